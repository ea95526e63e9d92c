//! Graphene 二进制编码（签名摘要的输入）
//!
//! - 整数小端；对象ID只写 instance 的 varint
//! - 可选字段前置 0/1 标记字节，变长字段前置 varint 长度
//!
//! 只覆盖 transfer 操作；其它操作类型与非空 extensions 直接拒绝。

use super::{
    memo::MemoEnvelope,
    object_id::ObjectId,
    operation::{AssetAmount, Operation, Transaction, TransferOperation},
};
use crate::error::{AdapterError, Result};

/// 写入 Graphene 二进制格式
pub trait GrapheneEncode {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()>;
}

/// 无符号 LEB128
pub fn write_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}

fn write_len(out: &mut Vec<u8>, len: usize) {
    write_varint(out, len as u64);
}

fn ensure_no_extensions(extensions: &[serde_json::Value]) -> Result<()> {
    if extensions.is_empty() {
        Ok(())
    } else {
        Err(AdapterError::InvalidTransaction(
            "extensions are not supported".into(),
        ))
    }
}

impl GrapheneEncode for ObjectId {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        write_varint(out, self.instance);
        Ok(())
    }
}

impl GrapheneEncode for AssetAmount {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        let amount = i64::try_from(self.amount).map_err(|_| {
            AdapterError::InvalidAmount(format!("{} exceeds share type", self.amount))
        })?;
        out.extend_from_slice(&amount.to_le_bytes());
        self.asset_id.encode(out)
    }
}

impl GrapheneEncode for MemoEnvelope {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(self.from.as_bytes());
        out.extend_from_slice(self.to.as_bytes());
        out.extend_from_slice(&self.nonce.to_le_bytes());
        let message = self.ciphertext()?;
        write_len(out, message.len());
        out.extend_from_slice(&message);
        Ok(())
    }
}

impl GrapheneEncode for TransferOperation {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        self.fee.encode(out)?;
        self.from.encode(out)?;
        self.to.encode(out)?;
        self.amount.encode(out)?;
        match &self.memo {
            Some(memo) => {
                out.push(1);
                memo.encode(out)?;
            }
            None => out.push(0),
        }
        ensure_no_extensions(&self.extensions)?;
        write_len(out, 0);
        Ok(())
    }
}

impl GrapheneEncode for Operation {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Operation::Transfer(op) => {
                write_varint(out, u64::from(self.op_type()));
                op.encode(out)
            }
            Operation::Other { op_type, .. } => Err(AdapterError::UnsupportedOperation(*op_type)),
        }
    }
}

impl GrapheneEncode for Transaction {
    fn encode(&self, out: &mut Vec<u8>) -> Result<()> {
        out.extend_from_slice(&self.ref_block_num.to_le_bytes());
        out.extend_from_slice(&self.ref_block_prefix.to_le_bytes());

        let expiration = u32::try_from(self.expiration.and_utc().timestamp()).map_err(|_| {
            AdapterError::InvalidTransaction(format!(
                "expiration {} out of range",
                self.expiration
            ))
        })?;
        out.extend_from_slice(&expiration.to_le_bytes());

        write_len(out, self.operations.len());
        for op in &self.operations {
            op.encode(out)?;
        }
        ensure_no_extensions(&self.extensions)?;
        write_len(out, 0);
        Ok(())
    }
}

/// 编码为字节
pub fn to_bytes<T: GrapheneEncode + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    value.encode(&mut out)?;
    Ok(out)
}
