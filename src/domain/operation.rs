//! Graphene 操作与交易
//!
//! 操作在 JSON 中是 `[tag, body]` 二元组。`Operation` 直接按 tag 反序列化为具体变体，
//! 不做"先解析成通用值再重新序列化"的二次转换。

use std::fmt;

use chrono::NaiveDateTime;
use serde::{
    de::{self, IgnoredAny, SeqAccess, Visitor},
    ser::SerializeTuple,
    Deserialize, Deserializer, Serialize, Serializer,
};

use super::{memo::MemoEnvelope, object_id::ObjectId};
use crate::utils::{serde_utils, time_utils::chain_time};

/// transfer 操作的 tag
pub const TRANSFER_OP_TYPE: u16 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetAmount {
    #[serde(with = "serde_utils::number_or_string")]
    pub amount: u64,
    pub asset_id: ObjectId,
}

impl AssetAmount {
    pub fn new(amount: u64, asset_id: ObjectId) -> Self {
        Self { amount, asset_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOperation {
    pub fee: AssetAmount,
    pub from: ObjectId,
    pub to: ObjectId,
    pub amount: AssetAmount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<MemoEnvelope>,
    #[serde(default)]
    pub extensions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Transfer(TransferOperation),
    /// 本适配器不解释的其它操作，原样保留
    Other { op_type: u16, body: serde_json::Value },
}

impl Operation {
    pub fn op_type(&self) -> u16 {
        match self {
            Operation::Transfer(_) => TRANSFER_OP_TYPE,
            Operation::Other { op_type, .. } => *op_type,
        }
    }

    pub fn as_transfer(&self) -> Option<&TransferOperation> {
        match self {
            Operation::Transfer(op) => Some(op),
            Operation::Other { .. } => None,
        }
    }
}

impl From<TransferOperation> for Operation {
    fn from(op: TransferOperation) -> Self {
        Operation::Transfer(op)
    }
}

impl Serialize for Operation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.op_type())?;
        match self {
            Operation::Transfer(op) => tuple.serialize_element(op)?,
            Operation::Other { body, .. } => tuple.serialize_element(body)?,
        }
        tuple.end()
    }
}

struct OperationVisitor;

impl<'de> Visitor<'de> for OperationVisitor {
    type Value = Operation;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a [op_type, body] pair")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Operation, A::Error> {
        let op_type: u16 = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;

        let op = if op_type == TRANSFER_OP_TYPE {
            seq.next_element::<TransferOperation>()?
                .map(Operation::Transfer)
        } else {
            seq.next_element::<serde_json::Value>()?
                .map(|body| Operation::Other { op_type, body })
        }
        .ok_or_else(|| de::Error::invalid_length(1, &self))?;

        if seq.next_element::<IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(3, &self));
        }
        Ok(op)
    }
}

impl<'de> Deserialize<'de> for Operation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(OperationVisitor)
    }
}

/// 未签名交易
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub ref_block_num: u16,
    #[serde(with = "serde_utils::number_or_string")]
    pub ref_block_prefix: u32,
    #[serde(with = "chain_time")]
    pub expiration: NaiveDateTime,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub extensions: Vec<serde_json::Value>,
}

impl Transaction {
    pub fn transfers(&self) -> impl Iterator<Item = (usize, &TransferOperation)> {
        self.operations
            .iter()
            .enumerate()
            .filter_map(|(i, op)| op.as_transfer().map(|t| (i, t)))
    }
}

/// 交易 + 签名；节点有时返回 `"signatures": null`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    #[serde(default, deserialize_with = "serde_utils::null_as_default")]
    pub signatures: Vec<String>,
}

impl SignedTransaction {
    pub fn unsigned(transaction: Transaction) -> Self {
        Self {
            transaction,
            signatures: Vec::new(),
        }
    }
}
