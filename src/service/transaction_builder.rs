//! 转账交易构建器
//!
//! 生成未签名的 Graphene transfer 交易（JSON），签名由调用方完成。

use std::sync::Arc;

use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::node_api::{LookupError, NodeApi};
use crate::{
    domain::{
        AssetAmount, MemoEnvelope, ObjectId, Operation, SignedTransaction, Transaction,
        TransferOperation,
    },
    error::{AdapterError, Result},
    utils::time_utils::add_seconds,
};

/// 默认交易有效期（秒）
pub const DEFAULT_EXPIRATION_SECS: u64 = 600;

/// 转账构建请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    /// 发送方账户名或ID
    pub from: String,
    /// 接收方账户名或ID
    pub to: String,
    /// 资产符号或ID，为空时使用主资产
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// 金额 (十进制字符串，如 "3.18")
    pub amount: String,
    /// 已加密的 memo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo: Option<MemoEnvelope>,
}

/// 引用区块号：`(lib - 1) & 0xffff`
pub fn ref_block_num(last_irreversible_block_num: u64) -> u16 {
    (last_irreversible_block_num.wrapping_sub(1) & 0xffff) as u16
}

/// 十进制金额按资产精度换算为链上整数
///
/// 拒绝非正数、超出精度的小数位和超过 int64 的结果。
pub fn scale_amount(amount: &str, precision: u8) -> Result<u64> {
    let value = Decimal::from_str_exact(amount.trim())
        .map_err(|e| AdapterError::InvalidAmount(format!("{:?}: {}", amount, e)))?;
    if value.is_sign_negative() || value.is_zero() {
        return Err(AdapterError::InvalidAmount(format!(
            "amount must be positive, got {}",
            amount
        )));
    }

    let overflow = || AdapterError::InvalidAmount(format!("amount {} overflows", amount));
    let factor = 10u64
        .checked_pow(u32::from(precision))
        .map(Decimal::from)
        .ok_or_else(overflow)?;
    let scaled = value.checked_mul(factor).ok_or_else(overflow)?;
    if !scaled.fract().is_zero() {
        return Err(AdapterError::InvalidAmount(format!(
            "{} has more than {} decimal places",
            amount, precision
        )));
    }

    scaled
        .to_i64()
        .and_then(|v| u64::try_from(v).ok())
        .ok_or_else(overflow)
}

pub struct TransactionBuilder<N: ?Sized> {
    node: Arc<N>,
    core_asset: String,
    expiration_secs: u64,
}

impl<N: NodeApi + ?Sized> TransactionBuilder<N> {
    pub fn new(node: Arc<N>, core_asset: impl Into<String>, expiration_secs: u64) -> Self {
        Self {
            node,
            core_asset: core_asset.into(),
            expiration_secs,
        }
    }

    /// 构建未签名转账
    ///
    /// # 流程
    /// 1. 解析双方账户与转账资产，按精度换算金额
    /// 2. 以主资产报价手续费
    /// 3. 以最新不可逆区块计算 ref_block_num / ref_block_prefix
    /// 4. 过期时间 = 链上时间 + 有效期
    pub async fn build_transfer(&self, request: &TransferRequest) -> Result<SignedTransaction> {
        let from = self.node.get_account(&request.from).await?;
        let to = self.node.get_account(&request.to).await?;

        let symbol = request
            .symbol
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.core_asset);
        let asset = self.node.get_asset(symbol).await?;
        let amount = scale_amount(&request.amount, asset.precision)?;
        let fee_asset = self.node.get_asset(&self.core_asset).await?;

        let mut op = TransferOperation {
            fee: AssetAmount::new(0, fee_asset.id),
            from: from.id,
            to: to.id,
            amount: AssetAmount::new(amount, asset.id),
            memo: request.memo.clone(),
            extensions: Vec::new(),
        };
        op.fee.amount = self.quote_fee(&op, fee_asset.id).await?;

        let props = self.node.get_dynamic_global_properties().await?;
        let lib = props.last_irreversible_block_num;
        let block = self.node.get_block(lib).await?;

        let tx = Transaction {
            ref_block_num: ref_block_num(lib),
            ref_block_prefix: block.previous_ref_prefix()?,
            expiration: add_seconds(&props.time, self.expiration_secs),
            operations: vec![Operation::Transfer(op)],
            extensions: Vec::new(),
        };

        info!(
            from = %from.name,
            to = %to.name,
            asset = %asset.symbol,
            amount,
            ref_block_num = tx.ref_block_num,
            "transfer built"
        );
        Ok(SignedTransaction::unsigned(tx))
    }

    /// 重新报价第一个（transfer）操作的手续费
    pub async fn requote_fee(&self, mut stx: SignedTransaction) -> Result<SignedTransaction> {
        let first = stx
            .transaction
            .operations
            .first_mut()
            .ok_or_else(|| AdapterError::InvalidTransaction("transaction has no operations".into()))?;
        let op_type = first.op_type();
        let Operation::Transfer(op) = first else {
            return Err(AdapterError::UnsupportedOperation(op_type));
        };

        let fee_asset = op.fee.asset_id;
        let quoted = self.quote_fee(op, fee_asset).await?;
        op.fee.amount = quoted;
        Ok(stx)
    }

    async fn quote_fee(&self, op: &TransferOperation, fee_asset: ObjectId) -> Result<u64> {
        let fees = self
            .node
            .get_required_fees(&[Operation::Transfer(op.clone())], fee_asset)
            .await?;
        let fee = fees
            .first()
            .ok_or_else(|| LookupError::Malformed("empty fee quote".into()))?;
        debug!(fee = fee.amount, asset = %fee.asset_id, "fee quoted");
        Ok(fee.amount)
    }
}
