//! 交易所接口的规范化账目模型
//!
//! 每个 transfer 操作对应一条 `LedgerEntry`，输入与输出各一个 `Utxo`，
//! 金额与资产相同，只有地址（账户名）不同。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::chain::Asset;

// extra 字段名（与交易所接口约定一致，不可修改）
pub const EXTRA_FEE_AMOUNT: &str = "feeAmount";
pub const EXTRA_FEE_TOKEN_CODE: &str = "feeTokenCode";
pub const EXTRA_FEE_TOKEN_IDENTIFIER: &str = "feeTokenIdentifier";
pub const EXTRA_FEE_TOKEN_DECIMAL: &str = "feeTokenDecimal";
pub const EXTRA_MEMO_FROM: &str = "from";
pub const EXTRA_MEMO_TO: &str = "to";
pub const EXTRA_MEMO_MESSAGE: &str = "message";
pub const EXTRA_MEMO_NONCE: &str = "nonce";
pub const EXTRA_BLOCK_NUM: &str = "block_num";
pub const EXTRA_TRX_IN_BLOCK: &str = "trx_in_block";
pub const EXTRA_OP_IN_TRX: &str = "op_in_trx";
pub const EXTRA_HISTORY_ID: &str = "id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    pub value: u64,
    pub address: String,
    pub token_code: String,
    pub token_identifier: String,
    pub token_decimal: u8,
}

impl Utxo {
    pub fn new(value: u64, address: impl Into<String>, asset: &Asset) -> Self {
        Self {
            value,
            address: address.into(),
            token_code: asset.symbol.clone(),
            token_identifier: asset.id.to_string(),
            token_decimal: asset.precision,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    pub inputs: Vec<Utxo>,
    pub outputs: Vec<Utxo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_no: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed_at: Option<String>,
    pub extra: BTreeMap<String, String>,
}

impl LedgerEntry {
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

/// 账户在某资产上的余额
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub token_code: String,
    pub token_identifier: String,
    pub token_decimal: u8,
    pub balance: u64,
}

impl AssetBalance {
    pub fn new(asset: &Asset, balance: u64) -> Self {
        Self {
            token_code: asset.symbol.clone(),
            token_identifier: asset.id.to_string(),
            token_decimal: asset.precision,
            balance,
        }
    }
}
