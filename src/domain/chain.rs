//! 节点返回的链上对象（只保留适配器用到的字段）

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{
    keys::PublicKey,
    object_id::ObjectId,
    operation::{Operation, SignedTransaction},
};
use crate::{
    error::{AdapterError, Result},
    utils::time_utils::chain_time,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub id: ObjectId,
    pub symbol: String,
    pub precision: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountOptions {
    pub memo_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: ObjectId,
    pub name: String,
    pub options: AccountOptions,
}

impl Account {
    pub fn memo_public_key(&self) -> Result<PublicKey> {
        PublicKey::from_address(&self.options.memo_key)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// 上一区块ID（hex）
    pub previous: String,
    #[serde(with = "chain_time")]
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub transactions: Vec<SignedTransaction>,
    #[serde(default)]
    pub transaction_ids: Vec<String>,
}

impl Block {
    /// 区块ID第 4..8 字节的小端 u32，即引用该区块的 `ref_block_prefix`
    pub fn previous_ref_prefix(&self) -> Result<u32> {
        ref_block_prefix(&self.previous)
    }
}

pub fn ref_block_prefix(block_id: &str) -> Result<u32> {
    let raw = hex::decode(block_id)?;
    let bytes: [u8; 4] = raw
        .get(4..8)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| AdapterError::DecodeError(format!("block id too short: {}", block_id)))?;
    Ok(u32::from_le_bytes(bytes))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicGlobalProperties {
    pub head_block_number: u64,
    pub last_irreversible_block_num: u64,
    #[serde(with = "chain_time")]
    pub time: NaiveDateTime,
}

/// `get_account_history` 的条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationHistory {
    pub id: ObjectId,
    pub op: Operation,
    pub block_num: u64,
    pub trx_in_block: u32,
    pub op_in_trx: u32,
    #[serde(default)]
    pub virtual_op: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub id: String,
    pub block_num: u64,
    #[serde(default)]
    pub trx_num: u32,
    #[serde(default)]
    pub expired: bool,
}
