//! 节点查询接口
//!
//! 标准化与分页逻辑只依赖这个 trait；具体实现见
//! `infrastructure::node_client::NodeClient`（HTTP JSON-RPC），测试中使用内存 mock。

use async_trait::async_trait;

use crate::domain::{
    Account, Asset, AssetAmount, Block, BroadcastResult, DynamicGlobalProperties, ObjectId,
    Operation, OperationHistory, PublicKey, SignedTransaction,
};

/// 节点查询错误：区分"对象不存在"与"调用失败"
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("{kind} {key} not found")]
    NotFound { kind: &'static str, key: String },

    /// 节点返回了 JSON-RPC error
    #[error("node rpc error: {0}")]
    Rpc(String),

    /// 网络、超时、HTTP 状态码
    #[error("node transport error: {0}")]
    Transport(String),

    /// 响应无法解析为预期结构
    #[error("malformed node response: {0}")]
    Malformed(String),
}

impl LookupError {
    pub fn not_found(kind: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type LookupResult<T> = std::result::Result<T, LookupError>;

/// Graphene 节点能力（database / history / network_broadcast API 的子集）
#[async_trait]
pub trait NodeApi: Send + Sync {
    async fn get_chain_id(&self) -> LookupResult<String>;

    /// 按符号（`GXC`）或ID（`1.3.1`）查询资产
    async fn get_asset(&self, symbol_or_id: &str) -> LookupResult<Asset>;

    /// 批量查询资产；不存在的ID不出现在结果中
    async fn get_assets(&self, ids: &[ObjectId]) -> LookupResult<Vec<Asset>>;

    /// 按名称或ID查询账户
    async fn get_account(&self, name_or_id: &str) -> LookupResult<Account>;

    /// 批量查询账户；不存在的ID不出现在结果中
    async fn get_accounts_by_ids(&self, ids: &[ObjectId]) -> LookupResult<Vec<Account>>;

    /// 引用该公钥的账户ID
    async fn get_key_references(&self, key: &PublicKey) -> LookupResult<Vec<ObjectId>>;

    /// `assets` 为空时返回全部非零余额
    async fn get_account_balances(
        &self,
        account: ObjectId,
        assets: &[ObjectId],
    ) -> LookupResult<Vec<AssetAmount>>;

    /// 返回 `(stop, start]` 区间内最多 `limit` 条记录，新的在前
    async fn get_account_history(
        &self,
        account: ObjectId,
        stop: ObjectId,
        limit: u32,
        start: ObjectId,
    ) -> LookupResult<Vec<OperationHistory>>;

    async fn get_block(&self, height: u64) -> LookupResult<Block>;

    async fn get_transaction_by_id(&self, tx_id: &str) -> LookupResult<SignedTransaction>;

    async fn get_dynamic_global_properties(&self) -> LookupResult<DynamicGlobalProperties>;

    /// 每个操作对应一个手续费报价
    async fn get_required_fees(
        &self,
        operations: &[Operation],
        fee_asset: ObjectId,
    ) -> LookupResult<Vec<AssetAmount>>;

    async fn broadcast_transaction_synchronous(
        &self,
        tx: &SignedTransaction,
    ) -> LookupResult<BroadcastResult>;
}
