//! 单次调用内的资产/账户查询缓存
//!
//! 生命周期只覆盖一次 `normalize_transaction` 或一页历史，不跨调用共享。
//! 同一ID在一次调用内最多向节点查询一次，缺失的ID以 `NotFound` 失败，绝不用空记录代替。

use std::collections::HashMap;

use tracing::debug;

use super::node_api::{LookupError, LookupResult, NodeApi};
use crate::domain::{Account, Asset, ObjectId, TransferOperation};

pub struct LookupCache<'a, N: ?Sized> {
    node: &'a N,
    assets: HashMap<ObjectId, Asset>,
    accounts: HashMap<ObjectId, Account>,
}

/// 去重并剔除已缓存的ID，保持首次出现的顺序
fn missing_ids<V>(
    ids: impl IntoIterator<Item = ObjectId>,
    cached: &HashMap<ObjectId, V>,
) -> Vec<ObjectId> {
    let mut out: Vec<ObjectId> = Vec::new();
    for id in ids {
        if !cached.contains_key(&id) && !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

impl<'a, N: NodeApi + ?Sized> LookupCache<'a, N> {
    pub fn new(node: &'a N) -> Self {
        Self {
            node,
            assets: HashMap::new(),
            accounts: HashMap::new(),
        }
    }

    /// 一次批量查询所有未缓存的资产
    pub async fn prefetch_assets(
        &mut self,
        ids: impl IntoIterator<Item = ObjectId>,
    ) -> LookupResult<()> {
        let missing = missing_ids(ids, &self.assets);
        if missing.is_empty() {
            return Ok(());
        }
        debug!(count = missing.len(), "batch asset lookup");

        for asset in self.node.get_assets(&missing).await? {
            self.assets.insert(asset.id, asset);
        }
        match missing.iter().find(|id| !self.assets.contains_key(id)) {
            Some(id) => Err(LookupError::not_found("asset", id)),
            None => Ok(()),
        }
    }

    /// 一次批量查询所有未缓存的账户
    pub async fn prefetch_accounts(
        &mut self,
        ids: impl IntoIterator<Item = ObjectId>,
    ) -> LookupResult<()> {
        let missing = missing_ids(ids, &self.accounts);
        if missing.is_empty() {
            return Ok(());
        }
        debug!(count = missing.len(), "batch account lookup");

        for account in self.node.get_accounts_by_ids(&missing).await? {
            self.accounts.insert(account.id, account);
        }
        match missing.iter().find(|id| !self.accounts.contains_key(id)) {
            Some(id) => Err(LookupError::not_found("account", id)),
            None => Ok(()),
        }
    }

    /// 预取若干 transfer 涉及的全部资产（金额+手续费）与账户（双方）
    pub async fn prefetch_transfers<'op>(
        &mut self,
        ops: impl IntoIterator<Item = &'op TransferOperation>,
    ) -> LookupResult<()> {
        let mut asset_ids = Vec::new();
        let mut account_ids = Vec::new();
        for op in ops {
            asset_ids.push(op.amount.asset_id);
            asset_ids.push(op.fee.asset_id);
            account_ids.push(op.from);
            account_ids.push(op.to);
        }
        self.prefetch_assets(asset_ids).await?;
        self.prefetch_accounts(account_ids).await
    }

    pub async fn asset(&mut self, id: ObjectId) -> LookupResult<Asset> {
        self.prefetch_assets([id]).await?;
        self.assets
            .get(&id)
            .cloned()
            .ok_or_else(|| LookupError::not_found("asset", id))
    }

    pub async fn account(&mut self, id: ObjectId) -> LookupResult<Account> {
        self.prefetch_accounts([id]).await?;
        self.accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| LookupError::not_found("account", id))
    }
}
