//! 交易所适配接口
//!
//! 地址 = 账户名；一笔 transfer = 一条 `LedgerEntry`。所有方法都是一次性的，
//! 除节点客户端外不持有跨调用状态。

use std::sync::Arc;

use tracing::info;

use super::{
    history::{HistoryPage, HistoryPaginator},
    lookup_cache::LookupCache,
    node_api::{LookupError, NodeApi},
    normalizer::TransactionNormalizer,
    transaction_builder::{TransactionBuilder, TransferRequest},
};
use crate::{
    config::ChainConfig,
    domain::{
        ledger::{EXTRA_BLOCK_NUM, EXTRA_TRX_IN_BLOCK},
        signing, AssetBalance, LedgerEntry, MemoReader, ObjectId, PrivateKey, PublicKey,
        SignedTransaction,
    },
    error::{AdapterError, Result},
    metrics,
};

pub struct ExchangeAdapter<N: ?Sized> {
    node: Arc<N>,
    normalizer: TransactionNormalizer<N>,
    paginator: HistoryPaginator<N>,
    builder: TransactionBuilder<N>,
    core_asset: String,
}

impl<N: NodeApi + ?Sized> ExchangeAdapter<N> {
    pub fn new(node: Arc<N>, chain: &ChainConfig) -> Self {
        Self {
            normalizer: TransactionNormalizer::new(Arc::clone(&node)),
            paginator: HistoryPaginator::new(Arc::clone(&node)),
            builder: TransactionBuilder::new(
                Arc::clone(&node),
                chain.core_asset.clone(),
                chain.expiration_secs,
            ),
            core_asset: chain.core_asset.clone(),
            node,
        }
    }

    /// 标准化时用该 memo 密钥解密 memo 明文
    pub fn with_memo_reader(mut self, reader: MemoReader) -> Self {
        self.normalizer = self.normalizer.with_memo_reader(reader.clone());
        self.paginator = self.paginator.with_memo_reader(reader);
        self
    }

    pub fn node(&self) -> &Arc<N> {
        &self.node
    }

    pub async fn chain_id(&self) -> Result<String> {
        Ok(self.node.get_chain_id().await?)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 账户
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// 引用该公钥的账户ID
    pub async fn account_ids_for_public_key(&self, public_key: &str) -> Result<Vec<String>> {
        let key = PublicKey::from_address(public_key)?;
        let ids = self.node.get_key_references(&key).await?;
        Ok(ids.iter().map(ToString::to_string).collect())
    }

    /// 账户ID → 账户名
    pub async fn account_name(&self, account_id: &str) -> Result<String> {
        let id: ObjectId = account_id.parse()?;
        let mut cache = LookupCache::new(self.node.as_ref());
        Ok(cache.account(id).await?.name)
    }

    /// 公钥 → 关联的全部账户名；没有关联账户视为不存在
    pub async fn account_names_for_public_key(&self, public_key: &str) -> Result<Vec<String>> {
        let key = PublicKey::from_address(public_key)?;
        let ids = self.node.get_key_references(&key).await?;
        if ids.is_empty() {
            return Err(LookupError::not_found("linked account for key", public_key).into());
        }

        let mut cache = LookupCache::new(self.node.as_ref());
        cache.prefetch_accounts(ids.iter().copied()).await?;
        let mut names = Vec::with_capacity(ids.len());
        for id in ids {
            names.push(cache.account(id).await?.name);
        }
        Ok(names)
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 区块与交易
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// 最新不可逆区块号
    pub async fn block_count(&self) -> Result<u64> {
        Ok(self
            .node
            .get_dynamic_global_properties()
            .await?
            .last_irreversible_block_num)
    }

    /// 标准化区块内全部交易
    pub async fn block_transactions(&self, height: u64) -> Result<Vec<LedgerEntry>> {
        let block = self.node.get_block(height).await?;
        if block.transaction_ids.len() != block.transactions.len() {
            return Err(LookupError::Malformed(format!(
                "block {} has {} transactions but {} transaction ids",
                height,
                block.transactions.len(),
                block.transaction_ids.len()
            ))
            .into());
        }

        let mut entries = Vec::new();
        for (index, (stx, tx_id)) in block
            .transactions
            .iter()
            .zip(&block.transaction_ids)
            .enumerate()
        {
            let mut txs = self
                .normalizer
                .normalize_transaction(&stx.transaction, tx_id, Some(block.timestamp))
                .await?;
            locate_in_block(&mut txs, height, index);
            entries.extend(txs);
        }
        Ok(entries)
    }

    /// 按区块号 + 区块内序号标准化一笔交易
    pub async fn transaction_at(&self, height: u64, trx_in_block: usize) -> Result<Vec<LedgerEntry>> {
        let block = self.node.get_block(height).await?;
        let stx = block.transactions.get(trx_in_block).ok_or_else(|| {
            LookupError::not_found("transaction", format!("{}:{}", height, trx_in_block))
        })?;
        let tx_id = block.transaction_ids.get(trx_in_block).ok_or_else(|| {
            LookupError::Malformed(format!(
                "block {} has no transaction id at {}",
                height, trx_in_block
            ))
        })?;

        let mut entries = self
            .normalizer
            .normalize_transaction(&stx.transaction, tx_id, Some(block.timestamp))
            .await?;
        locate_in_block(&mut entries, height, trx_in_block);
        Ok(entries)
    }

    /// 按交易ID标准化
    pub async fn transaction(&self, tx_hash: &str) -> Result<Vec<LedgerEntry>> {
        let stx = self.node.get_transaction_by_id(tx_hash).await?;
        self.normalizer
            .normalize_transaction(&stx.transaction, tx_hash, None)
            .await
    }

    /// 解析交易 JSON（签名与否均可）并标准化
    pub async fn deserialize(&self, raw_json: &str) -> Result<Vec<LedgerEntry>> {
        let stx: SignedTransaction = serde_json::from_str(raw_json)?;
        self.normalizer
            .normalize_transaction(&stx.transaction, "", None)
            .await
    }

    /// 账户历史一页，游标语义见 `history::next_cursor`
    pub async fn account_history(
        &self,
        account: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<HistoryPage> {
        self.paginator
            .normalize_history_page(account, cursor, limit)
            .await
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 资产与余额
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// 单个资产余额，未指定资产时查询主资产
    pub async fn balance(&self, account: &str, symbol: Option<&str>) -> Result<AssetBalance> {
        let account = self.node.get_account(account).await?;
        let symbol = symbol
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.core_asset);
        let asset = self.node.get_asset(symbol).await?;

        let amounts = self
            .node
            .get_account_balances(account.id, &[asset.id])
            .await?;
        let balance = amounts
            .iter()
            .find(|a| a.asset_id == asset.id)
            .map(|a| a.amount)
            .unwrap_or(0);
        Ok(AssetBalance::new(&asset, balance))
    }

    /// 全部非零余额，资产信息一次批量查询
    pub async fn balances(&self, account: &str) -> Result<Vec<AssetBalance>> {
        let account = self.node.get_account(account).await?;
        let amounts: Vec<_> = self
            .node
            .get_account_balances(account.id, &[])
            .await?
            .into_iter()
            .filter(|a| a.amount > 0)
            .collect();

        let mut cache = LookupCache::new(self.node.as_ref());
        cache
            .prefetch_assets(amounts.iter().map(|a| a.asset_id))
            .await?;
        let mut balances = Vec::with_capacity(amounts.len());
        for amount in &amounts {
            let asset = cache.asset(amount.asset_id).await?;
            balances.push(AssetBalance::new(&asset, amount.amount));
        }
        Ok(balances)
    }

    /// 资产详情（余额恒为 0）
    pub async fn token_detail(&self, symbol_or_id: &str) -> Result<AssetBalance> {
        let asset = self.node.get_asset(symbol_or_id).await?;
        Ok(AssetBalance::new(&asset, 0))
    }

    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
    // 构建与广播
    // ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    pub async fn build_transfer(&self, request: &TransferRequest) -> Result<SignedTransaction> {
        self.builder.build_transfer(request).await
    }

    /// 重新报价未签名交易的手续费
    pub async fn transaction_fee(&self, unsigned_json: &str) -> Result<SignedTransaction> {
        let stx: SignedTransaction = serde_json::from_str(unsigned_json)?;
        self.builder.requote_fee(stx).await
    }

    /// 用 hex 私钥签名，签名追加到 `signatures` 末尾；链ID取自节点
    pub async fn sign(
        &self,
        private_hex: &str,
        mut stx: SignedTransaction,
    ) -> Result<SignedTransaction> {
        let key = PrivateKey::from_hex(private_hex)?;
        let chain_id = self.node.get_chain_id().await?;
        let signature = signing::sign_transaction(&key, &chain_id, &stx.transaction)?;
        info!(
            signer = %key.public_key()?,
            signatures = stx.signatures.len() + 1,
            "transaction signed"
        );
        stx.signatures.push(signature);
        Ok(stx)
    }

    /// 同步广播已签名交易，返回其第一条 transfer 记录
    pub async fn broadcast(&self, signed_json: &str) -> Result<LedgerEntry> {
        let stx: SignedTransaction = serde_json::from_str(signed_json)?;
        if stx.signatures.is_empty() {
            return Err(AdapterError::InvalidTransaction(
                "transaction is not signed".into(),
            ));
        }
        let first_op = stx
            .transaction
            .operations
            .first()
            .ok_or_else(|| AdapterError::InvalidTransaction("transaction has no operations".into()))?;
        if first_op.as_transfer().is_none() {
            return Err(AdapterError::UnsupportedOperation(first_op.op_type()));
        }

        let result = match self.node.broadcast_transaction_synchronous(&stx).await {
            Ok(result) => {
                metrics::inc_broadcast(true);
                result
            }
            Err(e) => {
                metrics::inc_broadcast(false);
                return Err(e.into());
            }
        };
        info!(tx_id = %result.id, block_num = result.block_num, "transaction broadcast");

        let mut entries = self
            .normalizer
            .normalize_transaction(&stx.transaction, &result.id, None)
            .await?;
        locate_in_block(&mut entries, result.block_num, result.trx_num as usize);
        entries
            .into_iter()
            .next()
            .ok_or(AdapterError::UnsupportedOperation(first_op.op_type()))
    }
}

/// 附加区块号与区块内序号
fn locate_in_block(entries: &mut [LedgerEntry], height: u64, trx_in_block: usize) {
    for entry in entries {
        entry.block_no = Some(height);
        entry
            .extra
            .insert(EXTRA_BLOCK_NUM.to_string(), height.to_string());
        entry
            .extra
            .insert(EXTRA_TRX_IN_BLOCK.to_string(), trx_in_block.to_string());
    }
}
