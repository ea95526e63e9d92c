//! 交易标准化
//!
//! 把一笔链上交易（有序、异构的操作列表）投影为交易所接口的 `LedgerEntry` 列表：
//! 每个 transfer 一条，其它操作跳过。输出顺序与操作顺序一致；
//! 相同输入 + 相同查询结果 ⇒ 相同输出。

use std::{collections::BTreeMap, sync::Arc};

use chrono::NaiveDateTime;
use tracing::{debug, warn};

use super::{lookup_cache::LookupCache, node_api::NodeApi};
use crate::{
    domain::{
        ledger::{
            EXTRA_FEE_AMOUNT, EXTRA_FEE_TOKEN_CODE, EXTRA_FEE_TOKEN_DECIMAL,
            EXTRA_FEE_TOKEN_IDENTIFIER, EXTRA_MEMO_FROM, EXTRA_MEMO_MESSAGE, EXTRA_MEMO_NONCE,
            EXTRA_MEMO_TO, EXTRA_OP_IN_TRX,
        },
        LedgerEntry, MemoReader, Transaction, TransferOperation, Utxo,
    },
    error::Result,
    metrics,
    utils::time_utils::format_chain_time,
};

pub struct TransactionNormalizer<N: ?Sized> {
    node: Arc<N>,
    memo_reader: Option<MemoReader>,
}

impl<N: ?Sized> Clone for TransactionNormalizer<N> {
    fn clone(&self) -> Self {
        Self {
            node: Arc::clone(&self.node),
            memo_reader: self.memo_reader.clone(),
        }
    }
}

impl<N: NodeApi + ?Sized> TransactionNormalizer<N> {
    pub fn new(node: Arc<N>) -> Self {
        Self {
            node,
            memo_reader: None,
        }
    }

    /// memo 收发方是该密钥时，`extra["message"]` 填写明文
    pub fn with_memo_reader(mut self, reader: MemoReader) -> Self {
        self.memo_reader = Some(reader);
        self
    }

    /// 标准化一笔交易
    ///
    /// # 流程
    /// 1. 一次批量预取所有 transfer 的资产与账户
    /// 2. 按顺序为每个 transfer 生成一条记录，跳过其它操作
    /// 3. 附加交易ID（为空则不填）与区块时间
    ///
    /// 任何查询失败都使整个调用失败。
    pub async fn normalize_transaction(
        &self,
        tx: &Transaction,
        tx_id: &str,
        block_time: Option<NaiveDateTime>,
    ) -> Result<Vec<LedgerEntry>> {
        let mut cache = LookupCache::new(self.node.as_ref());
        cache
            .prefetch_transfers(tx.transfers().map(|(_, op)| op))
            .await?;

        let tx_hash = (!tx_id.is_empty()).then(|| tx_id.to_string());
        let tx_at = block_time.as_ref().map(format_chain_time);

        let mut entries = Vec::new();
        for (index, op) in tx.transfers() {
            let mut entry = transfer_entry(&mut cache, op, self.memo_reader.as_ref()).await?;
            entry.tx_hash = tx_hash.clone();
            entry.tx_at = tx_at.clone();
            entry
                .extra
                .insert(EXTRA_OP_IN_TRX.to_string(), index.to_string());
            entries.push(entry);
        }

        debug!(
            tx_id,
            operations = tx.operations.len(),
            entries = entries.len(),
            "transaction normalized"
        );
        metrics::add_entries_normalized(entries.len());
        Ok(entries)
    }
}

/// 单个 transfer → LedgerEntry（不含交易级字段）
pub(crate) async fn transfer_entry<N: NodeApi + ?Sized>(
    cache: &mut LookupCache<'_, N>,
    op: &TransferOperation,
    memo_reader: Option<&MemoReader>,
) -> Result<LedgerEntry> {
    let asset = cache.asset(op.amount.asset_id).await?;
    let fee_asset = cache.asset(op.fee.asset_id).await?;
    let from = cache.account(op.from).await?;
    let to = cache.account(op.to).await?;

    let mut extra = BTreeMap::new();
    if let Some(memo) = &op.memo {
        // 解密失败不影响入账，保留密文
        let message = match memo_reader {
            Some(reader) if reader.can_read(memo) => reader.read(memo).unwrap_or_else(|e| {
                warn!(
                    error = %e,
                    from = %memo.from,
                    nonce = memo.nonce,
                    "memo decrypt failed, keeping ciphertext"
                );
                memo.message.clone()
            }),
            _ => memo.message.clone(),
        };
        extra.insert(EXTRA_MEMO_FROM.to_string(), memo.from.to_string());
        extra.insert(EXTRA_MEMO_TO.to_string(), memo.to.to_string());
        extra.insert(EXTRA_MEMO_MESSAGE.to_string(), message);
        extra.insert(EXTRA_MEMO_NONCE.to_string(), memo.nonce.to_string());
    }
    extra.insert(EXTRA_FEE_AMOUNT.to_string(), op.fee.amount.to_string());
    extra.insert(EXTRA_FEE_TOKEN_CODE.to_string(), fee_asset.symbol.clone());
    extra.insert(EXTRA_FEE_TOKEN_IDENTIFIER.to_string(), fee_asset.id.to_string());
    extra.insert(EXTRA_FEE_TOKEN_DECIMAL.to_string(), fee_asset.precision.to_string());

    Ok(LedgerEntry {
        tx_hash: None,
        inputs: vec![Utxo::new(op.amount.amount, from.name, &asset)],
        outputs: vec![Utxo::new(op.amount.amount, to.name, &asset)],
        tx_at: None,
        block_no: None,
        confirmed_at: None,
        extra,
    })
}
