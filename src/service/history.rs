//! 账户历史分页
//!
//! 游标是操作历史ID（`1.11.x`）。节点按"新的在前"返回 `(stop, start]` 区间，
//! 下一页游标 = 节点本页返回的最后一条ID减一（含非 transfer 操作），见 [`next_cursor`]。

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::{lookup_cache::LookupCache, node_api::NodeApi, normalizer::transfer_entry};
use crate::{
    domain::{
        ledger::{EXTRA_BLOCK_NUM, EXTRA_HISTORY_ID, EXTRA_OP_IN_TRX, EXTRA_TRX_IN_BLOCK},
        LedgerEntry, MemoReader, ObjectId, OperationHistory, HISTORY_SENTINEL,
    },
    error::{AdapterError, Result},
    metrics,
};

/// 节点单次返回的最大条数
pub const MAX_HISTORY_LIMIT: u32 = 100;

/// 一页标准化后的历史
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryPage {
    pub entries: Vec<LedgerEntry>,
    /// 为 None 表示历史已到头
    pub next_cursor: Option<ObjectId>,
}

pub struct HistoryPaginator<N: ?Sized> {
    node: Arc<N>,
    memo_reader: Option<MemoReader>,
}

impl<N: NodeApi + ?Sized> HistoryPaginator<N> {
    pub fn new(node: Arc<N>) -> Self {
        Self {
            node,
            memo_reader: None,
        }
    }

    pub fn with_memo_reader(mut self, reader: MemoReader) -> Self {
        self.memo_reader = Some(reader);
        self
    }

    /// 标准化一页账户历史
    ///
    /// # 流程
    /// 1. 解析账户（名称或ID）；游标为空时从最新开始
    /// 2. 拉取最多 `limit` 条历史（1..=100），保持节点顺序
    /// 3. 本页所有资产/账户批量查询，每个ID至多一次
    /// 4. 每个 transfer 生成一条记录，附带定位字段
    /// 5. 由节点原始条目计算下一页游标；整页都是其它操作时游标照常前进
    pub async fn normalize_history_page(
        &self,
        account: &str,
        cursor: Option<&str>,
        limit: u32,
    ) -> Result<HistoryPage> {
        let account = self.node.get_account(account).await?;
        let start = parse_cursor(cursor)?;
        let limit = limit.clamp(1, MAX_HISTORY_LIMIT);

        let items = self
            .node
            .get_account_history(account.id, HISTORY_SENTINEL, limit, start)
            .await?;

        let mut cache = LookupCache::new(self.node.as_ref());
        cache
            .prefetch_transfers(items.iter().filter_map(|item| item.op.as_transfer()))
            .await?;

        let mut entries = Vec::new();
        for item in &items {
            let Some(op) = item.op.as_transfer() else {
                continue;
            };
            let mut entry = transfer_entry(&mut cache, op, self.memo_reader.as_ref()).await?;
            entry.block_no = Some(item.block_num);
            entry
                .extra
                .insert(EXTRA_BLOCK_NUM.to_string(), item.block_num.to_string());
            entry
                .extra
                .insert(EXTRA_TRX_IN_BLOCK.to_string(), item.trx_in_block.to_string());
            entry
                .extra
                .insert(EXTRA_OP_IN_TRX.to_string(), item.op_in_trx.to_string());
            entry
                .extra
                .insert(EXTRA_HISTORY_ID.to_string(), item.id.to_string());
            entries.push(entry);
        }

        let next_cursor = next_cursor(&items, limit);
        debug!(
            account = %account.id,
            %start,
            limit,
            items = items.len(),
            entries = entries.len(),
            next_cursor = ?next_cursor,
            "history page normalized"
        );
        metrics::add_entries_normalized(entries.len());
        Ok(HistoryPage {
            entries,
            next_cursor,
        })
    }
}

fn parse_cursor(cursor: Option<&str>) -> Result<ObjectId> {
    match cursor.map(str::trim) {
        None | Some("") => Ok(HISTORY_SENTINEL),
        Some(raw) => {
            let id: ObjectId = raw.parse()?;
            if id.space != HISTORY_SENTINEL.space || id.type_id != HISTORY_SENTINEL.type_id {
                return Err(AdapterError::DecodeError(format!(
                    "cursor must be an operation history id, got {}",
                    id
                )));
            }
            Ok(id)
        }
    }
}

/// 下一页游标：节点返回不足 `limit` 条即已到头；否则为最后一条ID减一，到达哨兵时为 None
pub fn next_cursor(items: &[OperationHistory], limit: u32) -> Option<ObjectId> {
    if items.len() < limit as usize {
        return None;
    }
    items.last()?.id.previous()
}
