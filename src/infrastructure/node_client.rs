//! GXChain 节点客户端：HTTP JSON-RPC，带超时/重试
//!
//! 请求格式：`{"jsonrpc":"2.0","method":"call","params":[api, method, args],"id":n}`
//!
//! - 传输失败（网络、超时、非 2xx）按指数回退重试，最多 `retries` 次
//! - 节点返回的 JSON-RPC error 不重试，直接作为 `LookupError::Rpc`
//! - 单对象查询返回 `null` 视为 `LookupError::NotFound`

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    config::NodeConfig,
    domain::{
        Account, Asset, AssetAmount, Block, BroadcastResult, DynamicGlobalProperties, ObjectId,
        Operation, OperationHistory, PublicKey, SignedTransaction,
    },
    metrics,
    service::node_api::{LookupError, LookupResult, NodeApi},
};

const DATABASE_API: &str = "database";
const HISTORY_API: &str = "history";
const BROADCAST_API: &str = "network_broadcast";

pub struct NodeClient {
    url: String,
    http: reqwest::Client,
    retries: usize,
    next_id: AtomicU64,
    chain_id: tokio::sync::OnceCell<String>,
}

impl NodeClient {
    pub fn new(config: &NodeConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            url: config.url.clone(),
            http,
            retries: config.retries,
            next_id: AtomicU64::new(1),
            chain_id: tokio::sync::OnceCell::new(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<T: DeserializeOwned>(&self, api: &str, method: &str, args: Value) -> LookupResult<T> {
        let raw = self.call_raw(api, method, args).await?;
        serde_json::from_value(raw)
            .map_err(|e| LookupError::Malformed(format!("{}.{}: {}", api, method, e)))
    }

    async fn call_raw(&self, api: &str, method: &str, args: Value) -> LookupResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let req = JsonRpcRequest::new(id, json!([api, method, args]));

        let mut attempt = 0usize;
        loop {
            let start = Instant::now();
            let err = match self.http.post(&self.url).json(&req).send().await {
                Ok(resp) if resp.status().is_success() => {
                    let body = resp.json::<JsonRpcResponse>().await;
                    let elapsed = start.elapsed().as_millis();
                    let body = match body {
                        Ok(body) => body,
                        Err(e) => {
                            metrics::observe_upstream_latency_ms(elapsed, false);
                            return Err(LookupError::Malformed(e.to_string()));
                        }
                    };
                    metrics::observe_upstream_latency_ms(elapsed, true);
                    debug!(api, method, id, elapsed_ms = elapsed as u64, "node call");

                    if let Some(error) = body.error {
                        return Err(LookupError::Rpc(rpc_error_message(&error)));
                    }
                    return Ok(body.result.unwrap_or(Value::Null));
                }
                Ok(resp) => {
                    metrics::observe_upstream_latency_ms(start.elapsed().as_millis(), false);
                    LookupError::Transport(format!("http status {}", resp.status()))
                }
                Err(e) => {
                    metrics::observe_upstream_latency_ms(start.elapsed().as_millis(), false);
                    LookupError::Transport(e.to_string())
                }
            };

            attempt += 1;
            if attempt > self.retries {
                return Err(err);
            }
            let backoff = 50u64 * (1 << attempt.min(5)); // 简单指数回退，最大 ~1600ms
            warn!(api, method, attempt, backoff_ms = backoff, error = %err, "node call failed, retrying");
            metrics::inc_upstream_retry();
            tokio::time::sleep(Duration::from_millis(backoff)).await;
        }
    }

    /// `get_objects` 单个对象，`null` → NotFound
    async fn get_object<T: DeserializeOwned>(&self, kind: &'static str, id: ObjectId) -> LookupResult<T> {
        let mut found: Vec<Option<T>> = self.call(DATABASE_API, "get_objects", json!([[id]])).await?;
        found
            .pop()
            .flatten()
            .ok_or_else(|| LookupError::not_found(kind, id))
    }

    /// `get_objects` 批量，跳过 `null`
    async fn get_objects<T: DeserializeOwned>(&self, ids: &[ObjectId]) -> LookupResult<Vec<T>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let found: Vec<Option<T>> = self.call(DATABASE_API, "get_objects", json!([ids])).await?;
        Ok(found.into_iter().flatten().collect())
    }
}

#[async_trait]
impl NodeApi for NodeClient {
    async fn get_chain_id(&self) -> LookupResult<String> {
        self.chain_id
            .get_or_try_init(|| self.call(DATABASE_API, "get_chain_id", json!([])))
            .await
            .cloned()
    }

    async fn get_asset(&self, symbol_or_id: &str) -> LookupResult<Asset> {
        if let Ok(id) = symbol_or_id.parse::<ObjectId>() {
            return self.get_object("asset", id).await;
        }
        let mut found: Vec<Option<Asset>> = self
            .call(DATABASE_API, "lookup_asset_symbols", json!([[symbol_or_id]]))
            .await?;
        found
            .pop()
            .flatten()
            .ok_or_else(|| LookupError::not_found("asset", symbol_or_id))
    }

    async fn get_assets(&self, ids: &[ObjectId]) -> LookupResult<Vec<Asset>> {
        self.get_objects(ids).await
    }

    async fn get_account(&self, name_or_id: &str) -> LookupResult<Account> {
        if let Ok(id) = name_or_id.parse::<ObjectId>() {
            return self.get_object("account", id).await;
        }
        let found: Option<Account> = self
            .call(DATABASE_API, "get_account_by_name", json!([name_or_id]))
            .await?;
        found.ok_or_else(|| LookupError::not_found("account", name_or_id))
    }

    async fn get_accounts_by_ids(&self, ids: &[ObjectId]) -> LookupResult<Vec<Account>> {
        self.get_objects(ids).await
    }

    async fn get_key_references(&self, key: &PublicKey) -> LookupResult<Vec<ObjectId>> {
        let refs: Vec<Vec<ObjectId>> = self
            .call(DATABASE_API, "get_key_references", json!([[key]]))
            .await?;
        // owner 与 active 引用同一把钥匙时节点会返回重复ID
        let mut ids: Vec<ObjectId> = Vec::new();
        for id in refs.into_iter().flatten() {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        Ok(ids)
    }

    async fn get_account_balances(
        &self,
        account: ObjectId,
        assets: &[ObjectId],
    ) -> LookupResult<Vec<AssetAmount>> {
        self.call(DATABASE_API, "get_account_balances", json!([account, assets]))
            .await
    }

    async fn get_account_history(
        &self,
        account: ObjectId,
        stop: ObjectId,
        limit: u32,
        start: ObjectId,
    ) -> LookupResult<Vec<OperationHistory>> {
        self.call(
            HISTORY_API,
            "get_account_history",
            json!([account, stop, limit, start]),
        )
        .await
    }

    async fn get_block(&self, height: u64) -> LookupResult<Block> {
        let block: Option<Block> = self.call(DATABASE_API, "get_block", json!([height])).await?;
        block.ok_or_else(|| LookupError::not_found("block", height))
    }

    async fn get_transaction_by_id(&self, tx_id: &str) -> LookupResult<SignedTransaction> {
        let tx: Option<SignedTransaction> = self
            .call(DATABASE_API, "get_transaction_by_txid", json!([tx_id]))
            .await?;
        tx.ok_or_else(|| LookupError::not_found("transaction", tx_id))
    }

    async fn get_dynamic_global_properties(&self) -> LookupResult<DynamicGlobalProperties> {
        self.call(DATABASE_API, "get_dynamic_global_properties", json!([]))
            .await
    }

    async fn get_required_fees(
        &self,
        operations: &[Operation],
        fee_asset: ObjectId,
    ) -> LookupResult<Vec<AssetAmount>> {
        let raw: Vec<Value> = self
            .call(DATABASE_API, "get_required_fees", json!([operations, fee_asset]))
            .await?;
        raw.into_iter().map(fee_from_value).collect()
    }

    async fn broadcast_transaction_synchronous(
        &self,
        tx: &SignedTransaction,
    ) -> LookupResult<BroadcastResult> {
        self.call(BROADCAST_API, "broadcast_transaction_synchronous", json!([tx]))
            .await
    }
}

/// 提案类操作的报价是 `[fee, [inner fees...]]`，只取外层
fn fee_from_value(value: Value) -> LookupResult<AssetAmount> {
    let value = match value {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        other => other,
    };
    serde_json::from_value(value).map_err(|e| LookupError::Malformed(format!("fee quote: {}", e)))
}

fn rpc_error_message(error: &Value) -> String {
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string())
}

static CLIENT: OnceCell<Arc<NodeClient>> = OnceCell::new();

/// 进程级单例
///
/// 首个调用者的配置生效；之后以不同配置调用仍返回同一个客户端。
pub fn global_client(config: &NodeConfig) -> anyhow::Result<Arc<NodeClient>> {
    let client = CLIENT.get_or_try_init(|| NodeClient::new(config).map(Arc::new))?;
    if client.url != config.url {
        warn!(
            configured = %config.url,
            active = %client.url,
            "node client already initialized with a different url"
        );
    }
    Ok(Arc::clone(client))
}

#[derive(Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    method: &'static str,
    params: Value,
    id: u64,
}

impl JsonRpcRequest {
    fn new(id: u64, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "call",
            params,
            id,
        }
    }
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_envelope() {
        let req = JsonRpcRequest::new(7, json!(["database", "get_block", [42]]));
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "call",
                "params": ["database", "get_block", [42]],
                "id": 7
            })
        );
    }

    #[test]
    fn test_fee_from_value_shapes() {
        let flat = fee_from_value(json!({"amount": 1210, "asset_id": "1.3.1"})).unwrap();
        assert_eq!(flat.amount, 1210);
        let nested = fee_from_value(json!([{"amount": "99", "asset_id": "1.3.1"}, []])).unwrap();
        assert_eq!(nested.amount, 99);
        assert!(fee_from_value(json!("x")).is_err());
    }

    #[test]
    fn test_rpc_error_message() {
        assert_eq!(
            rpc_error_message(&json!({"code": 1, "message": "missing required active authority"})),
            "missing required active authority"
        );
        assert_eq!(rpc_error_message(&json!("boom")), "\"boom\"");
    }

    #[tokio::test]
    async fn test_transport_failure_after_retries() {
        let client = NodeClient::new(&NodeConfig {
            url: "http://127.0.0.1:1/rpc".into(),
            timeout_ms: 200,
            retries: 1,
        })
        .unwrap();
        let err = client.get_dynamic_global_properties().await.unwrap_err();
        assert!(matches!(err, LookupError::Transport(_)));
    }
}
