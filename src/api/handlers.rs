//! HTTP 处理函数
//!
//! 地址即账户名；交易 JSON 以原始请求体传入，不做二次包装。

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Extension,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::{
        middleware::TraceId,
        response::{success_response, ApiResult},
    },
    app_state::AppState,
    domain::{keys, AssetBalance, LedgerEntry, SignedTransaction},
    error::{AdapterError, AppError},
    metrics,
    service::{HistoryPage, TransferRequest},
};

/// 记录端点成功/失败计数，并把库层错误转换为带 trace_id 的 HTTP 错误
fn track<T: Serialize>(
    endpoint: &'static str,
    trace_id: &TraceId,
    result: Result<T, AdapterError>,
) -> ApiResult<T> {
    match result {
        Ok(data) => {
            metrics::count_ok(endpoint);
            success_response(data)
        }
        Err(e) => {
            metrics::count_err(endpoint);
            tracing::debug!(endpoint, trace_id = %trace_id.0, error = %e, "request failed");
            Err(AppError::from(e).with_trace_id(trace_id.0.clone()))
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 健康检查
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Serialize)]
pub struct Healthz {
    pub status: &'static str,
    pub node_ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<String>,
}

pub async fn healthz(State(st): State<Arc<AppState>>) -> ApiResult<Healthz> {
    let chain_id = st.adapter.chain_id().await.ok();
    let node_ok = chain_id.is_some();
    success_response(Healthz {
        status: if node_ok { "ok" } else { "degraded" },
        node_ok,
        chain_id,
    })
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 密钥与地址
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Deserialize)]
pub struct PrivateHexBody {
    pub private_hex: String,
}

#[derive(Debug, Deserialize)]
pub struct WifBody {
    pub wif: String,
}

#[derive(Debug, Deserialize)]
pub struct PublicHexBody {
    pub public_hex: String,
}

#[derive(Debug, Deserialize)]
pub struct AddressBody {
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct KeyConversion {
    pub value: String,
}

pub async fn private_hex_to_wif(
    Extension(trace_id): Extension<TraceId>,
    axum::Json(body): axum::Json<PrivateHexBody>,
) -> ApiResult<KeyConversion> {
    track(
        "POST /api/v1/keys/wif",
        &trace_id,
        keys::private_hex_to_wif(&body.private_hex).map(|value| KeyConversion { value }),
    )
}

pub async fn wif_to_private_hex(
    Extension(trace_id): Extension<TraceId>,
    axum::Json(body): axum::Json<WifBody>,
) -> ApiResult<KeyConversion> {
    track(
        "POST /api/v1/keys/private",
        &trace_id,
        keys::wif_to_private_hex(&body.wif).map(|value| KeyConversion { value }),
    )
}

/// 私钥推导地址，不回显私钥
pub async fn derive_address(
    Extension(trace_id): Extension<TraceId>,
    axum::Json(body): axum::Json<PrivateHexBody>,
) -> ApiResult<KeyConversion> {
    track(
        "POST /api/v1/keys/derive",
        &trace_id,
        keys::public_key_from_private(&body.private_hex).map(|key| KeyConversion {
            value: key.to_address(),
        }),
    )
}

pub async fn public_hex_to_address(
    Extension(trace_id): Extension<TraceId>,
    axum::Json(body): axum::Json<PublicHexBody>,
) -> ApiResult<KeyConversion> {
    track(
        "POST /api/v1/keys/address",
        &trace_id,
        keys::public_hex_to_address(&body.public_hex).map(|value| KeyConversion { value }),
    )
}

pub async fn address_to_public_hex(
    Extension(trace_id): Extension<TraceId>,
    axum::Json(body): axum::Json<AddressBody>,
) -> ApiResult<KeyConversion> {
    track(
        "POST /api/v1/keys/public",
        &trace_id,
        keys::address_to_public_hex(&body.address).map(|value| KeyConversion { value }),
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 账户
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn key_account_ids(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(public_key): Path<String>,
) -> ApiResult<Vec<String>> {
    track(
        "GET /api/v1/keys/:public_key/accounts",
        &trace_id,
        st.adapter.account_ids_for_public_key(&public_key).await,
    )
}

pub async fn key_account_names(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(public_key): Path<String>,
) -> ApiResult<Vec<String>> {
    track(
        "GET /api/v1/keys/:public_key/names",
        &trace_id,
        st.adapter.account_names_for_public_key(&public_key).await,
    )
}

pub async fn account_name(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(account_id): Path<String>,
) -> ApiResult<String> {
    track(
        "GET /api/v1/accounts/:account/name",
        &trace_id,
        st.adapter.account_name(&account_id).await,
    )
}

#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// 资产符号或ID，默认主资产
    pub symbol: Option<String>,
}

pub async fn account_balance(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(account): Path<String>,
    Query(q): Query<BalanceQuery>,
) -> ApiResult<AssetBalance> {
    track(
        "GET /api/v1/accounts/:account/balance",
        &trace_id,
        st.adapter.balance(&account, q.symbol.as_deref()).await,
    )
}

pub async fn account_balances(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(account): Path<String>,
) -> ApiResult<Vec<AssetBalance>> {
    track(
        "GET /api/v1/accounts/:account/balances",
        &trace_id,
        st.adapter.balances(&account).await,
    )
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// 上一页返回的 next_cursor；为空时从最新开始
    pub cursor: Option<String>,
    pub limit: Option<u32>,
}

pub async fn account_history(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(account): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> ApiResult<HistoryPage> {
    track(
        "GET /api/v1/accounts/:account/history",
        &trace_id,
        st.adapter
            .account_history(&account, q.cursor.as_deref(), q.limit.unwrap_or(20))
            .await,
    )
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// 区块与交易
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn chain_id(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
) -> ApiResult<String> {
    track("GET /api/v1/chain/id", &trace_id, st.adapter.chain_id().await)
}

pub async fn block_count(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
) -> ApiResult<u64> {
    track(
        "GET /api/v1/blocks/count",
        &trace_id,
        st.adapter.block_count().await,
    )
}

pub async fn block_transactions(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(height): Path<u64>,
) -> ApiResult<Vec<LedgerEntry>> {
    track(
        "GET /api/v1/blocks/:height/transactions",
        &trace_id,
        st.adapter.block_transactions(height).await,
    )
}

pub async fn block_transaction_at(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path((height, index)): Path<(u64, usize)>,
) -> ApiResult<Vec<LedgerEntry>> {
    track(
        "GET /api/v1/blocks/:height/transactions/:index",
        &trace_id,
        st.adapter.transaction_at(height, index).await,
    )
}

pub async fn transaction(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(tx_hash): Path<String>,
) -> ApiResult<Vec<LedgerEntry>> {
    track(
        "GET /api/v1/transactions/:tx_hash",
        &trace_id,
        st.adapter.transaction(&tx_hash).await,
    )
}

pub async fn token_detail(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    Path(token): Path<String>,
) -> ApiResult<AssetBalance> {
    track(
        "GET /api/v1/tokens/:token",
        &trace_id,
        st.adapter.token_detail(&token).await,
    )
}

pub async fn build_transfer(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    axum::Json(request): axum::Json<TransferRequest>,
) -> ApiResult<SignedTransaction> {
    track(
        "POST /api/v1/transactions/build",
        &trace_id,
        st.adapter.build_transfer(&request).await,
    )
}

pub async fn transaction_fee(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    raw_json: String,
) -> ApiResult<SignedTransaction> {
    track(
        "POST /api/v1/transactions/fee",
        &trace_id,
        st.adapter.transaction_fee(&raw_json).await,
    )
}

#[derive(Debug, Deserialize)]
pub struct SignBody {
    pub private_hex: String,
    pub transaction: SignedTransaction,
}

pub async fn sign(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    axum::Json(body): axum::Json<SignBody>,
) -> ApiResult<SignedTransaction> {
    track(
        "POST /api/v1/transactions/sign",
        &trace_id,
        st.adapter.sign(&body.private_hex, body.transaction).await,
    )
}

pub async fn broadcast(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    raw_json: String,
) -> ApiResult<LedgerEntry> {
    track(
        "POST /api/v1/transactions/broadcast",
        &trace_id,
        st.adapter.broadcast(&raw_json).await,
    )
}

pub async fn deserialize(
    State(st): State<Arc<AppState>>,
    Extension(trace_id): Extension<TraceId>,
    raw_json: String,
) -> ApiResult<Vec<LedgerEntry>> {
    track(
        "POST /api/v1/transactions/deserialize",
        &trace_id,
        st.adapter.deserialize(&raw_json).await,
    )
}
