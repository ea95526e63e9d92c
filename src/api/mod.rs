use std::sync::Arc;

use axum::{
    http::{header::CONTENT_TYPE, HeaderName, Method},
    middleware::from_fn,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    api::handlers::{
        account_balance, account_balances, account_history, account_name, address_to_public_hex,
        block_count, block_transaction_at, block_transactions, broadcast, build_transfer,
        chain_id, derive_address, deserialize, healthz, key_account_ids, key_account_names,
        private_hex_to_wif, public_hex_to_address, sign, token_detail, transaction,
        transaction_fee, wif_to_private_hex,
    },
    api::middleware::trace_id_middleware,
    app_state::AppState,
};

pub mod handlers;
pub mod middleware;
pub mod response; // 统一响应格式

pub fn routes(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static("x-trace-id")])
        .expose_headers([HeaderName::from_static("x-trace-id")]);

    let v1 = Router::new()
        // 密钥与地址转换（纯计算，不访问节点）
        .route("/keys/wif", post(private_hex_to_wif))
        .route("/keys/private", post(wif_to_private_hex))
        .route("/keys/derive", post(derive_address))
        .route("/keys/address", post(public_hex_to_address))
        .route("/keys/public", post(address_to_public_hex))
        .route("/keys/:public_key/accounts", get(key_account_ids))
        .route("/keys/:public_key/names", get(key_account_names))
        // 账户
        .route("/accounts/:account/name", get(account_name))
        .route("/accounts/:account/balance", get(account_balance))
        .route("/accounts/:account/balances", get(account_balances))
        .route("/accounts/:account/history", get(account_history))
        // 区块与交易
        .route("/chain/id", get(chain_id))
        .route("/blocks/count", get(block_count))
        .route("/blocks/:height/transactions", get(block_transactions))
        .route(
            "/blocks/:height/transactions/:index",
            get(block_transaction_at),
        )
        .route("/transactions/build", post(build_transfer))
        .route("/transactions/fee", post(transaction_fee))
        .route("/transactions/sign", post(sign))
        .route("/transactions/broadcast", post(broadcast))
        .route("/transactions/deserialize", post(deserialize))
        .route("/transactions/:tx_hash", get(transaction))
        .route("/tokens/:token", get(token_detail));

    Router::new()
        .nest("/api/v1", v1)
        .route("/healthz", get(healthz))
        .route(
            "/metrics",
            get(|| async { crate::metrics::render_prometheus().into_response() }),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(from_fn(trace_id_middleware)),
        )
        .with_state(state)
}
