//! Trace ID 中间件
//! 每个请求带一个 trace_id：优先取请求头，没有则生成；写回响应头，错误响应体中同样携带

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

pub const TRACE_ID_HEADER: &str = "X-Trace-Id";

/// 请求扩展中的 trace_id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceId(pub String);

impl TraceId {
    /// 从请求头中提取，缺失或为空时生成新的
    pub fn get_or_generate(req: &Request) -> Self {
        let from_header = req
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match from_header {
            Some(trace_id) => Self(trace_id.to_string()),
            None => Self(Uuid::new_v4().to_string()),
        }
    }
}

pub async fn trace_id_middleware(mut req: Request, next: Next) -> Response {
    let trace_id = TraceId::get_or_generate(&req);
    req.extensions_mut().insert(trace_id.clone());

    let mut response = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&trace_id.0) {
        response.headers_mut().insert(TRACE_ID_HEADER, value);
    }
    response
}
