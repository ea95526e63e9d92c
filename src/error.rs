//! 错误定义
//!
//! - `AdapterError`：编解码与交易标准化的错误分类（库层）
//! - `AppError`：HTTP 层统一错误响应 `{ code, message, trace_id }`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::service::node_api::LookupError;

/// 适配器核心错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    /// Base58 / hex / JSON 片段格式错误
    #[error("decode error: {0}")]
    DecodeError(String),

    /// 私钥或地址的校验和不一致
    #[error("checksum mismatch")]
    ChecksumMismatch,

    /// 地址前缀不属于本链
    #[error("address prefix mismatch, expected {expected}")]
    PrefixMismatch { expected: &'static str },

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// memo 密文格式错误（奇数长度或非 hex）
    #[error("invalid memo ciphertext: {0}")]
    InvalidCiphertext(String),

    /// 外部资产/账户查询失败或结果为空
    #[error("lookup failure: {0}")]
    LookupFailure(#[from] LookupError),

    /// 需要 transfer 的位置出现了其它操作类型
    #[error("unsupported operation type {0}")]
    UnsupportedOperation(u16),

    /// 外部 memo 加解密能力返回的错误
    #[error("memo cipher error: {0}")]
    MemoCipher(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("signing failed: {0}")]
    SigningFailed(String),
}

pub type Result<T, E = AdapterError> = std::result::Result<T, E>;

impl From<serde_json::Error> for AdapterError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidTransaction(err.to_string())
    }
}

impl From<hex::FromHexError> for AdapterError {
    fn from(err: hex::FromHexError) -> Self {
        Self::DecodeError(format!("hex: {}", err))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HTTP 错误响应
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub enum AppErrorCode {
    BadRequest,
    NotFound,
    Internal,

    // 业务错误码
    InvalidAddress,
    InvalidKey,
    ChecksumMismatch,
    InvalidAmount,
    InvalidTransaction,
    UnsupportedOperation,
    RpcError,
    DecryptionFailed,
}

#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    pub trace_id: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    trace_id: Option<&'a str>,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::NotFound => "not_found",
            AppErrorCode::Internal => "internal",
            AppErrorCode::InvalidAddress => "invalid_address",
            AppErrorCode::InvalidKey => "invalid_key",
            AppErrorCode::ChecksumMismatch => "checksum_mismatch",
            AppErrorCode::InvalidAmount => "invalid_amount",
            AppErrorCode::InvalidTransaction => "invalid_transaction",
            AppErrorCode::UnsupportedOperation => "unsupported_operation",
            AppErrorCode::RpcError => "rpc_error",
            AppErrorCode::DecryptionFailed => "decryption_failed",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: self.code.as_str(),
            message: &self.message,
            trace_id: self.trace_id.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    fn new(code: AppErrorCode, status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            message: msg.into(),
            status,
            trace_id: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::BadRequest, StatusCode::BAD_REQUEST, msg)
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::NotFound, StatusCode::NOT_FOUND, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::Internal, StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn rpc_error(msg: impl Into<String>) -> Self {
        Self::new(AppErrorCode::RpcError, StatusCode::BAD_GATEWAY, msg)
    }

    /// 设置追踪ID
    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

impl From<AdapterError> for AppError {
    fn from(err: AdapterError) -> Self {
        let message = err.to_string();
        match err {
            AdapterError::DecodeError(_) => Self::bad_request(message),
            AdapterError::ChecksumMismatch => Self::new(
                AppErrorCode::ChecksumMismatch,
                StatusCode::BAD_REQUEST,
                message,
            ),
            AdapterError::PrefixMismatch { .. } | AdapterError::InvalidAddress(_) => Self::new(
                AppErrorCode::InvalidAddress,
                StatusCode::BAD_REQUEST,
                message,
            ),
            AdapterError::InvalidPublicKey(_) | AdapterError::InvalidPrivateKey(_) => {
                Self::new(AppErrorCode::InvalidKey, StatusCode::BAD_REQUEST, message)
            }
            AdapterError::InvalidCiphertext(_) | AdapterError::MemoCipher(_) => Self::new(
                AppErrorCode::DecryptionFailed,
                StatusCode::BAD_REQUEST,
                message,
            ),
            AdapterError::InvalidAmount(_) => Self::new(
                AppErrorCode::InvalidAmount,
                StatusCode::BAD_REQUEST,
                message,
            ),
            AdapterError::InvalidTransaction(_) => Self::new(
                AppErrorCode::InvalidTransaction,
                StatusCode::BAD_REQUEST,
                message,
            ),
            AdapterError::UnsupportedOperation(_) => Self::new(
                AppErrorCode::UnsupportedOperation,
                StatusCode::BAD_REQUEST,
                message,
            ),
            AdapterError::LookupFailure(ref lookup) if lookup.is_not_found() => {
                Self::not_found(message)
            }
            AdapterError::LookupFailure(_) => Self::rpc_error(message),
            AdapterError::SigningFailed(_) => Self::internal(message),
        }
    }
}

// 从 anyhow 错误转换
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{}", err))
    }
}
