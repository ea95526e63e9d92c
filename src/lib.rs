//! gxc-adapter - GXChain 交易所适配层
//!
//! 地址/密钥编解码、交易标准化、账户历史分页、转账构建与广播

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod metrics;
pub mod service;
pub mod utils;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AdapterError, AppError, AppErrorCode};

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        config::{ChainConfig, Config},
        domain::{LedgerEntry, ObjectId, PrivateKey, PublicKey, SignedTransaction},
        error::{AdapterError, AppError, AppErrorCode},
        service::{ExchangeAdapter, LookupError, NodeApi, TransferRequest},
    };
}
