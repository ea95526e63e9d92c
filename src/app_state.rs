use std::sync::Arc;

use crate::{
    config::ChainConfig,
    service::{node_api::NodeApi, ExchangeAdapter},
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    pub adapter: Arc<ExchangeAdapter<dyn NodeApi>>,
}

impl AppState {
    /// 创建新的应用状态；节点实现可替换（测试中使用内存 mock）
    pub fn new(chain: &ChainConfig, node: Arc<dyn NodeApi>) -> Self {
        let adapter = Arc::new(ExchangeAdapter::new(node, chain));
        Self { adapter }
    }
}
