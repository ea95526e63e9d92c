//! gxc-adapter 主入口
//! GXChain 交易所适配服务

use std::sync::Arc;

use anyhow::{Context, Result};
use gxc_adapter::{
    api,
    app_state::AppState,
    config::Config,
    infrastructure::{global_client, logging::init_logging},
    service::node_api::NodeApi,
};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    // 2. 加载配置（CONFIG_PATH 指向的 TOML 文件优先）
    let config_path = std::env::var("CONFIG_PATH").ok();
    let config = Config::from_env_and_file(config_path.as_deref())?;
    config.validate().context("invalid configuration")?;

    // 3. 初始化日志
    init_logging(&config.logging)?;
    tracing::info!(node = %config.node.url, core_asset = %config.chain.core_asset, "starting gxc-adapter");

    // 4. 节点客户端（进程级单例）
    let node: Arc<dyn NodeApi> = global_client(&config.node)?;
    match node.get_chain_id().await {
        Ok(chain_id) => tracing::info!(%chain_id, "node reachable"),
        Err(e) => tracing::warn!(error = %e, "node not reachable at startup, continuing"),
    }

    // 5. 构建路由并启动服务器
    let state = Arc::new(AppState::new(&config.chain, node));
    let app = api::routes(state);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind_addr))?;
    tracing::info!("server listening on http://{}", config.server.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
