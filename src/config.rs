//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::service::transaction_builder::DEFAULT_EXPIRATION_SECS;

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 节点 RPC 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub url: String,
    pub timeout_ms: u64,
    /// 传输失败时的额外重试次数
    pub retries: usize,
}

/// 链参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// 主资产符号，用于默认余额查询和手续费
    pub core_asset: String,
    /// 新建交易的有效期（秒）
    pub expiration_secs: u64,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("GXC_NODE_URL")
                .unwrap_or_else(|_| "https://node1.gxb.io/rpc".into()),
            timeout_ms: env_parse("GXC_NODE_TIMEOUT_MS").unwrap_or(5000),
            retries: env_parse("GXC_NODE_RETRIES").unwrap_or(2),
        }
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            core_asset: std::env::var("GXC_CORE_ASSET").unwrap_or_else(|_| "GXC".into()),
            expiration_secs: env_parse("GXC_TX_EXPIRATION_SECS")
                .unwrap_or(DEFAULT_EXPIRATION_SECS),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8088".into()),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
        }
    }
}

impl Config {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            node: NodeConfig::default(),
            chain: ChainConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件中出现的段覆盖环境变量）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) if path.as_ref().exists() => Self::from_file(path),
            _ => Self::from_env(),
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        if !self.node.url.starts_with("http://") && !self.node.url.starts_with("https://") {
            anyhow::bail!("GXC_NODE_URL must start with http:// or https://");
        }
        if self.node.timeout_ms == 0 {
            anyhow::bail!("GXC_NODE_TIMEOUT_MS must be greater than 0");
        }

        if self.chain.core_asset.trim().is_empty() {
            anyhow::bail!("GXC_CORE_ASSET must not be empty");
        }
        if self.chain.expiration_secs == 0 {
            anyhow::bail!("GXC_TX_EXPIRATION_SECS must be greater than 0");
        }

        self.server
            .bind_addr
            .parse::<std::net::SocketAddr>()
            .with_context(|| format!("BIND_ADDR is not a socket address: {}", self.server.bind_addr))?;

        // 验证日志级别
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        // 验证日志格式
        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn sample() -> Config {
        Config {
            node: NodeConfig {
                url: "http://127.0.0.1:28090/rpc".into(),
                timeout_ms: 1000,
                retries: 1,
            },
            chain: ChainConfig {
                core_asset: "GXC".into(),
                expiration_secs: 600,
            },
            server: ServerConfig {
                bind_addr: "127.0.0.1:8088".into(),
            },
            logging: LoggingConfig {
                level: "debug".into(),
                format: "json".into(),
            },
        }
    }

    #[test]
    fn test_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[node]
url = "http://127.0.0.1:28090/rpc"
timeout_ms = 3000
retries = 4

[chain]
core_asset = "GXC"
expiration_secs = 120

[server]
bind_addr = "0.0.0.0:9090"

[logging]
level = "info"
format = "text"
"#
        )
        .unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.node.retries, 4);
        assert_eq!(config.chain.expiration_secs, 120);
        assert_eq!(config.server.bind_addr, "0.0.0.0:9090");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_env() {
        let config = Config::from_env_and_file(Some("/nonexistent/gxc-adapter.toml")).unwrap();
        assert!(!config.chain.core_asset.is_empty());
    }

    #[test]
    fn test_config_validation() {
        assert!(sample().validate().is_ok());

        let mut bad = sample();
        bad.node.url = "ws://127.0.0.1:28090".into();
        assert!(bad.validate().is_err());

        let mut bad = sample();
        bad.logging.format = "xml".into();
        assert!(bad.validate().is_err());

        let mut bad = sample();
        bad.server.bind_addr = "not-an-addr".into();
        assert!(bad.validate().is_err());
    }
}
