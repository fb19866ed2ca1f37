//! 存储配置
//!
//! 可选的 YAML 配置文件，字段全部有默认值：
//! ```yaml
//! data_dir: ~/.parley/data
//! conversations_file: conversations.json
//! search_cache_file: search_cache.json
//! search_cache_ttl_secs: 86400
//! ```
//! 环境变量 `SEARCH_CACHE_TTL_SECONDS`（可写在 `.env` 中）覆盖 TTL；`<= 0` 表示永不过期。

use crate::error::{ConfigError, Result};
use crate::memory::DEFAULT_TTL_SECS;
use crate::memory::persist::expand_tilde;
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const TTL_ENV: &str = "SEARCH_CACHE_TTL_SECONDS";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub conversations_file: String,
    pub search_cache_file: String,
    pub search_cache_ttl_secs: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            conversations_file: "conversations.json".to_string(),
            search_cache_file: "search_cache.json".to_string(),
            search_cache_ttl_secs: DEFAULT_TTL_SECS,
        }
    }
}

impl StoreConfig {
    /// 读取 YAML 配置文件
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let config: StoreConfig = serde_yaml::from_reader(file)?;
        Ok(config)
    }

    /// 默认配置 + 环境变量
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// 用 `.env` / 进程环境中的 TTL 覆盖当前值
    pub fn with_env_overrides(mut self) -> Result<Self> {
        dotenv().ok();
        if let Ok(raw) = std::env::var(TTL_ENV) {
            self.search_cache_ttl_secs = parse_ttl(&raw)?;
        }
        Ok(self)
    }

    pub fn conversations_path(&self) -> PathBuf {
        expand_tilde(&self.data_dir).join(&self.conversations_file)
    }

    pub fn search_cache_path(&self) -> PathBuf {
        expand_tilde(&self.data_dir).join(&self.search_cache_file)
    }
}

fn parse_ttl(raw: &str) -> Result<i64> {
    raw.trim().parse::<i64>().map_err(|e| {
        ConfigError::InvalidValue {
            field: TTL_ENV.to_string(),
            message: format!("{raw:?}: {e}"),
        }
        .into()
    })
}
