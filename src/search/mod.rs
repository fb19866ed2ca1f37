//! 网页搜索服务接口
//!
//! 具体的 HTTP 客户端（Tavily 等）由外部实现，返回的 JSON 原样交给缓存和命令层。
//! 命令层只读取其中的 `results[].title / url / content` 字段。

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 搜索深度
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    #[default]
    Basic,
    Advanced,
}

/// 单次搜索参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub max_results: u32,
    pub depth: SearchDepth,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            max_results: 3,
            depth: SearchDepth::Basic,
        }
    }
}

/// 搜索服务
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// 执行搜索，返回服务端原始响应
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Value>;
}
