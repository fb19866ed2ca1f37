//! Chat Completions 调用接口
//!
//! HTTP 客户端、超时与重试由实现方负责，本 crate 只依赖这个 trait。

pub mod types;

use crate::error::Result;
use crate::llm::types::Message;
use async_trait::async_trait;

/// 轻量 LLM 调用接口
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 发起一次无工具对话，返回模型的文本内容
    async fn chat_simple(&self, messages: Vec<Message>) -> Result<String>;
}
