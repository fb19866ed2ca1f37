//! 命令处理
//!
//! 每个命令持有它需要的 store 与外部服务（均通过 `Arc` 注入），返回给用户的回复文本。
//! 命令从不向调用方返回错误：外部服务失败时记录日志并给出固定的提示语。
//!
//! 外部调用（搜索、LLM）期间不持有任何 store 的锁，store 操作只包住内存变更和写盘。

pub mod chat;
pub mod clear;
pub mod search;

pub use chat::ChatCommand;
pub use clear::ClearCommand;
pub use search::SearchCommand;

/// 默认系统提示词
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant in a chat server. \
Answer concisely and format replies in Markdown.";

/// 触发限流时的回复
pub const RATE_LIMITED: &str = "Rate limit reached. Please try again later.";

/// 模型返回空内容时的回复
pub const NO_ANSWER: &str = "No answer";

/// 一次用户交互的来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandContext {
    pub user_id: String,
    /// 私信等场景下没有频道
    pub channel_id: Option<String>,
}

impl CommandContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            channel_id: None,
        }
    }

    pub fn in_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }

    /// 会话标识：优先频道 ID，否则用户 ID
    pub fn identity(&self) -> &str {
        self.channel_id.as_deref().unwrap_or(&self.user_id)
    }
}
