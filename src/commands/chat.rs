//! 多轮对话
//!
//! 每次请求带上该会话已保存的记录，成功后把本轮问答追加进 [`ConversationStore`]。
//! 记录长度与落盘频率都由这里决定，store 本身不做限制。

use crate::commands::{CommandContext, DEFAULT_SYSTEM_PROMPT, NO_ANSWER, RATE_LIMITED};
use crate::llm::LlmClient;
use crate::llm::types::Message;
use crate::memory::ConversationStore;
use crate::rate_limit::RateLimiter;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, error, warn};

pub const CHAT_FAILED: &str = "Chat failed. Please try again later.";

pub struct ChatCommand {
    history: Arc<ConversationStore>,
    llm: Arc<dyn LlmClient>,
    limiter: Arc<dyn RateLimiter>,
    system_prompt: String,
    /// 每个会话最多保留的消息条数（不含 system）
    max_turns: usize,
    /// 每完成多少轮问答落盘一次
    save_every: usize,
    unsaved: AtomicUsize,
}

impl ChatCommand {
    pub fn new(
        history: Arc<ConversationStore>,
        llm: Arc<dyn LlmClient>,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            history,
            llm,
            limiter,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_turns: 20,
            save_every: 1,
            unsaved: AtomicUsize::new(0),
        }
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// 传入 0 按 1 处理
    pub fn save_every(mut self, exchanges: usize) -> Self {
        self.save_every = exchanges.max(1);
        self
    }

    pub async fn execute(&self, ctx: &CommandContext, prompt: &str) -> String {
        if !self.limiter.allowed(&ctx.user_id) {
            return RATE_LIMITED.to_string();
        }
        let identity = ctx.identity();

        let mut messages = vec![Message::system(self.system_prompt.clone())];
        messages.extend(self.history.get(identity).await.unwrap_or_default());
        let question = Message::user(prompt);
        messages.push(question.clone());

        let reply = match self.llm.chat_simple(messages).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(identity = %identity, "对话请求失败: {e}");
                return CHAT_FAILED.to_string();
            }
        };
        if reply.trim().is_empty() {
            return NO_ANSWER.to_string();
        }

        self.history
            .extend(identity, vec![question, Message::assistant(reply.clone())])
            .await;
        let trimmed = self.history.retain_last(identity, self.max_turns).await;
        debug!(identity = %identity, trimmed, "💬 记录本轮对话");

        if self.record_exchange()
            && let Err(e) = self.history.save().await
        {
            warn!(identity = %identity, "会话落盘失败: {e}");
        }
        reply
    }

    /// 计数一轮问答；达到 `save_every` 时在同一次原子更新中清零并返回 `true`
    fn record_exchange(&self) -> bool {
        let save_every = self.save_every;
        let previous = self
            .unsaved
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(if n + 1 >= save_every { 0 } else { n + 1 })
            })
            .unwrap_or_default();
        previous + 1 >= save_every
    }
}
