use crate::commands::CommandContext;
use crate::memory::ConversationStore;
use std::sync::Arc;
use tracing::{info, warn};

pub const CLEARED: &str = "New chat started. Previous context cleared.";
pub const NOTHING_TO_CLEAR: &str = "New chat started.";

/// 清空当前会话的上下文，开始新对话
pub struct ClearCommand {
    history: Arc<ConversationStore>,
}

impl ClearCommand {
    pub fn new(history: Arc<ConversationStore>) -> Self {
        Self { history }
    }

    pub async fn execute(&self, ctx: &CommandContext) -> String {
        let identity = ctx.identity();
        let existed = self.history.delete(identity).await;
        if let Err(e) = self.history.save().await {
            warn!(identity = %identity, "清空会话后落盘失败: {e}");
        }
        info!(identity = %identity, existed, "🆕 新会话");
        let reply = if existed { CLEARED } else { NOTHING_TO_CLEAR };
        reply.to_string()
    }
}
