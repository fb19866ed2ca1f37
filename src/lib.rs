pub mod commands;
pub mod config;
pub mod error;
pub mod llm;
pub mod memory;
pub mod rate_limit;
pub mod search;
pub mod testing;

pub mod prelude {
    pub use crate::commands::{ChatCommand, ClearCommand, CommandContext, SearchCommand};
    pub use crate::config::StoreConfig;
    pub use crate::error::Result;
    pub use crate::llm::LlmClient;
    pub use crate::llm::types::Message;
    pub use crate::memory::{ConversationStore, SearchCache};
    pub use crate::rate_limit::RateLimiter;
    pub use crate::search::{SearchOptions, SearchProvider};
}
