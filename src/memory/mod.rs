//! 持久化存储层
//!
//! | 组件 | 作用 | 落盘时机 |
//! |------|------|----------|
//! | [`JsonFile`] | 整体读写一个 JSON 对象文件 | 由持有者决定 |
//! | [`normalize_query`] | 查询文本 → 缓存 key | - |
//! | [`SearchCache`] | 带 TTL 的搜索结果缓存 | 每次写入 / 淘汰后立即落盘 |
//! | [`ConversationStore`] | 按会话标识保存对话记录 | 调用方显式 `save()` |
//!
//! 两个 store 都在进程启动时创建一次，通过 `Arc` 注入到各个命令中。
//! 读盘或解析失败一律从空状态开始，写盘失败只记录日志，内存状态始终是当前进程的准绳。
//!
//! ```rust,no_run
//! use parley::memory::{ConversationStore, SearchCache};
//! use parley::llm::types::Message;
//! use std::sync::Arc;
//!
//! # async fn example() -> parley::error::Result<()> {
//! let history: Arc<ConversationStore> = Arc::new(ConversationStore::open("data/conversations.json"));
//! history.append("channel-1", Message::user("你好")).await;
//! history.save().await?;
//!
//! let cache = Arc::new(SearchCache::open("data/search_cache.json", 86_400));
//! cache.set("Weather Today", serde_json::json!({"results": []})).await;
//! assert!(cache.get("weather today").await.is_some());
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod conversation;
pub mod normalize;
pub mod persist;
pub mod search_cache;

pub use clock::{Clock, SystemClock};
pub use conversation::ConversationStore;
pub use normalize::{normalize_optional_query, normalize_query};
pub use persist::JsonFile;
pub use search_cache::{DEFAULT_TTL_SECS, SearchCache, SearchCacheEntry};
