//! 测试基础设施
//!
//! 不依赖真实 LLM / 搜索服务 / 系统时间即可测试各命令与存储。
//!
//! | 类型 | 用途 |
//! |------|------|
//! | [`MockLlmClient`] | 替代真实 Chat Completions 客户端 |
//! | [`MockSearchProvider`] | 替代真实搜索服务 |
//! | [`MockRateLimiter`] | 按标识放行或拒绝 |
//! | [`ManualClock`] | 手动推进时间，测试缓存过期 |
//!
//! 所有 Mock 都记录调用情况（`call_count()` / `calls()` 等），内部用 `Mutex` 保护，
//! 可以在多任务测试中共享。

mod clock;
mod mock_llm;
mod mock_search;

pub use clock::ManualClock;
pub use mock_llm::MockLlmClient;
pub use mock_search::{MockRateLimiter, MockSearchProvider};
