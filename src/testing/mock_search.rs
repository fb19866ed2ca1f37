//! Mock 搜索服务与限流器

use crate::error::{BotError, Result, SearchError};
use crate::rate_limit::RateLimiter;
use crate::search::{SearchOptions, SearchProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

enum MockSearchResponse {
    Results(Value),
    Err(BotError),
}

/// 可脚本化的 Mock 搜索服务，按顺序返回预设结果
pub struct MockSearchProvider {
    responses: Arc<Mutex<VecDeque<MockSearchResponse>>>,
    /// 每次调用的 (query, options)
    calls: Arc<Mutex<Vec<(String, SearchOptions)>>>,
}

impl Default for MockSearchProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_results(self, results: Value) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockSearchResponse::Results(results));
        self
    }

    pub fn with_error(self, err: BotError) -> Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(MockSearchResponse::Err(err));
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(String, SearchOptions)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(&self, query: &str, options: &SearchOptions) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), options.clone()));

        match self.responses.lock().unwrap().pop_front() {
            Some(MockSearchResponse::Results(v)) => Ok(v),
            Some(MockSearchResponse::Err(e)) => Err(e),
            None => Err(BotError::Search(SearchError::ProviderError {
                status: 500,
                message: "no scripted response".to_string(),
            })),
        }
    }
}

/// 按标识放行/拒绝的 Mock 限流器，默认全部放行
#[derive(Default)]
pub struct MockRateLimiter {
    denied: Mutex<HashSet<String>>,
    checks: Mutex<Vec<String>>,
}

impl MockRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// 拒绝指定标识的所有请求
    pub fn deny(self, identity: impl Into<String>) -> Self {
        self.denied.lock().unwrap().insert(identity.into());
        self
    }

    /// 被检查过的标识，按调用顺序
    pub fn checks(&self) -> Vec<String> {
        self.checks.lock().unwrap().clone()
    }
}

impl RateLimiter for MockRateLimiter {
    fn allowed(&self, identity: &str) -> bool {
        self.checks.lock().unwrap().push(identity.to_string());
        !self.denied.lock().unwrap().contains(identity)
    }
}
