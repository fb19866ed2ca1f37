//! 网页搜索 + 模型总结
//!
//! 先查 [`SearchCache`]，未命中才调用搜索服务并写回缓存；
//! 然后把结果整理成要点交给模型，生成带来源的简短回答。

use crate::commands::{CommandContext, DEFAULT_SYSTEM_PROMPT, NO_ANSWER, RATE_LIMITED};
use crate::error::Result;
use crate::llm::LlmClient;
use crate::llm::types::Message;
use crate::memory::SearchCache;
use crate::rate_limit::RateLimiter;
use crate::search::{SearchDepth, SearchOptions, SearchProvider};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error};

pub const SEARCH_FAILED: &str = "Search failed. Please try again later.";

pub const DEFAULT_MAX_RESULTS: u32 = 3;
pub const MAX_RESULTS_LIMIT: u32 = 10;

/// 摘要超过这个字符数会被截断
const SNIPPET_CHARS: usize = 400;

const SEARCH_GUIDELINES: &str = "You can browse the web via provided results. \
Produce a short, source-grounded answer.

**Guidelines**
- Cite sources by listing URLs at the end as bullets.
- If info conflicts, note the disagreement briefly.
- If results are weak, say so and suggest better query terms.";

pub struct SearchCommand {
    provider: Arc<dyn SearchProvider>,
    llm: Arc<dyn LlmClient>,
    cache: Arc<SearchCache>,
    limiter: Arc<dyn RateLimiter>,
    system_prompt: String,
}

impl SearchCommand {
    pub fn new(
        provider: Arc<dyn SearchProvider>,
        llm: Arc<dyn LlmClient>,
        cache: Arc<SearchCache>,
        limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            provider,
            llm,
            cache,
            limiter,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// `max` 缺省为 3，超出 1..=10 的值被截断到边界
    pub async fn execute(&self, ctx: &CommandContext, query: &str, max: Option<u32>) -> String {
        let max = max
            .unwrap_or(DEFAULT_MAX_RESULTS)
            .clamp(1, MAX_RESULTS_LIMIT);
        if !self.limiter.allowed(&ctx.user_id) {
            return RATE_LIMITED.to_string();
        }
        match self.answer(query, max).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(user_id = %ctx.user_id, query = %query, "搜索失败: {e}");
                SEARCH_FAILED.to_string()
            }
        }
    }

    async fn answer(&self, query: &str, max: u32) -> Result<String> {
        let search = match self.cache.get(query).await {
            Some(hit) if !hit.is_null() => hit,
            _ => {
                let options = SearchOptions {
                    max_results: max,
                    depth: SearchDepth::Basic,
                };
                let fresh = self.provider.search(query, &options).await?;
                self.cache.set(query, fresh.clone()).await;
                fresh
            }
        };

        let bullets = format_results(&search, max as usize);
        debug!(query = %query, lines = bullets.len(), "整理搜索结果");
        let messages = vec![
            Message::system(self.system_prompt.clone()),
            Message::system(SEARCH_GUIDELINES),
            Message::user(format!(
                "Query: {query}\n\nResults:\n{}",
                bullets.join("\n")
            )),
        ];

        let answer = self.llm.chat_simple(messages).await?;
        if answer.trim().is_empty() {
            return Ok(NO_ANSWER.to_string());
        }
        Ok(answer)
    }
}

/// 把搜索响应中的 `results` 数组整理成 Markdown 要点
fn format_results(search: &Value, max: usize) -> Vec<String> {
    let Some(results) = search.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };
    let mut lines = Vec::new();
    for result in results.iter().take(max) {
        let title = result
            .get("title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled");
        lines.push(format!("- Title: {title}"));
        if let Some(url) = result.get("url").and_then(Value::as_str).filter(|u| !u.is_empty()) {
            lines.push(format!("  - URL: {url}"));
        }
        if let Some(content) = result
            .get("content")
            .and_then(Value::as_str)
            .filter(|c| !c.is_empty())
        {
            lines.push(format!("  - Snippet: {}", truncate_snippet(content)));
        }
    }
    lines
}

fn truncate_snippet(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(SNIPPET_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
