//! 搜索结果缓存
//!
//! 以规整后的查询为 key，缓存搜索服务返回的原始 JSON（不解析、不改写）。
//! 过期只在读取时惰性检查：读到过期条目按未命中处理，同时从内存删除并落盘。
//! 没有后台清理任务，需要时由调用方显式调用 [`SearchCache::purge_expired`]。
//!
//! 落盘格式：
//! ```json
//! {
//!   "weather today": { "timestamp": 1718000000000, "data": { "results": [...] } }
//! }
//! ```

use crate::memory::clock::{Clock, SystemClock};
use crate::memory::normalize::normalize_query;
use crate::memory::persist::JsonFile;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 未配置时的默认 TTL（秒）
pub const DEFAULT_TTL_SECS: i64 = 86_400;

/// 单条缓存
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCacheEntry {
    /// 写入时间（Unix 毫秒）
    #[serde(default)]
    pub timestamp: u64,
    /// 搜索服务的原始响应
    #[serde(default)]
    pub data: Value,
}

/// 带 TTL 的持久化搜索缓存
pub struct SearchCache {
    file: JsonFile,
    /// `None` 表示永不过期
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, SearchCacheEntry>>,
}

impl SearchCache {
    /// 打开缓存文件；`ttl_secs <= 0` 表示永不过期
    pub fn open(path: impl AsRef<Path>, ttl_secs: i64) -> Self {
        let file = JsonFile::new(path);
        let snapshot = file.load();
        Self::from_persistable(file, snapshot, ttl_secs)
    }

    /// 从落盘格式重建缓存，无法识别的条目被跳过
    pub fn from_persistable(file: JsonFile, snapshot: Map<String, Value>, ttl_secs: i64) -> Self {
        let mut entries = HashMap::with_capacity(snapshot.len());
        for (key, value) in snapshot {
            if !value.is_object() {
                warn!(key = %key, "跳过格式错误的缓存条目");
                continue;
            }
            match serde_json::from_value::<SearchCacheEntry>(value) {
                Ok(entry) => {
                    entries.insert(key, entry);
                }
                Err(e) => warn!(key = %key, "跳过格式错误的缓存条目: {e}"),
            }
        }
        let ttl = ttl_from_secs(ttl_secs);
        info!(
            path = %file.path().display(),
            entries = entries.len(),
            ttl_secs = ttl.map(|t| t.as_secs()),
            "🔎 SearchCache 初始化"
        );
        Self {
            file,
            ttl,
            clock: Arc::new(SystemClock),
            entries: RwLock::new(entries),
        }
    }

    /// 替换时间源
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    /// 查询缓存；未命中或已过期返回 `None`
    pub async fn get(&self, raw_query: &str) -> Option<Value> {
        let key = normalize_query(raw_query);
        let mut entries = self.entries.write().await;
        let entry = entries.get(&key)?;
        if self.is_expired(entry) {
            entries.remove(&key);
            debug!(key = %key, "⌛ 缓存过期，已淘汰");
            self.persist(&entries).await;
            return None;
        }
        debug!(key = %key, "✅ 缓存命中");
        Some(entry.data.clone())
    }

    /// 写入（覆盖）一条缓存并立即落盘
    pub async fn set(&self, raw_query: &str, data: Value) {
        let key = normalize_query(raw_query);
        let entry = SearchCacheEntry {
            timestamp: self.clock.now_millis(),
            data,
        };
        let mut entries = self.entries.write().await;
        entries.insert(key.clone(), entry);
        debug!(key = %key, "📝 写入缓存");
        self.persist(&entries).await;
    }

    /// 删除一条缓存，返回是否存在
    pub async fn remove(&self, raw_query: &str) -> bool {
        let key = normalize_query(raw_query);
        let mut entries = self.entries.write().await;
        let found = entries.remove(&key).is_some();
        if found {
            self.persist(&entries).await;
        }
        found
    }

    /// 清除全部过期条目，返回清除数量
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry));
        let purged = before - entries.len();
        if purged > 0 {
            info!(purged, remaining = entries.len(), "🧹 已清理过期缓存");
            self.persist(&entries).await;
        }
        purged
    }

    /// 内存中的条目数（含尚未被读到的过期条目）
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// 转换为落盘格式
    pub async fn to_persistable(&self) -> Map<String, Value> {
        snapshot(&*self.entries.read().await)
    }

    fn is_expired(&self, entry: &SearchCacheEntry) -> bool {
        let Some(ttl) = self.ttl else {
            return false;
        };
        let age = self.clock.now_millis().saturating_sub(entry.timestamp);
        u128::from(age) > ttl.as_millis()
    }

    /// 调用方持有写锁，保证多次写盘按变更顺序发生
    async fn persist(&self, entries: &HashMap<String, SearchCacheEntry>) {
        if let Err(e) = self.file.save(&snapshot(entries)).await {
            warn!(path = %self.file.path().display(), "搜索缓存落盘失败: {e}");
        }
    }
}

fn snapshot(entries: &HashMap<String, SearchCacheEntry>) -> Map<String, Value> {
    entries
        .iter()
        .map(|(k, entry)| {
            let value = serde_json::json!({
                "timestamp": entry.timestamp,
                "data": entry.data,
            });
            (k.clone(), value)
        })
        .collect()
}

fn ttl_from_secs(ttl_secs: i64) -> Option<Duration> {
    u64::try_from(ttl_secs)
        .ok()
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ManualClock;
    use futures::future::join_all;
    use serde_json::json;
    use tempfile::TempDir;

    const START: u64 = 1_700_000_000_000;

    fn open_with_clock(dir: &TempDir, ttl_secs: i64) -> (SearchCache, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(START));
        let cache = SearchCache::open(dir.path().join("search_cache.json"), ttl_secs)
            .with_clock(clock.clone());
        (cache, clock)
    }

    #[tokio::test]
    async fn test_miss_on_empty_cache() {
        let dir = TempDir::new().unwrap();
        let (cache, _) = open_with_clock(&dir, DEFAULT_TTL_SECS);

        assert!(cache.get("anything").await.is_none());
        assert!(cache.get("").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_hit_is_normalization_insensitive() {
        let dir = TempDir::new().unwrap();
        let (cache, _) = open_with_clock(&dir, DEFAULT_TTL_SECS);
        let payload = json!({"answer": "sunny", "results": [{"title": "Forecast"}]});

        cache.set("Weather Today", payload.clone()).await;

        assert_eq!(cache.get("weather today").await, Some(payload.clone()));
        assert_eq!(cache.get("  WEATHER   today ").await, Some(payload));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted() {
        let dir = TempDir::new().unwrap();
        let (cache, clock) = open_with_clock(&dir, 1);

        cache.set("q", json!({"n": 1})).await;
        clock.advance(Duration::from_secs(2));

        assert!(cache.get("q").await.is_none());
        assert!(cache.get("q").await.is_none());
        assert_eq!(cache.len().await, 0);

        // 淘汰也已落盘
        let reopened = SearchCache::open(dir.path().join("search_cache.json"), 1);
        assert_eq!(reopened.len().await, 0);
    }

    #[tokio::test]
    async fn test_entry_at_exact_ttl_is_still_valid() {
        let dir = TempDir::new().unwrap();
        let (cache, clock) = open_with_clock(&dir, 10);

        cache.set("q", json!(1)).await;
        clock.advance(Duration::from_secs(10));
        assert_eq!(cache.get("q").await, Some(json!(1)));

        clock.advance(Duration::from_millis(1));
        assert!(cache.get("q").await.is_none());
    }

    #[tokio::test]
    async fn test_non_positive_ttl_never_expires() {
        let dir = TempDir::new().unwrap();
        for ttl in [0, -5] {
            let (cache, clock) = open_with_clock(&dir, ttl);
            assert!(cache.ttl().is_none());
            cache.set("old", json!("kept")).await;
            clock.advance(Duration::from_secs(10 * 365 * 86_400));
            assert_eq!(cache.get("old").await, Some(json!("kept")));
        }
    }

    #[tokio::test]
    async fn test_set_overwrites_and_refreshes_timestamp() {
        let dir = TempDir::new().unwrap();
        let (cache, clock) = open_with_clock(&dir, 5);

        cache.set("q", json!("first")).await;
        clock.advance(Duration::from_secs(4));
        cache.set("Q", json!("second")).await;
        clock.advance(Duration::from_secs(4));

        assert_eq!(cache.get("q").await, Some(json!("second")));
    }

    #[tokio::test]
    async fn test_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("search_cache.json");
        let (cache, _) = open_with_clock(&dir, DEFAULT_TTL_SECS);

        for i in 0..5 {
            cache.set(&format!("query {i}"), json!({"i": i})).await;
        }
        let before = cache.to_persistable().await;

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["query 3"]["timestamp"], json!(START));
        assert_eq!(raw["query 3"]["data"], json!({"i": 3}));

        let reopened = SearchCache::open(&path, DEFAULT_TTL_SECS)
            .with_clock(Arc::new(ManualClock::new(START)));
        assert_eq!(reopened.to_persistable().await, before);
        assert_eq!(reopened.get("QUERY 4").await, Some(json!({"i": 4})));
    }

    #[tokio::test]
    async fn test_expired_entries_absent_after_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("search_cache.json");
        let (cache, _) = open_with_clock(&dir, 60);
        cache.set("stale", json!(1)).await;

        let later = Arc::new(ManualClock::new(START + 61_000));
        let reopened = SearchCache::open(&path, 60).with_clock(later);
        assert_eq!(reopened.len().await, 1);
        assert!(reopened.get("stale").await.is_none());
        assert_eq!(reopened.len().await, 0);
    }

    #[tokio::test]
    async fn test_load_skips_malformed_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("search_cache.json");
        std::fs::write(
            &path,
            r#"{
                "good": { "timestamp": 1700000000000, "data": { "ok": true } },
                "not an object": 42,
                "bad timestamp": { "timestamp": "yesterday", "data": 1 },
                "no timestamp": { "data": "old" }
            }"#,
        )
        .unwrap();

        let cache =
            SearchCache::open(&path, 60).with_clock(Arc::new(ManualClock::new(START)));
        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("good").await, Some(json!({"ok": true})));
        // 缺少时间戳视为极旧条目
        assert!(cache.get("no timestamp").await.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_file_yields_empty_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("search_cache.json");
        std::fs::write(&path, "{\"truncated\": {\"timestamp\": 17").unwrap();

        let cache = SearchCache::open(&path, DEFAULT_TTL_SECS);
        assert!(cache.is_empty().await);

        cache.set("fresh", json!("start")).await;
        let reopened = SearchCache::open(&path, DEFAULT_TTL_SECS);
        assert_eq!(reopened.get("fresh").await, Some(json!("start")));
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let dir = TempDir::new().unwrap();
        let (cache, clock) = open_with_clock(&dir, 10);

        cache.set("a", json!(1)).await;
        cache.set("b", json!(2)).await;
        clock.advance(Duration::from_secs(8));
        cache.set("c", json!(3)).await;
        clock.advance(Duration::from_secs(5));

        assert_eq!(cache.purge_expired().await, 2);
        assert_eq!(cache.purge_expired().await, 0);
        assert_eq!(cache.get("c").await, Some(json!(3)));

        let reopened = SearchCache::open(dir.path().join("search_cache.json"), 0);
        assert_eq!(reopened.len().await, 1);
    }

    /// 数据文件与临时文件位置都被目录占住，任何写盘都会失败
    fn blocked_path(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("blocked");
        std::fs::create_dir(&path).unwrap();
        std::fs::create_dir(dir.path().join("blocked.tmp")).unwrap();
        path
    }

    #[tokio::test]
    async fn test_write_failure_keeps_serving_from_memory() {
        let dir = TempDir::new().unwrap();
        let cache = SearchCache::open(blocked_path(&dir), 60)
            .with_clock(Arc::new(ManualClock::new(START)));

        cache.set("Q", json!(1)).await;
        assert_eq!(cache.get("q").await, Some(json!(1)));
        assert!(cache.remove("q").await);
        assert!(cache.get("q").await.is_none());
    }

    #[tokio::test]
    async fn test_write_failure_on_expiry_still_misses() {
        let dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::new(START));
        let cache = SearchCache::open(blocked_path(&dir), 60).with_clock(clock.clone());

        cache.set("stale", json!("old")).await;
        clock.advance(Duration::from_secs(61));

        assert!(cache.get("stale").await.is_none());
        assert!(cache.get("stale").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove() {
        let dir = TempDir::new().unwrap();
        let (cache, _) = open_with_clock(&dir, DEFAULT_TTL_SECS);

        assert!(!cache.remove("missing").await);
        cache.set("Rust Async", json!([])).await;
        assert!(cache.remove("rust async").await);
        assert!(cache.get("rust async").await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_writers() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("search_cache.json");
        let (cache, _) = open_with_clock(&dir, DEFAULT_TTL_SECS);
        let cache = Arc::new(cache);

        let tasks = (0..32).map(|i| {
            let cache = cache.clone();
            tokio::spawn(async move {
                cache.set(&format!("Query {i}"), json!(i)).await;
                cache.get(&format!("query {i}")).await
            })
        });
        for (i, result) in join_all(tasks).await.into_iter().enumerate() {
            assert_eq!(result.unwrap(), Some(json!(i)));
        }

        let reopened = SearchCache::open(&path, DEFAULT_TTL_SECS);
        assert_eq!(reopened.len().await, 32);
    }
}
