//! JSON 文件持久化
//!
//! 两个 store 共用的落盘能力：启动时把整个 JSON 对象读进内存，变更后整体写回。
//!
//! - 读：文件或目录不存在、内容为空、解析失败、顶层不是对象，一律返回空映射
//! - 写：先写同目录下的 `*.tmp`，再 `rename` 覆盖正式文件，旧快照在新文件完整写出前不会被改动

use crate::error::{Result, StorageError};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// 一个 JSON 对象文件
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    /// 绑定文件路径（支持 `~/` 前缀），不触碰磁盘
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: expand_tilde(path.as_ref()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取文件内容；任何失败都退化为空映射
    ///
    /// 副作用：确保父目录存在（幂等）。
    pub fn load(&self) -> Map<String, Value> {
        if let Err(e) = self.ensure_parent_dir() {
            warn!(path = %self.path.display(), "创建数据目录失败，从空状态开始: {e}");
            return Map::new();
        }
        if !self.path.exists() {
            return Map::new();
        }
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(path = %self.path.display(), "读取数据文件失败，从空状态开始: {e}");
                return Map::new();
            }
        };
        if raw.trim().is_empty() {
            return Map::new();
        }
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!(path = %self.path.display(), "数据文件顶层不是 JSON 对象，从空状态开始");
                Map::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), "数据文件解析失败，从空状态开始: {e}");
                Map::new()
            }
        }
    }

    /// 把整个映射以 pretty JSON 写回磁盘
    ///
    /// 失败时返回错误但不改变内存状态，是否记录由调用方决定。
    pub async fn save(&self, map: &Map<String, Value>) -> Result<()> {
        self.ensure_parent_dir()?;
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let tmp = self.tmp_path();
        write_synced(&tmp, json.as_bytes())
            .await
            .map_err(|e| StorageError::IoError(format!("写入临时文件失败: {e}")))?;
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StorageError::IoError(format!("替换数据文件失败: {e}")).into());
        }
        debug!(path = %self.path.display(), entries = map.len(), "💾 数据已持久化");
        Ok(())
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::IoError(format!("创建目录失败: {e}")))?;
        }
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

/// 写入并 `sync_all`，保证 rename 之后新文件名指向的是完整内容
async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await
}

pub(crate) fn expand_tilde(path: &Path) -> PathBuf {
    let s = path.to_string_lossy();
    if s.starts_with("~/")
        && let Some(home) = std::env::var("HOME")
            .ok()
            .or_else(|| std::env::var("USERPROFILE").ok())
    {
        return PathBuf::from(home).join(&s[2..]);
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_file_and_dir() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::new(dir.path().join("nested/data/state.json"));

        assert!(file.load().is_empty());
        // 父目录作为副作用被创建
        assert!(dir.path().join("nested/data").is_dir());
        assert!(!file.path().exists());
    }

    #[test]
    fn test_load_recovers_from_corruption() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let file = JsonFile::new(&path);

        for bad in ["{\"a\": [1, 2", "[1, 2, 3]", "\"just a string\"", "null", "   \n"] {
            std::fs::write(&path, bad).unwrap();
            assert!(file.load().is_empty(), "内容 {bad:?} 应视为空");
        }
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let file = JsonFile::new(dir.path().join("data/state.json"));

        let mut map = Map::new();
        map.insert("alpha".to_string(), json!({"n": 1}));
        map.insert("beta".to_string(), json!([1, "two"]));
        file.save(&map).await.unwrap();

        let raw = std::fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains('\n'), "应写出 pretty JSON");
        assert_eq!(file.load(), map);
        assert!(!dir.path().join("data/state.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_synced_write_replaces_larger_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let file = JsonFile::new(&path);

        let mut big = Map::new();
        for i in 0..50 {
            big.insert(format!("key-{i}"), json!({"payload": "x".repeat(64)}));
        }
        file.save(&big).await.unwrap();

        let mut small = Map::new();
        small.insert("only".to_string(), json!(1));
        file.save(&small).await.unwrap();

        // 旧内容不会残留在新文件尾部
        assert_eq!(file.load(), small);

        let tmp = dir.path().join("direct.json");
        write_synced(&tmp, b"{\"a\": 1}").await.unwrap();
        assert_eq!(std::fs::read_to_string(&tmp).unwrap(), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn test_save_failure_keeps_old_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let file = JsonFile::new(&path);

        let mut map = Map::new();
        map.insert("k".to_string(), json!("v1"));
        file.save(&map).await.unwrap();

        // 用同名目录占住临时文件位置，让下一次写入失败
        std::fs::create_dir(dir.path().join("state.json.tmp")).unwrap();
        map.insert("k".to_string(), json!("v2"));
        assert!(file.save(&map).await.is_err());

        assert_eq!(file.load().get("k"), Some(&json!("v1")));
    }

    #[test]
    fn test_expand_tilde_leaves_plain_paths() {
        assert_eq!(
            expand_tilde(Path::new("data/x.json")),
            PathBuf::from("data/x.json")
        );
    }
}
