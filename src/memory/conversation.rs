//! 会话历史存储
//!
//! 按会话标识（频道 ID 或用户 ID）保存有序的对话记录。
//! 变更只发生在内存里，何时落盘由调用方决定（例如清空后立即保存，或每 N 轮保存一次）。
//!
//! 没有任何记录的标识与不存在的标识等价：空列表不会被保存。
//!
//! 落盘格式：
//! ```json
//! {
//!   "channel-42": [
//!     { "role": "user", "content": "hi" },
//!     { "role": "assistant", "content": "hello" }
//!   ]
//! }
//! ```

use crate::error::{Result, StorageError};
use crate::llm::types::Message;
use crate::memory::persist::JsonFile;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// 会话历史存储，`T` 为单轮消息的类型
pub struct ConversationStore<T = Message> {
    file: JsonFile,
    conversations: RwLock<HashMap<String, Vec<T>>>,
}

impl<T> ConversationStore<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync,
{
    /// 打开会话文件，文件缺失或损坏时从空状态开始
    pub fn open(path: impl AsRef<Path>) -> Self {
        let file = JsonFile::new(path);
        let snapshot = file.load();
        Self::from_persistable(file, snapshot)
    }

    /// 从落盘格式重建，无法解析的会话被跳过
    pub fn from_persistable(file: JsonFile, snapshot: Map<String, Value>) -> Self {
        let mut conversations = HashMap::with_capacity(snapshot.len());
        for (identity, value) in snapshot {
            match serde_json::from_value::<Vec<T>>(value) {
                Ok(turns) if turns.is_empty() => {}
                Ok(turns) => {
                    conversations.insert(identity, turns);
                }
                Err(e) => warn!(identity = %identity, "跳过无法解析的会话记录: {e}"),
            }
        }
        let turn_count: usize = conversations.values().map(Vec::len).sum();
        info!(
            path = %file.path().display(),
            conversations = conversations.len(),
            turns = turn_count,
            "🗂️ ConversationStore 初始化"
        );
        Self {
            file,
            conversations: RwLock::new(conversations),
        }
    }

    pub async fn has(&self, identity: &str) -> bool {
        self.conversations.read().await.contains_key(identity)
    }

    pub async fn get(&self, identity: &str) -> Option<Vec<T>> {
        self.conversations.read().await.get(identity).cloned()
    }

    /// 整体替换某个会话；传入空列表等同于删除
    pub async fn set(&self, identity: &str, turns: Vec<T>) {
        let mut conversations = self.conversations.write().await;
        if turns.is_empty() {
            conversations.remove(identity);
        } else {
            conversations.insert(identity.to_string(), turns);
        }
    }

    /// 追加一轮
    pub async fn append(&self, identity: &str, turn: T) {
        self.extend(identity, vec![turn]).await;
    }

    /// 在同一把锁内追加多轮，保证它们在记录中相邻
    pub async fn extend(&self, identity: &str, turns: Vec<T>) {
        if turns.is_empty() {
            return;
        }
        self.conversations
            .write()
            .await
            .entry(identity.to_string())
            .or_default()
            .extend(turns);
    }

    /// 只保留最新的 `max_turns` 轮，返回被裁掉的轮数
    pub async fn retain_last(&self, identity: &str, max_turns: usize) -> usize {
        let mut conversations = self.conversations.write().await;
        let Some(turns) = conversations.get_mut(identity) else {
            return 0;
        };
        let excess = turns.len().saturating_sub(max_turns);
        turns.drain(..excess);
        if turns.is_empty() {
            conversations.remove(identity);
        }
        excess
    }

    /// 删除某个会话，返回之前是否存在
    pub async fn delete(&self, identity: &str) -> bool {
        let removed = self.conversations.write().await.remove(identity).is_some();
        debug!(identity = %identity, removed, "🗑️ 删除会话");
        removed
    }

    pub async fn identities(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.conversations.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }

    /// 转换为落盘格式
    pub async fn to_persistable(&self) -> Result<Map<String, Value>> {
        snapshot(&*self.conversations.read().await)
    }

    /// 把当前状态整体写回磁盘
    ///
    /// 写盘期间持有写锁，并发保存按调用顺序落盘，不会出现旧快照覆盖新快照。
    pub async fn save(&self) -> Result<()> {
        let conversations = self.conversations.write().await;
        let map = snapshot(&*conversations)?;
        self.file.save(&map).await
    }
}

fn snapshot<T: Serialize>(conversations: &HashMap<String, Vec<T>>) -> Result<Map<String, Value>> {
    let mut map = Map::new();
    for (identity, turns) in conversations {
        let value = serde_json::to_value(turns)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        map.insert(identity.clone(), value);
    }
    Ok(map)
}
