use std::fmt;

/// parley 的统一错误类型
#[derive(Debug)]
pub enum BotError {
    /// 持久化相关错误
    Storage(StorageError),
    /// 配置错误
    Config(ConfigError),
    /// LLM 调用错误
    Llm(LlmError),
    /// 搜索服务错误
    Search(SearchError),
    /// IO 错误
    Io(std::io::Error),
    /// 其他错误
    Other(String),
}

/// 持久化错误（文件读写、序列化）
#[derive(Debug)]
pub enum StorageError {
    /// 文件或目录读写失败
    IoError(String),
    /// 序列化/反序列化失败
    SerializationError(String),
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),
    /// 配置解析失败
    ParseFailed(String),
    /// 配置值无效
    InvalidValue { field: String, message: String },
}

/// LLM 相关错误
#[derive(Debug)]
pub enum LlmError {
    /// 网络请求失败
    NetworkError(String),
    /// API 返回错误状态码
    ApiError { status: u16, message: String },
    /// 没有返回内容
    EmptyResponse,
}

/// 搜索服务错误
#[derive(Debug)]
pub enum SearchError {
    /// 未配置 API Key 等必要参数
    NotConfigured(String),
    /// 网络请求失败
    NetworkError(String),
    /// 服务端返回错误状态码
    ProviderError { status: u16, message: String },
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotError::Storage(e) => write!(f, "Storage Error: {}", e),
            BotError::Config(e) => write!(f, "Config Error: {}", e),
            BotError::Llm(e) => write!(f, "LLM Error: {}", e),
            BotError::Search(e) => write!(f, "Search Error: {}", e),
            BotError::Io(e) => write!(f, "IO Error: {}", e),
            BotError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::IoError(msg) => write!(f, "IO failure: {}", msg),
            StorageError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseFailed(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, message } => {
                write!(f, "Invalid config value for '{}': {}", field, message)
            }
        }
    }
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            LlmError::ApiError { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            LlmError::EmptyResponse => write!(f, "Empty response from LLM"),
        }
    }
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::NotConfigured(what) => write!(f, "Search not configured: {}", what),
            SearchError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            SearchError::ProviderError { status, message } => {
                write!(f, "Provider error (status {}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for BotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BotError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for StorageError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for LlmError {}
impl std::error::Error for SearchError {}

impl From<std::io::Error> for BotError {
    fn from(err: std::io::Error) -> Self {
        BotError::Io(err)
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Storage(StorageError::SerializationError(err.to_string()))
    }
}

impl From<serde_yaml::Error> for BotError {
    fn from(err: serde_yaml::Error) -> Self {
        BotError::Config(ConfigError::ParseFailed(err.to_string()))
    }
}

impl From<StorageError> for BotError {
    fn from(err: StorageError) -> Self {
        BotError::Storage(err)
    }
}

impl From<ConfigError> for BotError {
    fn from(err: ConfigError) -> Self {
        BotError::Config(err)
    }
}

impl From<LlmError> for BotError {
    fn from(err: LlmError) -> Self {
        BotError::Llm(err)
    }
}

impl From<SearchError> for BotError {
    fn from(err: SearchError) -> Self {
        BotError::Search(err)
    }
}

// 便捷的 Result 类型别名
pub type Result<T> = std::result::Result<T, BotError>;
