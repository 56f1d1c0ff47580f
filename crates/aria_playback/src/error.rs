//! 错误类型

/// 曲目加载错误
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("Source unreachable: {0}")]
    Unreachable(String),
    #[error("Malformed source: {0}")]
    Malformed(String),
}

/// 播放错误
///
/// 任何一种都不会让协调器退出；`InvalidCommand` 只记日志，不提示用户。
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error("Failed to load track: {0}")]
    Load(#[from] LoadError),
    #[error("Engine fault: {0}")]
    EngineFault(String),
    #[error("Invalid command: {0}")]
    InvalidCommand(String),
}

impl PlaybackError {
    /// 是否需要作为提示展示给用户
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, PlaybackError::InvalidCommand(_))
    }
}

/// 配置错误
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// 通知栏/媒体会话动作字符串无法识别
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown action: {0}")]
pub struct ParseActionError(pub String);
