//! 协调器配置

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, RepeatMode};

/// 通知栏展示配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PresenterConfig {
    /// 没有当前曲目时的标题
    pub fallback_title: String,
    /// 通知栏第二行的署名（应用名）
    pub byline: String,
}

impl Default for PresenterConfig {
    fn default() -> Self {
        Self {
            fallback_title: "Aria Music".to_string(),
            byline: "Aria Music".to_string(),
        }
    }
}

/// 协调器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorConfig {
    /// 命令队列容量
    pub queue_capacity: usize,
    /// 事件通道容量
    pub event_capacity: usize,
    /// 播放中刷新进度的间隔（毫秒）
    pub progress_interval_ms: u64,
    /// 固定随机种子（测试或复现用）
    pub shuffle_seed: Option<u64>,
    pub initial_shuffle: bool,
    pub initial_repeat: RepeatMode,
    pub presenter: PresenterConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            event_capacity: 64,
            progress_interval_ms: 1000,
            shuffle_seed: None,
            initial_shuffle: false,
            initial_repeat: RepeatMode::Off,
            presenter: PresenterConfig::default(),
        }
    }
}

impl CoordinatorConfig {
    /// 从 JSON 字符串解析，缺省字段取默认值
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// 从 JSON 文件读取
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// 把直接构造时留下的非法取值换回默认值
    pub fn sanitized(mut self) -> Self {
        if let Err(e) = self.validate() {
            log::warn!("{}, falling back to defaults", e);
            let defaults = Self::default();
            if self.queue_capacity == 0 {
                self.queue_capacity = defaults.queue_capacity;
            }
            if self.event_capacity == 0 {
                self.event_capacity = defaults.event_capacity;
            }
            if self.progress_interval_ms == 0 {
                self.progress_interval_ms = defaults.progress_interval_ms;
            }
        }
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "queue_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "event_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.progress_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "progress_interval_ms",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}
