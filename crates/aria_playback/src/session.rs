//! 播放会话

use serde::{Deserialize, Serialize};

use crate::Track;

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Preparing,
    Playing,
    Paused,
}

impl PlaybackState {
    /// 是否处于需要保活的状态
    pub fn is_active(self) -> bool {
        !matches!(self, PlaybackState::Stopped)
    }
}

/// 循环模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RepeatMode {
    #[default]
    Off,
    All,
    One,
}

impl RepeatMode {
    /// 通知栏“循环”按钮的轮换顺序：Off -> All -> One -> Off
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }

    /// 桥接层使用的整数编码（0 = Off, 1 = All, 2 = One）
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(RepeatMode::Off),
            1 => Some(RepeatMode::All),
            2 => Some(RepeatMode::One),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::Off => "Off",
            RepeatMode::All => "All",
            RepeatMode::One => "One",
        }
    }
}

/// 播放会话
///
/// 进程内唯一，只在控制流上被状态机修改。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaybackSession {
    pub state: PlaybackState,
    pub current_track: Option<Track>,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub shuffle: bool,
    pub repeat_mode: RepeatMode,
}

impl PlaybackSession {
    /// 更新位置；时长已知时不超过时长
    pub(crate) fn set_position(&mut self, position_ms: u64) {
        self.position_ms = if self.duration_ms > 0 {
            position_ms.min(self.duration_ms)
        } else {
            position_ms
        };
    }
}

/// 对外发布的只读会话快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub state: PlaybackState,
    pub current_track: Option<Track>,
    pub current_index: usize,
    pub playlist_len: usize,
    pub position_ms: u64,
    pub duration_ms: u64,
    pub shuffle: bool,
    pub repeat_mode: RepeatMode,
}

impl SessionSnapshot {
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_cycle_wraps() {
        let mut mode = RepeatMode::Off;
        let mut seen = Vec::new();
        for _ in 0..4 {
            mode = mode.cycle();
            seen.push(mode);
        }
        assert_eq!(
            seen,
            vec![RepeatMode::All, RepeatMode::One, RepeatMode::Off, RepeatMode::All]
        );
    }

    #[test]
    fn test_repeat_codes() {
        assert_eq!(RepeatMode::from_code(2), Some(RepeatMode::One));
        assert_eq!(RepeatMode::from_code(3), None);
    }

    #[test]
    fn test_position_clamped_once_duration_known() {
        let mut session = PlaybackSession::default();
        session.set_position(5_000);
        assert_eq!(session.position_ms, 5_000);

        session.duration_ms = 3_000;
        session.set_position(5_000);
        assert_eq!(session.position_ms, 3_000);
    }
}
