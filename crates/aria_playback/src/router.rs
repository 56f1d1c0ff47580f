//! 传输事件路由
//!
//! 把三个入口（应用桥接、系统媒体会话、通知栏动作）翻译成统一的
//! [`Command`]。路由本身不持有状态，不重排也不合并：每次触发恰好产生
//! 一条命令，按到达顺序入队。

use std::fmt;
use std::str::FromStr;

use crossbeam_channel::Sender;

use crate::{Command, Inbound, ParseActionError, RepeatMode, Track};

/// 应用内桥接调用（页面脚本 -> 原生）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeCall {
    PlaySongAt(i64),
    PauseSong,
    ResumeSong,
    TogglePlayPause,
    StopSong,
    NextSong,
    PreviousSong,
    SeekTo(i64),
    SetShuffle(bool),
    SetRepeatMode(RepeatMode),
}

/// 媒体会话自定义动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CustomAction {
    Shuffle,
    Repeat,
}

impl FromStr for CustomAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SHUFFLE" => Ok(CustomAction::Shuffle),
            "REPEAT" => Ok(CustomAction::Repeat),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}

/// 系统媒体会话回调（锁屏、耳机按键等）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaSessionCallback {
    Play,
    Pause,
    SkipToNext,
    SkipToPrevious,
    SeekTo(i64),
    Stop,
    CustomAction(CustomAction),
}

/// 通知栏动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum NotificationAction {
    Previous,
    PlayPause,
    Next,
    Shuffle,
    Repeat,
}

impl NotificationAction {
    /// 通知栏固定的按钮顺序
    pub const ALL: [NotificationAction; 5] = [
        NotificationAction::Previous,
        NotificationAction::PlayPause,
        NotificationAction::Next,
        NotificationAction::Shuffle,
        NotificationAction::Repeat,
    ];

    /// 写入 PendingIntent 的动作字符串
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationAction::Previous => "PREVIOUS",
            NotificationAction::PlayPause => "PLAY_PAUSE",
            NotificationAction::Next => "NEXT",
            NotificationAction::Shuffle => "SHUFFLE",
            NotificationAction::Repeat => "REPEAT",
        }
    }
}

impl fmt::Display for NotificationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ParseActionError(s.to_string()))
    }
}

impl From<BridgeCall> for Command {
    fn from(call: BridgeCall) -> Self {
        match call {
            BridgeCall::PlaySongAt(index) => Command::PlayTrack(index),
            BridgeCall::PauseSong => Command::Pause,
            BridgeCall::ResumeSong => Command::Play,
            BridgeCall::TogglePlayPause => Command::PlayPauseToggle,
            BridgeCall::StopSong => Command::Stop,
            BridgeCall::NextSong => Command::Next,
            BridgeCall::PreviousSong => Command::Previous,
            BridgeCall::SeekTo(ms) => Command::Seek(ms),
            BridgeCall::SetShuffle(on) => Command::SetShuffle(on),
            BridgeCall::SetRepeatMode(mode) => Command::SetRepeat(mode),
        }
    }
}

impl From<MediaSessionCallback> for Command {
    fn from(callback: MediaSessionCallback) -> Self {
        match callback {
            MediaSessionCallback::Play => Command::Play,
            MediaSessionCallback::Pause => Command::Pause,
            MediaSessionCallback::SkipToNext => Command::Next,
            MediaSessionCallback::SkipToPrevious => Command::Previous,
            MediaSessionCallback::SeekTo(ms) => Command::Seek(ms),
            MediaSessionCallback::Stop => Command::Stop,
            MediaSessionCallback::CustomAction(CustomAction::Shuffle) => Command::ToggleShuffle,
            MediaSessionCallback::CustomAction(CustomAction::Repeat) => Command::CycleRepeat,
        }
    }
}

impl From<NotificationAction> for Command {
    fn from(action: NotificationAction) -> Self {
        match action {
            NotificationAction::Previous => Command::Previous,
            NotificationAction::PlayPause => Command::PlayPauseToggle,
            NotificationAction::Next => Command::Next,
            // 随机和循环不属于标准传输命令，直接作为带外命令交给状态机
            NotificationAction::Shuffle => Command::ToggleShuffle,
            NotificationAction::Repeat => Command::CycleRepeat,
        }
    }
}

/// 传输事件路由
#[derive(Debug, Clone)]
pub struct TransportRouter {
    tx: Sender<Inbound>,
}

impl TransportRouter {
    pub fn new(tx: Sender<Inbound>) -> Self {
        Self { tx }
    }

    /// 应用桥接入口
    pub fn bridge(&self, call: BridgeCall) -> bool {
        log::debug!("bridge: {:?}", call);
        self.enqueue(call.into())
    }

    /// 媒体会话入口
    pub fn media_session(&self, callback: MediaSessionCallback) -> bool {
        log::debug!("media session: {:?}", callback);
        self.enqueue(callback.into())
    }

    /// 通知栏入口
    pub fn notification(&self, action: NotificationAction) -> bool {
        log::debug!("notification action: {}", action);
        self.enqueue(action.into())
    }

    /// 页面下发新的播放列表
    pub fn set_playlist(&self, tracks: Vec<Track>) -> bool {
        log::debug!("playlist: {} tracks", tracks.len());
        self.tx.send(Inbound::SetPlaylist(tracks)).is_ok()
    }

    /// 入队；协调器已退出时返回 false
    fn enqueue(&self, cmd: Command) -> bool {
        match self.tx.send(Inbound::Command(cmd)) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("coordinator gone, dropping {:?}", e.0);
                false
            }
        }
    }
}
