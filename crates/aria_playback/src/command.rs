//! 播放命令和事件定义

use crate::{EngineSignal, LoadId, PlaybackError, PlaybackState, RepeatMode, Track};

/// 传输命令（路由层 -> 状态机）
///
/// 索引与跳转位置保留外部传入的有符号值，由状态机统一校验。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 播放列表中的指定曲目
    PlayTrack(i64),
    /// 播放/暂停切换
    PlayPauseToggle,
    /// 只恢复不暂停（媒体会话的 onPlay）
    Play,
    /// 暂停
    Pause,
    /// 停止
    Stop,
    /// 下一首
    Next,
    /// 上一首
    Previous,
    /// 跳转（毫秒）
    Seek(i64),
    /// 设置随机播放
    SetShuffle(bool),
    /// 设置循环模式
    SetRepeat(RepeatMode),
    /// 通知栏自定义动作：切换随机播放
    ToggleShuffle,
    /// 通知栏自定义动作：轮换循环模式
    CycleRepeat,
}

/// 控制流队列中的消息
///
/// 命令与引擎信号共用一条有序队列，由唯一的工作线程依次处理。
#[derive(Debug, Clone)]
pub enum Inbound {
    Command(Command),
    /// 整体替换播放列表
    SetPlaylist(Vec<Track>),
    /// 引擎信号（已从解码线程转送过来）
    Engine { load_id: LoadId, signal: EngineSignal },
    /// 关闭协调器
    Shutdown,
}

impl From<Command> for Inbound {
    fn from(cmd: Command) -> Self {
        Inbound::Command(cmd)
    }
}

/// 播放事件（协调器 -> UI）
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    /// 状态变更
    StateChanged(PlaybackState),
    /// 当前曲目变更
    TrackChanged(Track),
    /// 需要提示给用户的可恢复错误
    Notice(PlaybackError),
}
