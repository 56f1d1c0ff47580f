//! 通知栏/媒体会话展示
//!
//! 每次状态迁移后从会话重新生成 [`NotificationSnapshot`]，与上次推送的
//! 快照相同就不再推送。前台降级移除通知后也保留上次的快照，
//! 停止状态下的无效命令不会把通知重新推出来。

use serde::Serialize;

use crate::{NotificationAction, PlaybackSession, PlaybackState, Playlist, PresenterConfig, RepeatMode};

/// 按钮图标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Glyph {
    SkipPrevious,
    Play,
    Pause,
    SkipNext,
    ShuffleOff,
    ShuffleOn,
    RepeatOff,
    RepeatAll,
    RepeatOne,
}

/// 通知栏按钮
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionButton {
    pub action: NotificationAction,
    pub glyph: Glyph,
    pub label: &'static str,
    pub enabled: bool,
}

/// 通知栏快照
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationSnapshot {
    pub title: String,
    pub subtitle: String,
    pub byline: String,
    /// 锁屏媒体会话用的播放状态
    pub state: PlaybackState,
    pub is_playing: bool,
    pub shuffle: bool,
    pub repeat_mode: RepeatMode,
    pub position_ms: u64,
    /// 时长未知时为 0
    pub duration_ms: u64,
    /// 0-100，时长未知时为空
    pub progress: Option<u8>,
    /// 只有播放中才常驻（不可滑动清除）
    pub ongoing: bool,
    pub actions: Vec<ActionButton>,
}

impl NotificationSnapshot {
    /// 从会话生成快照
    ///
    /// 播放/暂停按钮反映的是当前已生效的状态，而不是正在过渡到的状态。
    pub fn render(session: &PlaybackSession, playlist: &Playlist, config: &PresenterConfig) -> Self {
        let is_playing = session.state == PlaybackState::Playing;
        let title = session
            .current_track
            .as_ref()
            .map(|t| t.display_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| config.fallback_title.clone());

        let subtitle = format!(
            "Shuffle {} | Repeat {}",
            if session.shuffle { "On" } else { "Off" },
            session.repeat_mode.label()
        );

        let progress = (session.duration_ms > 0).then(|| {
            let pct = session.position_ms.min(session.duration_ms) * 100 / session.duration_ms;
            pct as u8
        });

        let has_tracks = !playlist.is_empty();
        let has_selection = session.current_track.is_some();

        let actions = NotificationAction::ALL
            .into_iter()
            .map(|action| {
                let (glyph, label, enabled) = match action {
                    NotificationAction::Previous => (Glyph::SkipPrevious, "Previous", has_tracks),
                    NotificationAction::PlayPause if is_playing => (Glyph::Pause, "Pause", true),
                    NotificationAction::PlayPause => (Glyph::Play, "Play", has_selection),
                    NotificationAction::Next => (Glyph::SkipNext, "Next", has_tracks),
                    NotificationAction::Shuffle => (
                        if session.shuffle { Glyph::ShuffleOn } else { Glyph::ShuffleOff },
                        "Shuffle",
                        true,
                    ),
                    NotificationAction::Repeat => (
                        match session.repeat_mode {
                            RepeatMode::Off => Glyph::RepeatOff,
                            RepeatMode::All => Glyph::RepeatAll,
                            RepeatMode::One => Glyph::RepeatOne,
                        },
                        "Repeat",
                        true,
                    ),
                };
                ActionButton {
                    action,
                    glyph,
                    label,
                    enabled,
                }
            })
            .collect();

        Self {
            title,
            subtitle,
            byline: config.byline.clone(),
            state: session.state,
            is_playing,
            shuffle: session.shuffle,
            repeat_mode: session.repeat_mode,
            position_ms: session.position_ms,
            duration_ms: session.duration_ms,
            progress,
            ongoing: is_playing,
            actions,
        }
    }
}

/// 系统媒体展示面（通知栏、锁屏）
pub trait MediaSurface: Send {
    fn publish(&mut self, snapshot: &NotificationSnapshot);
}

/// 去重后推送快照
pub struct Presenter {
    surface: Box<dyn MediaSurface>,
    config: PresenterConfig,
    last: Option<NotificationSnapshot>,
}

impl Presenter {
    pub fn new(surface: Box<dyn MediaSurface>, config: PresenterConfig) -> Self {
        Self {
            surface,
            config,
            last: None,
        }
    }

    /// 生成并推送；返回是否真的推送了
    pub fn present(&mut self, session: &PlaybackSession, playlist: &Playlist) -> bool {
        let snapshot = NotificationSnapshot::render(session, playlist, &self.config);
        if self.last.as_ref() == Some(&snapshot) {
            return false;
        }
        self.surface.publish(&snapshot);
        self.last = Some(snapshot);
        true
    }

    /// 最近一次推送的快照
    pub fn last(&self) -> Option<&NotificationSnapshot> {
        self.last.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Track;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<NotificationSnapshot>>>);

    impl MediaSurface for Recorder {
        fn publish(&mut self, snapshot: &NotificationSnapshot) {
            self.0.lock().push(snapshot.clone());
        }
    }

    fn playing_session() -> (PlaybackSession, Playlist) {
        let track = Track::new("a", "/music/a.mp3", "Song A");
        let session = PlaybackSession {
            state: PlaybackState::Playing,
            current_track: Some(track.clone()),
            position_ms: 2_500,
            duration_ms: 10_000,
            shuffle: true,
            repeat_mode: RepeatMode::One,
        };
        (session, Playlist::new(vec![track]))
    }

    #[test]
    fn test_render_playing() {
        let (session, playlist) = playing_session();
        let snap = NotificationSnapshot::render(&session, &playlist, &PresenterConfig::default());
        assert_eq!(snap.title, "Song A");
        assert_eq!(snap.subtitle, "Shuffle On | Repeat One");
        assert_eq!(snap.progress, Some(25));
        assert!(snap.ongoing);
        let play_pause = &snap.actions[1];
        assert_eq!(play_pause.glyph, Glyph::Pause);
        assert_eq!(play_pause.label, "Pause");
        assert_eq!(
            snap.actions.iter().map(|a| a.action).collect::<Vec<_>>(),
            NotificationAction::ALL.to_vec()
        );
    }

    #[test]
    fn test_render_idle_uses_fallback_and_hides_progress() {
        let session = PlaybackSession::default();
        let snap =
            NotificationSnapshot::render(&session, &Playlist::default(), &PresenterConfig::default());
        assert_eq!(snap.title, "Aria Music");
        assert_eq!(snap.progress, None);
        assert!(!snap.ongoing);
        assert_eq!(snap.actions[1].glyph, Glyph::Play);
        assert!(!snap.actions[0].enabled);
        assert!(!snap.actions[1].enabled);
    }

    #[test]
    fn test_render_carries_media_session_fields() {
        let (session, playlist) = playing_session();
        let snap = NotificationSnapshot::render(&session, &playlist, &PresenterConfig::default());
        assert_eq!(snap.state, PlaybackState::Playing);
        assert_eq!(snap.position_ms, 2_500);
        assert_eq!(snap.duration_ms, 10_000);

        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["position_ms"], 2_500);
        assert_eq!(json["duration_ms"], 10_000);
        assert_eq!(json["state"], "Playing");
    }

    #[test]
    fn test_duplicate_snapshot_published_once() {
        let recorder = Recorder::default();
        let mut presenter = Presenter::new(Box::new(recorder.clone()), PresenterConfig::default());
        let (mut session, playlist) = playing_session();

        assert!(presenter.present(&session, &playlist));
        assert!(!presenter.present(&session, &playlist));
        assert_eq!(recorder.0.lock().len(), 1);

        session.position_ms = 5_000;
        assert!(presenter.present(&session, &playlist));
        assert!(!presenter.present(&session, &playlist));
        assert_eq!(recorder.0.lock().len(), 2);
        assert_eq!(presenter.last().map(|s| s.progress), Some(Some(50)));
    }
}
