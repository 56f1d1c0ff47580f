//! 与 Java 层交换的 JSON 载荷

use serde::Serialize;

use aria_playback::{
    CoordinatorConfig, ConfigError, PlaybackEvent, PlaybackState, RepeatMode, Track,
};

/// 推给 Java 层的事件
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload<'a> {
    State { state: PlaybackState },
    Track { track: &'a Track },
    Notice { message: String, user_visible: bool },
}

impl<'a> EventPayload<'a> {
    pub fn from_event(event: &'a PlaybackEvent) -> Self {
        match event {
            PlaybackEvent::StateChanged(state) => EventPayload::State { state: *state },
            PlaybackEvent::TrackChanged(track) => EventPayload::Track { track },
            PlaybackEvent::Notice(err) => EventPayload::Notice {
                message: err.to_string(),
                user_visible: err.is_user_visible(),
            },
        }
    }
}

pub fn event_json(event: &PlaybackEvent) -> Option<String> {
    match serde_json::to_string(&EventPayload::from_event(event)) {
        Ok(json) => Some(json),
        Err(e) => {
            log::error!("failed to encode event {:?}: {}", event, e);
            None
        }
    }
}

/// 启动配置；空串表示全部默认
pub fn parse_config(json: &str) -> Result<CoordinatorConfig, ConfigError> {
    if json.trim().is_empty() {
        return Ok(CoordinatorConfig::default());
    }
    CoordinatorConfig::from_json_str(json)
}

/// 播放列表：`[{"id", "source_uri", "display_name"}, ...]`
pub fn parse_playlist(json: &str) -> Result<Vec<Track>, serde_json::Error> {
    serde_json::from_str(json)
}

/// 桥接层的循环模式编码
pub fn repeat_from_code(code: i32) -> Option<RepeatMode> {
    RepeatMode::from_code(code)
}
