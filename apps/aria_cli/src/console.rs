//! 终端输入解析与日志版通知栏

use aria_playback::{
    BridgeCall, CustomAction, ForegroundHost, MediaSessionCallback, MediaSurface,
    NotificationAction, NotificationSnapshot, RepeatMode,
};

/// 一行终端输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Bridge(BridgeCall),
    Media(MediaSessionCallback),
    Notify(NotificationAction),
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  play <n>              play track n (0-based)
  toggle | pause | resume | stop | next | prev
  seek <ms>             seek within the current track
  shuffle on|off
  repeat off|all|one
  media play|pause|next|prev|stop|seek <ms>|SHUFFLE|REPEAT
  notify PREVIOUS|PLAY_PAUSE|NEXT|SHUFFLE|REPEAT
  status | help | quit";

fn arg<'a>(words: &[&'a str], i: usize, what: &str) -> Result<&'a str, String> {
    words.get(i).copied().ok_or_else(|| format!("missing {}", what))
}

fn number(words: &[&str], i: usize, what: &str) -> Result<i64, String> {
    let raw = arg(words, i, what)?;
    raw.parse()
        .map_err(|_| format!("invalid {}: {}", what, raw))
}

fn repeat_mode(s: &str) -> Result<RepeatMode, String> {
    match s.to_ascii_lowercase().as_str() {
        "off" | "0" => Ok(RepeatMode::Off),
        "all" | "1" => Ok(RepeatMode::All),
        "one" | "2" => Ok(RepeatMode::One),
        other => Err(format!("unknown repeat mode: {}", other)),
    }
}

fn media(words: &[&str]) -> Result<MediaSessionCallback, String> {
    let name = arg(words, 1, "media callback")?;
    let cb = match name {
        "play" => MediaSessionCallback::Play,
        "pause" => MediaSessionCallback::Pause,
        "next" => MediaSessionCallback::SkipToNext,
        "prev" => MediaSessionCallback::SkipToPrevious,
        "stop" => MediaSessionCallback::Stop,
        "seek" => MediaSessionCallback::SeekTo(number(words, 2, "position")?),
        custom => MediaSessionCallback::CustomAction(
            custom
                .parse::<CustomAction>()
                .map_err(|e| e.to_string())?,
        ),
    };
    Ok(cb)
}

/// 解析一行输入；空行返回 `Ok(None)`
pub fn parse_line(line: &str) -> Result<Option<Input>, String> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let Some(&head) = words.first() else {
        return Ok(None);
    };

    let input = match head {
        "play" => Input::Bridge(BridgeCall::PlaySongAt(number(&words, 1, "track index")?)),
        "toggle" => Input::Bridge(BridgeCall::TogglePlayPause),
        "pause" => Input::Bridge(BridgeCall::PauseSong),
        "resume" => Input::Bridge(BridgeCall::ResumeSong),
        "stop" => Input::Bridge(BridgeCall::StopSong),
        "next" => Input::Bridge(BridgeCall::NextSong),
        "prev" => Input::Bridge(BridgeCall::PreviousSong),
        "seek" => Input::Bridge(BridgeCall::SeekTo(number(&words, 1, "position")?)),
        "shuffle" => match arg(&words, 1, "on|off")? {
            "on" => Input::Bridge(BridgeCall::SetShuffle(true)),
            "off" => Input::Bridge(BridgeCall::SetShuffle(false)),
            other => return Err(format!("expected on|off, got {}", other)),
        },
        "repeat" => Input::Bridge(BridgeCall::SetRepeatMode(repeat_mode(arg(
            &words,
            1,
            "repeat mode",
        )?)?)),
        "media" => Input::Media(media(&words)?),
        "notify" => Input::Notify(
            arg(&words, 1, "action")?
                .parse()
                .map_err(|e: aria_playback::ParseActionError| e.to_string())?,
        ),
        "status" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "exit" => Input::Quit,
        other => return Err(format!("unknown command: {}", other)),
    };
    Ok(Some(input))
}

/// 把通知栏输出成日志
pub struct LogSurface;

impl MediaSurface for LogSurface {
    fn publish(&mut self, snapshot: &NotificationSnapshot) {
        let progress = snapshot
            .progress
            .map(|p| format!(" {}% ({}/{} ms)", p, snapshot.position_ms, snapshot.duration_ms))
            .unwrap_or_default();
        log::info!(
            "[notification] {} | {} [{:?}]{}",
            snapshot.title,
            snapshot.subtitle,
            snapshot.state,
            progress
        );
    }
}

/// 前台保活只记日志
pub struct LogHost;

impl ForegroundHost for LogHost {
    fn promote(&mut self, snapshot: &NotificationSnapshot) {
        log::info!("[foreground] promoted: {}", snapshot.title);
    }

    fn demote(&mut self) {
        log::info!("[foreground] demoted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_commands() {
        assert_eq!(
            parse_line("play 3").unwrap(),
            Some(Input::Bridge(BridgeCall::PlaySongAt(3)))
        );
        assert_eq!(
            parse_line("  seek -500 ").unwrap(),
            Some(Input::Bridge(BridgeCall::SeekTo(-500)))
        );
        assert_eq!(
            parse_line("repeat one").unwrap(),
            Some(Input::Bridge(BridgeCall::SetRepeatMode(RepeatMode::One)))
        );
        assert_eq!(
            parse_line("shuffle on").unwrap(),
            Some(Input::Bridge(BridgeCall::SetShuffle(true)))
        );
    }

    #[test]
    fn test_media_and_notify() {
        assert_eq!(
            parse_line("media next").unwrap(),
            Some(Input::Media(MediaSessionCallback::SkipToNext))
        );
        assert_eq!(
            parse_line("media REPEAT").unwrap(),
            Some(Input::Media(MediaSessionCallback::CustomAction(CustomAction::Repeat)))
        );
        assert_eq!(
            parse_line("notify PLAY_PAUSE").unwrap(),
            Some(Input::Notify(NotificationAction::PlayPause))
        );
    }

    #[test]
    fn test_blank_and_errors() {
        assert_eq!(parse_line("   ").unwrap(), None);
        assert!(parse_line("play").is_err());
        assert!(parse_line("play x").is_err());
        assert!(parse_line("repeat twice").is_err());
        assert!(parse_line("notify LOUDER").is_err());
        assert!(parse_line("dance").is_err());
    }
}
