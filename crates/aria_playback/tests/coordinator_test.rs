//! 协调器端到端测试：真实工作线程 + 跨线程引擎信号

mod common;

use std::time::Duration;

use aria_playback::{
    BridgeCall, Command, CoordinatorConfig, Glyph, LoadError, MediaSessionCallback,
    NotificationAction, PlaybackError, PlaybackEvent, PlaybackState, RepeatMode, SessionSnapshot,
    Track,
};
use common::{
    next_notice, start, start_with, wait_event, wait_playing, wait_until, HostCall,
    TRACK_DURATION_MS,
};

fn is_playing_index(index: usize) -> impl Fn(&SessionSnapshot) -> bool {
    move |s| s.state == PlaybackState::Playing && s.current_index == index
}

#[test]
fn play_track_reaches_playing_with_selected_track() {
    let h = start(&["a", "b", "c"]);
    let expected = common::tracks(&["a", "b", "c"]);
    for (index, track) in expected.iter().enumerate() {
        h.handle.send(Command::PlayTrack(index as i64));
        let snap = wait_until(&h.handle, "playing", is_playing_index(index));
        assert_eq!(snap.current_track.as_ref(), Some(track));
        assert_eq!(snap.duration_ms, TRACK_DURATION_MS);
    }
    assert!(h.handle.is_playing());
    assert_eq!(h.handle.current_track().map(|t| t.id), Some("c".to_string()));
}

#[test]
fn repeat_all_wraps_from_last_track_on_completion() {
    let h = start(&["a", "b", "c"]);
    h.handle.send(Command::SetRepeat(RepeatMode::All));
    h.handle.send(Command::PlayTrack(2));
    wait_until(&h.handle, "playing C", is_playing_index(2));

    h.engine.finish_current();
    let snap = wait_until(&h.handle, "wrapped to A", is_playing_index(0));
    assert_eq!(snap.current_track.map(|t| t.id), Some("a".to_string()));
}

#[test]
fn repeat_one_replays_same_index_each_time() {
    let h = start(&["a", "b"]);
    h.handle.send(Command::SetRepeat(RepeatMode::One));
    h.handle.send(Command::PlayTrack(1));
    wait_playing(&h.handle);

    for _ in 0..3 {
        h.engine.finish_current();
        wait_playing(&h.handle);
        assert_eq!(h.handle.snapshot().current_index, 1);
    }
    assert_eq!(*h.engine.loads.lock(), vec!["b", "b", "b", "b"]);
}

#[test]
fn next_from_last_stops_without_repeat() {
    let h = start(&["a", "b"]);
    h.handle.send(Command::PlayTrack(1));
    wait_until(&h.handle, "playing", is_playing_index(1));

    h.handle.send(Command::Next);
    let snap = wait_until(&h.handle, "stopped", |s| s.state == PlaybackState::Stopped);
    assert_eq!(snap.current_index, 1);
    assert_eq!(snap.current_track.map(|t| t.id), Some("b".to_string()));
}

#[test]
fn stop_then_toggle_resumes_last_track_from_zero() {
    let h = start(&["a", "b"]);
    h.handle.send(Command::PlayTrack(1));
    wait_until(&h.handle, "playing", is_playing_index(1));
    h.handle.send(Command::Seek(4_000));
    wait_until(&h.handle, "seeked", |s| s.position_ms == 4_000);

    h.handle.send(Command::Stop);
    h.handle.send(Command::PlayPauseToggle);
    let snap = wait_until(&h.handle, "resumed", |s| {
        s.state == PlaybackState::Playing && s.current_index == 1 && s.position_ms == 0
    });
    assert_eq!(snap.current_track.map(|t| t.id), Some("b".to_string()));
    assert_eq!(h.engine.load_count(), 2);
}

#[test]
fn seek_is_clamped_to_track_bounds() {
    let h = start(&["a"]);
    h.handle.send(Command::PlayTrack(0));
    wait_until(&h.handle, "playing", is_playing_index(0));

    h.handle.send(Command::Seek(3_000));
    wait_until(&h.handle, "seeked", |s| s.position_ms == 3_000);
    h.handle.send(Command::Seek(-500));
    wait_until(&h.handle, "clamped low", |s| s.position_ms == 0);
    h.handle.send(Command::Seek(99_999));
    wait_until(&h.handle, "clamped high", |s| s.position_ms == TRACK_DURATION_MS);
}

#[test]
fn unreachable_source_surfaces_notice_and_keeps_running() {
    let h = start(&[]);
    h.handle.set_playlist(vec![
        Track::new("remote", "http://example.com/x.mp3", "Remote"),
        Track::new("local", "/sdcard/Music/local.mp3", "Local"),
    ]);
    h.handle.send(Command::PlayTrack(0));

    let notice = next_notice(&h.handle);
    assert!(matches!(notice, PlaybackError::Load(LoadError::Unreachable(_))));
    assert_eq!(h.handle.snapshot().state, PlaybackState::Stopped);

    h.handle.send(Command::PlayTrack(1));
    wait_until(&h.handle, "recovered", is_playing_index(1));
}

#[test]
fn malformed_source_reported_asynchronously() {
    let h = start(&[]);
    h.handle
        .set_playlist(vec![Track::new("x", "/sdcard/Music/x.broken", "Broken")]);
    h.handle.send(Command::PlayTrack(0));

    let notice = next_notice(&h.handle);
    assert!(matches!(notice, PlaybackError::Load(LoadError::Malformed(_))));
    wait_until(&h.handle, "stopped", |s| s.state == PlaybackState::Stopped);
    assert!(*h.engine.stops.lock() >= 1);
}

#[test]
fn all_three_channels_drive_the_same_machine() {
    let h = start(&["a", "b", "c"]);
    let router = h.handle.router();

    assert!(router.bridge(BridgeCall::PlaySongAt(0)));
    wait_until(&h.handle, "playing a", is_playing_index(0));

    router.media_session(MediaSessionCallback::SkipToNext);
    wait_until(&h.handle, "playing b", is_playing_index(1));

    router.notification(NotificationAction::PlayPause);
    wait_until(&h.handle, "paused", |s| s.state == PlaybackState::Paused);

    router.media_session(MediaSessionCallback::Play);
    wait_until(&h.handle, "playing again", |s| s.state == PlaybackState::Playing);

    router.notification(NotificationAction::Shuffle);
    router.notification(NotificationAction::Repeat);
    let snap = wait_until(&h.handle, "flags", |s| {
        s.shuffle && s.repeat_mode == RepeatMode::All
    });
    assert_eq!(snap.current_index, 1);

    router.notification(NotificationAction::Previous);
    router.media_session(MediaSessionCallback::Stop);
    wait_until(&h.handle, "stopped", |s| s.state == PlaybackState::Stopped);
}

#[test]
fn foreground_promoted_while_active_and_demoted_on_stop() {
    let h = start(&["a"]);
    h.handle.send(Command::PlayTrack(0));
    wait_until(&h.handle, "playing", is_playing_index(0));
    h.handle.send(Command::Pause);
    h.handle.send(Command::Stop);
    wait_event(&h.handle, "stopped", |e| {
        matches!(e, PlaybackEvent::StateChanged(PlaybackState::Stopped))
    });

    let calls = h.host.calls.lock().clone();
    assert_eq!(calls, vec![HostCall::Promote, HostCall::Demote]);
}

#[test]
fn notification_reflects_current_state_without_duplicates() {
    let h = start(&["a"]);
    h.handle.send(Command::PlayTrack(0));
    wait_until(&h.handle, "playing", is_playing_index(0));
    h.handle.send(Command::SetShuffle(false));
    h.handle.send(Command::SetShuffle(false));
    h.handle.send(Command::Pause);
    wait_event(&h.handle, "paused", |e| {
        matches!(e, PlaybackEvent::StateChanged(PlaybackState::Paused))
    });

    let published = h.surface.published.lock().clone();
    for pair in published.windows(2) {
        assert_ne!(pair[0], pair[1], "identical snapshot pushed twice");
    }
    let last = published.last().expect("published");
    assert_eq!(last.title, "A");
    assert!(!last.is_playing);
    assert_eq!(last.actions[1].glyph, Glyph::Play);
    assert!(published
        .iter()
        .any(|s| s.is_playing && s.actions[1].glyph == Glyph::Pause));
}

#[test]
fn progress_refresh_runs_only_while_playing() {
    let config = CoordinatorConfig {
        progress_interval_ms: 10,
        ..Default::default()
    };
    let h = start_with(&["a"], config);
    h.handle.send(Command::PlayTrack(0));
    wait_until(&h.handle, "playing", is_playing_index(0));

    *h.engine.position.lock() = 5_000;
    let snap = wait_until(&h.handle, "progress sampled", |s| s.position_ms == 5_000);
    assert_eq!(snap.state, PlaybackState::Playing);
    wait_until(&h.handle, "progress shown", |_| {
        h.surface
            .published
            .lock()
            .last()
            .map_or(false, |n| n.progress == Some(50))
    });

    h.handle.send(Command::Pause);
    wait_until(&h.handle, "paused", |s| s.state == PlaybackState::Paused);
    *h.engine.position.lock() = 9_000;
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(h.handle.snapshot().position_ms, 5_000);
}

#[test]
fn shutdown_releases_engine_and_foreground() {
    let h = start(&["a"]);
    h.handle.send(Command::PlayTrack(0));
    wait_until(&h.handle, "playing", is_playing_index(0));

    let stops = h.engine.stops.clone();
    let host = h.host.calls.clone();
    h.handle.shutdown();

    assert!(*stops.lock() >= 1);
    assert_eq!(host.lock().last(), Some(&HostCall::Demote));
}

#[test]
fn zero_capacity_and_interval_fall_back_to_defaults() {
    let config = CoordinatorConfig {
        queue_capacity: 0,
        event_capacity: 0,
        progress_interval_ms: 0,
        ..Default::default()
    };
    let h = start_with(&["a", "b"], config);
    h.handle.send(Command::PlayTrack(1));
    wait_until(&h.handle, "playing", is_playing_index(1));

    // 队列不是零容量的会合通道，连续发送不会卡住
    for _ in 0..4 {
        assert!(h.handle.send(Command::SetShuffle(true)));
    }
    h.handle.send(Command::Stop);
    wait_until(&h.handle, "stopped", |s| s.state == PlaybackState::Stopped);
}
