//! 协调器集成测试共用的替身

#![allow(dead_code)]

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use aria_playback::{
    spawn_coordinator, AudioEngine, CoordinatorConfig, EngineCallback, ForegroundHost, LoadError,
    MediaSurface, NotificationSnapshot, PlaybackError, PlaybackEvent, PlaybackHandle,
    PlaybackState, SessionSnapshot, Track,
};
use parking_lot::Mutex;

/// 引擎替身：在自己的线程里回报就绪，模拟真实解码线程
#[derive(Clone, Default)]
pub struct FakeEngine {
    pub probe: EngineProbe,
}

#[derive(Clone, Default)]
pub struct EngineProbe {
    pub loads: Arc<Mutex<Vec<String>>>,
    pub callback: Arc<Mutex<Option<EngineCallback>>>,
    pub position: Arc<Mutex<u64>>,
    pub stops: Arc<Mutex<usize>>,
}

impl EngineProbe {
    /// 从测试线程模拟“播放到结尾”
    pub fn finish_current(&self) {
        if let Some(cb) = self.callback.lock().as_ref() {
            cb.reached_end();
        }
    }

    pub fn load_count(&self) -> usize {
        self.loads.lock().len()
    }
}

pub const TRACK_DURATION_MS: u64 = 10_000;

impl AudioEngine for FakeEngine {
    fn load(&mut self, track: &Track, callback: EngineCallback) -> Result<(), LoadError> {
        if track.source_uri.starts_with("http://") {
            return Err(LoadError::Unreachable(track.source_uri.clone()));
        }
        self.probe.loads.lock().push(track.id.clone());
        *self.probe.callback.lock() = Some(callback.clone());
        *self.probe.position.lock() = 0;

        let broken = track.source_uri.ends_with(".broken");
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            if broken {
                callback.load_failed(LoadError::Malformed("bad header".to_string()));
            } else {
                callback.ready(TRACK_DURATION_MS);
            }
        });
        Ok(())
    }

    fn start(&mut self) {}

    fn pause(&mut self) {}

    fn stop(&mut self) {
        *self.probe.stops.lock() += 1;
        self.probe.callback.lock().take();
    }

    fn seek(&mut self, position_ms: u64) {
        *self.probe.position.lock() = position_ms;
    }

    fn position_ms(&self) -> u64 {
        *self.probe.position.lock()
    }
}

#[derive(Clone, Default)]
pub struct RecordingSurface {
    pub published: Arc<Mutex<Vec<NotificationSnapshot>>>,
}

impl MediaSurface for RecordingSurface {
    fn publish(&mut self, snapshot: &NotificationSnapshot) {
        self.published.lock().push(snapshot.clone());
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostCall {
    Promote,
    Demote,
}

#[derive(Clone, Default)]
pub struct RecordingHost {
    pub calls: Arc<Mutex<Vec<HostCall>>>,
}

impl ForegroundHost for RecordingHost {
    fn promote(&mut self, _snapshot: &NotificationSnapshot) {
        self.calls.lock().push(HostCall::Promote);
    }

    fn demote(&mut self) {
        self.calls.lock().push(HostCall::Demote);
    }
}

pub struct Harness {
    pub handle: PlaybackHandle,
    pub engine: EngineProbe,
    pub surface: RecordingSurface,
    pub host: RecordingHost,
}

pub fn tracks(names: &[&str]) -> Vec<Track> {
    names
        .iter()
        .map(|name| Track::new(*name, format!("/sdcard/Music/{name}.mp3"), name.to_uppercase()))
        .collect()
}

pub fn start(names: &[&str]) -> Harness {
    start_with(names, CoordinatorConfig::default())
}

pub fn start_with(names: &[&str], config: CoordinatorConfig) -> Harness {
    let engine = FakeEngine::default();
    let surface = RecordingSurface::default();
    let host = RecordingHost::default();
    let probe = engine.probe.clone();

    let handle = spawn_coordinator(
        Box::new(engine),
        Box::new(surface.clone()),
        Box::new(host.clone()),
        config,
    );
    handle.set_playlist(tracks(names));

    Harness {
        handle,
        engine: probe,
        surface,
        host,
    }
}

/// 轮询已发布的快照直到满足条件
pub fn wait_until<F>(handle: &PlaybackHandle, what: &str, pred: F) -> SessionSnapshot
where
    F: Fn(&SessionSnapshot) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let snap = handle.snapshot();
        if pred(&snap) {
            return snap;
        }
        if Instant::now() > deadline {
            panic!("timed out waiting for {what}; last snapshot: {snap:?}");
        }
        thread::sleep(Duration::from_millis(2));
    }
}

/// 等待下一条满足条件的事件
pub fn wait_event<F>(handle: &PlaybackHandle, what: &str, pred: F) -> PlaybackEvent
where
    F: Fn(&PlaybackEvent) -> bool,
{
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        let left = deadline.saturating_duration_since(Instant::now());
        match handle.evt_rx.recv_timeout(left) {
            Ok(event) if pred(&event) => return event,
            Ok(_) => {}
            Err(_) => panic!("timed out waiting for {what}"),
        }
    }
}

pub fn next_notice(handle: &PlaybackHandle) -> PlaybackError {
    match wait_event(handle, "notice", |e| matches!(e, PlaybackEvent::Notice(_))) {
        PlaybackEvent::Notice(err) => err,
        _ => unreachable!(),
    }
}

/// 等待进入 Playing；事件在快照和通知栏都更新之后才发出
pub fn wait_playing(handle: &PlaybackHandle) {
    wait_event(handle, "playing", |e| {
        matches!(e, PlaybackEvent::StateChanged(PlaybackState::Playing))
    });
}
