//! 协调器控制流
//!
//! 一个工作线程、一条有序队列：命令和引擎信号都从这里进入状态机。

use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, never, select, tick, Receiver, Sender};

use crate::{
    AudioEngine, Command, CoordinatorConfig, ForegroundHost, Inbound, MediaSurface,
    PlaybackEvent, PlaybackMachine, PlaybackState, SessionSnapshot, SharedSnapshot, Track,
    TransportRouter,
};

/// 协调器句柄
///
/// 丢弃句柄会关闭协调器并等待工作线程退出。
pub struct PlaybackHandle {
    cmd_tx: Sender<Inbound>,
    pub evt_rx: Receiver<PlaybackEvent>,
    snapshot: SharedSnapshot,
    worker: Option<JoinHandle<()>>,
}

/// 启动协调器；配置里为 0 的容量或间隔按默认值处理
pub fn spawn_coordinator(
    engine: Box<dyn AudioEngine>,
    surface: Box<dyn MediaSurface>,
    host: Box<dyn ForegroundHost>,
    config: CoordinatorConfig,
) -> PlaybackHandle {
    let config = config.sanitized();
    let (cmd_tx, cmd_rx) = bounded(config.queue_capacity);
    let (evt_tx, evt_rx) = bounded(config.event_capacity);

    let machine = PlaybackMachine::new(engine, surface, host, &config, cmd_tx.clone(), evt_tx);
    let snapshot = machine.shared_snapshot();
    let interval = config.progress_interval();

    let worker = thread::Builder::new()
        .name("aria-coordinator".to_string())
        .spawn(move || run_coordinator(machine, cmd_rx, interval));

    let worker = match worker {
        Ok(handle) => Some(handle),
        Err(e) => {
            log::error!("failed to spawn coordinator thread: {}", e);
            None
        }
    };

    PlaybackHandle {
        cmd_tx,
        evt_rx,
        snapshot,
        worker,
    }
}

fn run_coordinator(mut machine: PlaybackMachine, cmd_rx: Receiver<Inbound>, interval: Duration) {
    log::info!("coordinator started");
    let idle = never::<Instant>();
    let mut ticker: Option<Receiver<Instant>> = None;

    loop {
        // 进度刷新只在播放中存在
        let playing = machine.session().state == PlaybackState::Playing;
        if playing && ticker.is_none() {
            ticker = Some(tick(interval));
        } else if !playing {
            ticker = None;
        }
        let tick_rx = ticker.as_ref().unwrap_or(&idle);

        select! {
            recv(cmd_rx) -> msg => match msg {
                Ok(msg) => {
                    if !machine.handle(msg) {
                        break;
                    }
                }
                Err(_) => break,
            },
            recv(tick_rx) -> _ => machine.tick(),
        }
    }
    log::info!("coordinator stopped");
}

impl PlaybackHandle {
    /// 发送命令
    pub fn send(&self, cmd: Command) -> bool {
        self.cmd_tx.send(Inbound::Command(cmd)).is_ok()
    }

    /// 整体替换播放列表（应在任何 PlayTrack 之前调用）
    pub fn set_playlist(&self, tracks: Vec<Track>) -> bool {
        self.cmd_tx.send(Inbound::SetPlaylist(tracks)).is_ok()
    }

    /// 三个外部入口共用的路由
    pub fn router(&self) -> TransportRouter {
        TransportRouter::new(self.cmd_tx.clone())
    }

    /// 最近发布的会话快照
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }

    pub fn is_playing(&self) -> bool {
        self.snapshot.read().is_playing()
    }

    pub fn current_track(&self) -> Option<Track> {
        self.snapshot.read().current_track.clone()
    }

    /// 关闭协调器并等待工作线程退出
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(Inbound::Shutdown);
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("coordinator thread panicked");
            }
        }
    }
}
