//! 播放状态机
//!
//! 唯一持有 [`PlaybackSession`] 与 [`Playlist`] 的地方。所有消息都在同一条
//! 控制流上逐条处理；处理完每条消息后发布只读快照、刷新通知栏并同步前台状态。

use std::sync::Arc;

use crossbeam_channel::{Sender, TrySendError};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::navigator::{self, NextResult};
use crate::{
    AudioEngine, Command, CoordinatorConfig, EngineCallback, EngineSignal, ForegroundHost, ForegroundManager, Inbound, LoadId, MediaSurface, PlaybackError,
    PlaybackEvent, PlaybackSession, PlaybackState, Playlist, Presenter, RepeatMode,
    SessionSnapshot, Track,
};

/// 读者共享的会话快照
pub type SharedSnapshot = Arc<RwLock<SessionSnapshot>>;

pub struct PlaybackMachine {
    session: PlaybackSession,
    playlist: Playlist,
    engine: Box<dyn AudioEngine>,
    presenter: Presenter,
    foreground: ForegroundManager,
    rng: StdRng,
    load_id: LoadId,
    /// 用于构造引擎回调，信号回到同一条队列
    cmd_tx: Sender<Inbound>,
    evt_tx: Sender<PlaybackEvent>,
    shared: SharedSnapshot,
    last_state: PlaybackState,
    last_track_id: Option<String>,
}

impl PlaybackMachine {
    pub fn new(
        engine: Box<dyn AudioEngine>,
        surface: Box<dyn MediaSurface>,
        host: Box<dyn ForegroundHost>,
        config: &CoordinatorConfig,
        cmd_tx: Sender<Inbound>,
        evt_tx: Sender<PlaybackEvent>,
    ) -> Self {
        let rng = match config.shuffle_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let session = PlaybackSession {
            shuffle: config.initial_shuffle,
            repeat_mode: config.initial_repeat,
            ..Default::default()
        };

        let mut machine = Self {
            session,
            playlist: Playlist::default(),
            engine,
            presenter: Presenter::new(surface, config.presenter.clone()),
            foreground: ForegroundManager::new(host),
            rng,
            load_id: LoadId::default(),
            cmd_tx,
            evt_tx,
            shared: Arc::new(RwLock::new(SessionSnapshot::default())),
            last_state: PlaybackState::Stopped,
            last_track_id: None,
        };
        *machine.shared.write() = machine.snapshot();
        machine
    }

    pub fn session(&self) -> &PlaybackSession {
        &self.session
    }

    pub fn playlist(&self) -> &Playlist {
        &self.playlist
    }

    pub fn shared_snapshot(&self) -> SharedSnapshot {
        Arc::clone(&self.shared)
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground.is_promoted()
    }

    /// 处理一条消息；返回 false 表示应当退出控制流
    pub fn handle(&mut self, msg: Inbound) -> bool {
        let result = match msg {
            Inbound::Command(cmd) => {
                log::debug!("command {:?} in {:?}", cmd, self.session.state);
                self.apply(cmd)
            }
            Inbound::SetPlaylist(tracks) => {
                self.replace_playlist(tracks);
                Ok(())
            }
            Inbound::Engine { load_id, signal } => self.on_engine_signal(load_id, signal),
            Inbound::Shutdown => {
                log::info!("coordinator shutting down");
                self.release();
                self.publish();
                return false;
            }
        };

        if let Err(e) = result {
            self.report(e);
        }
        self.publish();
        true
    }

    /// 播放中的周期性进度刷新
    pub fn tick(&mut self) {
        if self.session.state != PlaybackState::Playing {
            return;
        }
        let position = self.engine.position_ms();
        self.session.set_position(position);
        self.publish();
    }

    fn apply(&mut self, cmd: Command) -> Result<(), PlaybackError> {
        match cmd {
            Command::PlayTrack(index) => self.play_track(index),
            Command::PlayPauseToggle => self.toggle(),
            Command::Play => self.play(),
            Command::Pause => {
                self.pause();
                Ok(())
            }
            Command::Stop => {
                self.stop();
                Ok(())
            }
            Command::Next => self.navigate(navigator::next),
            Command::Previous => self.navigate(navigator::previous),
            Command::Seek(ms) => self.seek(ms),
            Command::SetShuffle(on) => {
                self.session.shuffle = on;
                Ok(())
            }
            Command::SetRepeat(mode) => {
                self.session.repeat_mode = mode;
                Ok(())
            }
            Command::ToggleShuffle => {
                self.session.shuffle = !self.session.shuffle;
                Ok(())
            }
            Command::CycleRepeat => {
                self.session.repeat_mode = self.session.repeat_mode.cycle();
                Ok(())
            }
        }
    }

    fn play_track(&mut self, index: i64) -> Result<(), PlaybackError> {
        let index = usize::try_from(index)
            .ok()
            .filter(|&i| i < self.playlist.len())
            .ok_or_else(|| {
                PlaybackError::InvalidCommand(format!(
                    "track index {} out of range (len {})",
                    index,
                    self.playlist.len()
                ))
            })?;
        self.load(index)
    }

    /// 进入 Preparing 并让引擎加载；新的加载会取代尚未完成的旧加载
    fn load(&mut self, index: usize) -> Result<(), PlaybackError> {
        let track = match self.playlist.select(index) {
            Some(track) => track.clone(),
            None => {
                return Err(PlaybackError::InvalidCommand(format!(
                    "track index {} out of range",
                    index
                )))
            }
        };

        self.load_id = self.load_id.next();
        log::info!("loading [{}] {} (load {})", index, track.display_name, self.load_id);

        self.session.state = PlaybackState::Preparing;
        self.session.position_ms = 0;
        self.session.duration_ms = 0;
        self.session.current_track = Some(track.clone());

        let callback = EngineCallback::new(self.load_id, self.cmd_tx.clone());
        if let Err(e) = self.engine.load(&track, callback) {
            self.release();
            return Err(e.into());
        }
        Ok(())
    }

    fn toggle(&mut self) -> Result<(), PlaybackError> {
        match self.session.state {
            PlaybackState::Playing => {
                self.pause();
                Ok(())
            }
            PlaybackState::Paused => {
                self.resume();
                Ok(())
            }
            PlaybackState::Stopped => self.replay_last(),
            PlaybackState::Preparing => Err(PlaybackError::InvalidCommand(
                "toggle while preparing".to_string(),
            )),
        }
    }

    fn play(&mut self) -> Result<(), PlaybackError> {
        match self.session.state {
            PlaybackState::Paused => {
                self.resume();
                Ok(())
            }
            PlaybackState::Stopped => self.replay_last(),
            PlaybackState::Playing | PlaybackState::Preparing => Ok(()),
        }
    }

    /// 停止后恢复：从头重新播放上一次选中的曲目
    fn replay_last(&mut self) -> Result<(), PlaybackError> {
        if self.session.current_track.is_none() {
            return Err(PlaybackError::InvalidCommand(
                "nothing selected to resume".to_string(),
            ));
        }
        self.load(self.playlist.current_index())
    }

    fn pause(&mut self) {
        if self.session.state != PlaybackState::Playing {
            return;
        }
        self.engine.pause();
        let position = self.engine.position_ms();
        self.session.set_position(position);
        self.session.state = PlaybackState::Paused;
    }

    fn resume(&mut self) {
        self.engine.start();
        self.session.state = PlaybackState::Playing;
    }

    fn stop(&mut self) {
        if self.session.state == PlaybackState::Stopped {
            return;
        }
        log::info!("stopping playback");
        self.release();
    }

    /// 释放引擎并回到 Stopped；保留 current_track 供之后恢复
    fn release(&mut self) {
        self.engine.stop();
        // 作废尚未送达的信号
        self.load_id = self.load_id.next();
        self.session.state = PlaybackState::Stopped;
        self.session.position_ms = 0;
    }

    fn navigate(
        &mut self,
        step: fn(&Playlist, bool, RepeatMode, &mut StdRng) -> NextResult,
    ) -> Result<(), PlaybackError> {
        if self.playlist.is_empty() {
            return Err(PlaybackError::InvalidCommand("playlist is empty".to_string()));
        }
        match step(
            &self.playlist,
            self.session.shuffle,
            self.session.repeat_mode,
            &mut self.rng,
        ) {
            NextResult::Index(i) => self.load(i),
            NextResult::Stop => {
                self.stop();
                Ok(())
            }
        }
    }

    fn seek(&mut self, ms: i64) -> Result<(), PlaybackError> {
        match self.session.state {
            PlaybackState::Playing | PlaybackState::Paused => {
                let target = u64::try_from(ms).unwrap_or(0);
                self.session.set_position(target);
                self.engine.seek(self.session.position_ms);
                Ok(())
            }
            state => Err(PlaybackError::InvalidCommand(format!(
                "seek while {:?}",
                state
            ))),
        }
    }

    fn replace_playlist(&mut self, tracks: Vec<Track>) {
        log::info!("playlist replaced ({} tracks)", tracks.len());
        if self.session.state.is_active() {
            self.release();
        }
        self.session.current_track = None;
        self.session.duration_ms = 0;
        self.playlist = Playlist::new(tracks);
    }

    fn on_engine_signal(&mut self, load_id: LoadId, signal: EngineSignal) -> Result<(), PlaybackError> {
        if load_id != self.load_id {
            log::debug!("stale engine signal {:?} from load {}", signal, load_id);
            return Ok(());
        }

        match signal {
            EngineSignal::Ready { duration_ms } => {
                if self.session.state == PlaybackState::Preparing {
                    self.session.duration_ms = duration_ms;
                    self.engine.start();
                    self.session.state = PlaybackState::Playing;
                }
                Ok(())
            }
            EngineSignal::ReachedEnd => {
                if self.session.state == PlaybackState::Playing {
                    self.on_track_end()
                } else {
                    Ok(())
                }
            }
            EngineSignal::LoadFailed(err) => {
                self.release();
                Err(err.into())
            }
            EngineSignal::Fault(reason) => {
                self.release();
                Err(PlaybackError::EngineFault(reason))
            }
        }
    }

    /// 自然播完：单曲循环优先，否则交给导航；每次结尾只做一次前进决定
    fn on_track_end(&mut self) -> Result<(), PlaybackError> {
        self.session.position_ms = self.session.duration_ms;
        if self.session.repeat_mode == RepeatMode::One {
            return self.load(self.playlist.current_index());
        }
        self.navigate(navigator::next)
    }

    fn report(&mut self, err: PlaybackError) {
        if !err.is_user_visible() {
            log::debug!("ignored: {}", err);
            return;
        }
        log::warn!("{}", err);
        self.emit(PlaybackEvent::Notice(err));
    }

    fn emit(&self, event: PlaybackEvent) {
        match self.evt_tx.try_send(event) {
            Ok(()) | Err(TrySendError::Disconnected(_)) => {}
            Err(TrySendError::Full(event)) => {
                log::warn!("event channel full, dropping {:?}", event);
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.session.state,
            current_track: self.session.current_track.clone(),
            current_index: self.playlist.current_index(),
            playlist_len: self.playlist.len(),
            position_ms: self.session.position_ms,
            duration_ms: self.session.duration_ms,
            shuffle: self.session.shuffle,
            repeat_mode: self.session.repeat_mode,
        }
    }

    /// 发布快照、通知栏与前台状态，最后再发事件
    fn publish(&mut self) {
        *self.shared.write() = self.snapshot();

        self.presenter.present(&self.session, &self.playlist);
        // 降级后保留上次快照；再次提升时把它交给宿主
        self.foreground.sync(self.session.state, self.presenter.last());

        if self.session.state != self.last_state {
            self.last_state = self.session.state;
            self.emit(PlaybackEvent::StateChanged(self.session.state));
        }

        let track_id = self.session.current_track.as_ref().map(|t| t.id.clone());
        if track_id != self.last_track_id {
            self.last_track_id = track_id;
            if let Some(track) = &self.session.current_track {
                self.emit(PlaybackEvent::TrackChanged(track.clone()));
            }
        }
    }
}
