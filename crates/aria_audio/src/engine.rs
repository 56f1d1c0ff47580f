//! 播放引擎
//!
//! 每次 `load` 启动一个解码线程，独占解码器和输出流。新的 `load` 或
//! `stop` 置位取消标志并等旧线程退出，同一时刻最多只有一个输出流，
//! 旧线程之后不再发信号。

use std::fs::File;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};

use aria_playback::{AudioEngine, EngineCallback, LoadError, Track};

use crate::{AudioDecoder, AudioOutput, LocalSource, OutputConfig};

/// 解码线程控制命令
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Control {
    Start,
    Pause,
    Seek(u64),
}

/// 暂停时等待控制命令的间隔
const IDLE_WAIT: Duration = Duration::from_millis(50);
/// 缓冲区满时的等待
const FILL_WAIT: Duration = Duration::from_millis(5);

/// 引擎参数
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// 输出缓冲时长（毫秒）
    pub buffer_ms: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { buffer_ms: 500 }
    }
}

/// 正在进行的一次加载
struct ActiveLoad {
    ctrl_tx: Sender<Control>,
    cancel: Arc<AtomicBool>,
    position_ms: Arc<AtomicU64>,
    worker: JoinHandle<()>,
}

impl ActiveLoad {
    /// 取消并等待解码线程退出（最多一个 `IDLE_WAIT` 或一帧解码）
    fn cancel(self) {
        let ActiveLoad {
            ctrl_tx,
            cancel,
            worker,
            ..
        } = self;
        cancel.store(true, Ordering::Release);
        drop(ctrl_tx);
        if worker.join().is_err() {
            log::error!("decode thread panicked");
        }
    }
}

/// symphonia + cpal 实现的解码引擎
#[derive(Default)]
pub struct SymphoniaEngine {
    config: EngineConfig,
    active: Option<ActiveLoad>,
}

impl SymphoniaEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    fn send(&self, ctrl: Control) {
        if let Some(active) = &self.active {
            if active.ctrl_tx.try_send(ctrl).is_err() {
                log::warn!("decode thread not accepting {:?}", ctrl);
            }
        }
    }
}

impl AudioEngine for SymphoniaEngine {
    fn load(&mut self, track: &Track, callback: EngineCallback) -> Result<(), LoadError> {
        if let Some(previous) = self.active.take() {
            previous.cancel();
        }

        let source = LocalSource::resolve(&track.source_uri)?;
        let file = File::open(&source.path).map_err(|e| {
            LoadError::Unreachable(format!("{}: {}", source.path.display(), e))
        })?;
        let hint = source.extension_hint();

        let (ctrl_tx, ctrl_rx) = bounded(16);
        let cancel = Arc::new(AtomicBool::new(false));
        let position_ms = Arc::new(AtomicU64::new(0));

        let job = DecodeJob {
            callback: callback.abort_on(cancel.clone()),
            ctrl_rx,
            cancel: cancel.clone(),
            position_ms: position_ms.clone(),
            buffer_ms: self.config.buffer_ms,
        };

        let worker = thread::Builder::new()
            .name("aria-decode".to_string())
            .spawn(move || job.run(file, hint))
            .map_err(|e| LoadError::Unreachable(format!("failed to spawn decoder: {}", e)))?;

        self.active = Some(ActiveLoad {
            ctrl_tx,
            cancel,
            position_ms,
            worker,
        });
        Ok(())
    }

    fn start(&mut self) {
        self.send(Control::Start);
    }

    fn pause(&mut self) {
        self.send(Control::Pause);
    }

    fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel();
        }
    }

    fn seek(&mut self, position_ms: u64) {
        if let Some(active) = &self.active {
            active.position_ms.store(position_ms, Ordering::Relaxed);
        }
        self.send(Control::Seek(position_ms));
    }

    fn position_ms(&self) -> u64 {
        self.active
            .as_ref()
            .map_or(0, |a| a.position_ms.load(Ordering::Relaxed))
    }
}

impl Drop for SymphoniaEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

/// 解码线程持有的全部状态
struct DecodeJob {
    callback: EngineCallback,
    ctrl_rx: Receiver<Control>,
    cancel: Arc<AtomicBool>,
    position_ms: Arc<AtomicU64>,
    buffer_ms: u32,
}

impl DecodeJob {
    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    fn run(self, file: File, hint: Option<String>) {
        let load_id = self.callback.load_id();

        let mut decoder = match AudioDecoder::new(file, hint.as_deref()) {
            Ok(d) => d,
            Err(e) => {
                if !self.cancelled() {
                    self.callback.load_failed(LoadError::Malformed(e.to_string()));
                }
                return;
            }
        };

        let info = decoder.info.clone();
        log::debug!(
            "load {} decoded as {} {} Hz x{}",
            load_id,
            info.codec,
            info.sample_rate,
            info.channels
        );

        // 已被取代的加载不再打开输出流
        if self.cancelled() {
            return;
        }
        let output_config =
            OutputConfig::with_buffer_ms(info.sample_rate, info.channels as u16, self.buffer_ms);
        let output = match AudioOutput::new(output_config) {
            Ok(o) => o,
            Err(e) => {
                if !self.cancelled() {
                    self.callback.fault(format!("Audio output error: {}", e));
                }
                return;
            }
        };

        if self.cancelled() {
            return;
        }
        self.callback.ready(info.duration_ms());

        self.pump(&mut decoder, &output);
        output.set_playing(false);
        log::debug!("decode thread for load {} finished", load_id);
    }

    /// 解码 -> 缓冲区，直到播完、出错或被取消
    fn pump(&self, decoder: &mut AudioDecoder, output: &AudioOutput) {
        let mut playing = false;
        let mut drained = false;
        let mut ended = false;
        let mut pending: Vec<f32> = Vec::new();
        let mut offset = 0;
        let mut base_ms = 0u64;

        loop {
            if self.cancelled() {
                return;
            }

            let ctrl = if playing {
                match self.ctrl_rx.try_recv() {
                    Ok(c) => Some(c),
                    Err(TryRecvError::Empty) => None,
                    Err(TryRecvError::Disconnected) => return,
                }
            } else {
                match self.ctrl_rx.recv_timeout(IDLE_WAIT) {
                    Ok(c) => Some(c),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            };

            match ctrl {
                Some(Control::Start) if !ended => {
                    playing = true;
                    output.set_playing(true);
                }
                Some(Control::Pause) => {
                    playing = false;
                    output.set_playing(false);
                }
                Some(Control::Seek(ms)) => {
                    if let Err(e) = decoder.seek(Duration::from_millis(ms)) {
                        log::warn!("seek to {} ms failed: {}", ms, e);
                    } else {
                        output.clear();
                        pending.clear();
                        offset = 0;
                        base_ms = ms;
                        drained = false;
                    }
                }
                _ => {}
            }

            if playing {
                if offset < pending.len() {
                    let n = output.push(&pending[offset..]);
                    offset += n;
                    if n == 0 {
                        thread::sleep(FILL_WAIT);
                    }
                } else if !drained {
                    match decoder.decode_next() {
                        Ok(Some(samples)) => {
                            pending = samples;
                            offset = 0;
                        }
                        Ok(None) => drained = true,
                        Err(e) => {
                            if !self.cancelled() {
                                self.callback.fault(e.to_string());
                            }
                            return;
                        }
                    }
                } else if output.buffered() == 0 {
                    ended = true;
                    playing = false;
                    output.set_playing(false);
                    if !self.cancelled() {
                        self.callback.reached_end();
                    }
                } else {
                    thread::sleep(FILL_WAIT);
                }
            }

            self.position_ms
                .store(base_ms + output.played_ms(), Ordering::Relaxed);
        }
    }
}
