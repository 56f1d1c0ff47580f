//! 解码引擎适配层
//!
//! 状态机只通过 [`AudioEngine`] 操作底层解码资源。引擎的异步信号
//! （就绪、出错、播放到结尾）一律经由 [`EngineCallback`] 投递回控制流的
//! 命令队列，绝不在引擎自己的线程里直接修改会话。

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{SendTimeoutError, Sender};

use crate::{Inbound, LoadError, Track};

/// 一次 `load` 的标识，单调递增
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct LoadId(pub u64);

impl LoadId {
    pub fn next(self) -> Self {
        LoadId(self.0 + 1)
    }
}

impl fmt::Display for LoadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 引擎异步信号（引擎 -> 控制流）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineSignal {
    /// 已就绪，可以 start；时长未知时为 0
    Ready { duration_ms: u64 },
    /// 就绪之前失败（源不可达或格式错误）
    LoadFailed(LoadError),
    /// 播放途中解码失败
    Fault(String),
    /// 播放到结尾（每次 load 至多一次）
    ReachedEnd,
}

/// 队列满时重试入队的间隔
const RETRY_WAIT: Duration = Duration::from_millis(20);

/// 引擎回调句柄
///
/// 每次 `load` 都会拿到一个新的句柄。被新的 `load` 取代之后，引擎应当
/// 直接丢弃旧句柄而不再发信号；即使发了，状态机也会按 [`LoadId`] 过滤掉。
#[derive(Debug, Clone)]
pub struct EngineCallback {
    load_id: LoadId,
    tx: Sender<Inbound>,
    abort: Option<Arc<AtomicBool>>,
}

impl EngineCallback {
    pub fn new(load_id: LoadId, tx: Sender<Inbound>) -> Self {
        Self {
            load_id,
            tx,
            abort: None,
        }
    }

    /// 绑定取消标志：置位后不再发信号，也不再等待已满的队列
    pub fn abort_on(mut self, flag: Arc<AtomicBool>) -> Self {
        self.abort = Some(flag);
        self
    }

    fn aborted(&self) -> bool {
        self.abort
            .as_ref()
            .map_or(false, |flag| flag.load(Ordering::Acquire))
    }

    pub fn load_id(&self) -> LoadId {
        self.load_id
    }

    pub fn ready(&self, duration_ms: u64) {
        self.emit(EngineSignal::Ready { duration_ms });
    }

    pub fn load_failed(&self, err: LoadError) {
        self.emit(EngineSignal::LoadFailed(err));
    }

    pub fn fault(&self, reason: impl Into<String>) {
        self.emit(EngineSignal::Fault(reason.into()));
    }

    pub fn reached_end(&self) {
        self.emit(EngineSignal::ReachedEnd);
    }

    fn emit(&self, signal: EngineSignal) {
        let mut msg = Inbound::Engine {
            load_id: self.load_id,
            signal,
        };
        loop {
            if self.aborted() {
                log::debug!("engine signal for load {} dropped: load cancelled", self.load_id);
                return;
            }
            match self.tx.send_timeout(msg, RETRY_WAIT) {
                Ok(()) => return,
                Err(SendTimeoutError::Timeout(m)) => msg = m,
                Err(SendTimeoutError::Disconnected(_)) => {
                    log::debug!("engine signal for load {} dropped: coordinator gone", self.load_id);
                    return;
                }
            }
        }
    }
}

/// 解码引擎
///
/// `start`/`pause`/`stop`/`seek` 在底层状态不合适时（例如未加载就 pause）
/// 必须是空操作而不是错误。除了 `stop` 与 `load` 要等旧的解码资源释放完，
/// 其余调用都不能阻塞调用方。
pub trait AudioEngine: Send {
    /// 开始加载曲目；之前未完成的加载被隐式取消且不再发信号
    fn load(&mut self, track: &Track, callback: EngineCallback) -> Result<(), LoadError>;

    fn start(&mut self);

    fn pause(&mut self);

    /// 停止并释放解码资源
    fn stop(&mut self);

    fn seek(&mut self, position_ms: u64);

    /// 当前播放位置（毫秒）
    fn position_ms(&self) -> u64;
}

impl<E: AudioEngine + ?Sized> AudioEngine for Box<E> {
    fn load(&mut self, track: &Track, callback: EngineCallback) -> Result<(), LoadError> {
        (**self).load(track, callback)
    }

    fn start(&mut self) {
        (**self).start()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn seek(&mut self, position_ms: u64) {
        (**self).seek(position_ms)
    }

    fn position_ms(&self) -> u64 {
        (**self).position_ms()
    }
}
