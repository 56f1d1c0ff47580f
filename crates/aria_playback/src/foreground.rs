//! 前台保活
//!
//! 有活动播放且通知已推送过时提升为前台服务；停止后立即降级并移除通知。

use crate::{NotificationSnapshot, PlaybackState};

/// 宿主进程的前台控制（Android 上对应 startForeground/stopForeground）
pub trait ForegroundHost: Send {
    /// 提升为前台，附带要常驻的通知
    fn promote(&mut self, snapshot: &NotificationSnapshot);
    /// 降级并移除常驻通知
    fn demote(&mut self);
}

/// 前台状态变化
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForegroundChange {
    Promoted,
    Demoted,
    Unchanged,
}

pub struct ForegroundManager {
    host: Box<dyn ForegroundHost>,
    promoted: bool,
}

impl ForegroundManager {
    pub fn new(host: Box<dyn ForegroundHost>) -> Self {
        Self {
            host,
            promoted: false,
        }
    }

    pub fn is_promoted(&self) -> bool {
        self.promoted
    }

    /// 按当前状态同步；幂等
    pub fn sync(
        &mut self,
        state: PlaybackState,
        published: Option<&NotificationSnapshot>,
    ) -> ForegroundChange {
        match (state.is_active(), published, self.promoted) {
            (true, Some(snapshot), false) => {
                log::info!("promoting to foreground");
                self.host.promote(snapshot);
                self.promoted = true;
                ForegroundChange::Promoted
            }
            (false, _, true) => {
                log::info!("demoting from foreground");
                self.host.demote();
                self.promoted = false;
                ForegroundChange::Demoted
            }
            _ => ForegroundChange::Unchanged,
        }
    }
}
