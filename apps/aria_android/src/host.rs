//! Java 侧回调
//!
//! 协调器线程通过 `JavaVM` 调用 Java 监听器对象的方法：
//! `onNotification(String)`、`startForeground(String)`、`stopForeground()`、
//! `onEvent(String)`。Java 抛出的异常在这里清掉并记日志，不影响协调器。

use std::sync::Arc;

use jni::objects::{GlobalRef, JValue};
use jni::{JNIEnv, JavaVM};

use aria_playback::{ForegroundHost, MediaSurface, NotificationSnapshot};

const SIG_STRING: &str = "(Ljava/lang/String;)V";
const SIG_VOID: &str = "()V";

/// Java 监听器的句柄
#[derive(Clone)]
pub struct JavaListener {
    vm: Arc<JavaVM>,
    listener: GlobalRef,
}

impl JavaListener {
    pub fn new(vm: JavaVM, listener: GlobalRef) -> Self {
        Self {
            vm: Arc::new(vm),
            listener,
        }
    }

    /// 调用监听器方法；`arg` 为 `None` 时调用无参版本
    pub fn call(&self, method: &str, arg: Option<&str>) {
        let mut env = match self.vm.attach_current_thread_permanently() {
            Ok(env) => env,
            Err(e) => {
                log::error!("attach thread for {} failed: {}", method, e);
                return;
            }
        };

        let result = env.with_local_frame(4, |env| -> jni::errors::Result<()> {
            match arg {
                Some(text) => {
                    let jstr = env.new_string(text)?;
                    env.call_method(
                        self.listener.as_obj(),
                        method,
                        SIG_STRING,
                        &[JValue::Object(&jstr)],
                    )?;
                }
                None => {
                    env.call_method(self.listener.as_obj(), method, SIG_VOID, &[])?;
                }
            }
            Ok(())
        });

        if let Err(e) = result {
            clear_exception(&mut env);
            log::warn!("{} callback failed: {}", method, e);
        }
    }

    fn call_json<T: serde::Serialize>(&self, method: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.call(method, Some(&json)),
            Err(e) => log::error!("failed to encode {} payload: {}", method, e),
        }
    }
}

fn clear_exception(env: &mut JNIEnv<'_>) {
    if env.exception_check().unwrap_or(false) {
        let _ = env.exception_describe();
        let _ = env.exception_clear();
    }
}

impl MediaSurface for JavaListener {
    fn publish(&mut self, snapshot: &NotificationSnapshot) {
        self.call_json("onNotification", snapshot);
    }
}

impl ForegroundHost for JavaListener {
    fn promote(&mut self, snapshot: &NotificationSnapshot) {
        self.call_json("startForeground", snapshot);
    }

    fn demote(&mut self) {
        self.call("stopForeground", None);
    }
}
