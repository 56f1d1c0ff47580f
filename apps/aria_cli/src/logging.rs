//! 终端日志
//!
//! `log` 记录经由 tracing-subscriber 的 `tracing-log` 桥接输出到 stderr。

use tracing_subscriber::EnvFilter;

/// 默认：本工作区的 crate 输出 debug，其余只输出 warn；可用 `RUST_LOG` 覆盖
const DEFAULT_FILTER: &str = "aria_playback=debug,aria_audio=debug,aria_cli=debug,warn";

pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(true)
        .try_init();

    if let Err(e) = result {
        eprintln!("logging already initialised: {}", e);
    }
}
