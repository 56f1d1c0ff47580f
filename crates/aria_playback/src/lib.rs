//! aria_playback - 后台播放协调器
//!
//! 持有唯一的播放会话，把来自应用桥接、系统媒体会话和通知栏的传输命令
//! 统一排入一条控制流，并据此驱动解码引擎、通知栏与前台保活。

mod command;
mod config;
mod coordinator;
mod engine;
mod error;
mod foreground;
mod machine;
pub mod navigator;
mod presenter;
mod router;
mod session;
mod track;

pub use command::*;
pub use config::*;
pub use coordinator::*;
pub use engine::*;
pub use error::*;
pub use foreground::*;
pub use machine::*;
pub use navigator::NextResult;
pub use presenter::*;
pub use router::*;
pub use session::*;
pub use track::*;
