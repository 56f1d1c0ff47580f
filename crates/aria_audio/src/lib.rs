//! aria_audio - 解码与输出引擎
//!
//! 用 symphonia 解码本地音频、cpal 输出，实现 `aria_playback::AudioEngine`。

mod decoder;
mod engine;
mod output;
mod source;

pub use decoder::*;
pub use engine::*;
pub use output::*;
pub use source::*;
