//! 播放列表导航
//!
//! 纯函数：根据随机/循环策略计算上一首、下一首的索引。

use rand::Rng;

use crate::{Playlist, RepeatMode};

/// 导航结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextResult {
    Index(usize),
    Stop,
}

/// 下一首
///
/// 随机模式下在 `[0, len)` 中均匀取值，可能重复选中当前曲目。
/// 顺序模式下走到末尾时，只有 `RepeatMode::All` 会回到开头。
pub fn next<R: Rng>(
    playlist: &Playlist,
    shuffle: bool,
    repeat: RepeatMode,
    rng: &mut R,
) -> NextResult {
    let len = playlist.len();
    if len == 0 {
        return NextResult::Stop;
    }
    if shuffle {
        return NextResult::Index(rng.gen_range(0..len));
    }

    let i = playlist.current_index() + 1;
    if i < len {
        NextResult::Index(i)
    } else if repeat == RepeatMode::All {
        NextResult::Index(0)
    } else {
        NextResult::Stop
    }
}

/// 上一首，永远不会返回 `Stop`
pub fn previous<R: Rng>(
    playlist: &Playlist,
    shuffle: bool,
    repeat: RepeatMode,
    rng: &mut R,
) -> NextResult {
    let len = playlist.len();
    if len == 0 {
        return NextResult::Index(0);
    }
    if shuffle {
        return NextResult::Index(rng.gen_range(0..len));
    }

    match playlist.current_index().checked_sub(1) {
        Some(i) => NextResult::Index(i),
        None if repeat == RepeatMode::All => NextResult::Index(len - 1),
        None => NextResult::Index(0),
    }
}
