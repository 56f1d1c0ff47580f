//! 曲目与播放列表

use serde::{Deserialize, Serialize};

/// 曲目（创建后不可变）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub source_uri: String,
    pub display_name: String,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        source_uri: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source_uri: source_uri.into(),
            display_name: display_name.into(),
        }
    }
}

/// 播放列表
///
/// 只由状态机持有；外部只能整体替换，不能局部修改。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    tracks: Vec<Track>,
    current_index: usize,
}

impl Playlist {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self {
            tracks,
            current_index: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// 选中指定曲目，越界时返回 `None` 且不改变当前索引
    pub fn select(&mut self, index: usize) -> Option<&Track> {
        if index < self.tracks.len() {
            self.current_index = index;
            self.tracks.get(index)
        } else {
            None
        }
    }
}
