//! 音源定位
//!
//! 只接受本地路径和 `file://` URI，其余协议视为不可达。

use std::path::{Path, PathBuf};

use aria_playback::LoadError;

/// 解析出的本地音源
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSource {
    pub path: PathBuf,
}

impl LocalSource {
    /// 解析曲目的 source_uri
    pub fn resolve(uri: &str) -> Result<Self, LoadError> {
        let uri = uri.trim();
        if uri.is_empty() {
            return Err(LoadError::Unreachable("empty source uri".to_string()));
        }

        let path = match uri.split_once("://") {
            Some((scheme, rest)) if scheme.eq_ignore_ascii_case("file") => percent_decode(rest),
            Some((scheme, _)) => {
                return Err(LoadError::Unreachable(format!(
                    "unsupported scheme '{}': {}",
                    scheme, uri
                )))
            }
            None => uri.to_string(),
        };

        if path.is_empty() {
            return Err(LoadError::Unreachable(format!("no path in {}", uri)));
        }
        Ok(Self {
            path: PathBuf::from(path),
        })
    }

    /// 扩展名（小写），作为探测格式的提示
    pub fn extension_hint(&self) -> Option<String> {
        extension_of(&self.path)
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// `file://` URI 里的 %XX 转义
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
            if let Some(b) = hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                out.push(b);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_path() {
        let src = LocalSource::resolve("/sdcard/Music/Song.MP3").unwrap();
        assert_eq!(src.path, PathBuf::from("/sdcard/Music/Song.MP3"));
        assert_eq!(src.extension_hint().as_deref(), Some("mp3"));
    }

    #[test]
    fn test_file_uri() {
        let src = LocalSource::resolve("file:///storage/emulated/0/My%20Song.flac").unwrap();
        assert_eq!(src.path, PathBuf::from("/storage/emulated/0/My Song.flac"));
        assert_eq!(src.extension_hint().as_deref(), Some("flac"));
    }

    #[test]
    fn test_bad_escape_kept_verbatim() {
        let src = LocalSource::resolve("file:///music/100%.ogg").unwrap();
        assert_eq!(src.path, PathBuf::from("/music/100%.ogg"));
    }

    #[test]
    fn test_remote_schemes_unreachable() {
        for uri in ["http://host/a.mp3", "https://host/a.mp3", "content://media/1"] {
            assert!(matches!(
                LocalSource::resolve(uri),
                Err(LoadError::Unreachable(_))
            ));
        }
    }

    #[test]
    fn test_empty_unreachable() {
        assert!(LocalSource::resolve("  ").is_err());
        assert!(LocalSource::resolve("file://").is_err());
    }
}
