//! Where an asset comes from.

use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::AssetError;

/// Upper bound on a remote response body.
const MAX_REMOTE_BYTES: u64 = 64 * 1024 * 1024;

/// A local file or a remote URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssetSource {
    /// A file on disk.
    Local(PathBuf),
    /// An `http` or `https` URL.
    Remote(String),
}

impl AssetSource {
    /// Interpret a configured asset string.
    ///
    /// URLs with an `http(s)` scheme are remote. Any other `scheme://` is
    /// rejected. Everything else is a path; relative paths (and paths written
    /// web-style with a leading `/`) resolve against `root`.
    pub fn parse(raw: &str, root: &Path) -> Result<Self, AssetError> {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(Self::Remote(raw.to_string()));
        }
        if raw.contains("://") {
            return Err(AssetError::UnsupportedScheme(raw.to_string()));
        }

        let path = Path::new(raw);
        if path.is_absolute() && path.exists() {
            return Ok(Self::Local(path.to_path_buf()));
        }
        let relative = raw.trim_start_matches('/');
        Ok(Self::Local(root.join(relative)))
    }

    /// Human-readable label used in logs and progress reports.
    pub fn label(&self) -> String {
        match self {
            Self::Local(path) => path.display().to_string(),
            Self::Remote(url) => url.clone(),
        }
    }

    /// Fetch the raw bytes. Blocking; call from a worker thread.
    pub fn fetch(&self) -> Result<Vec<u8>, AssetError> {
        match self {
            Self::Local(path) => std::fs::read(path).map_err(|source| AssetError::Io {
                path: path.clone(),
                source,
            }),
            Self::Remote(url) => {
                let response = ureq::get(url).call().map_err(|e| AssetError::Http {
                    url: url.clone(),
                    message: e.to_string(),
                })?;
                let mut bytes = Vec::new();
                response
                    .into_reader()
                    .take(MAX_REMOTE_BYTES)
                    .read_to_end(&mut bytes)
                    .map_err(|e| AssetError::Http {
                        url: url.clone(),
                        message: e.to_string(),
                    })?;
                Ok(bytes)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote() {
        let src = AssetSource::parse("https://example.com/sky.exr", Path::new("assets")).unwrap();
        assert_eq!(src, AssetSource::Remote("https://example.com/sky.exr".into()));
    }

    #[test]
    fn test_parse_relative_joins_root() {
        let src = AssetSource::parse("earth/map.jpg", Path::new("assets")).unwrap();
        assert_eq!(src, AssetSource::Local(PathBuf::from("assets/earth/map.jpg")));
    }

    #[test]
    fn test_parse_web_root_path_joins_root() {
        let src = AssetSource::parse("/does-not-exist/stars.jpg", Path::new("assets")).unwrap();
        assert_eq!(
            src,
            AssetSource::Local(PathBuf::from("assets/does-not-exist/stars.jpg"))
        );
    }

    #[test]
    fn test_parse_existing_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("stars.jpg");
        std::fs::write(&file, b"x").unwrap();
        let raw = file.to_string_lossy().to_string();
        let src = AssetSource::parse(&raw, Path::new("assets")).unwrap();
        assert_eq!(src, AssetSource::Local(file));
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        let err = AssetSource::parse("ftp://host/x.png", Path::new(".")).unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedScheme(_)));
    }

    #[test]
    fn test_fetch_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = AssetSource::Local(dir.path().join("missing.png"));
        assert!(matches!(src.fetch(), Err(AssetError::Io { .. })));
    }

    #[test]
    fn test_fetch_local_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("blob.bin");
        std::fs::write(&file, [1u8, 2, 3]).unwrap();
        assert_eq!(AssetSource::Local(file).fetch().unwrap(), vec![1, 2, 3]);
    }
}
