//! Asset error types.

use std::path::PathBuf;

/// Errors raised while fetching or decoding an asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Reading a local file failed.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// An HTTP fetch failed or returned an error status.
    #[error("failed to fetch {url}: {message}")]
    Http {
        /// Requested URL.
        url: String,
        /// Transport or status description.
        message: String,
    },

    /// The bytes could not be decoded as an image.
    #[error("failed to decode {name}: {source}")]
    Decode {
        /// Asset label.
        name: String,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },

    /// The source uses a URL scheme other than `http` or `https`.
    #[error("unsupported asset scheme in {0}")]
    UnsupportedScheme(String),

    /// The loader shut down before the request completed.
    #[error("asset loader is shut down")]
    Shutdown,
}
