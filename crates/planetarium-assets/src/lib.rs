//! Asynchronous texture loading.
//!
//! Images are fetched from disk or over HTTP and decoded on a small worker
//! pool; the event-loop thread drains finished [`AssetEvent`]s once per frame.
//! [`LoadingTracker`] reports overall progress for the loading screen and
//! [`TextureGroup`] aggregates the per-body textures with fail-fast semantics.

mod decode;
mod error;
mod group;
mod loader;
mod source;
mod tracker;

pub use decode::{DecodedImage, ImageKind, PixelData, decode_image};
pub use error::AssetError;
pub use group::{GroupStatus, TextureGroup};
pub use loader::{AssetEvent, AssetId, AssetLoader, AssetRequest};
pub use source::AssetSource;
pub use tracker::{LoadingEvent, LoadingTracker};
