//! Viewer configuration.
//!
//! Settings persist to disk as `config.ron` in the platform config directory.
//! Every section is `#[serde(default)]`, so older or partial files keep
//! loading, and the handful of startup flags can be overridden via clap.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    AssetsConfig, CarouselConfig, Config, DebugConfig, HeadingsConfig, InputConfig,
    RenderConfig, SceneConfig, WindowConfig,
};
pub use error::ConfigError;
