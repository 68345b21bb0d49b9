//! Input normalization: winit wheel deltas mapped onto browser-style pixel deltas.

pub mod wheel;

pub use wheel::{WheelEvent, WheelLog, WheelNormalizer};
