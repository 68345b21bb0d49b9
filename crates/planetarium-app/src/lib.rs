//! Planetarium viewer shell.
//!
//! Provides window creation, event handling, frame timing, and the renderer
//! that draws the scene each frame.

pub mod frame_clock;
pub mod platform;
pub mod renderer;
pub mod window;

pub use window::{AppState, run};
