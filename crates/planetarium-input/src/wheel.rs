//! Mouse wheel normalization.
//!
//! winit reports wheel motion either in lines (`LineDelta`, positive y = away
//! from the user) or in pixels (`PixelDelta`, trackpads). The carousel wants a
//! single convention: pixel-like units where positive means "forward", i.e.
//! scrolling down the page. [`WheelNormalizer`] does that conversion and
//! [`WheelLog`] keeps per-frame counters for debug output.

use winit::event::MouseScrollDelta;

/// Default pixel size of one wheel line.
pub const DEFAULT_PIXELS_PER_LINE: f32 = 100.0;

/// A normalized wheel event. Positive values mean forward/down/right.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelEvent {
    /// Vertical delta.
    pub delta_y: f32,
    /// Horizontal delta.
    pub delta_x: f32,
}

impl WheelEvent {
    /// Create an event from raw vertical/horizontal components.
    #[must_use]
    pub fn new(delta_y: f32, delta_x: f32) -> Self {
        Self { delta_y, delta_x }
    }

    /// The component the carousel acts on: vertical unless it is exactly zero.
    #[must_use]
    pub fn dominant(&self) -> f32 {
        if self.delta_y != 0.0 {
            self.delta_y
        } else {
            self.delta_x
        }
    }

    /// Both components are zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.delta_y == 0.0 && self.delta_x == 0.0
    }
}

/// Converts winit scroll deltas into [`WheelEvent`]s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelNormalizer {
    pixels_per_line: f32,
    invert: bool,
}

impl Default for WheelNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PIXELS_PER_LINE)
    }
}

impl WheelNormalizer {
    /// Create a normalizer. Non-positive line sizes fall back to the default.
    #[must_use]
    pub fn new(pixels_per_line: f32) -> Self {
        let pixels_per_line = if pixels_per_line > 0.0 {
            pixels_per_line
        } else {
            DEFAULT_PIXELS_PER_LINE
        };
        Self {
            pixels_per_line,
            invert: false,
        }
    }

    /// Flip the sign of every normalized event.
    #[must_use]
    pub fn inverted(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Normalize one winit delta. Zero deltas are passed through unchanged.
    #[must_use]
    pub fn normalize(&self, delta: MouseScrollDelta) -> WheelEvent {
        let event = match delta {
            MouseScrollDelta::LineDelta(x, y) => {
                WheelEvent::new(-y * self.pixels_per_line, -x * self.pixels_per_line)
            }
            MouseScrollDelta::PixelDelta(pos) => WheelEvent::new(-pos.y as f32, -pos.x as f32),
        };
        if self.invert {
            WheelEvent::new(-event.delta_y, -event.delta_x)
        } else {
            event
        }
    }
}

/// Per-frame wheel counters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WheelLog {
    events: u32,
    zero_events: u32,
    magnitude: f32,
}

impl WheelLog {
    /// Record a normalized event.
    pub fn record(&mut self, event: &WheelEvent) {
        self.events += 1;
        if event.is_zero() {
            self.zero_events += 1;
        }
        self.magnitude += event.dominant().abs();
    }

    /// Emit a debug line if anything happened, then reset.
    pub fn flush(&mut self) {
        if self.events > 0 {
            tracing::debug!(
                events = self.events,
                zero_events = self.zero_events,
                magnitude = self.magnitude,
                "wheel input"
            );
        }
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn test_line_delta_scales_and_flips() {
        let n = WheelNormalizer::default();
        let e = n.normalize(MouseScrollDelta::LineDelta(0.0, -1.0));
        assert_eq!(e, WheelEvent::new(100.0, 0.0));
        let e = n.normalize(MouseScrollDelta::LineDelta(0.5, 0.0));
        assert_eq!(e.delta_x, -50.0);
        assert_eq!(e.delta_y, 0.0);
    }

    #[test]
    fn test_pixel_delta_flips_sign() {
        let n = WheelNormalizer::default();
        let e = n.normalize(MouseScrollDelta::PixelDelta(PhysicalPosition::new(3.0, -12.0)));
        assert_eq!(e, WheelEvent::new(12.0, -3.0));
    }

    #[test]
    fn test_custom_line_size() {
        let n = WheelNormalizer::new(40.0);
        let e = n.normalize(MouseScrollDelta::LineDelta(0.0, -2.0));
        assert!((e.delta_y - 80.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_non_positive_line_size_uses_default() {
        assert_eq!(WheelNormalizer::new(0.0).pixels_per_line, DEFAULT_PIXELS_PER_LINE);
        assert_eq!(WheelNormalizer::new(-5.0).pixels_per_line, DEFAULT_PIXELS_PER_LINE);
    }

    #[test]
    fn test_inverted() {
        let n = WheelNormalizer::default().inverted(true);
        let e = n.normalize(MouseScrollDelta::LineDelta(0.0, -1.0));
        assert_eq!(e.delta_y, -100.0);
    }

    #[test]
    fn test_zero_event_passes_through() {
        let n = WheelNormalizer::default();
        let e = n.normalize(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 0.0)));
        assert!(e.is_zero());
        assert_eq!(e.dominant(), 0.0);
    }

    #[test]
    fn test_dominant_prefers_vertical() {
        assert_eq!(WheelEvent::new(-7.0, 30.0).dominant(), -7.0);
        assert_eq!(WheelEvent::new(0.0, 30.0).dominant(), 30.0);
    }

    #[test]
    fn test_wheel_log_accumulates_and_resets() {
        let mut log = WheelLog::default();
        log.record(&WheelEvent::new(-20.0, 0.0));
        log.record(&WheelEvent::new(0.0, 15.0));
        assert_eq!(log.events, 2);
        assert!((log.magnitude - 35.0).abs() < f32::EPSILON);
        log.flush();
        assert_eq!(log, WheelLog::default());
    }

    #[test]
    fn test_wheel_log_counts_zero_events() {
        let mut log = WheelLog::default();
        log.record(&WheelEvent::new(0.0, 0.0));
        log.record(&WheelEvent::new(0.0, -0.0));
        log.record(&WheelEvent::new(4.0, 0.0));
        assert_eq!(log.events, 3);
        assert_eq!(log.zero_events, 2);
        assert!((log.magnitude - 4.0).abs() < f32::EPSILON);
    }
}
