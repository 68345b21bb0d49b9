//! Variable-rate frame timing.
//!
//! Tweens and the carousel cool-down run on wall-clock time, so each frame
//! samples the clock once and hands the same delta to every consumer. Long
//! stalls (window drags, breakpoints) are clamped so animations resume where
//! they left off instead of jumping to their end.

use std::time::{Duration, Instant};
use tracing::warn;

/// Longest frame delta passed on to the scene.
pub const MAX_FRAME_TIME: Duration = Duration::from_millis(250);

/// Measures the time between consecutive frames.
pub struct FrameClock {
    previous_time: Instant,
    total_time: Duration,
    frame_count: u64,
    clamped_count: u64,
}

impl FrameClock {
    /// Creates a clock starting from the current instant.
    pub fn new() -> Self {
        Self {
            previous_time: Instant::now(),
            total_time: Duration::ZERO,
            frame_count: 0,
            clamped_count: 0,
        }
    }

    /// Restart timing from now without counting the gap as a frame.
    pub fn reset(&mut self) {
        self.previous_time = Instant::now();
    }

    /// Sample the clock and return the delta since the previous frame.
    pub fn tick(&mut self) -> Duration {
        let now = Instant::now();
        let raw = now.duration_since(self.previous_time);
        self.previous_time = now;
        self.advance(raw)
    }

    /// Account for one frame of length `raw`, clamped to [`MAX_FRAME_TIME`].
    pub fn advance(&mut self, raw: Duration) -> Duration {
        let dt = if raw > MAX_FRAME_TIME {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                raw.as_secs_f64() * 1000.0,
                MAX_FRAME_TIME.as_secs_f64() * 1000.0
            );
            self.clamped_count += 1;
            MAX_FRAME_TIME
        } else {
            raw
        };
        self.total_time += dt;
        self.frame_count += 1;
        dt
    }

    /// Frames measured so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Sum of all (clamped) frame deltas.
    pub fn total_time(&self) -> Duration {
        self.total_time
    }

    /// Frames whose delta hit the clamp.
    pub fn clamped_count(&self) -> u64 {
        self.clamped_count
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_micros(16_667);

    #[test]
    fn test_normal_frame_passes_through() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(FRAME), FRAME);
        assert_eq!(clock.frame_count(), 1);
        assert_eq!(clock.clamped_count(), 0);
    }

    #[test]
    fn test_long_frame_is_clamped() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(Duration::from_secs(3)), MAX_FRAME_TIME);
        assert_eq!(clock.clamped_count(), 1);
        assert_eq!(clock.total_time(), MAX_FRAME_TIME);
    }

    #[test]
    fn test_exactly_max_is_not_clamped() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(MAX_FRAME_TIME), MAX_FRAME_TIME);
        assert_eq!(clock.clamped_count(), 0);
    }

    #[test]
    fn test_zero_frame_time() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance(Duration::ZERO), Duration::ZERO);
        assert_eq!(clock.frame_count(), 1);
    }

    #[test]
    fn test_total_time_accumulates() {
        let mut clock = FrameClock::new();
        let frame_times = [17, 15, 20, 16, 33, 8, 18];
        for ms in frame_times {
            clock.advance(Duration::from_millis(ms));
        }
        assert_eq!(clock.total_time(), Duration::from_millis(frame_times.iter().sum()));
        assert_eq!(clock.frame_count(), frame_times.len() as u64);
    }

    #[test]
    fn test_tick_is_monotonic() {
        let mut clock = FrameClock::default();
        let first = clock.tick();
        let second = clock.tick();
        assert!(first <= MAX_FRAME_TIME);
        assert!(second <= MAX_FRAME_TIME);
        assert_eq!(clock.frame_count(), 2);
    }
}
