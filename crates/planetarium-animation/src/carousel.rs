//! Wheel debounce and orbit step state machine.
//!
//! Wheel magnitude accumulates while [`CarouselState::Idle`]. Crossing the
//! threshold fires exactly one [`Transition`] and locks the carousel for a
//! fixed cool-down; input during the lock is dropped, not queued. The lock
//! cannot be cancelled or restarted.

use std::f32::consts::TAU;
use std::time::Duration;

use planetarium_config::CarouselConfig;

/// Heading travel per step, in percent of one heading height.
pub const HEADING_STEP_PERCENT: f32 = 100.0;

/// Debounce and timing parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CarouselSettings {
    /// Accumulated magnitude needed to fire a step.
    pub threshold: f32,
    /// Lock duration after a step.
    pub cooldown: Duration,
    /// Duration of the rotation/heading tweens, seconds.
    pub step_duration: f32,
    /// Number of discrete orbit positions.
    pub positions: usize,
}

impl Default for CarouselSettings {
    fn default() -> Self {
        Self::from_config(&CarouselConfig::default(), 4)
    }
}

impl CarouselSettings {
    /// Build settings from the config section and the number of bodies.
    pub fn from_config(config: &CarouselConfig, positions: usize) -> Self {
        Self {
            threshold: config.threshold,
            cooldown: Duration::from_millis(config.cooldown_ms),
            step_duration: config.step_duration_s,
            positions: positions.max(1),
        }
    }

    /// Orbit rotation per step, radians.
    pub fn step_angle(&self) -> f32 {
        TAU / self.positions as f32
    }
}

/// Step direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Positive wheel delta (scrolling down).
    Forward,
    /// Negative wheel delta.
    Backward,
}

impl Direction {
    /// Direction of a non-zero delta. Zero counts as backward, matching `delta > 0`.
    pub fn from_delta(delta: f32) -> Self {
        if delta > 0.0 { Self::Forward } else { Self::Backward }
    }

    /// `+1` or `-1`.
    pub fn sign(self) -> i32 {
        match self {
            Self::Forward => 1,
            Self::Backward => -1,
        }
    }
}

/// Debouncer bookkeeping.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RotationState {
    /// Sum of absolute deltas since the last step.
    pub accumulated_delta: f32,
    /// A cool-down is running.
    pub is_locked: bool,
}

/// Observable phase of the state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CarouselState {
    /// Accepting input.
    Idle,
    /// Ignoring input until `remaining` elapses.
    Locked {
        /// Time left in the cool-down.
        remaining: Duration,
    },
}

/// One fired step. Both tweens it describes share `duration`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition {
    /// Step direction.
    pub direction: Direction,
    /// Index facing front before the step.
    pub departing_index: usize,
    /// Index facing front after the step.
    pub arriving_index: usize,
    /// Orbit Y rotation to add, radians.
    pub rotation_delta: f32,
    /// Offset to add to every heading, percent.
    pub heading_delta: f32,
    /// Tween duration, seconds.
    pub duration: f32,
    /// Heading offset to snap to once the heading tween completes.
    pub wrap: Option<f32>,
}

/// Heading offset to snap to after a step, if the step wrapped around.
///
/// Leaving the last position forward resets headings to `0%`; leaving the
/// first position backward resets them to `-(positions - 1) * 100%`.
pub fn wrap_snap(departing_index: usize, direction: Direction, positions: usize) -> Option<f32> {
    let last = positions.saturating_sub(1);
    match direction {
        Direction::Forward if departing_index == last => Some(0.0),
        Direction::Backward if departing_index == 0 => Some(-(last as f32) * HEADING_STEP_PERCENT),
        _ => None,
    }
}

/// Discrete index implied by an orbit rotation: `round((rot mod 2π) / step) mod positions`.
pub fn index_from_rotation(rotation_y: f32, positions: usize) -> usize {
    let positions = positions.max(1);
    let step = TAU / positions as f32;
    let steps = (rotation_y.rem_euclid(TAU) / step).round() as usize;
    steps % positions
}

/// The wheel-driven step state machine.
#[derive(Debug)]
pub struct Carousel {
    settings: CarouselSettings,
    rotation: RotationState,
    lock_remaining: Duration,
    index: usize,
    transitions_fired: u64,
    events_dropped: u64,
}

impl Carousel {
    /// Create an idle carousel facing index 0.
    pub fn new(settings: CarouselSettings) -> Self {
        Self {
            settings,
            rotation: RotationState::default(),
            lock_remaining: Duration::ZERO,
            index: 0,
            transitions_fired: 0,
            events_dropped: 0,
        }
    }

    /// Feed one normalized wheel event. Returns the fired step, if any.
    pub fn on_wheel_event(&mut self, delta_y: f32, delta_x: f32) -> Option<Transition> {
        if self.rotation.is_locked {
            self.events_dropped += 1;
            return None;
        }

        let delta = if delta_y != 0.0 { delta_y } else { delta_x };
        // NaN would poison the accumulator forever.
        if !delta.is_finite() {
            return None;
        }
        self.rotation.accumulated_delta += delta.abs();

        if self.rotation.accumulated_delta < self.settings.threshold {
            return None;
        }

        self.rotation = RotationState {
            accumulated_delta: 0.0,
            is_locked: true,
        };
        self.lock_remaining = self.settings.cooldown;

        let direction = Direction::from_delta(delta);
        let positions = self.settings.positions;
        let departing_index = self.index;
        let arriving_index =
            (departing_index as i64 + direction.sign() as i64).rem_euclid(positions as i64) as usize;
        self.index = arriving_index;
        self.transitions_fired += 1;

        let transition = Transition {
            direction,
            departing_index,
            arriving_index,
            rotation_delta: direction.sign() as f32 * self.settings.step_angle(),
            heading_delta: -(direction.sign() as f32) * HEADING_STEP_PERCENT,
            duration: self.settings.step_duration,
            wrap: wrap_snap(departing_index, direction, positions),
        };
        tracing::debug!(
            ?direction,
            departing_index,
            arriving_index,
            "carousel step fired"
        );
        Some(transition)
    }

    /// Advance the cool-down clock. Returns `true` if this call unlocked.
    pub fn advance(&mut self, dt: Duration) -> bool {
        if !self.is_locked() {
            return false;
        }
        self.lock_remaining = self.lock_remaining.saturating_sub(dt);
        if self.lock_remaining.is_zero() {
            self.rotation = RotationState::default();
            if self.events_dropped > 0 {
                tracing::trace!(dropped = self.events_dropped, "carousel unlocked");
            }
            self.events_dropped = 0;
            true
        } else {
            false
        }
    }

    /// Whether a cool-down is running.
    pub fn is_locked(&self) -> bool {
        self.rotation.is_locked
    }

    /// Current phase.
    pub fn state(&self) -> CarouselState {
        if self.is_locked() {
            CarouselState::Locked {
                remaining: self.lock_remaining,
            }
        } else {
            CarouselState::Idle
        }
    }

    /// Debouncer bookkeeping.
    pub fn rotation_state(&self) -> RotationState {
        self.rotation
    }

    /// Index currently facing front.
    pub fn current_index(&self) -> usize {
        self.index
    }

    /// Steps fired since creation.
    pub fn transitions_fired(&self) -> u64 {
        self.transitions_fired
    }

    /// Active settings.
    pub fn settings(&self) -> &CarouselSettings {
        &self.settings
    }
}
