//! Single-property tweens with easing.

/// Easing curves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// Constant speed, no acceleration.
    Linear,
    /// Slow start, fast end.
    EaseIn,
    /// Fast start, slow end.
    #[default]
    EaseOut,
    /// Slow start, fast middle, slow end.
    EaseInOut,
}

impl Easing {
    /// Map a linear progress value (0.0..=1.0) to an eased value.
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

/// An animatable scalar in the scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKey {
    /// Y rotation of the orbit group, radians.
    OrbitRotationY,
    /// Vertical offset of heading `i`, percent of one heading height.
    HeadingOffset(usize),
}

/// Handle returned when a tween is started.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TweenId(pub u64);

/// Interpolates one property from `from` to `to` over `duration` seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Tween {
    /// Handle of this tween.
    pub id: TweenId,
    /// Property being driven.
    pub key: PropertyKey,
    /// Value at the start of the tween.
    pub from: f32,
    /// Value at the end of the tween.
    pub to: f32,
    /// Total duration in seconds.
    pub duration: f32,
    /// Seconds elapsed so far.
    pub elapsed: f32,
    /// Easing curve.
    pub easing: Easing,
}

impl Tween {
    /// Create a tween between two absolute values.
    /// Non-positive or non-finite durations complete on the first advance.
    pub fn new(id: TweenId, key: PropertyKey, from: f32, to: f32, duration: f32, easing: Easing) -> Self {
        let duration = if duration.is_finite() { duration.max(0.0) } else { 0.0 };
        Self {
            id,
            key,
            from,
            to,
            duration,
            elapsed: 0.0,
            easing,
        }
    }

    /// Create a relative tween: `current += delta`.
    pub fn by(id: TweenId, key: PropertyKey, current: f32, delta: f32, duration: f32, easing: Easing) -> Self {
        Self::new(id, key, current, current + delta, duration, easing)
    }

    /// Linear progress in `0.0..=1.0`.
    pub fn progress(&self) -> f32 {
        if self.duration <= 0.0 {
            if self.elapsed > 0.0 { 1.0 } else { 0.0 }
        } else {
            (self.elapsed / self.duration).min(1.0)
        }
    }

    /// Current interpolated value. Exactly `to` once finished.
    pub fn value(&self) -> f32 {
        if self.is_finished() {
            return self.to;
        }
        let t = self.easing.apply(self.progress());
        self.from + (self.to - self.from) * t
    }

    /// Whether the tween has reached its end.
    pub fn is_finished(&self) -> bool {
        self.progress() >= 1.0
    }

    /// Advance by `dt` seconds and return the new value.
    pub fn advance(&mut self, dt: f32) -> f32 {
        // A zero-length tween still needs one advance to count as finished.
        self.elapsed += dt.max(0.0).max(f32::MIN_POSITIVE);
        self.value()
    }
}
