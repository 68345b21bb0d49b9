//! Owns animated property values and the tweens driving them.

use std::collections::BTreeMap;

use crate::tween::{Easing, PropertyKey, Tween, TweenId};

/// Emitted by [`Animator::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimatorEvent {
    /// A property changed value.
    Updated {
        /// Property that changed.
        key: PropertyKey,
        /// New value.
        value: f32,
    },
    /// A tween reached its target. Always preceded by the final `Updated`.
    Completed {
        /// Tween that finished.
        id: TweenId,
        /// Property it drove.
        key: PropertyKey,
    },
}

/// Time-based property interpolation.
///
/// Each key has at most one active tween. Starting a new tween on a key that
/// is still animating replaces the old tween, which is dropped without a
/// completion event, and the new tween starts from the in-flight value.
#[derive(Debug, Default)]
pub struct Animator {
    values: BTreeMap<PropertyKey, f32>,
    tweens: Vec<Tween>,
    next_id: u64,
}

impl Animator {
    /// Create an animator. New tweens use [`Easing::EaseOut`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key` (0.0 if never written).
    pub fn value(&self, key: PropertyKey) -> f32 {
        self.values.get(&key).copied().unwrap_or(0.0)
    }

    /// Tween `key` by `delta` relative to its current value.
    pub fn by(&mut self, key: PropertyKey, delta: f32, duration: f32) -> TweenId {
        let id = self.allocate_id();
        let from = self.value(key);
        self.start(Tween::by(id, key, from, delta, duration, Easing::default()))
    }

    /// Set `key` instantly, cancelling any tween on it.
    pub fn set(&mut self, key: PropertyKey, value: f32) {
        self.tweens.retain(|t| t.key != key);
        self.values.insert(key, value);
    }

    /// Number of active tweens.
    pub fn active_count(&self) -> usize {
        self.tweens.len()
    }

    /// Advance every tween by `dt` seconds.
    ///
    /// Events come out in tween start order; all `Updated` events of a tick
    /// precede its `Completed` events.
    pub fn tick(&mut self, dt: f32) -> Vec<AnimatorEvent> {
        let mut updates = Vec::with_capacity(self.tweens.len());
        let mut completions = Vec::new();

        for tween in &mut self.tweens {
            let value = tween.advance(dt);
            self.values.insert(tween.key, value);
            updates.push(AnimatorEvent::Updated { key: tween.key, value });
            if tween.is_finished() {
                completions.push(AnimatorEvent::Completed {
                    id: tween.id,
                    key: tween.key,
                });
            }
        }
        self.tweens.retain(|t| !t.is_finished());

        updates.extend(completions);
        updates
    }

    fn allocate_id(&mut self) -> TweenId {
        self.next_id += 1;
        TweenId(self.next_id)
    }

    fn start(&mut self, tween: Tween) -> TweenId {
        let id = tween.id;
        if let Some(existing) = self.tweens.iter().position(|t| t.key == tween.key) {
            tracing::trace!(key = ?tween.key, "replacing in-flight tween");
            self.tweens.remove(existing);
        }
        self.tweens.push(tween);
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    const DT: f32 = 1.0 / 60.0;

    fn run_to_completion(animator: &mut Animator) -> Vec<AnimatorEvent> {
        let mut all = Vec::new();
        for _ in 0..600 {
            all.extend(animator.tick(DT));
            if animator.active_count() == 0 {
                break;
            }
        }
        all
    }

    #[test]
    fn test_unwritten_value_is_zero() {
        let animator = Animator::new();
        assert_eq!(animator.value(PropertyKey::OrbitRotationY), 0.0);
    }

    #[test]
    fn test_relative_tween_accumulates() {
        let mut animator = Animator::new();
        animator.by(PropertyKey::OrbitRotationY, FRAC_PI_2, 1.0);
        run_to_completion(&mut animator);
        animator.by(PropertyKey::OrbitRotationY, FRAC_PI_2, 1.0);
        run_to_completion(&mut animator);
        assert!((animator.value(PropertyKey::OrbitRotationY) - 2.0 * FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_relative_tween_after_set_starts_from_set_value() {
        let mut animator = Animator::new();
        animator.by(PropertyKey::HeadingOffset(1), -100.0, 1.0);
        run_to_completion(&mut animator);
        animator.set(PropertyKey::HeadingOffset(1), -300.0);
        animator.by(PropertyKey::HeadingOffset(1), 100.0, 0.5);
        run_to_completion(&mut animator);
        assert_eq!(animator.value(PropertyKey::HeadingOffset(1)), -200.0);
    }

    #[test]
    fn test_completion_emitted_once_after_final_update() {
        let mut animator = Animator::new();
        let id = animator.by(PropertyKey::HeadingOffset(0), -100.0, 1.0);
        let events = run_to_completion(&mut animator);

        let completions: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, AnimatorEvent::Completed { .. }))
            .collect();
        assert_eq!(completions.len(), 1);
        assert_eq!(
            *completions[0],
            AnimatorEvent::Completed { id, key: PropertyKey::HeadingOffset(0) }
        );

        let last_update = events
            .iter()
            .rev()
            .find_map(|e| match e {
                AnimatorEvent::Updated { value, .. } => Some(*value),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_update, -100.0);
        assert!(matches!(events.last(), Some(AnimatorEvent::Completed { .. })));
    }

    #[test]
    fn test_parallel_tweens_complete_same_tick() {
        let mut animator = Animator::new();
        animator.by(PropertyKey::OrbitRotationY, FRAC_PI_2, 1.0);
        for i in 0..4 {
            animator.by(PropertyKey::HeadingOffset(i), -100.0, 1.0);
        }
        assert_eq!(animator.active_count(), 5);

        let mut ticks = 0;
        let final_events = loop {
            let events = animator.tick(DT);
            ticks += 1;
            if animator.active_count() == 0 {
                break events;
            }
        };
        assert!(ticks >= 60);
        let completed = final_events
            .iter()
            .filter(|e| matches!(e, AnimatorEvent::Completed { .. }))
            .count();
        assert_eq!(completed, 5);
    }

    #[test]
    fn test_set_cancels_tween() {
        let mut animator = Animator::new();
        animator.by(PropertyKey::HeadingOffset(2), -100.0, 1.0);
        animator.tick(0.5);
        animator.set(PropertyKey::HeadingOffset(2), 0.0);
        assert_eq!(animator.active_count(), 0);
        assert!(animator.tick(DT).is_empty());
        assert_eq!(animator.value(PropertyKey::HeadingOffset(2)), 0.0);
    }

    #[test]
    fn test_replacing_tween_starts_from_in_flight_value() {
        let mut animator = Animator::new();
        animator.by(PropertyKey::OrbitRotationY, 1.0, 1.0);
        animator.tick(0.5);
        // Ease-out is at 0.75 halfway through.
        assert!((animator.value(PropertyKey::OrbitRotationY) - 0.75).abs() < 1e-5);
        animator.by(PropertyKey::OrbitRotationY, 1.0, 1.0);
        assert_eq!(animator.active_count(), 1);
        let events = run_to_completion(&mut animator);
        assert!((animator.value(PropertyKey::OrbitRotationY) - 1.75).abs() < 1e-5);
        let completions = events
            .iter()
            .filter(|e| matches!(e, AnimatorEvent::Completed { .. }))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut animator = Animator::new();
        let a = animator.by(PropertyKey::HeadingOffset(0), 1.0, 1.0);
        let b = animator.by(PropertyKey::HeadingOffset(1), 1.0, 1.0);
        assert_ne!(a, b);
    }
}
