//! Time-based property tweening and the wheel-driven orbit carousel.
//!
//! The [`Carousel`] turns accumulated wheel input into discrete, rate-limited
//! steps. The [`Animator`] interpolates the orbit rotation and heading offsets
//! that those steps move, emitting update and completion events each frame.

pub mod animator;
pub mod carousel;
pub mod tween;

pub use animator::{Animator, AnimatorEvent};
pub use carousel::{
    Carousel, CarouselSettings, CarouselState, Direction, RotationState, Transition,
    index_from_rotation, wrap_snap,
};
pub use tween::{Easing, PropertyKey, Tween, TweenId};
