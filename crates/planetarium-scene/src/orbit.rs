//! The ring of bodies rotated as one rigid group.

use std::f32::consts::TAU;

use glam::{Mat4, Vec3};
use planetarium_config::SceneConfig;

/// Construction state of one body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyState {
    /// Texture not resolved yet; nothing is drawn.
    Pending,
    /// Constructed and drawn.
    Visible,
    /// Texture failed; the slot stays empty.
    Failed,
}

/// One slot on the ring.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Angle around the ring, radians.
    pub angle: f32,
    /// Position inside the group, before the group transform.
    pub position: Vec3,
    pub state: BodyState,
}

/// Bodies at equal angular offsets on a circle, sharing one Y rotation.
#[derive(Clone, Debug)]
pub struct OrbitGroup {
    bodies: Vec<Body>,
    body_radius: f32,
    tilt: f32,
    rotation_y: f32,
}

impl OrbitGroup {
    /// Body `i` sits at angle `i / count * 2π` on a circle of `orbit_radius`
    /// in the XZ plane. `tilt` rotates the whole group about X.
    pub fn new(count: usize, orbit_radius: f32, body_radius: f32, tilt: f32) -> Self {
        let bodies = (0..count)
            .map(|i| {
                let angle = i as f32 / count as f32 * TAU;
                Body {
                    angle,
                    position: Vec3::new(angle.cos() * orbit_radius, 0.0, angle.sin() * orbit_radius),
                    state: BodyState::Pending,
                }
            })
            .collect();

        Self {
            bodies,
            body_radius,
            tilt,
            rotation_y: 0.0,
        }
    }

    /// Creates `count` bodies laid out from the scene settings.
    pub fn from_config(config: &SceneConfig, count: usize) -> Self {
        Self::new(count, config.orbit_radius, config.body_radius, config.orbit_tilt)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Returns the group's Y rotation, radians.
    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    /// Sets the group's Y rotation, radians.
    pub fn set_rotation_y(&mut self, rotation_y: f32) {
        self.rotation_y = rotation_y;
    }

    /// Group transform: tilt about X, then the animated Y rotation.
    pub fn group_matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.tilt) * Mat4::from_rotation_y(self.rotation_y)
    }

    /// World matrix of body `index` for a unit sphere mesh.
    pub fn model_matrix(&self, index: usize) -> Option<Mat4> {
        let body = self.bodies.get(index)?;
        Some(
            self.group_matrix()
                * Mat4::from_translation(body.position)
                * Mat4::from_scale(Vec3::splat(self.body_radius)),
        )
    }

    /// `(index, matrix)` for every visible body.
    pub fn model_matrices(&self) -> Vec<(usize, Mat4)> {
        self.bodies
            .iter()
            .enumerate()
            .filter(|(_, body)| body.state == BodyState::Visible)
            .filter_map(|(i, _)| self.model_matrix(i).map(|m| (i, m)))
            .collect()
    }

    /// Mark a body constructed. Out-of-range indices are ignored.
    pub fn show(&mut self, index: usize) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.state = BodyState::Visible;
        }
    }

    /// Mark a body's texture as failed.
    pub fn mark_failed(&mut self, index: usize) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.state = BodyState::Failed;
        }
    }

    /// Returns how many bodies are drawn.
    pub fn visible_count(&self) -> usize {
        self.bodies
            .iter()
            .filter(|b| b.state == BodyState::Visible)
            .count()
    }
}
