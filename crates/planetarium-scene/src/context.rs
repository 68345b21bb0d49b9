//! Per-frame scene state: the orbit, its headings and everything that moves them.

use std::time::Duration;

use glam::Vec3;
use planetarium_animation::{
    Animator, AnimatorEvent, Carousel, CarouselSettings, PropertyKey, Transition, TweenId,
    index_from_rotation,
};
use planetarium_assets::{AssetEvent, AssetLoader, DecodedImage};
use planetarium_config::Config;
use planetarium_input::WheelEvent;
use planetarium_render::SceneLighting;
use planetarium_space::EnvironmentLighting;

use crate::assets::{SceneAssetUpdate, SceneAssets};
use crate::headings::HeadingSet;
use crate::lights::Lights;
use crate::loading::LoadingOverlay;
use crate::orbit::OrbitGroup;

/// Decoded image the renderer should turn into a GPU texture.
#[derive(Debug)]
pub enum TextureUpload {
    Starfield(DecodedImage),
    Body { index: usize, image: DecodedImage },
}

/// Everything the renderer reads each frame.
pub struct SceneContext {
    orbit: OrbitGroup,
    headings: HeadingSet,
    lights: Lights,
    environment: EnvironmentLighting,
    loading: LoadingOverlay,
    assets: SceneAssets,
    animator: Animator,
    carousel: Carousel,
    /// Heading tween whose completion triggers a wrap, and the offset to snap to.
    pending_wrap: Option<(TweenId, f32)>,
}

impl SceneContext {
    /// Build the scene from a validated config.
    pub fn new(config: &Config) -> Self {
        let positions = config.positions();
        Self {
            orbit: OrbitGroup::from_config(&config.scene, positions),
            headings: HeadingSet::from_config(&config.headings),
            lights: Lights::from_config(&config.scene),
            environment: EnvironmentLighting::new(Vec3::from_array(config.scene.fallback_background)),
            loading: LoadingOverlay::new(),
            assets: SceneAssets::plan(&config.assets),
            animator: Animator::new(),
            carousel: Carousel::new(CarouselSettings::from_config(&config.carousel, positions)),
            pending_wrap: None,
        }
    }

    /// Queue every asset on `loader`.
    pub fn begin_loading(&mut self, loader: &AssetLoader) -> Vec<TextureUpload> {
        tracing::info!(assets = self.assets.len(), "loading scene assets");
        let updates = self.assets.begin(loader);
        self.apply_asset_updates(updates)
    }

    /// Apply one finished load. Returns the textures to upload.
    pub fn handle_asset_event(&mut self, event: AssetEvent) -> Vec<TextureUpload> {
        let updates = self.assets.handle(event);
        self.apply_asset_updates(updates)
    }

    fn apply_asset_updates(&mut self, updates: Vec<SceneAssetUpdate>) -> Vec<TextureUpload> {
        let mut uploads = Vec::new();
        for update in updates {
            match update {
                SceneAssetUpdate::Environment(image) => self.environment.apply_image(&image),
                SceneAssetUpdate::EnvironmentFailed => self.environment.mark_failed(),
                SceneAssetUpdate::Starfield(image) => uploads.push(TextureUpload::Starfield(image)),
                SceneAssetUpdate::StarfieldFailed => {
                    tracing::warn!("starfield unavailable, drawing the background colour only");
                }
                SceneAssetUpdate::BodyTexture { index, image } => {
                    uploads.push(TextureUpload::Body { index, image });
                }
                SceneAssetUpdate::BodyFailed { index } => self.orbit.mark_failed(index),
                SceneAssetUpdate::BodiesSettled { loaded, failed } => {
                    for &index in &loaded {
                        self.orbit.show(index);
                    }
                    tracing::info!(
                        visible = self.orbit.visible_count(),
                        failed = failed.len(),
                        "bodies constructed"
                    );
                }
                SceneAssetUpdate::Loading(event) => self.loading.on_event(&event),
            }
        }
        uploads
    }

    /// Feed one normalized wheel event. Starts the rotation and heading tweens
    /// when it fires a step.
    pub fn handle_wheel(&mut self, event: WheelEvent) -> Option<Transition> {
        let Some(transition) = self.carousel.on_wheel_event(event.delta_y, event.delta_x) else {
            tracing::trace!(
                accumulated = self.carousel.rotation_state().accumulated_delta,
                state = ?self.carousel.state(),
                "wheel input absorbed"
            );
            return None;
        };

        if let Some((_, snap)) = self.pending_wrap.take() {
            tracing::warn!(
                in_flight = self.animator.active_count(),
                "step started before the previous wrap completed"
            );
            self.snap_headings(snap);
        }

        self.animator
            .by(PropertyKey::OrbitRotationY, transition.rotation_delta, transition.duration);
        for i in 0..self.headings.len() {
            let id = self.animator.by(
                PropertyKey::HeadingOffset(i),
                transition.heading_delta,
                transition.duration,
            );
            if i == 0 {
                self.pending_wrap = transition.wrap.map(|snap| (id, snap));
            }
        }

        tracing::info!(
            direction = ?transition.direction,
            from = transition.departing_index,
            to = transition.arriving_index,
            heading = ?self.headings.front_index(),
            "orbit step"
        );
        Some(transition)
    }

    /// Advance the cool-down, tweens and loading fade by `dt`.
    pub fn update(&mut self, dt: Duration) {
        let seconds = dt.as_secs_f32();
        if self.carousel.advance(dt) {
            tracing::debug!("carousel unlocked");
        }

        for event in self.animator.tick(seconds) {
            match event {
                AnimatorEvent::Updated { key: PropertyKey::OrbitRotationY, value } => {
                    self.orbit.set_rotation_y(value);
                }
                AnimatorEvent::Updated { key: PropertyKey::HeadingOffset(i), value } => {
                    self.headings.set_offset(i, value);
                }
                AnimatorEvent::Completed { key: PropertyKey::OrbitRotationY, .. } => {
                    self.check_index();
                }
                AnimatorEvent::Completed { id, .. } => {
                    if let Some((wrap_id, snap)) = self.pending_wrap {
                        if wrap_id == id {
                            self.pending_wrap = None;
                            self.snap_headings(snap);
                        }
                    }
                }
            }
        }

        self.loading.update(seconds);
    }

    fn snap_headings(&mut self, offset: f32) {
        tracing::debug!(offset, "headings wrapped");
        for i in 0..self.headings.len() {
            self.animator.set(PropertyKey::HeadingOffset(i), offset);
            self.headings.set_offset(i, offset);
        }
    }

    fn check_index(&self) {
        let positions = self.carousel.settings().positions;
        let from_angle = index_from_rotation(self.orbit.rotation_y(), positions);
        let index = self.carousel.current_index();
        if from_angle != index {
            tracing::warn!(index, from_angle, "orbit rotation drifted from the carousel index");
        }
    }

    /// Returns the orbiting bodies and their group rotation.
    pub fn orbit(&self) -> &OrbitGroup {
        &self.orbit
    }

    /// Returns the heading strip.
    pub fn headings(&self) -> &HeadingSet {
        &self.headings
    }

    /// Returns the loading overlay.
    pub fn loading(&self) -> &LoadingOverlay {
        &self.loading
    }

    /// Mutable access for the renderer to consume the label-changed flag.
    pub fn loading_mut(&mut self) -> &mut LoadingOverlay {
        &mut self.loading
    }

    /// Returns the environment lighting state.
    pub fn environment(&self) -> &EnvironmentLighting {
        &self.environment
    }

    /// Returns the wheel carousel.
    pub fn carousel(&self) -> &Carousel {
        &self.carousel
    }

    /// Returns the planned assets and their progress.
    pub fn assets(&self) -> &SceneAssets {
        &self.assets
    }

    /// Lighting uniforms for this frame.
    pub fn scene_lighting(&self) -> SceneLighting {
        self.lights.scene_lighting(self.environment.radiance())
    }

    /// Linear RGB behind the starfield.
    pub fn background(&self) -> Vec3 {
        self.environment.background()
    }
}
