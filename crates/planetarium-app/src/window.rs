//! Window creation and event handling via winit.
//!
//! Provides [`AppState`] which implements winit's [`ApplicationHandler`] trait,
//! and a [`run`] function to start the event loop.

use std::sync::Arc;

use planetarium_assets::AssetLoader;
use planetarium_config::Config;
use planetarium_input::{WheelLog, WheelNormalizer};
use planetarium_render::{RenderContext, SurfaceError, SurfaceWrapper, init_render_context_blocking};
use planetarium_scene::{SceneContext, TextureUpload};
use tracing::{error, info, instrument, warn};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Fullscreen, Window, WindowAttributes, WindowId};

use crate::frame_clock::FrameClock;
use crate::renderer::SceneRenderer;

/// Returns [`WindowAttributes`] based on the given configuration.
pub fn window_attributes_from_config(config: &Config) -> WindowAttributes {
    let attrs = WindowAttributes::default()
        .with_title(config.window.title.clone())
        .with_inner_size(winit::dpi::LogicalSize::new(
            config.window.width as f64,
            config.window.height as f64,
        ));
    if config.window.fullscreen {
        attrs.with_fullscreen(Some(Fullscreen::Borderless(None)))
    } else {
        attrs
    }
}

/// Application state: the window, its GPU resources and the scene.
pub struct AppState {
    /// Viewer configuration.
    pub config: Config,
    /// The window handle, wrapped in `Arc` for sharing with the surface.
    pub window: Option<Arc<Window>>,
    /// GPU context owning device, queue, and surface.
    pub gpu: Option<RenderContext>,
    /// Pipelines and textures; present once the GPU is up.
    pub renderer: Option<SceneRenderer>,
    /// Cross-platform surface wrapper that normalizes resize/DPI behavior.
    pub surface_wrapper: SurfaceWrapper,
    /// Orbit, headings, animation and loading state.
    pub scene: SceneContext,
    /// Background texture loader.
    pub loader: AssetLoader,
    /// Maps winit scroll deltas to pixel deltas.
    pub wheel: WheelNormalizer,
    wheel_log: WheelLog,
    clock: FrameClock,
    loading_started: bool,
}

impl AppState {
    /// Creates the application state from a validated [`Config`]. No window
    /// exists until the event loop resumes.
    pub fn new(config: Config) -> Self {
        let scene = SceneContext::new(&config);
        let loader = AssetLoader::new(config.assets.worker_threads);
        let wheel = WheelNormalizer::new(config.input.pixels_per_line)
            .inverted(config.input.invert_wheel);

        Self {
            surface_wrapper: SurfaceWrapper::new(config.window.width, config.window.height, 1.0),
            window: None,
            gpu: None,
            renderer: None,
            scene,
            loader,
            wheel,
            wheel_log: WheelLog::default(),
            clock: FrameClock::new(),
            loading_started: false,
            config,
        }
    }

    /// Queue every scene asset. Runs once, after the renderer exists.
    fn start_loading(&mut self) {
        if self.loading_started {
            return;
        }
        self.loading_started = true;
        let uploads = self.scene.begin_loading(&self.loader);
        self.apply_uploads(uploads);
    }

    fn apply_uploads(&mut self, uploads: Vec<TextureUpload>) {
        if let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) {
            for upload in uploads {
                renderer.upload(&gpu.device, &gpu.queue, upload);
            }
        }
    }

    /// Propagate the wrapper's current size to the surface, depth buffer and camera.
    fn apply_surface_size(&mut self) {
        let size = self.surface_wrapper.physical_size();
        if let Some(gpu) = &mut self.gpu {
            gpu.resize(size.width, size.height);
            if let Some(renderer) = &mut self.renderer {
                renderer.resize(&gpu.device, size.width, size.height);
            }
        }
    }

    /// One frame: drain loads, advance the scene, draw.
    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let dt = self.clock.tick();

        for event in self.loader.drain() {
            let uploads = self.scene.handle_asset_event(event);
            self.apply_uploads(uploads);
        }

        self.scene.update(dt);
        if self.config.debug.trace_wheel {
            self.wheel_log.flush();
        }

        // Some platforms report 0x0 until the window is mapped.
        if !self.surface_wrapper.is_configured() {
            return;
        }
        let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer) else {
            return;
        };
        match renderer.render(gpu, &mut self.scene) {
            Ok(()) => {}
            Err(SurfaceError::Lost) => {
                warn!("Surface lost, reconfiguring");
                self.apply_surface_size();
            }
            Err(SurfaceError::Timeout) => warn!("Surface timeout, skipping frame"),
            Err(SurfaceError::OutOfMemory) => {
                error!("GPU out of memory, shutting down");
                event_loop.exit();
            }
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attrs = window_attributes_from_config(&self.config);
        let window = match event_loop.create_window(attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        let scale_factor = window.scale_factor();
        let inner_size = window.inner_size();
        self.surface_wrapper = SurfaceWrapper::new(inner_size.width, inner_size.height, scale_factor);
        info!(
            "Surface wrapper initialized: {}x{} (scale: {:.2})",
            inner_size.width, inner_size.height, scale_factor
        );

        let gpu = match init_render_context_blocking(window.clone(), self.config.window.vsync) {
            Ok(gpu) => gpu,
            Err(e) => {
                error!("GPU initialization failed: {e}");
                event_loop.exit();
                return;
            }
        };

        match SceneRenderer::new(
            &gpu,
            &self.config,
            &self.scene,
            self.surface_wrapper.physical_size(),
            scale_factor,
        ) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => {
                error!("Renderer initialization failed: {e}");
                event_loop.exit();
                return;
            }
        }

        self.gpu = Some(gpu);
        self.start_loading();
        self.clock.reset();
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key: Key::Named(NamedKey::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                info!("Escape pressed, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(resize) = self
                    .surface_wrapper
                    .handle_resize(new_size.width, new_size.height)
                {
                    self.apply_surface_size();
                    let (logical_width, logical_height) = self.surface_wrapper.logical_size();
                    info!(
                        "Window resized to {}x{} ({:.0}x{:.0} logical, scale: {:.2})",
                        resize.physical.width,
                        resize.physical.height,
                        logical_width,
                        logical_height,
                        resize.scale_factor
                    );
                }
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                let Some(window) = &self.window else {
                    return;
                };
                let inner = window.inner_size();
                let resize = self.surface_wrapper.handle_scale_factor_changed(
                    scale_factor,
                    inner.width,
                    inner.height,
                );
                self.apply_surface_size();
                if let (Some(gpu), Some(renderer)) = (&self.gpu, &mut self.renderer)
                    && let Err(e) =
                        renderer.set_scale_factor(&gpu.device, &gpu.queue, &self.scene, scale_factor)
                {
                    error!("Failed to re-rasterize labels: {e}");
                }
                info!(
                    "Scale factor changed to {:.2}, resized to {}x{}",
                    scale_factor, resize.physical.width, resize.physical.height
                );
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let wheel = self.wheel.normalize(delta);
                if self.config.debug.trace_wheel {
                    self.wheel_log.record(&wheel);
                }
                self.scene.handle_wheel(wheel);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        let tracker = self.scene.assets().tracker();
        info!(
            frames = self.clock.frame_count(),
            animated_secs = self.clock.total_time().as_secs_f32(),
            clamped_frames = self.clock.clamped_count(),
            orbit_steps = self.scene.carousel().transitions_fired(),
            assets_loaded = tracker.loaded(),
            assets_failed = tracker.failed(),
            environment = ?self.scene.environment().state(),
            pending_assets = self.loader.pending(),
            "Shutting down"
        );
        self.loader.shutdown();
    }
}

/// Creates an event loop and runs the viewer until the window closes.
///
/// # Errors
///
/// Returns the winit error if the event loop cannot be created or fails.
#[instrument(skip(config))]
pub fn run(config: Config) -> Result<(), winit::error::EventLoopError> {
    let event_loop = EventLoop::new()?;
    let mut app = AppState::new(config);
    event_loop.run_app(&mut app)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_config() -> Config {
        let mut config = Config::default();
        config.assets.root = "/nonexistent-assets".into();
        config.assets.environment = "env.exr".into();
        config
    }

    #[test]
    fn test_initial_dimensions() {
        let state = AppState::new(offline_config());
        assert_eq!(state.surface_wrapper.physical_size().width, 1280);
        assert_eq!(state.surface_wrapper.physical_size().height, 720);
        assert!(state.window.is_none());
        assert!(state.renderer.is_none());
    }

    #[test]
    fn test_resize_tracking() {
        let mut state = AppState::new(offline_config());
        state.surface_wrapper.handle_resize(1920, 1080);
        assert_eq!(state.surface_wrapper.physical_size().width, 1920);
        assert_eq!(state.surface_wrapper.physical_size().height, 1080);
    }

    #[test]
    fn test_wheel_settings_come_from_config() {
        let mut config = offline_config();
        config.input.pixels_per_line = 40.0;
        let state = AppState::new(config);
        assert_eq!(state.wheel, WheelNormalizer::new(40.0));
    }

    #[test]
    fn test_start_loading_runs_once() {
        let mut state = AppState::new(offline_config());
        state.start_loading();
        assert!(state.loading_started);
        assert_eq!(state.scene.assets().tracker().total(), 6);
        // Second call is a no-op.
        state.start_loading();
        assert_eq!(state.scene.assets().tracker().total(), 6);
    }

    #[test]
    fn test_window_attributes_from_config() {
        let mut config = offline_config();
        config.window.fullscreen = true;
        let attrs = window_attributes_from_config(&config);
        assert_eq!(attrs.title, "Planetarium");
        assert!(attrs.fullscreen.is_some());
    }
}
