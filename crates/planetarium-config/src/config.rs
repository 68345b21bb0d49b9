//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level viewer configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Window settings.
    pub window: WindowConfig,
    /// Camera and rendering settings.
    pub render: RenderConfig,
    /// Wheel input normalization.
    pub input: InputConfig,
    /// Wheel debounce and transition timing.
    pub carousel: CarouselConfig,
    /// Orbit layout and lighting.
    pub scene: SceneConfig,
    /// Asset locations.
    pub assets: AssetsConfig,
    /// Heading labels shown next to the orbit.
    pub headings: HeadingsConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Window configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in logical pixels.
    pub width: u32,
    /// Window height in logical pixels.
    pub height: u32,
    /// Start in fullscreen mode.
    pub fullscreen: bool,
    /// Enable vsync (PresentMode::Fifo).
    pub vsync: bool,
    /// Window title.
    pub title: String,
}

/// Camera and rendering configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    /// Near clip plane.
    pub near: f32,
    /// Far clip plane.
    pub far: f32,
    /// Camera distance from the orbit center along +Z.
    pub camera_distance: f32,
}

/// Wheel input configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InputConfig {
    /// Pixels reported per wheel line (line-based devices).
    pub pixels_per_line: f32,
    /// Flip the wheel direction.
    pub invert_wheel: bool,
}

/// Debounce and transition timing for the orbit carousel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CarouselConfig {
    /// Accumulated wheel magnitude needed to trigger one step.
    pub threshold: f32,
    /// Lock duration after a step, in milliseconds.
    pub cooldown_ms: u64,
    /// Duration of the rotation and heading tweens, in seconds.
    pub step_duration_s: f32,
}

/// Orbit layout and lighting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SceneConfig {
    /// Radius of the circle the bodies sit on.
    pub orbit_radius: f32,
    /// Radius of each body.
    pub body_radius: f32,
    /// Horizontal sphere segments.
    pub width_segments: u32,
    /// Vertical sphere segments.
    pub height_segments: u32,
    /// Fixed tilt of the orbit group around X, in radians.
    pub orbit_tilt: f32,
    /// Ambient light intensity.
    pub ambient_intensity: f32,
    /// Directional light intensity.
    pub directional_intensity: f32,
    /// Brightness multiplier for the starfield backdrop.
    pub starfield_intensity: f32,
    /// Directional light position (the light points at the origin).
    pub directional_position: [f32; 3],
    /// Background used when the environment map fails to load.
    pub fallback_background: [f32; 3],
}

/// Asset locations. Relative entries resolve against `root`; `http(s)` entries are fetched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory local asset paths are resolved against.
    pub root: PathBuf,
    /// Equirectangular starfield texture.
    pub starfield: String,
    /// Equirectangular environment image used for ambient reflection lighting.
    pub environment: String,
    /// One surface texture per orbiting body.
    pub bodies: Vec<String>,
    /// Number of background loader threads.
    pub worker_threads: usize,
}

/// Heading labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HeadingsConfig {
    /// One label per body, in orbit order.
    pub labels: Vec<String>,
    /// Integer scale applied to the 8x8 glyphs.
    pub glyph_scale: u32,
    /// Distance of the heading window from the top of the screen, in logical pixels.
    pub top_margin: f32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Log every normalized wheel event at debug level.
    pub trace_wheel: bool,
}

// --- Default implementations ---

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            fullscreen: false,
            vsync: true,
            title: "Planetarium".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            camera_distance: 9.0,
        }
    }
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            pixels_per_line: 100.0,
            invert_wheel: false,
        }
    }
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            threshold: 50.0,
            cooldown_ms: 1000,
            step_duration_s: 1.0,
        }
    }
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            orbit_radius: 6.9,
            body_radius: 1.5,
            width_segments: 30,
            height_segments: 32,
            orbit_tilt: 0.2,
            ambient_intensity: 0.5,
            directional_intensity: 1.0,
            starfield_intensity: 1.0,
            directional_position: [5.0, 5.0, 5.0],
            fallback_background: [0.0, 0.0, 0.0],
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("assets"),
            starfield: "stars.jpg".to_string(),
            environment:
                "https://dl.polyhaven.org/file/ph-assets/HDRIs/exr/1k/versveldpas_1k.exr"
                    .to_string(),
            bodies: vec![
                "csilla/color.png".to_string(),
                "earth/map.jpg".to_string(),
                "venus/map.jpg".to_string(),
                "volcanic/color.png".to_string(),
            ],
            worker_threads: 2,
        }
    }
}

impl Default for HeadingsConfig {
    fn default() -> Self {
        Self {
            labels: vec![
                "CSILLA".to_string(),
                "EARTH".to_string(),
                "VENUS".to_string(),
                "VOLCANIC".to_string(),
            ],
            glyph_scale: 8,
            top_margin: 48.0,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            trace_wheel: false,
        }
    }
}

// --- Validation ---

impl Config {
    /// Check cross-field constraints that serde defaults cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.assets.bodies.is_empty() {
            return Err(ConfigError::Invalid("at least one body texture is required".into()));
        }
        if self.assets.bodies.len() != self.headings.labels.len() {
            return Err(ConfigError::Invalid(format!(
                "{} body textures but {} heading labels",
                self.assets.bodies.len(),
                self.headings.labels.len()
            )));
        }
        if !(self.carousel.threshold > 0.0) {
            return Err(ConfigError::Invalid("carousel threshold must be positive".into()));
        }
        if !(self.carousel.step_duration_s > 0.0) {
            return Err(ConfigError::Invalid("step duration must be positive".into()));
        }
        if (self.carousel.cooldown_ms as f64) < f64::from(self.carousel.step_duration_s) * 1000.0 {
            return Err(ConfigError::Invalid(format!(
                "cool-down of {} ms is shorter than the {} s step",
                self.carousel.cooldown_ms, self.carousel.step_duration_s
            )));
        }
        if self.render.near <= 0.0 || self.render.far <= self.render.near {
            return Err(ConfigError::Invalid(format!(
                "invalid clip planes: near={} far={}",
                self.render.near, self.render.far
            )));
        }
        Ok(())
    }

    /// Number of discrete orbit positions.
    pub fn positions(&self) -> usize {
        self.assets.bodies.len()
    }
}

// --- Load / Save ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("width: 1280"));
        assert!(ron_str.contains("threshold: 50.0"));
        assert!(ron_str.contains("cooldown_ms: 1000"));
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
        assert_eq!(Config::default().positions(), 4);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(window: (), render: ())";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.carousel, CarouselConfig::default());
        assert_eq!(config.assets, AssetsConfig::default());
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_mismatched_labels_rejected() {
        let mut config = Config::default();
        config.headings.labels.pop();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("4 body textures but 3 heading labels"));
    }

    #[test]
    fn test_non_positive_threshold_rejected() {
        let mut config = Config::default();
        config.carousel.threshold = 0.0;
        assert!(config.validate().is_err());
        config.carousel.threshold = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cooldown_shorter_than_step_rejected() {
        let mut config = Config::default();
        config.carousel.cooldown_ms = 500;
        assert!(config.validate().is_err());
        config.carousel.cooldown_ms = 1000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_clip_planes_rejected() {
        let mut config = Config::default();
        config.render.far = 0.05;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.window.width = 1920;
        config.carousel.threshold = 120.0;
        config.assets.environment = "env/sky.hdr".to_string();

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join("config.ron").exists());
    }

    #[test]
    fn test_load_or_create_reads_edited_file() {
        let dir = tempfile::tempdir().unwrap();
        Config::default().save(dir.path()).unwrap();

        let path = dir.path().join("config.ron");
        let edited = std::fs::read_to_string(&path)
            .unwrap()
            .replace("cooldown_ms: 1000", "cooldown_ms: 1500");
        std::fs::write(&path, edited).unwrap();

        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(loaded.carousel.cooldown_ms, 1500);
        assert!(loaded.validate().is_ok());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
