//! Scene light setup.

use glam::Vec3;
use planetarium_config::SceneConfig;
use planetarium_render::SceneLighting;

/// White ambient plus one white directional light aimed at the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lights {
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub directional_color: Vec3,
    pub directional_intensity: f32,
    pub directional_position: Vec3,
}

impl Lights {
    pub fn from_config(config: &SceneConfig) -> Self {
        Self {
            ambient_color: Vec3::ONE,
            ambient_intensity: config.ambient_intensity,
            directional_color: Vec3::ONE,
            directional_intensity: config.directional_intensity,
            directional_position: Vec3::from_array(config.directional_position),
        }
    }

    /// Lighting for the sphere pipeline, with the environment radiance if bound.
    pub fn scene_lighting(&self, environment: Option<Vec3>) -> SceneLighting {
        SceneLighting {
            ambient_color: self.ambient_color,
            ambient_intensity: self.ambient_intensity,
            directional_color: self.directional_color,
            directional_intensity: self.directional_intensity,
            directional_position: self.directional_position,
            environment,
        }
    }
}

impl Default for Lights {
    fn default() -> Self {
        Self::from_config(&SceneConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_lights() {
        let lights = Lights::default();
        assert_eq!(lights.ambient_intensity, 0.5);
        assert_eq!(lights.directional_intensity, 1.0);
        assert_eq!(lights.directional_position, Vec3::splat(5.0));
        assert_eq!(lights.ambient_color, Vec3::ONE);
    }

    #[test]
    fn test_scene_lighting_carries_environment() {
        let lighting = Lights::default().scene_lighting(Some(Vec3::splat(0.3)));
        assert_eq!(lighting.environment, Some(Vec3::splat(0.3)));
        assert_eq!(lighting, SceneLighting {
            environment: Some(Vec3::splat(0.3)),
            ..SceneLighting::default()
        });
    }
}
