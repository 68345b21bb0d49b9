//! Image-based ambient light from an equirectangular environment map.
//!
//! The map is reduced on the CPU to one solid-angle weighted average radiance,
//! which tints the bodies' ambient term. A failed load leaves a flat
//! background colour and plain ambient light.

use glam::Vec3;
use planetarium_assets::{DecodedImage, PixelData};

/// Where the environment stands.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EnvironmentState {
    Pending,
    Ready { radiance: Vec3 },
    Failed,
}

/// Environment contribution to scene lighting and background.
#[derive(Clone, Debug)]
pub struct EnvironmentLighting {
    state: EnvironmentState,
    fallback_background: Vec3,
}

impl EnvironmentLighting {
    pub fn new(fallback_background: Vec3) -> Self {
        Self {
            state: EnvironmentState::Pending,
            fallback_background,
        }
    }

    /// Reduce a decoded map to its average radiance.
    pub fn apply_image(&mut self, image: &DecodedImage) {
        let radiance = average_radiance(image);
        log::info!(
            "Environment ready ({}x{}), average radiance ({:.3}, {:.3}, {:.3})",
            image.width,
            image.height,
            radiance.x,
            radiance.y,
            radiance.z
        );
        self.state = EnvironmentState::Ready { radiance };
    }

    /// Switch to the flat background.
    pub fn mark_failed(&mut self) {
        log::error!("Failed to load environment map, using a flat background");
        self.state = EnvironmentState::Failed;
    }

    pub fn state(&self) -> EnvironmentState {
        self.state
    }

    /// Average radiance while an environment is bound.
    pub fn radiance(&self) -> Option<Vec3> {
        match self.state {
            EnvironmentState::Ready { radiance } => Some(radiance),
            _ => None,
        }
    }

    /// Colour behind everything; the environment only lights, it is never drawn.
    pub fn background(&self) -> Vec3 {
        self.fallback_background
    }
}

impl Default for EnvironmentLighting {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

/// Average radiance of an equirectangular image, each row weighted by the
/// solid angle it covers. Non-finite texels are skipped.
pub fn average_radiance(image: &DecodedImage) -> Vec3 {
    if image.pixel_count() == 0 {
        return Vec3::ZERO;
    }
    let (width, height) = (image.width as usize, image.height as usize);

    let mut sum = glam::DVec3::ZERO;
    let mut weight_sum = 0.0_f64;

    for row in 0..height {
        let theta = (row as f64 + 0.5) / height as f64 * std::f64::consts::PI;
        let weight = theta.sin();
        for column in 0..width {
            let offset = (row * width + column) * 4;
            let texel = match &image.pixels {
                PixelData::Rgba8(data) => data
                    .get(offset..offset + 3)
                    .map(|p| glam::DVec3::new(srgb_to_linear(p[0]), srgb_to_linear(p[1]), srgb_to_linear(p[2]))),
                PixelData::Rgba32F(data) => data
                    .get(offset..offset + 3)
                    .filter(|p| p.iter().all(|c| c.is_finite()))
                    .map(|p| glam::DVec3::new(f64::from(p[0]), f64::from(p[1]), f64::from(p[2]))),
            };
            if let Some(texel) = texel {
                sum += texel * weight;
                weight_sum += weight;
            }
        }
    }

    if weight_sum <= 0.0 {
        return Vec3::ZERO;
    }
    (sum / weight_sum).as_vec3()
}

fn srgb_to_linear(c: u8) -> f64 {
    let c = f64::from(c) / 255.0;
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hdr(width: u32, height: u32, texel: impl Fn(u32, u32) -> [f32; 4]) -> DecodedImage {
        let mut data = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&texel(x, y));
            }
        }
        DecodedImage {
            width,
            height,
            pixels: PixelData::Rgba32F(data),
        }
    }

    #[test]
    fn test_uniform_map_averages_to_itself() {
        let image = hdr(8, 4, |_, _| [0.5, 1.0, 2.0, 1.0]);
        let avg = average_radiance(&image);
        assert!((avg - Vec3::new(0.5, 1.0, 2.0)).length() < 1e-5);
    }

    #[test]
    fn test_rows_are_weighted_by_solid_angle() {
        // Bright top row, dark elsewhere: the polar row covers little area.
        let image = hdr(4, 8, |_, y| if y == 0 { [8.0, 8.0, 8.0, 1.0] } else { [0.0; 4] });
        let avg = average_radiance(&image);
        assert!(avg.x < 8.0 / 8.0, "polar row overweighted: {avg:?}");
        assert!(avg.x > 0.0);
    }

    #[test]
    fn test_non_finite_texels_are_skipped() {
        let image = hdr(2, 2, |x, _| if x == 0 { [f32::NAN, 0.0, 0.0, 1.0] } else { [1.0; 4] });
        let avg = average_radiance(&image);
        assert!(avg.is_finite());
        assert!((avg.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_srgb_texels_are_linearized() {
        let image = DecodedImage {
            width: 2,
            height: 2,
            pixels: PixelData::Rgba8([255, 128, 0, 255].repeat(4)),
        };
        let avg = average_radiance(&image);
        assert!((avg.x - 1.0).abs() < 1e-5);
        assert!((avg.y - 0.2158).abs() < 1e-3);
        assert_eq!(avg.z, 0.0);
    }

    #[test]
    fn test_lifecycle() {
        let mut env = EnvironmentLighting::default();
        assert_eq!(env.state(), EnvironmentState::Pending);
        assert_eq!(env.radiance(), None);

        env.apply_image(&hdr(2, 2, |_, _| [0.25; 4]));
        assert!(matches!(env.state(), EnvironmentState::Ready { .. }));
        assert!((env.radiance().unwrap() - Vec3::splat(0.25)).length() < 1e-6);
    }

    #[test]
    fn test_failure_keeps_flat_background() {
        let mut env = EnvironmentLighting::new(Vec3::ZERO);
        env.mark_failed();
        assert_eq!(env.state(), EnvironmentState::Failed);
        assert_eq!(env.radiance(), None);
        assert_eq!(env.background(), Vec3::ZERO);
    }
}
