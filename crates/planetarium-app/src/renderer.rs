//! GPU-side state for the window: pipelines, textures and per-body uniforms.
//!
//! Everything is drawn in one pass: the star sphere first (no depth write),
//! then the bodies (reverse-Z depth), then the screen-space overlay.

use std::borrow::Cow;
use std::sync::Arc;

use glam::Vec3;
use planetarium_assets::{DecodedImage, PixelData};
use planetarium_config::Config;
use planetarium_render::{
    BufferAllocator, Camera, DepthBuffer, FrameEncoder, IndexData, ManagedTexture, MeshBuffer,
    ModelUniform, OverlayQuad, OverlayRenderer, PhysicalSize, PlanetPipeline, RenderContext,
    RenderPassBuilder, SceneUniform, ScreenRect, SurfaceError, TextRaster, TextureError,
    TextureManager, TextureOptions, UniformBinding, draw_planet, generate_uv_sphere,
};
use planetarium_scene::{SceneContext, TextureUpload};
use planetarium_space::StarSphere;
use tracing::{debug, error, info};

const TEXT_COLOR: [u8; 4] = [255, 255, 255, 255];
/// Loading panel colour, alpha comes from the fade.
const PANEL_RGB: [f32; 3] = [0.0, 0.0, 0.0];
const STARFIELD_TEXTURE: &str = "starfield";
const LOADING_LABEL_TEXTURE: &str = "loading-label";

/// Owns every GPU resource the scene is drawn with.
pub struct SceneRenderer {
    camera: Camera,
    depth_buffer: DepthBuffer,
    textures: TextureManager,
    planet_pipeline: PlanetPipeline,
    star_sphere: StarSphere,
    overlay: OverlayRenderer,
    sphere_mesh: MeshBuffer,
    scene_binding: UniformBinding,
    model_bindings: Vec<UniformBinding>,
    body_textures: Vec<Option<Arc<ManagedTexture>>>,
    glyph_scale: u32,
    heading_labels: Vec<Arc<ManagedTexture>>,
    loading_label: Option<Arc<ManagedTexture>>,
    viewport: (u32, u32),
    scale_factor: f64,
}

impl SceneRenderer {
    /// Create pipelines and static meshes, and rasterize the heading labels.
    pub fn new(
        gpu: &RenderContext,
        config: &Config,
        scene: &SceneContext,
        size: PhysicalSize,
        scale_factor: f64,
    ) -> Result<Self, TextureError> {
        let device = &gpu.device;
        let queue = &gpu.queue;

        let camera = Camera::perspective(
            config.render.fov_y_degrees,
            size.aspect_ratio(),
            config.render.near,
            config.render.far,
            Vec3::new(0.0, 0.0, config.render.camera_distance),
        );
        let depth_buffer = DepthBuffer::new(device, size.width, size.height);
        let textures = TextureManager::new(device, queue);
        let texture_layout = textures.bind_group_layout();

        let planet_pipeline = PlanetPipeline::new(device, texture_layout, gpu.surface_format);
        let mut star_sphere = StarSphere::new(device, texture_layout, gpu.surface_format);
        star_sphere.set_tint(Vec3::splat(config.scene.starfield_intensity));
        let overlay = OverlayRenderer::new(device, texture_layout, gpu.surface_format);

        let sphere = generate_uv_sphere(
            1.0,
            config.scene.width_segments,
            config.scene.height_segments,
        );
        let sphere_mesh = BufferAllocator::new(device).create_mesh(
            "body-sphere",
            &sphere.vertices,
            IndexData::U32(&sphere.indices),
        );
        info!(
            "Body mesh: {} vertices, {} triangles",
            sphere.vertices.len(),
            sphere.triangle_count()
        );

        let scene_binding = planet_pipeline
            .create_scene_binding(device, &SceneUniform::new(&camera, &scene.scene_lighting()));
        let body_count = scene.orbit().len();
        let model_bindings = (0..body_count)
            .map(|_| planet_pipeline.create_model_binding(device, &ModelUniform::default()))
            .collect();

        let mut renderer = Self {
            camera,
            depth_buffer,
            textures,
            planet_pipeline,
            star_sphere,
            overlay,
            sphere_mesh,
            scene_binding,
            model_bindings,
            body_textures: vec![None; body_count],
            glyph_scale: config.headings.glyph_scale,
            heading_labels: Vec::new(),
            loading_label: None,
            viewport: (size.width, size.height),
            scale_factor,
        };
        renderer.rasterize_headings(device, queue, scene)?;
        Ok(renderer)
    }

    /// Follow a surface resize.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.camera.set_aspect_ratio(width as f32, height as f32);
        self.depth_buffer.resize(device, width, height);
        self.viewport = (width.max(1), height.max(1));
    }

    /// Follow a DPI change. Labels are re-rasterized at the new scale.
    pub fn set_scale_factor(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneContext,
        scale_factor: f64,
    ) -> Result<(), TextureError> {
        if scale_factor == self.scale_factor {
            return Ok(());
        }
        self.scale_factor = scale_factor;
        self.rasterize_headings(device, queue, scene)?;
        self.loading_label = None;
        Ok(())
    }

    fn text_raster(&self) -> TextRaster {
        TextRaster::new(physical_glyph_scale(self.glyph_scale, self.scale_factor))
    }

    fn rasterize_headings(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &SceneContext,
    ) -> Result<(), TextureError> {
        let raster = self.text_raster();
        self.heading_labels = scene
            .headings()
            .labels()
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let image = raster.rasterize(label, TEXT_COLOR);
                self.textures.replace_texture(
                    device,
                    queue,
                    &format!("heading-{i}"),
                    &image.pixels,
                    image.size(),
                    TextureOptions::overlay(),
                )
            })
            .collect::<Result<_, _>>()?;
        debug!(
            scale = raster.scale(),
            count = self.heading_labels.len(),
            "rasterized headings"
        );
        Ok(())
    }

    /// Turn a decoded image into the texture it was loaded for.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, upload: TextureUpload) {
        match upload {
            TextureUpload::Starfield(image) => {
                match self.create_color_map(device, queue, STARFIELD_TEXTURE, &image) {
                    Ok(texture) => self.star_sphere.set_texture(texture),
                    Err(e) => error!("Starfield texture rejected: {e}"),
                }
            }
            TextureUpload::Body { index, image } => {
                let name = format!("body-{index}");
                match self.create_color_map(device, queue, &name, &image) {
                    Ok(texture) => {
                        if let Some(slot) = self.body_textures.get_mut(index) {
                            *slot = Some(texture);
                        }
                    }
                    Err(e) => error!("Body {index} texture rejected: {e}"),
                }
            }
        }
    }

    fn create_color_map(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        image: &DecodedImage,
    ) -> Result<Arc<ManagedTexture>, TextureError> {
        let texture = self.textures.replace_texture(
            device,
            queue,
            name,
            &rgba8_pixels(image),
            (image.width, image.height),
            TextureOptions::color_map(),
        )?;
        debug!(name, cached = self.textures.len(), "uploaded colour map");
        Ok(texture)
    }

    /// Write this frame's uniforms and overlay, then draw and present.
    pub fn render(
        &mut self,
        gpu: &RenderContext,
        scene: &mut SceneContext,
    ) -> Result<(), SurfaceError> {
        let device = &gpu.device;
        let queue = &gpu.queue;

        self.star_sphere
            .update(queue, self.camera.sky_inverse_view_projection());
        self.scene_binding.write(
            queue,
            &SceneUniform::new(&self.camera, &scene.scene_lighting()),
        );

        let bodies = scene.orbit().model_matrices();
        for (index, model) in &bodies {
            if let Some(binding) = self.model_bindings.get(*index) {
                binding.write(queue, &ModelUniform::new(*model));
            }
        }

        let quads = self.overlay_quads(device, queue, scene);
        self.overlay.prepare(device, queue, self.viewport, &quads);

        let surface_texture = gpu.get_current_texture()?;
        let mut frame = FrameEncoder::new(device, Arc::clone(&gpu.queue), surface_texture);
        let builder = RenderPassBuilder::new()
            .label("scene-pass")
            .clear_rgb(scene.background().to_array())
            .depth(self.depth_buffer.view.clone(), DepthBuffer::CLEAR_VALUE);

        if let Some(mut pass) = frame.begin_render_pass(&builder) {
            self.star_sphere.render(&mut pass);
            for (index, _) in &bodies {
                let texture = self.body_textures.get(*index).and_then(Option::as_ref);
                let binding = self.model_bindings.get(*index);
                if let (Some(texture), Some(binding)) = (texture, binding) {
                    draw_planet(
                        &mut pass,
                        &self.planet_pipeline,
                        &self.scene_binding.bind_group,
                        &texture.bind_group,
                        &binding.bind_group,
                        &self.sphere_mesh,
                    );
                }
            }
            self.overlay.render(&mut pass);
        }
        frame.submit();
        Ok(())
    }

    fn overlay_quads(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &mut SceneContext,
    ) -> Vec<OverlayQuad> {
        let sizes: Vec<(u32, u32)> = self.heading_labels.iter().map(|t| t.dimensions).collect();
        let mut quads: Vec<OverlayQuad> = scene
            .headings()
            .layout(self.viewport, self.scale_factor as f32, &sizes)
            .into_iter()
            .filter_map(|layout| {
                let texture = self.heading_labels.get(layout.index)?;
                Some(OverlayQuad {
                    rect: layout.rect,
                    texture: Arc::clone(texture),
                    color: [1.0; 4],
                    clip: Some(layout.clip),
                })
            })
            .collect();

        if !scene.loading().is_visible() {
            return quads;
        }

        if scene.loading_mut().take_label_dirty() || self.loading_label.is_none() {
            let image = self.text_raster().rasterize(&scene.loading().label(), TEXT_COLOR);
            match self.textures.replace_texture(
                device,
                queue,
                LOADING_LABEL_TEXTURE,
                &image.pixels,
                image.size(),
                TextureOptions::overlay(),
            ) {
                Ok(texture) => self.loading_label = Some(texture),
                Err(e) => error!("Loading label rejected: {e}"),
            }
        }

        let opacity = scene.loading().opacity();
        let (width, height) = self.viewport;
        quads.push(OverlayQuad {
            rect: ScreenRect::new(0.0, 0.0, width as f32, height as f32),
            texture: self.textures.placeholder(),
            color: [PANEL_RGB[0], PANEL_RGB[1], PANEL_RGB[2], opacity],
            clip: None,
        });
        if let Some(label) = &self.loading_label {
            quads.push(OverlayQuad {
                rect: centered_rect(self.viewport, label.dimensions),
                texture: Arc::clone(label),
                color: [1.0, 1.0, 1.0, opacity],
                clip: None,
            });
        }
        quads
    }
}

/// Glyph scale in physical pixels for a logical `glyph_scale`.
pub fn physical_glyph_scale(glyph_scale: u32, scale_factor: f64) -> u32 {
    ((f64::from(glyph_scale) * scale_factor).round() as u32).max(1)
}

/// A `size` rectangle centred in `viewport`.
pub fn centered_rect(viewport: (u32, u32), size: (u32, u32)) -> ScreenRect {
    ScreenRect::new(
        (viewport.0 as f32 - size.0 as f32) / 2.0,
        (viewport.1 as f32 - size.1 as f32) / 2.0,
        size.0 as f32,
        size.1 as f32,
    )
}

/// RGBA8 bytes for upload. Float images are tone-clamped and sRGB encoded.
pub fn rgba8_pixels(image: &DecodedImage) -> Cow<'_, [u8]> {
    match &image.pixels {
        PixelData::Rgba8(bytes) => Cow::Borrowed(bytes),
        PixelData::Rgba32F(values) => Cow::Owned(
            values
                .chunks_exact(4)
                .flat_map(|px| {
                    [
                        encode_srgb(px[0]),
                        encode_srgb(px[1]),
                        encode_srgb(px[2]),
                        (px[3].clamp(0.0, 1.0) * 255.0).round() as u8,
                    ]
                })
                .collect(),
        ),
    }
}

fn encode_srgb(linear: f32) -> u8 {
    let c = if linear.is_finite() { linear.clamp(0.0, 1.0) } else { 0.0 };
    let encoded = if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba8_is_borrowed() {
        let image = DecodedImage {
            width: 2,
            height: 2,
            pixels: PixelData::Rgba8([1, 2, 3, 4].repeat(4)),
        };
        let pixels = rgba8_pixels(&image);
        assert!(matches!(pixels, Cow::Borrowed(_)));
        assert_eq!(&pixels[..4], &[1, 2, 3, 4]);
    }

    #[test]
    fn test_float_pixels_are_encoded() {
        let image = DecodedImage {
            width: 2,
            height: 1,
            pixels: PixelData::Rgba32F(vec![0.0, 1.0, 4.0, 1.0, f32::NAN, 0.5, -1.0, 0.5]),
        };
        let pixels = rgba8_pixels(&image);
        assert_eq!(pixels.len(), 8);
        assert_eq!(&pixels[..4], &[0, 255, 255, 255]);
        assert_eq!(pixels[4], 0);
        // Linear 0.5 is about 188 in sRGB.
        assert_eq!(pixels[5], 188);
        assert_eq!(pixels[6], 0);
        assert_eq!(pixels[7], 128);
    }

    #[test]
    fn test_physical_glyph_scale() {
        assert_eq!(physical_glyph_scale(3, 1.0), 3);
        assert_eq!(physical_glyph_scale(3, 2.0), 6);
        assert_eq!(physical_glyph_scale(3, 1.5), 5);
        assert_eq!(physical_glyph_scale(0, 2.0), 1);
    }

    #[test]
    fn test_centered_rect() {
        let rect = centered_rect((800, 600), (200, 24));
        assert_eq!(rect, ScreenRect::new(300.0, 288.0, 200.0, 24.0));
    }
}
