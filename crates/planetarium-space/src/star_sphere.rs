//! Star backdrop: an equirectangular texture sampled per pixel by a fullscreen
//! triangle.
//!
//! View directions are reconstructed from the rotation-only inverse
//! view-projection, so the backdrop behaves like an inward-facing sphere
//! centred on the camera at infinite distance.

use std::num::NonZeroU64;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use planetarium_render::{BufferAllocator, DepthBuffer, ManagedTexture};

/// Uniform for the star pass. 80 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct StarSphereUniform {
    /// Inverse view-projection matrix (rotation only, no translation).
    pub inv_view_proj: [[f32; 4]; 4],
    /// Linear multiplier applied to the star texture.
    pub tint: [f32; 4],
}

/// WGSL source for the star pass.
pub const STAR_SPHERE_SHADER_SOURCE: &str = r#"
const PI: f32 = 3.14159265359;

struct StarSphereUniform {
    inv_view_proj: mat4x4<f32>,
    tint: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> sky: StarSphereUniform;

@group(1) @binding(0)
var star_texture: texture_2d<f32>;
@group(1) @binding(1)
var star_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) view_dir: vec3<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    let ndc = uv * 2.0 - 1.0;

    let clip = vec4<f32>(ndc.x, ndc.y, 1.0, 1.0);
    let world = sky.inv_view_proj * clip;

    var out: VertexOutput;
    out.position = vec4<f32>(ndc.x, ndc.y, 0.0, 1.0);
    out.view_dir = world.xyz / world.w;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let dir = normalize(in.view_dir);
    let u = fract(atan2(dir.z, -dir.x) / (2.0 * PI));
    let v = acos(clamp(dir.y, -1.0, 1.0)) / PI;

    // The seam at u = 0/1 breaks screen-space derivatives; take them from a
    // copy of u that is continuous there instead.
    let u_seamless = fract(u + 0.5) - 0.5;
    let du_dx = select(dpdx(u), dpdx(u_seamless), abs(dpdx(u_seamless)) < abs(dpdx(u)));
    let du_dy = select(dpdy(u), dpdy(u_seamless), abs(dpdy(u_seamless)) < abs(dpdy(u)));

    let color = textureSampleGrad(
        star_texture,
        star_sampler,
        vec2<f32>(u, v),
        vec2<f32>(du_dx, dpdx(v)),
        vec2<f32>(du_dy, dpdy(v)),
    );
    return vec4<f32>(color.rgb * sky.tint.rgb, 1.0);
}
"#;

/// Renders the star backdrop once its texture has arrived.
pub struct StarSphere {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture: Option<Arc<ManagedTexture>>,
    tint: Vec3,
}

impl StarSphere {
    /// `texture_bind_group_layout` must be the texture manager's shared layout.
    pub fn new(
        device: &wgpu::Device,
        texture_bind_group_layout: &wgpu::BindGroupLayout,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("star-sphere-shader"),
            source: wgpu::ShaderSource::Wgsl(STAR_SPHERE_SHADER_SOURCE.into()),
        });

        let uniform_bgl = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("star-sphere-uniform-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(
                        std::mem::size_of::<StarSphereUniform>() as u64
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("star-sphere-pipeline-layout"),
            bind_group_layouts: &[&uniform_bgl, texture_bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("star-sphere-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            // Drawn first and never occludes anything.
            depth_stencil: Some(DepthBuffer::depth_state(false, wgpu::CompareFunction::Always)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let uniform_buffer = BufferAllocator::new(device).create_uniform(
            "star-sphere-uniform",
            &StarSphereUniform {
                inv_view_proj: Mat4::IDENTITY.to_cols_array_2d(),
                tint: [1.0; 4],
            },
        );

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("star-sphere-uniform-bg"),
            layout: &uniform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        log::info!("Star sphere renderer initialized ({surface_format:?})");

        Self {
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture: None,
            tint: Vec3::ONE,
        }
    }

    /// Attach the decoded star texture.
    pub fn set_texture(&mut self, texture: Arc<ManagedTexture>) {
        let (w, h) = texture.dimensions;
        log::info!("Star sphere texture attached ({w}x{h})");
        self.texture = Some(texture);
    }

    /// Brightness multiplier for the star texture.
    pub fn set_tint(&mut self, tint: Vec3) {
        self.tint = tint;
    }

    /// Upload the rotation-only inverse view-projection for this frame.
    pub fn update(&self, queue: &wgpu::Queue, inv_view_proj: Mat4) {
        let uniform = StarSphereUniform {
            inv_view_proj: inv_view_proj.to_cols_array_2d(),
            tint: self.tint.extend(1.0).to_array(),
        };
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
    }

    /// Draw the backdrop. Leaves the clear colour untouched until a texture
    /// is attached.
    pub fn render(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(texture) = &self.texture else {
            return;
        };
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.uniform_bind_group, &[]);
        pass.set_bind_group(1, &texture.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use planetarium_render::generate_uv_sphere;
    use std::f32::consts::{PI, TAU};

    /// CPU copy of the fragment shader's direction-to-UV mapping.
    fn direction_to_equirect_uv(dir: Vec3) -> Vec2 {
        let dir = dir.normalize_or(Vec3::NEG_Z);
        let u = (dir.z.atan2(-dir.x) / TAU).rem_euclid(1.0);
        let v = dir.y.clamp(-1.0, 1.0).acos() / PI;
        Vec2::new(u, v)
    }

    #[test]
    fn test_uniform_size() {
        assert_eq!(std::mem::size_of::<StarSphereUniform>(), 80);
    }

    #[test]
    fn test_poles_map_to_top_and_bottom_rows() {
        assert!(direction_to_equirect_uv(Vec3::Y).y.abs() < 1e-6);
        assert!((direction_to_equirect_uv(Vec3::NEG_Y).y - 1.0).abs() < 1e-6);
        assert!((direction_to_equirect_uv(Vec3::X).y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_horizontal_directions_cover_the_full_width() {
        assert!(direction_to_equirect_uv(Vec3::NEG_X).x.abs() < 1e-6);
        assert!((direction_to_equirect_uv(Vec3::Z).x - 0.25).abs() < 1e-6);
        assert!((direction_to_equirect_uv(Vec3::X).x - 0.5).abs() < 1e-6);
        assert!((direction_to_equirect_uv(Vec3::NEG_Z).x - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_matches_sphere_mesh_uvs() {
        let mesh = generate_uv_sphere(50.0, 32, 32);
        // Skip pole rows (offset u) and the seam columns (u = 0 and 1 alias).
        for vertex in mesh.vertices.iter().filter(|v| {
            v.uv[1] > 0.0 && v.uv[1] < 1.0 && v.uv[0] > 0.001 && v.uv[0] < 0.999
        }) {
            let uv = direction_to_equirect_uv(Vec3::from(vertex.position));
            assert!((uv.x - vertex.uv[0]).abs() < 1e-4, "{uv:?} vs {:?}", vertex.uv);
            assert!((uv.y - vertex.uv[1]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_zero_direction_does_not_produce_nan() {
        let uv = direction_to_equirect_uv(Vec3::ZERO);
        assert!(uv.is_finite());
    }
}
