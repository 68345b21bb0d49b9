//! Textured, lit sphere pipeline.
//!
//! Approximates a standard (metallic/roughness) material with metallic 0 and
//! roughness 1: albedo from the body texture, Lambert plus GGX for the
//! directional light, flat ambient, and an image-based ambient tint taken from
//! the environment map's average radiance.
//!
//! Bind groups: scene uniform at group 0, body texture at group 1 (layout owned
//! by [`crate::TextureManager`]), model uniform at group 2.

use std::num::NonZeroU64;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use crate::buffer::{BufferAllocator, MeshBuffer, VertexPositionNormalUv};
use crate::camera::{Camera, CameraUniform};
use crate::depth::DepthBuffer;

/// Per-frame scene constants. 144 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneUniform {
    pub camera: CameraUniform,
    /// xyz: unit vector towards the light, w: intensity.
    pub light_dir_intensity: [f32; 4],
    pub light_color: [f32; 4],
    /// rgb: ambient colour pre-multiplied by intensity.
    pub ambient: [f32; 4],
    /// rgb: average environment radiance, w: 1 when an environment is bound.
    pub environment: [f32; 4],
}

/// Light setup feeding [`SceneUniform`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneLighting {
    pub ambient_color: Vec3,
    pub ambient_intensity: f32,
    pub directional_color: Vec3,
    pub directional_intensity: f32,
    /// Directional light position; it shines from here towards the origin.
    pub directional_position: Vec3,
    /// Average environment radiance, `None` until (or unless) it loads.
    pub environment: Option<Vec3>,
}

impl Default for SceneLighting {
    fn default() -> Self {
        Self {
            ambient_color: Vec3::ONE,
            ambient_intensity: 0.5,
            directional_color: Vec3::ONE,
            directional_intensity: 1.0,
            directional_position: Vec3::splat(5.0),
            environment: None,
        }
    }
}

impl SceneUniform {
    pub fn new(camera: &Camera, lighting: &SceneLighting) -> Self {
        let to_light = lighting.directional_position.normalize_or(Vec3::Y);
        let ambient = lighting.ambient_color * lighting.ambient_intensity;
        let (env, env_enabled) = match lighting.environment {
            Some(radiance) => (radiance, 1.0),
            None => (Vec3::ZERO, 0.0),
        };

        Self {
            camera: camera.to_uniform(),
            light_dir_intensity: to_light.extend(lighting.directional_intensity).to_array(),
            light_color: lighting.directional_color.extend(1.0).to_array(),
            ambient: ambient.extend(0.0).to_array(),
            environment: env.extend(env_enabled).to_array(),
        }
    }
}

/// Per-body transform. 64 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ModelUniform {
    pub model: [[f32; 4]; 4],
}

impl ModelUniform {
    pub fn new(model: Mat4) -> Self {
        Self {
            model: model.to_cols_array_2d(),
        }
    }
}

impl Default for ModelUniform {
    fn default() -> Self {
        Self::new(Mat4::IDENTITY)
    }
}

/// A uniform buffer with the bind group exposing it.
pub struct UniformBinding {
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl UniformBinding {
    fn new<T: Pod>(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        label: &str,
        value: &T,
    ) -> Self {
        let buffer = BufferAllocator::new(device).create_uniform(label, value);
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    /// Overwrite the buffer contents.
    pub fn write<T: Pod>(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }
}

fn uniform_layout(
    device: &wgpu::Device,
    label: &str,
    visibility: wgpu::ShaderStages,
    size: u64,
) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: NonZeroU64::new(size),
            },
            count: None,
        }],
    })
}

/// Sphere pipeline: scene at group 0, texture at group 1, model at group 2.
pub struct PlanetPipeline {
    pub pipeline: wgpu::RenderPipeline,
    pub scene_bind_group_layout: wgpu::BindGroupLayout,
    pub model_bind_group_layout: wgpu::BindGroupLayout,
}

impl PlanetPipeline {
    pub fn new(
        device: &wgpu::Device,
        texture_bind_group_layout: &wgpu::BindGroupLayout,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let scene_bind_group_layout = uniform_layout(
            device,
            "planet-scene-bgl",
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            std::mem::size_of::<SceneUniform>() as u64,
        );
        let model_bind_group_layout = uniform_layout(
            device,
            "planet-model-bgl",
            wgpu::ShaderStages::VERTEX,
            std::mem::size_of::<ModelUniform>() as u64,
        );

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("planet-shader"),
            source: wgpu::ShaderSource::Wgsl(PLANET_SHADER_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("planet-pipeline-layout"),
            bind_group_layouts: &[
                &scene_bind_group_layout,
                texture_bind_group_layout,
                &model_bind_group_layout,
            ],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("planet-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[VertexPositionNormalUv::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                unclipped_depth: false,
                polygon_mode: wgpu::PolygonMode::Fill,
                conservative: false,
            },
            depth_stencil: Some(DepthBuffer::depth_state(true, DepthBuffer::COMPARE_FUNCTION)),
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

        Self {
            pipeline,
            scene_bind_group_layout,
            model_bind_group_layout,
        }
    }

    /// Scene uniform buffer bound at group 0.
    pub fn create_scene_binding(&self, device: &wgpu::Device, scene: &SceneUniform) -> UniformBinding {
        UniformBinding::new(device, &self.scene_bind_group_layout, "planet-scene-uniform", scene)
    }

    /// Model uniform buffer bound at group 2.
    pub fn create_model_binding(&self, device: &wgpu::Device, model: &ModelUniform) -> UniformBinding {
        UniformBinding::new(device, &self.model_bind_group_layout, "planet-model-uniform", model)
    }
}

/// Draw one body.
pub fn draw_planet(
    render_pass: &mut wgpu::RenderPass<'_>,
    pipeline: &PlanetPipeline,
    scene_bind_group: &wgpu::BindGroup,
    texture_bind_group: &wgpu::BindGroup,
    model_bind_group: &wgpu::BindGroup,
    mesh: &MeshBuffer,
) {
    render_pass.set_pipeline(&pipeline.pipeline);
    render_pass.set_bind_group(0, scene_bind_group, &[]);
    render_pass.set_bind_group(1, texture_bind_group, &[]);
    render_pass.set_bind_group(2, model_bind_group, &[]);
    mesh.bind(render_pass);
    mesh.draw(render_pass, 0..1);
}

/// WGSL source for the sphere pipeline.
pub const PLANET_SHADER_SOURCE: &str = r#"
const PI: f32 = 3.14159265359;

struct CameraUniform {
    view_proj: mat4x4<f32>,
    position: vec4<f32>,
};

struct SceneUniform {
    camera: CameraUniform,
    light_dir_intensity: vec4<f32>,
    light_color: vec4<f32>,
    ambient: vec4<f32>,
    environment: vec4<f32>,
};

struct ModelUniform {
    model: mat4x4<f32>,
};

@group(0) @binding(0)
var<uniform> scene: SceneUniform;

@group(1) @binding(0)
var albedo_texture: texture_2d<f32>;

@group(1) @binding(1)
var albedo_sampler: sampler;

@group(2) @binding(0)
var<uniform> transform: ModelUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    return a2 / (PI * denom * denom);
}

fn geometry_schlick_ggx(n_dot: f32, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = (r * r) / 8.0;
    return n_dot / (n_dot * (1.0 - k) + k);
}

fn fresnel_schlick(cos_theta: f32, f0: vec3<f32>) -> vec3<f32> {
    return f0 + (1.0 - f0) * pow(clamp(1.0 - cos_theta, 0.0, 1.0), 5.0);
}

fn direct_light(light_dir: vec3<f32>, view_dir: vec3<f32>, normal: vec3<f32>, albedo: vec3<f32>) -> vec3<f32> {
    let roughness = 1.0;
    let half_vec = normalize(view_dir + light_dir);
    let n_dot_l = max(dot(normal, light_dir), 0.0);
    let n_dot_v = max(dot(normal, view_dir), 0.0);
    let n_dot_h = max(dot(normal, half_vec), 0.0);
    let h_dot_v = max(dot(half_vec, view_dir), 0.0);

    let f = fresnel_schlick(h_dot_v, vec3<f32>(0.04));
    let d = distribution_ggx(n_dot_h, roughness);
    let g = geometry_schlick_ggx(n_dot_v, roughness) * geometry_schlick_ggx(n_dot_l, roughness);
    let specular = d * g * f / (4.0 * n_dot_v * n_dot_l + 0.0001);
    let diffuse = (vec3<f32>(1.0) - f) * albedo / PI;

    return (diffuse + specular) * n_dot_l;
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = transform.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = scene.camera.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = (transform.model * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let albedo = textureSample(albedo_texture, albedo_sampler, in.uv).rgb;
    let normal = normalize(in.world_normal);
    let view_dir = normalize(scene.camera.position.xyz - in.world_position);
    let light_dir = normalize(scene.light_dir_intensity.xyz);
    let light = scene.light_color.rgb * scene.light_dir_intensity.w;

    var color = direct_light(light_dir, view_dir, normal, albedo) * light;
    color += scene.ambient.rgb * albedo / PI;
    color += scene.environment.rgb * scene.environment.w * albedo;

    return vec4<f32>(color, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::create_test_device_queue;

    #[test]
    fn test_uniform_sizes_match_shader_structs() {
        assert_eq!(std::mem::size_of::<SceneUniform>(), 144);
        assert_eq!(std::mem::size_of::<ModelUniform>(), 64);
    }

    #[test]
    fn test_scene_uniform_light_points_towards_source() {
        let uniform = SceneUniform::new(&Camera::default(), &SceneLighting::default());
        let dir = Vec3::from_slice(&uniform.light_dir_intensity[..3]);
        assert!((dir - Vec3::splat(5.0).normalize()).length() < 1e-6);
        assert_eq!(uniform.light_dir_intensity[3], 1.0);
        assert_eq!(uniform.ambient[..3], [0.5, 0.5, 0.5]);
        assert_eq!(uniform.camera.camera_pos, [0.0, 0.0, 9.0, 1.0]);
    }

    #[test]
    fn test_environment_flag_follows_lighting() {
        let camera = Camera::default();
        let without = SceneUniform::new(&camera, &SceneLighting::default());
        assert_eq!(without.environment, [0.0; 4]);

        let lighting = SceneLighting {
            environment: Some(Vec3::new(0.2, 0.3, 0.4)),
            ..SceneLighting::default()
        };
        let with = SceneUniform::new(&camera, &lighting);
        assert_eq!(with.environment, [0.2, 0.3, 0.4, 1.0]);
    }

    #[test]
    fn test_degenerate_light_position_falls_back_to_up() {
        let lighting = SceneLighting {
            directional_position: Vec3::ZERO,
            ..SceneLighting::default()
        };
        let uniform = SceneUniform::new(&Camera::default(), &lighting);
        assert_eq!(uniform.light_dir_intensity[..3], [0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_pipeline_creation() {
        let Some((device, queue)) = create_test_device_queue() else {
            return;
        };
        let textures = crate::texture::TextureManager::new(&device, &queue);
        let pipeline = PlanetPipeline::new(
            &device,
            textures.bind_group_layout(),
            wgpu::TextureFormat::Bgra8UnormSrgb,
        );
        let model = pipeline.create_model_binding(&device, &ModelUniform::default());
        assert_eq!(model.buffer.size(), 64);
    }
}
