//! Screen-space textured quads drawn over the 3D scene.
//!
//! Quads are laid out in physical pixels with the origin at the top-left of the
//! surface. Each quad may carry a clip rectangle applied as a scissor, which is
//! how headings slide in and out of their band.

use std::num::NonZeroU64;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};

use crate::buffer::BufferAllocator;
use crate::depth::DepthBuffer;
use crate::texture::ManagedTexture;

/// Axis-aligned rectangle in physical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScreenRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl ScreenRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Overlap with `other`, `None` when they do not intersect.
    pub fn intersect(&self, other: &ScreenRect) -> Option<ScreenRect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        (right > x && bottom > y).then(|| ScreenRect::new(x, y, right - x, bottom - y))
    }
}

/// Integer scissor rectangle inside the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScissorRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Snap `clip` to whole pixels inside a `viewport`-sized surface.
///
/// Returns `None` when nothing of the clip is visible; wgpu rejects empty
/// and out-of-bounds scissors.
pub fn clamp_scissor(clip: &ScreenRect, viewport: (u32, u32)) -> Option<ScissorRect> {
    let (vw, vh) = (viewport.0 as f32, viewport.1 as f32);
    let x0 = clip.x.floor().clamp(0.0, vw);
    let y0 = clip.y.floor().clamp(0.0, vh);
    let x1 = clip.right().ceil().clamp(0.0, vw);
    let y1 = clip.bottom().ceil().clamp(0.0, vh);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(ScissorRect {
        x: x0 as u32,
        y: y0 as u32,
        width: (x1 - x0) as u32,
        height: (y1 - y0) as u32,
    })
}

/// One textured rectangle.
#[derive(Clone)]
pub struct OverlayQuad {
    pub rect: ScreenRect,
    pub texture: Arc<ManagedTexture>,
    /// Multiplied with the texel; alpha drives fades.
    pub color: [f32; 4],
    pub clip: Option<ScreenRect>,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct OverlayVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
    pub color: [f32; 4],
}

impl OverlayVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2, 2 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<OverlayVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

const VERTICES_PER_QUAD: u32 = 6;

/// Two triangles covering `rect`, UVs spanning the whole texture.
pub fn quad_vertices(rect: &ScreenRect, color: [f32; 4]) -> [OverlayVertex; 6] {
    let v = |x: f32, y: f32, u: f32, t: f32| OverlayVertex {
        position: [x, y],
        uv: [u, t],
        color,
    };
    let (l, t, r, b) = (rect.x, rect.y, rect.right(), rect.bottom());
    [
        v(l, t, 0.0, 0.0),
        v(l, b, 0.0, 1.0),
        v(r, b, 1.0, 1.0),
        v(l, t, 0.0, 0.0),
        v(r, b, 1.0, 1.0),
        v(r, t, 1.0, 0.0),
    ]
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
struct ViewportUniform {
    size: [f32; 4],
}

struct PreparedQuad {
    texture: Arc<ManagedTexture>,
    first_vertex: u32,
    scissor: ScissorRect,
}

/// Draws [`OverlayQuad`]s with alpha blending.
pub struct OverlayRenderer {
    pipeline: wgpu::RenderPipeline,
    viewport_buffer: wgpu::Buffer,
    viewport_bind_group: wgpu::BindGroup,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    prepared: Vec<PreparedQuad>,
}

impl OverlayRenderer {
    pub fn new(
        device: &wgpu::Device,
        texture_bind_group_layout: &wgpu::BindGroupLayout,
        surface_format: wgpu::TextureFormat,
    ) -> Self {
        let viewport_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("overlay-viewport-bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(16),
                },
                count: None,
            }],
        });

        let allocator = BufferAllocator::new(device);
        let viewport_buffer = allocator.create_uniform(
            "overlay-viewport",
            &ViewportUniform {
                size: [1.0, 1.0, 0.0, 0.0],
            },
        );
        let viewport_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("overlay-viewport"),
            layout: &viewport_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: viewport_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("overlay-shader"),
            source: wgpu::ShaderSource::Wgsl(OVERLAY_SHADER_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("overlay-pipeline-layout"),
            bind_group_layouts: &[&viewport_layout, texture_bind_group_layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("overlay-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[OverlayVertex::layout()],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(DepthBuffer::depth_state(false, wgpu::CompareFunction::Always)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let vertex_capacity = 16 * VERTICES_PER_QUAD as usize;
        let vertex_buffer = allocator.create_dynamic_vertex_buffer(
            "overlay-vertices",
            (vertex_capacity * std::mem::size_of::<OverlayVertex>()) as u64,
        );

        Self {
            pipeline,
            viewport_buffer,
            viewport_bind_group,
            vertex_buffer,
            vertex_capacity,
            prepared: Vec::new(),
        }
    }

    /// Upload this frame's quads. Quads clipped away entirely are dropped.
    pub fn prepare(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        viewport: (u32, u32),
        quads: &[OverlayQuad],
    ) {
        self.prepared.clear();
        let full = ScissorRect {
            x: 0,
            y: 0,
            width: viewport.0.max(1),
            height: viewport.1.max(1),
        };

        let mut vertices = Vec::with_capacity(quads.len() * VERTICES_PER_QUAD as usize);
        for quad in quads {
            let scissor = match &quad.clip {
                Some(clip) => match clamp_scissor(clip, viewport) {
                    Some(scissor) => scissor,
                    None => continue,
                },
                None => full,
            };
            self.prepared.push(PreparedQuad {
                texture: Arc::clone(&quad.texture),
                first_vertex: vertices.len() as u32,
                scissor,
            });
            vertices.extend_from_slice(&quad_vertices(&quad.rect, quad.color));
        }

        if vertices.len() > self.vertex_capacity {
            self.vertex_capacity = vertices.len().next_power_of_two();
            self.vertex_buffer = BufferAllocator::new(device).create_dynamic_vertex_buffer(
                "overlay-vertices",
                (self.vertex_capacity * std::mem::size_of::<OverlayVertex>()) as u64,
            );
            log::debug!("Grew overlay vertex buffer to {} vertices", self.vertex_capacity);
        }

        queue.write_buffer(
            &self.viewport_buffer,
            0,
            bytemuck::bytes_of(&ViewportUniform {
                size: [full.width as f32, full.height as f32, 0.0, 0.0],
            }),
        );
        if !vertices.is_empty() {
            queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        }
    }

    /// Draw the prepared quads into the current pass.
    pub fn render(&self, render_pass: &mut wgpu::RenderPass<'_>) {
        if self.prepared.is_empty() {
            return;
        }
        render_pass.set_pipeline(&self.pipeline);
        render_pass.set_bind_group(0, &self.viewport_bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));

        for quad in &self.prepared {
            let s = quad.scissor;
            render_pass.set_scissor_rect(s.x, s.y, s.width, s.height);
            render_pass.set_bind_group(1, &quad.texture.bind_group, &[]);
            render_pass.draw(quad.first_vertex..quad.first_vertex + VERTICES_PER_QUAD, 0..1);
        }
    }
}

/// WGSL source for overlay quads.
pub const OVERLAY_SHADER_SOURCE: &str = r#"
struct Viewport {
    size: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> viewport: Viewport;

@group(1) @binding(0)
var quad_texture: texture_2d<f32>;

@group(1) @binding(1)
var quad_sampler: sampler;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) uv: vec2<f32>,
    @location(2) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec4<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let ndc = vec2<f32>(
        in.position.x / viewport.size.x * 2.0 - 1.0,
        1.0 - in.position.y / viewport.size.y * 2.0,
    );
    var out: VertexOutput;
    out.clip_position = vec4<f32>(ndc, 0.0, 1.0);
    out.uv = in.uv;
    out.color = in.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(quad_texture, quad_sampler, in.uv) * in.color;
}
"#;
