//! GPU texture management: creation, caching, mipmap generation, and bind groups.
//!
//! [`TextureManager`] uploads decoded RGBA8 images and hands back an
//! [`Arc<ManagedTexture>`] whose bind group matches [`TextureManager::bind_group_layout`].
//! A 1x1 white placeholder stands in for textures that have not arrived yet.

use std::collections::HashMap;
use std::sync::Arc;

/// A GPU texture with its view, bind group, and metadata.
pub struct ManagedTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    /// Texture plus sampler, bound at the texture group slot of every pipeline.
    pub bind_group: wgpu::BindGroup,
    /// Width and height in texels.
    pub dimensions: (u32, u32),
    pub format: wgpu::TextureFormat,
    /// Number of mip levels (1 if mipmaps were not generated).
    pub mip_level_count: u32,
}

/// Sampling filter applied when the texture is magnified or minified.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextureFilter {
    #[default]
    Linear,
    /// Crisp texels, used for bitmap text.
    Nearest,
}

/// How a texture is uploaded and sampled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureOptions {
    pub format: wgpu::TextureFormat,
    pub generate_mipmaps: bool,
    pub filter: TextureFilter,
    /// Repeat horizontally (equirectangular maps wrapping around a sphere).
    pub repeat_u: bool,
}

impl TextureOptions {
    /// sRGB colour map wrapped around a sphere.
    pub fn color_map() -> Self {
        Self {
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            generate_mipmaps: true,
            filter: TextureFilter::Linear,
            repeat_u: true,
        }
    }

    /// Screen-space overlay image.
    pub fn overlay() -> Self {
        Self {
            format: wgpu::TextureFormat::Rgba8UnormSrgb,
            generate_mipmaps: false,
            filter: TextureFilter::Nearest,
            repeat_u: false,
        }
    }
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self::color_map()
    }
}

/// Errors that can occur during texture creation.
#[derive(Debug, thiserror::Error)]
pub enum TextureError {
    #[error(
        "texture data size ({actual}) does not match expected ({expected}) for {width}x{height} {format:?}"
    )]
    DataSizeMismatch {
        actual: usize,
        expected: usize,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    },

    #[error("texture dimensions must be non-zero, got {width}x{height}")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("texture {width}x{height} exceeds the device limit of {limit}")]
    TooLarge { width: u32, height: u32, limit: u32 },
}

/// Calculates the number of mip levels for the given dimensions.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Name under which the placeholder texture is cached.
pub const PLACEHOLDER_TEXTURE: &str = "placeholder-white";

/// Centralized GPU texture manager.
pub struct TextureManager {
    textures: HashMap<String, Arc<ManagedTexture>>,
    placeholder: Arc<ManagedTexture>,
    samplers: Samplers,
    bind_group_layout: wgpu::BindGroupLayout,
    blit_shader: wgpu::ShaderModule,
    blit_pipeline_layout: wgpu::PipelineLayout,
    blit_bind_group_layout: wgpu::BindGroupLayout,
    blit_sampler: wgpu::Sampler,
}

struct Samplers {
    linear_clamp: wgpu::Sampler,
    linear_repeat_u: wgpu::Sampler,
    nearest_clamp: wgpu::Sampler,
}

impl Samplers {
    fn new(device: &wgpu::Device) -> Self {
        let linear = |label, address_mode_u| {
            device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some(label),
                address_mode_u,
                mag_filter: wgpu::FilterMode::Linear,
                min_filter: wgpu::FilterMode::Linear,
                mipmap_filter: wgpu::MipmapFilterMode::Linear,
                ..Default::default()
            })
        };

        Self {
            linear_clamp: linear("sampler-linear-clamp", wgpu::AddressMode::ClampToEdge),
            linear_repeat_u: linear("sampler-linear-repeat-u", wgpu::AddressMode::Repeat),
            nearest_clamp: device.create_sampler(&wgpu::SamplerDescriptor {
                label: Some("sampler-nearest"),
                mag_filter: wgpu::FilterMode::Nearest,
                min_filter: wgpu::FilterMode::Nearest,
                mipmap_filter: wgpu::MipmapFilterMode::Nearest,
                ..Default::default()
            }),
        }
    }

    fn select(&self, options: &TextureOptions) -> &wgpu::Sampler {
        match (options.filter, options.repeat_u) {
            (TextureFilter::Nearest, _) => &self.nearest_clamp,
            (TextureFilter::Linear, true) => &self.linear_repeat_u,
            (TextureFilter::Linear, false) => &self.linear_clamp,
        }
    }
}

/// WGSL shader for mipmap generation via fullscreen blit.
const BLIT_SHADER_SOURCE: &str = r#"
@group(0) @binding(0) var src_texture: texture_2d<f32>;
@group(0) @binding(1) var src_sampler: sampler;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_main(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    var out: VertexOutput;
    out.position = vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
    out.uv = vec2<f32>(uv.x, 1.0 - uv.y);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(src_texture, src_sampler, in.uv);
}
"#;

fn texture_sampler_layout_entries() -> [wgpu::BindGroupLayoutEntry; 2] {
    [
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Texture {
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
                view_dimension: wgpu::TextureViewDimension::D2,
                multisampled: false,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ]
}

impl TextureManager {
    /// Create the manager, its samplers, and the white placeholder.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let samplers = Samplers::new(device);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture-bind-group-layout"),
            entries: &texture_sampler_layout_entries(),
        });

        let blit_bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("blit-bind-group-layout"),
                entries: &texture_sampler_layout_entries(),
            });

        let blit_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("blit-shader"),
            source: wgpu::ShaderSource::Wgsl(BLIT_SHADER_SOURCE.into()),
        });

        let blit_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("blit-pipeline-layout"),
            bind_group_layouts: &[&blit_bind_group_layout],
            immediate_size: 0,
        });

        let blit_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("blit-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let options = TextureOptions {
            generate_mipmaps: false,
            ..TextureOptions::color_map()
        };
        let placeholder = Arc::new(upload(
            device,
            queue,
            &bind_group_layout,
            samplers.select(&options),
            PLACEHOLDER_TEXTURE,
            &[255, 255, 255, 255],
            (1, 1),
            options.format,
            1,
        ));

        Self {
            textures: HashMap::new(),
            placeholder,
            samplers,
            bind_group_layout,
            blit_shader,
            blit_pipeline_layout,
            blit_bind_group_layout,
            blit_sampler,
        }
    }

    /// Upload a texture, or return the cached one registered under `name`.
    pub fn create_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        data: &[u8],
        (width, height): (u32, u32),
        options: TextureOptions,
    ) -> Result<Arc<ManagedTexture>, TextureError> {
        if let Some(existing) = self.textures.get(name) {
            return Ok(Arc::clone(existing));
        }

        validate_dimensions(width, height, device.limits().max_texture_dimension_2d)?;
        validate_data_size(data, width, height, options.format)?;

        let mip_levels = if options.generate_mipmaps {
            mip_level_count(width, height)
        } else {
            1
        };

        let managed = upload(
            device,
            queue,
            &self.bind_group_layout,
            self.samplers.select(&options),
            name,
            data,
            (width, height),
            options.format,
            mip_levels,
        );

        if mip_levels > 1 {
            self.generate_mipmaps(device, queue, &managed.texture, options.format, mip_levels);
        }

        let managed = Arc::new(managed);
        self.textures.insert(name.to_string(), Arc::clone(&managed));
        log::info!("Created texture '{name}' ({width}x{height}, {mip_levels} mips)");
        Ok(managed)
    }

    /// Upload a texture, discarding any cached texture with the same name.
    pub fn replace_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        name: &str,
        data: &[u8],
        size: (u32, u32),
        options: TextureOptions,
    ) -> Result<Arc<ManagedTexture>, TextureError> {
        self.textures.remove(name);
        self.create_texture(device, queue, name, data, size, options)
    }

    /// 1x1 opaque white texture.
    pub fn placeholder(&self) -> Arc<ManagedTexture> {
        Arc::clone(&self.placeholder)
    }

    /// Number of cached textures, excluding the placeholder.
    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// The shared bind group layout for texture + sampler pairs.
    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// Generate mipmaps for a texture using render passes.
    fn generate_mipmaps(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        format: wgpu::TextureFormat,
        mip_count: u32,
    ) {
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mipmap-pipeline"),
            layout: Some(&self.blit_pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.blit_shader,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &self.blit_shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("mipmap-encoder"),
        });

        for level in 1..mip_count {
            let src_view = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level - 1,
                mip_level_count: Some(1),
                ..Default::default()
            });

            let dst_view = texture.create_view(&wgpu::TextureViewDescriptor {
                base_mip_level: level,
                mip_level_count: Some(1),
                ..Default::default()
            });

            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("mipmap-bind-group"),
                layout: &self.blit_bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&src_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.blit_sampler),
                    },
                ],
            });

            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("mipmap-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &dst_view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            pass.set_pipeline(&pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.draw(0..3, 0..1);
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

#[allow(clippy::too_many_arguments)]
fn upload(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    name: &str,
    data: &[u8],
    (width, height): (u32, u32),
    format: wgpu::TextureFormat,
    mip_levels: u32,
) -> ManagedTexture {
    let size = wgpu::Extent3d {
        width,
        height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(name),
        size,
        mip_level_count: mip_levels,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::COPY_DST
            | wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });

    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(bytes_per_row(width, format)),
            rows_per_image: None,
        },
        size,
    );

    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{name}-bind-group")),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });

    ManagedTexture {
        texture,
        view,
        bind_group,
        dimensions: (width, height),
        format,
        mip_level_count: mip_levels,
    }
}

fn expected_byte_size(width: u32, height: u32, format: wgpu::TextureFormat) -> usize {
    let bpp = format.block_copy_size(None).unwrap_or(4) as usize;
    width as usize * height as usize * bpp
}

fn bytes_per_row(width: u32, format: wgpu::TextureFormat) -> u32 {
    let bpp = format.block_copy_size(None).unwrap_or(4);
    width * bpp
}

fn validate_dimensions(width: u32, height: u32, limit: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::ZeroDimensions { width, height });
    }
    if width > limit || height > limit {
        return Err(TextureError::TooLarge {
            width,
            height,
            limit,
        });
    }
    Ok(())
}

fn validate_data_size(
    data: &[u8],
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
) -> Result<(), TextureError> {
    let expected = expected_byte_size(width, height, format);
    if data.len() != expected {
        return Err(TextureError::DataSizeMismatch {
            actual: data.len(),
            expected,
            width,
            height,
            format,
        });
    }
    Ok(())
}
