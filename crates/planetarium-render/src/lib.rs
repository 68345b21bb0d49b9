//! wgpu rendering backend: surface management, render passes, textures, and the
//! sphere and overlay pipelines.

pub mod buffer;
pub mod camera;
pub mod depth;
pub mod gpu;
pub mod mesh;
pub mod overlay;
pub mod pass;
pub mod planet_pipeline;
pub mod surface;
pub mod text;
pub mod texture;

pub use buffer::{BufferAllocator, IndexData, MeshBuffer, VertexPositionNormalUv};
pub use camera::{Camera, CameraUniform};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use mesh::{SphereMesh, generate_uv_sphere};
pub use overlay::{
    OverlayQuad, OverlayRenderer, ScissorRect, ScreenRect, clamp_scissor, quad_vertices,
};
pub use pass::{BLACK, DepthAttachmentConfig, FrameEncoder, RenderPassBuilder};
pub use planet_pipeline::{
    ModelUniform, PlanetPipeline, SceneLighting, SceneUniform, UniformBinding, draw_planet,
};
pub use surface::{PhysicalSize, SurfaceResizeEvent, SurfaceWrapper};
pub use text::{GLYPH_SIZE, RasterImage, TextRaster};
pub use texture::{
    ManagedTexture, PLACEHOLDER_TEXTURE, TextureError, TextureFilter, TextureManager,
    TextureOptions,
};
