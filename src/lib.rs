//! softraster: a multithreaded software 3D rendering pipeline
//!
//! Triangles go through a user-supplied [`Shader`]:
//! - Vertex program to homogeneous clip space
//! - Frustum clipping against all six planes
//! - Perspective divide and viewport mapping (y-up)
//! - Scan conversion with perspective-correct varyings, on a rayon pool
//! - Depth test and fragment program over pixel-disjoint row bands
//!
//! Output lands in double-buffered color/depth targets bound through a
//! [`FrameAdapter`]; `swap` publishes the finished frame.

/// Version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod camera;
pub mod config;
pub mod error;
pub mod math;
pub mod mesh;
pub mod pipeline;
pub mod shaders;
pub mod texture;
pub mod types;

pub use camera::Camera;
pub use config::{load_settings, save_settings, settings_from_str, RenderSettings};
pub use error::{PipelineError, PipelineResult};
pub use mesh::Mesh;
pub use pipeline::{
    ColorBuffer, CullMode, DepthBuffer, Fragment, FrameAdapter, FrameContext, FrameStats, Interpolate, PixelSink,
    RenderMode, Renderer, Shader,
};
pub use texture::{sample_texture, Filter, Texture};
pub use types::{Color, MeshVertex};
