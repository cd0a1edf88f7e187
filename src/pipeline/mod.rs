//! Programmable triangle pipeline
//!
//! - `shader.rs`   - Shader trait, frame uniforms, fragment output sink
//! - `payload.rs`  - Interpolate trait for varyings
//! - `clip.rs`     - Homogeneous frustum clipping
//! - `vertex.rs`   - Vertex stage, perspective divide, viewport mapping
//! - `raster.rs`   - Scan conversion, culling, perspective-correct varyings
//! - `fragment.rs` - Depth test and fragment shading over row bands
//! - `target.rs`   - Double-buffered render targets and the frame adapter
//! - `line.rs`     - Bresenham lines for wireframe
//! - `renderer.rs` - Draw calls tying the stages together

mod clip;
mod fragment;
mod line;
mod payload;
mod raster;
mod renderer;
mod shader;
mod target;
mod vertex;

pub use clip::{clip_triangle, outcode, ClipPlane, ClipVertex};
pub use fragment::{process_fragments, ShadeStats};
pub use line::LinePixels;
pub use payload::Interpolate;
pub use raster::{barycentric, rasterize, rasterize_triangle, signed_area, CullMode, RasterOutput, AREA_EPSILON};
pub use renderer::{FrameStats, RenderMode, Renderer};
pub use shader::{Fragment, FrameContext, PixelSink, Shader};
pub use target::{ColorBuffer, DepthBuffer, DoubleBuffer, FrameAdapter, TargetRegion, DEPTH_CLEAR};
pub use vertex::{process_vertices, to_screen, ScreenVertex, MIN_W};
