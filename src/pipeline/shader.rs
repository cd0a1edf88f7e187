//! Programmable stages: the `Shader` trait and the data it sees

use crate::math::{Mat4, Vec3, Vec4};
use crate::types::Color;

use super::payload::Interpolate;
use super::target::TargetRegion;

/// Per-frame transform state handed to every shader invocation
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameContext {
    pub model: Mat4,
    pub view: Mat4,
    pub projection: Mat4,
    /// Camera position in world space
    pub eye: Vec3,
    /// Seconds since start, for animated shaders
    pub time: f32,
}

impl FrameContext {
    pub fn new(model: Mat4, view: Mat4, projection: Mat4, eye: Vec3) -> Self {
        Self { model, view, projection, eye, time: 0.0 }
    }

    pub fn mvp(&self) -> Mat4 {
        self.projection * self.view * self.model
    }

    /// Object-space position to clip space
    pub fn to_clip(&self, pos: Vec3) -> Vec4 {
        self.mvp() * pos.extend(1.0)
    }
}

/// A rasterized sample waiting for the depth test and fragment program
#[derive(Debug, Clone)]
pub struct Fragment<V> {
    pub x: i32,
    pub y: i32,
    /// NDC depth, used only for the depth test
    pub z: f32,
    /// Interpolated 1/w, used only for perspective correction
    pub inv_w: f32,
    /// Screen-space barycentric weights of the source triangle's vertices
    pub barycentric: [f32; 3],
    pub varying: V,
}

/// Write access to the single pixel a fragment covers
pub struct PixelSink<'s, 'r> {
    region: &'s mut TargetRegion<'r>,
    x: i32,
    y: i32,
}

impl<'s, 'r> PixelSink<'s, 'r> {
    pub(crate) fn new(region: &'s mut TargetRegion<'r>, x: i32, y: i32) -> Self {
        Self { region, x, y }
    }

    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    /// Write to color attachment `index`; unknown attachments are ignored.
    pub fn write_color(&mut self, index: usize, color: Color) {
        self.region.write_color(index, self.x, self.y, color);
    }

    /// Override the depth already written by the depth test
    pub fn write_depth(&mut self, depth: f32) {
        self.region.write_depth(self.x, self.y, depth);
    }
}

/// A vertex + fragment program pair.
///
/// The pipeline is generic over implementors; `Varying` is whatever the
/// vertex program wants carried to the fragment program.
pub trait Shader: Sync {
    type Vertex: Sync;
    type Varying: Interpolate;

    /// Transform one vertex to clip space and emit its varyings.
    fn vertex(&self, ctx: &FrameContext, input: &Self::Vertex) -> (Vec4, Self::Varying);

    /// Shade a fragment that passed the depth test.
    fn fragment(&self, ctx: &FrameContext, fragment: &Fragment<Self::Varying>, out: &mut PixelSink<'_, '_>);
}
