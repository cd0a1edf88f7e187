//! Vertex stage: run the vertex program, clip, divide, map to the viewport

use super::clip::{clip_triangle, ClipVertex};
use super::shader::{FrameContext, Shader};

/// Smallest clip-space w accepted by the perspective divide
pub const MIN_W: f32 = 1e-6;

/// A clipped vertex in screen space, ready for rasterization
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenVertex<V> {
    /// Pixel coordinates, y-up, in `[0, width] x [0, height]`
    pub x: f32,
    pub y: f32,
    /// NDC depth in `[-1, 1]`, nearer is smaller
    pub z: f32,
    /// Reciprocal of clip-space w
    pub inv_w: f32,
    pub varying: V,
}

/// Perspective divide and viewport transform.
/// Non-positive or NaN w is clamped to [`MIN_W`].
pub fn to_screen<V>(v: ClipVertex<V>, width: usize, height: usize) -> ScreenVertex<V> {
    let w = if v.position.w > MIN_W { v.position.w } else { MIN_W };
    let inv_w = 1.0 / w;
    let ndc = v.position.xyz() * inv_w;
    ScreenVertex {
        x: (ndc.x + 1.0) * 0.5 * width as f32,
        y: (ndc.y + 1.0) * 0.5 * height as f32,
        z: ndc.z,
        inv_w,
        varying: v.varying,
    }
}

/// Run the vertex stage over a triangle list.
///
/// With `indices`, every three indices form a triangle and each referenced
/// vertex is shaded once. Triangles that reference a missing vertex, or have
/// a non-finite clip position, are dropped; a trailing partial triangle is
/// ignored. The result is a flat list, three vertices per triangle.
pub fn process_vertices<S: Shader>(
    shader: &S,
    ctx: &FrameContext,
    vertices: &[S::Vertex],
    indices: Option<&[u32]>,
    viewport: (usize, usize),
) -> Vec<ScreenVertex<S::Varying>> {
    let (width, height) = viewport;

    let transformed: Vec<ClipVertex<S::Varying>> = vertices
        .iter()
        .map(|v| {
            let (position, varying) = shader.vertex(ctx, v);
            ClipVertex { position, varying }
        })
        .collect();

    let corners: Box<dyn Iterator<Item = [usize; 3]> + '_> = match indices {
        Some(idx) => {
            if idx.len() % 3 != 0 {
                tracing::warn!(count = idx.len(), "index count is not a multiple of 3, ignoring the remainder");
            }
            Box::new(idx.chunks_exact(3).map(|t| [t[0] as usize, t[1] as usize, t[2] as usize]))
        }
        None => {
            if vertices.len() % 3 != 0 {
                tracing::warn!(count = vertices.len(), "vertex count is not a multiple of 3, ignoring the remainder");
            }
            Box::new((0..vertices.len() / 3).map(|t| [t * 3, t * 3 + 1, t * 3 + 2]))
        }
    };

    let mut clipped = Vec::with_capacity(transformed.len());
    let mut bad_indices = 0usize;
    let mut non_finite = 0usize;

    for [a, b, c] in corners {
        let (Some(va), Some(vb), Some(vc)) = (transformed.get(a), transformed.get(b), transformed.get(c)) else {
            bad_indices += 1;
            continue;
        };
        let finite = [va, vb, vc].iter().all(|v| {
            let p = v.position;
            p.x.is_finite() && p.y.is_finite() && p.z.is_finite() && p.w.is_finite()
        });
        if !finite {
            non_finite += 1;
            continue;
        }
        clip_triangle([va.clone(), vb.clone(), vc.clone()], &mut clipped);
    }

    if bad_indices > 0 {
        tracing::warn!(triangles = bad_indices, "dropped triangles with out-of-range indices");
    }
    if non_finite > 0 {
        tracing::debug!(triangles = non_finite, "dropped triangles with non-finite clip positions");
    }

    clipped
        .into_iter()
        .map(|v| to_screen(v, width, height))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec4;
    use crate::pipeline::shader::{Fragment, PixelSink};

    /// Passes positions straight through as clip coordinates
    struct Passthrough;

    impl Shader for Passthrough {
        type Vertex = Vec4;
        type Varying = f32;

        fn vertex(&self, _ctx: &FrameContext, input: &Vec4) -> (Vec4, f32) {
            (*input, input.x)
        }

        fn fragment(&self, _ctx: &FrameContext, _fragment: &Fragment<f32>, _out: &mut PixelSink<'_, '_>) {}
    }

    #[test]
    fn maps_ndc_corners_to_viewport() {
        let verts = [
            Vec4::new(-1.0, -1.0, 0.0, 1.0),
            Vec4::new(1.0, -1.0, 0.0, 1.0),
            Vec4::new(1.0, 1.0, 0.5, 1.0),
        ];
        let out = process_vertices(&Passthrough, &FrameContext::default(), &verts, None, (200, 100));
        assert_eq!(out.len(), 3);
        assert_eq!((out[0].x, out[0].y), (0.0, 0.0));
        assert_eq!((out[1].x, out[1].y), (200.0, 0.0));
        assert_eq!((out[2].x, out[2].y, out[2].z), (200.0, 100.0, 0.5));
    }

    #[test]
    fn divides_by_w_and_keeps_reciprocal() {
        let verts = [
            Vec4::new(0.0, 0.0, 1.0, 2.0),
            Vec4::new(1.0, 0.0, 1.0, 2.0),
            Vec4::new(0.0, 1.0, 1.0, 2.0),
        ];
        let out = process_vertices(&Passthrough, &FrameContext::default(), &verts, None, (100, 100));
        assert_eq!(out[0].inv_w, 0.5);
        assert_eq!(out[0].z, 0.5);
        assert_eq!(out[1].x, 75.0);
    }

    #[test]
    fn zero_w_is_clamped() {
        let v = to_screen(ClipVertex::new(Vec4::new(0.0, 0.0, 0.0, 0.0), ()), 10, 10);
        assert_eq!(v.inv_w, 1.0 / MIN_W);
        assert_eq!((v.x, v.y), (5.0, 5.0));
    }

    #[test]
    fn indexed_triangles_and_bad_indices() {
        let verts = [
            Vec4::new(-0.5, -0.5, 0.0, 1.0),
            Vec4::new(0.5, -0.5, 0.0, 1.0),
            Vec4::new(0.5, 0.5, 0.0, 1.0),
            Vec4::new(-0.5, 0.5, 0.0, 1.0),
        ];
        let indices = [0, 1, 2, 0, 2, 3, 0, 2, 9, 1];
        let out = process_vertices(&Passthrough, &FrameContext::default(), &verts, Some(&indices[..]), (10, 10));
        assert_eq!(out.len(), 6);
        assert_eq!(out[5].varying, -0.5);
    }

    #[test]
    fn trailing_vertices_and_nan_triangles_are_dropped() {
        let verts = [
            Vec4::new(f32::NAN, 0.0, 0.0, 1.0),
            Vec4::new(0.5, -0.5, 0.0, 1.0),
            Vec4::new(0.5, 0.5, 0.0, 1.0),
            Vec4::new(-0.5, 0.5, 0.0, 1.0),
        ];
        let out = process_vertices(&Passthrough, &FrameContext::default(), &verts, None, (10, 10));
        assert!(out.is_empty());
    }
}
