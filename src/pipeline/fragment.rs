//! Fragment stage: depth test, then run the fragment program
//!
//! The back buffers are split into horizontal bands and every band is owned
//! by exactly one worker, so the read-test-write on a pixel never races even
//! when triangles overlap on screen.

use rayon::prelude::*;

use super::shader::{Fragment, FrameContext, PixelSink, Shader};
use super::target::{FrameAdapter, TargetRegion};

/// Outcome counts of one fragment pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShadeStats {
    /// Passed the depth test and ran the fragment program
    pub shaded: usize,
    /// Failed the depth test
    pub occluded: usize,
    /// Outside the viewport
    pub offscreen: usize,
}

impl ShadeStats {
    fn merge(self, other: ShadeStats) -> ShadeStats {
        ShadeStats {
            shaded: self.shaded + other.shaded,
            occluded: self.occluded + other.occluded,
            offscreen: self.offscreen + other.offscreen,
        }
    }
}

/// Depth-test and shade `fragments` into the adapter's back buffers.
///
/// Fragments are bucketed by band in list order, so the result is identical
/// to shading the list front to back on one thread. Runs on the current
/// rayon pool.
pub fn process_fragments<S: Shader>(
    shader: &S,
    ctx: &FrameContext,
    fragments: &[Fragment<S::Varying>],
    adapter: &mut FrameAdapter<'_>,
    band_rows: usize,
) -> ShadeStats {
    let Some((width, height)) = adapter.viewport() else {
        return ShadeStats { offscreen: fragments.len(), ..Default::default() };
    };
    if width == 0 || height == 0 {
        return ShadeStats { offscreen: fragments.len(), ..Default::default() };
    }
    let band_rows = band_rows.clamp(1, height);

    let mut offscreen = 0;
    let mut buckets: Vec<Vec<&Fragment<S::Varying>>> = vec![Vec::new(); height.div_ceil(band_rows)];
    for f in fragments {
        if f.x < 0 || f.y < 0 || f.x as usize >= width || f.y as usize >= height {
            offscreen += 1;
            continue;
        }
        let row = height - f.y as usize - 1;
        buckets[row / band_rows].push(f);
    }

    let mut regions = adapter.regions(band_rows);
    debug_assert_eq!(regions.len(), buckets.len());

    let stats = regions
        .par_iter_mut()
        .zip(buckets.par_iter())
        .map(|(region, bucket)| shade_band(shader, ctx, region, bucket))
        .reduce(ShadeStats::default, ShadeStats::merge);

    ShadeStats { offscreen, ..stats }
}

fn shade_band<S: Shader>(
    shader: &S,
    ctx: &FrameContext,
    region: &mut TargetRegion<'_>,
    bucket: &[&Fragment<S::Varying>],
) -> ShadeStats {
    let mut stats = ShadeStats::default();
    for f in bucket {
        if !(f.z < region.read_depth(f.x, f.y)) {
            stats.occluded += 1;
            continue;
        }
        region.write_depth(f.x, f.y, f.z);
        let mut sink = PixelSink::new(region, f.x, f.y);
        shader.fragment(ctx, f, &mut sink);
        stats.shaded += 1;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec4;
    use crate::pipeline::target::{ColorBuffer, DepthBuffer, DEPTH_CLEAR};
    use crate::types::Color;

    /// Writes its varying as the red channel; optionally pushes depth back
    struct Tagged {
        depth_override: Option<f32>,
    }

    impl Shader for Tagged {
        type Vertex = Vec4;
        type Varying = u8;

        fn vertex(&self, _ctx: &FrameContext, input: &Vec4) -> (Vec4, u8) {
            (*input, 0)
        }

        fn fragment(&self, _ctx: &FrameContext, fragment: &Fragment<u8>, out: &mut PixelSink<'_, '_>) {
            out.write_color(0, Color::new(fragment.varying, 0, 0));
            if let Some(d) = self.depth_override {
                out.write_depth(d);
            }
        }
    }

    impl crate::pipeline::payload::Interpolate for u8 {
        fn lerp2(a: &Self, _b: &Self, _t: f32) -> Self {
            *a
        }
        fn lerp3(a: &Self, _b: &Self, _c: &Self, _w: [f32; 3]) -> Self {
            *a
        }
    }

    fn frag(x: i32, y: i32, z: f32, tag: u8) -> Fragment<u8> {
        Fragment { x, y, z, inv_w: 1.0, barycentric: [1.0, 0.0, 0.0], varying: tag }
    }

    fn shade(fragments: &[Fragment<u8>], band_rows: usize, shader: &Tagged) -> (ColorBuffer, DepthBuffer, ShadeStats) {
        let mut color = ColorBuffer::new(8, 8, Color::BLACK);
        let mut depth = DepthBuffer::new(8, 8, DEPTH_CLEAR);
        let stats = {
            let mut adapter = FrameAdapter::new();
            adapter.bind_color(&mut color).unwrap();
            adapter.bind_depth(&mut depth).unwrap();
            process_fragments(shader, &FrameContext::default(), fragments, &mut adapter, band_rows)
        };
        (color, depth, stats)
    }

    #[test]
    fn nearer_fragment_wins_regardless_of_order() {
        let shader = Tagged { depth_override: None };
        let near = frag(3, 3, -0.5, 1);
        let far = frag(3, 3, 0.5, 2);

        let (a, _, sa) = shade(&[near.clone(), far.clone()], 2, &shader);
        let (b, _, sb) = shade(&[far, near], 2, &shader);
        assert_eq!(a.back_texel(3, 3), Some(Color::new(1, 0, 0)));
        assert_eq!(b.back_texel(3, 3), Some(Color::new(1, 0, 0)));
        assert_eq!((sa.shaded, sa.occluded), (1, 1));
        assert_eq!((sb.shaded, sb.occluded), (2, 0));
    }

    #[test]
    fn equal_depth_is_rejected() {
        let shader = Tagged { depth_override: None };
        let (c, _, stats) = shade(&[frag(0, 0, 0.0, 1), frag(0, 0, 0.0, 2)], 8, &shader);
        assert_eq!(c.back_texel(0, 0), Some(Color::new(1, 0, 0)));
        assert_eq!(stats.occluded, 1);
    }

    #[test]
    fn offscreen_fragments_are_dropped() {
        let shader = Tagged { depth_override: None };
        let (_, _, stats) = shade(&[frag(-1, 0, 0.0, 1), frag(0, 8, 0.0, 1), frag(1, 1, 0.0, 1)], 3, &shader);
        assert_eq!(stats, ShadeStats { shaded: 1, occluded: 0, offscreen: 2 });
    }

    #[test]
    fn fragment_program_can_override_depth() {
        let shader = Tagged { depth_override: Some(0.9) };
        let (_, depth, _) = shade(&[frag(2, 5, -0.2, 1)], 4, &shader);
        assert_eq!(depth.back_texel(2, 5), Some(0.9));
    }

    #[test]
    fn banded_result_matches_single_band() {
        let shader = Tagged { depth_override: None };
        let mut fragments = Vec::new();
        for i in 0..200u32 {
            let x = (i * 7 % 8) as i32;
            let y = (i * 3 % 8) as i32;
            let z = ((i * 37 % 101) as f32) / 101.0 - 0.5;
            fragments.push(frag(x, y, z, (i % 250) as u8));
        }
        let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        let (single, single_depth, _) = shade(&fragments, 8, &shader);
        let (banded, banded_depth, _) = pool.install(|| shade(&fragments, 1, &shader));
        assert_eq!(single.back(), banded.back());
        assert_eq!(single_depth.back(), banded_depth.back());
    }
}
