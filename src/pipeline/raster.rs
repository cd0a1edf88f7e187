//! Scan conversion of screen-space triangles into fragments

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::payload::Interpolate;
use super::shader::Fragment;
use super::vertex::ScreenVertex;

/// Which screen-space winding to discard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CullMode {
    #[default]
    None,
    /// Discard counter-clockwise (front-facing) triangles
    Front,
    /// Discard clockwise (back-facing) triangles
    Back,
}

impl CullMode {
    pub fn next(self) -> Self {
        match self {
            CullMode::None => CullMode::Back,
            CullMode::Back => CullMode::Front,
            CullMode::Front => CullMode::None,
        }
    }

    /// True if a triangle with this signed area is discarded
    pub fn culls(self, signed_area: f32) -> bool {
        match self {
            CullMode::None => false,
            CullMode::Front => signed_area > 0.0,
            CullMode::Back => signed_area < 0.0,
        }
    }
}

/// Triangles whose doubled screen area is at or below this are skipped
pub const AREA_EPSILON: f32 = 1e-6;

/// Triangles handed to one worker task at a time
const TRIANGLES_PER_TASK: usize = 64;

/// Fragments plus the triangles the stage threw away
#[derive(Debug)]
pub struct RasterOutput<V> {
    pub fragments: Vec<Fragment<V>>,
    pub culled: usize,
    pub degenerate: usize,
}

impl<V> Default for RasterOutput<V> {
    fn default() -> Self {
        Self { fragments: Vec::new(), culled: 0, degenerate: 0 }
    }
}

impl<V> RasterOutput<V> {
    fn append(&mut self, mut other: RasterOutput<V>) {
        self.fragments.append(&mut other.fragments);
        self.culled += other.culled;
        self.degenerate += other.degenerate;
    }
}

/// Twice the signed area of `(a, b, c)`, positive when counter-clockwise
/// in y-up screen space
pub fn signed_area(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    (b.0 - a.0) * (c.1 - a.1) - (c.0 - a.0) * (b.1 - a.1)
}

/// Barycentric weights of `p` in triangle `(a, b, c)` with doubled area
/// `area`, clamped to be non-negative and renormalized to sum to one.
pub fn barycentric(p: (f32, f32), a: (f32, f32), b: (f32, f32), c: (f32, f32), area: f32) -> [f32; 3] {
    let mut w = [
        (signed_area(b, c, p) / area).max(0.0),
        (signed_area(c, a, p) / area).max(0.0),
        (signed_area(a, b, p) / area).max(0.0),
    ];
    let sum = w[0] + w[1] + w[2];
    if sum > 0.0 {
        for wi in &mut w {
            *wi /= sum;
        }
    } else {
        w = [1.0 / 3.0; 3];
    }
    w
}

/// Rasterize a flat triangle list (three vertices per triangle).
///
/// Work is split into batches of triangles on the current rayon pool; the
/// output keeps triangle order, and within a triangle rows go bottom to top
/// and pixels left to right.
pub fn rasterize<V: Interpolate>(
    vertices: &[ScreenVertex<V>],
    cull: CullMode,
    viewport: (usize, usize),
) -> RasterOutput<V> {
    let batches: Vec<RasterOutput<V>> = vertices
        .par_chunks(3 * TRIANGLES_PER_TASK)
        .map(|batch| {
            let mut out = RasterOutput::default();
            for tri in batch.chunks_exact(3) {
                rasterize_triangle(&tri[0], &tri[1], &tri[2], cull, viewport, &mut out);
            }
            out
        })
        .collect();

    let mut out = RasterOutput::default();
    for batch in batches {
        out.append(batch);
    }
    out
}

/// Scan-convert one triangle into `out`
pub fn rasterize_triangle<V: Interpolate>(
    a: &ScreenVertex<V>,
    b: &ScreenVertex<V>,
    c: &ScreenVertex<V>,
    cull: CullMode,
    viewport: (usize, usize),
    out: &mut RasterOutput<V>,
) {
    let (width, height) = viewport;
    let pa = (a.x, a.y);
    let pb = (b.x, b.y);
    let pc = (c.x, c.y);

    let area = signed_area(pa, pb, pc);
    if !(area.abs() > AREA_EPSILON) {
        out.degenerate += 1;
        return;
    }
    if cull.culls(area) {
        out.culled += 1;
        return;
    }
    if width == 0 || height == 0 {
        return;
    }

    // Sort by y for the edge walk; weights still refer to a, b, c
    let mut sorted = [pa, pb, pc];
    sorted.sort_by(|p, q| p.1.total_cmp(&q.1));
    let [lo, mid, hi] = sorted;
    let edges = [(lo, mid), (mid, hi), (lo, hi)];

    let row_start = lo.1.ceil().max(0.0) as i32;
    let row_end = hi.1.floor().min(height as f32 - 1.0) as i32;

    for y in row_start..=row_end {
        let yf = y as f32;
        let mut left = f32::INFINITY;
        let mut right = f32::NEG_INFINITY;

        for (p, q) in edges {
            if yf < p.1 || yf > q.1 {
                continue;
            }
            if q.1 == p.1 {
                left = left.min(p.0.min(q.0));
                right = right.max(p.0.max(q.0));
            } else {
                let x = p.0 + (q.0 - p.0) * (yf - p.1) / (q.1 - p.1);
                left = left.min(x);
                right = right.max(x);
            }
        }
        if left > right {
            continue;
        }

        let col_start = left.ceil().max(0.0) as i32;
        let col_end = right.floor().min(width as f32 - 1.0) as i32;

        for x in col_start..=col_end {
            let weights = barycentric((x as f32, yf), pa, pb, pc, area);
            out.fragments.push(make_fragment(x, y, weights, a, b, c));
        }
    }
}

/// Depth and 1/w are affine in screen space; varyings are weighted by 1/w
/// and renormalized for perspective correction.
fn make_fragment<V: Interpolate>(
    x: i32,
    y: i32,
    w: [f32; 3],
    a: &ScreenVertex<V>,
    b: &ScreenVertex<V>,
    c: &ScreenVertex<V>,
) -> Fragment<V> {
    let z = w[0] * a.z + w[1] * b.z + w[2] * c.z;
    let inv_w = w[0] * a.inv_w + w[1] * b.inv_w + w[2] * c.inv_w;
    let corrected = if inv_w > 0.0 {
        [
            w[0] * a.inv_w / inv_w,
            w[1] * b.inv_w / inv_w,
            w[2] * c.inv_w / inv_w,
        ]
    } else {
        w
    };

    Fragment {
        x,
        y,
        z,
        inv_w,
        barycentric: w,
        varying: V::lerp3(&a.varying, &b.varying, &c.varying, corrected),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sv(x: f32, y: f32, tag: f32) -> ScreenVertex<f32> {
        ScreenVertex { x, y, z: 0.0, inv_w: 1.0, varying: tag }
    }

    fn run(tri: &[ScreenVertex<f32>], cull: CullMode) -> RasterOutput<f32> {
        rasterize(tri, cull, (64, 64))
    }

    #[test]
    fn covers_right_triangle_samples() {
        let tri = [sv(0.0, 0.0, 0.0), sv(10.0, 0.0, 0.0), sv(0.0, 10.0, 0.0)];
        let out = run(&tri, CullMode::None);
        // integer samples with x + y <= 10
        assert_eq!(out.fragments.len(), 66);
        assert!(out.fragments.iter().all(|f| f.x + f.y <= 10 && f.x >= 0 && f.y >= 0));
    }

    #[test]
    fn weights_are_normalized_and_exact_at_vertices() {
        let tri = [sv(3.0, 2.0, 0.0), sv(40.0, 9.0, 0.0), sv(17.0, 33.0, 0.0)];
        let out = run(&tri, CullMode::None);
        assert!(!out.fragments.is_empty());
        for f in &out.fragments {
            let s: f32 = f.barycentric.iter().sum();
            assert!((s - 1.0).abs() < 1e-4);
            assert!(f.barycentric.iter().all(|&w| w >= -1e-4));
        }
        let at_vertex = out.fragments.iter().find(|f| (f.x, f.y) == (40, 9)).unwrap();
        let mut w = at_vertex.barycentric;
        w.sort_by(|a, b| a.total_cmp(b));
        assert_eq!(w, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn back_face_culling_drops_clockwise() {
        let cw = [sv(0.0, 0.0, 0.0), sv(0.0, 10.0, 0.0), sv(10.0, 0.0, 0.0)];
        assert!(signed_area((0.0, 0.0), (0.0, 10.0), (10.0, 0.0)) < 0.0);

        let culled = run(&cw, CullMode::Back);
        assert!(culled.fragments.is_empty());
        assert_eq!(culled.culled, 1);

        assert_eq!(run(&cw, CullMode::None).fragments.len(), 66);
        assert!(run(&cw, CullMode::Front).fragments.len() == 66);
    }

    #[test]
    fn front_face_culling_drops_counter_clockwise() {
        let ccw = [sv(0.0, 0.0, 0.0), sv(10.0, 0.0, 0.0), sv(0.0, 10.0, 0.0)];
        assert!(run(&ccw, CullMode::Front).fragments.is_empty());
        assert_eq!(run(&ccw, CullMode::Back).fragments.len(), 66);
    }

    #[test]
    fn zero_area_triangles_are_skipped() {
        let collinear = [sv(0.0, 0.0, 0.0), sv(5.0, 5.0, 0.0), sv(10.0, 10.0, 0.0)];
        let out = run(&collinear, CullMode::None);
        assert!(out.fragments.is_empty());
        assert_eq!(out.degenerate, 1);

        let point = [sv(4.0, 4.0, 0.0), sv(4.0, 4.0, 0.0), sv(4.0, 4.0, 0.0)];
        assert!(run(&point, CullMode::None).fragments.is_empty());
    }

    #[test]
    fn fragments_are_clipped_to_viewport() {
        let tri = [sv(-20.0, -20.0, 0.0), sv(100.0, -20.0, 0.0), sv(-20.0, 100.0, 0.0)];
        let out = rasterize(&tri, CullMode::None, (8, 4));
        assert_eq!(out.fragments.len(), 32);
    }

    #[test]
    fn varyings_interpolate_linearly_with_uniform_w() {
        let tri = [sv(0.0, 0.0, 0.0), sv(20.0, 0.0, 20.0), sv(0.0, 20.0, 0.0)];
        let out = run(&tri, CullMode::None);
        for f in &out.fragments {
            assert!((f.varying - f.x as f32).abs() < 1e-3);
        }
    }

    #[test]
    fn output_keeps_triangle_order_across_batches() {
        let mut tris = Vec::new();
        for i in 0..300 {
            let x = (i % 50) as f32;
            tris.push(sv(x, 0.0, i as f32));
            tris.push(sv(x + 3.0, 0.0, i as f32));
            tris.push(sv(x, 3.0, i as f32));
        }
        let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build().unwrap();
        let out = pool.install(|| run(&tris, CullMode::None));
        // Interpolated tags can land a few ulps off the integer
        let tags: Vec<i64> = out.fragments.iter().map(|f| f.varying.round() as i64).collect();
        assert!(tags.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(tags.first(), Some(&0));
        assert_eq!(tags.last(), Some(&299));
        assert_eq!(tags.len(), 300 * 10);
    }
}
