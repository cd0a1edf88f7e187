//! Homogeneous clip-space polygon clipping (Sutherland-Hodgman)

use smallvec::SmallVec;

use crate::math::Vec4;

use super::payload::Interpolate;

/// Vertex program output: clip-space position plus varyings
#[derive(Debug, Clone, PartialEq)]
pub struct ClipVertex<V> {
    pub position: Vec4,
    pub varying: V,
}

impl<V: Interpolate> ClipVertex<V> {
    pub fn new(position: Vec4, varying: V) -> Self {
        Self { position, varying }
    }

    fn lerp(a: &Self, b: &Self, t: f32) -> Self {
        Self {
            position: a.position.lerp(b.position, t),
            varying: V::lerp2(&a.varying, &b.varying, t),
        }
    }
}

/// One of the six half-spaces bounding the view volume
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipPlane {
    Left,
    Right,
    Bottom,
    Top,
    Near,
    Far,
}

impl ClipPlane {
    pub const ALL: [ClipPlane; 6] = [
        ClipPlane::Left,
        ClipPlane::Right,
        ClipPlane::Bottom,
        ClipPlane::Top,
        ClipPlane::Near,
        ClipPlane::Far,
    ];

    /// Signed distance; non-negative means inside.
    pub fn distance(self, p: Vec4) -> f32 {
        match self {
            ClipPlane::Left => p.w + p.x,
            ClipPlane::Right => p.w - p.x,
            ClipPlane::Bottom => p.w + p.y,
            ClipPlane::Top => p.w - p.y,
            ClipPlane::Near => p.w + p.z,
            ClipPlane::Far => p.w - p.z,
        }
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Bitmask of the planes `p` lies outside of. NaN counts as outside.
pub fn outcode(p: Vec4) -> u8 {
    ClipPlane::ALL
        .iter()
        .filter(|plane| !(plane.distance(p) >= 0.0))
        .fold(0, |code, plane| code | plane.bit())
}

/// A triangle clipped by all six planes has at most nine vertices.
type Polygon<V> = SmallVec<[ClipVertex<V>; 9]>;

/// Point on `plane` along the edge, always computed from the inside end so
/// both triangles sharing an edge synthesize the identical vertex.
fn intersect<V: Interpolate>(inside: &ClipVertex<V>, outside: &ClipVertex<V>, plane: ClipPlane) -> ClipVertex<V> {
    let d_in = plane.distance(inside.position);
    let d_out = plane.distance(outside.position);
    let t = d_in / (d_in - d_out);
    let mut v = ClipVertex::lerp(inside, outside, t);
    // Snap the residual so the vertex sits exactly on the plane
    let residual = plane.distance(v.position);
    match plane {
        ClipPlane::Left => v.position.x -= residual,
        ClipPlane::Right => v.position.x += residual,
        ClipPlane::Bottom => v.position.y -= residual,
        ClipPlane::Top => v.position.y += residual,
        ClipPlane::Near => v.position.z -= residual,
        ClipPlane::Far => v.position.z += residual,
    }
    v
}

fn clip_against<V: Interpolate>(input: &Polygon<V>, plane: ClipPlane, output: &mut Polygon<V>) {
    output.clear();
    let n = input.len();
    for i in 0..n {
        let a = &input[i];
        let b = &input[(i + 1) % n];
        let d_a = plane.distance(a.position);
        let d_b = plane.distance(b.position);

        if d_a >= 0.0 {
            output.push(a.clone());
        }
        // A vertex on the plane is kept as is; only a strict crossing adds one
        if d_a > 0.0 && d_b < 0.0 {
            output.push(intersect(a, b, plane));
        } else if d_a < 0.0 && d_b > 0.0 {
            output.push(intersect(b, a, plane));
        }
    }
}

/// Drop repeated positions, including between the last and first vertex.
fn remove_duplicates<V>(polygon: &mut Polygon<V>) {
    polygon.dedup_by(|b, a| a.position == b.position);
    while polygon.len() > 1 && polygon[0].position == polygon[polygon.len() - 1].position {
        polygon.pop();
    }
}

/// Clip one triangle and append the result to `out` as a triangle list,
/// fanned from the polygon's first vertex. Returns the number of triangles
/// appended.
///
/// A triangle inside every plane is appended unmodified; one entirely
/// outside any single plane appends nothing.
pub fn clip_triangle<V: Interpolate>(tri: [ClipVertex<V>; 3], out: &mut Vec<ClipVertex<V>>) -> usize {
    let codes = [outcode(tri[0].position), outcode(tri[1].position), outcode(tri[2].position)];

    if codes.iter().all(|&c| c == 0) {
        out.extend(tri);
        return 1;
    }
    if codes[0] & codes[1] & codes[2] != 0 {
        return 0;
    }

    let crossed = codes[0] | codes[1] | codes[2];
    let mut polygon: Polygon<V> = SmallVec::from_iter(tri);
    let mut scratch: Polygon<V> = SmallVec::new();

    for plane in ClipPlane::ALL {
        if crossed & plane.bit() == 0 {
            continue;
        }
        clip_against(&polygon, plane, &mut scratch);
        std::mem::swap(&mut polygon, &mut scratch);
        if polygon.len() < 3 {
            return 0;
        }
    }

    remove_duplicates(&mut polygon);
    if polygon.len() < 3 {
        return 0;
    }

    let count = polygon.len() - 2;
    for i in 1..polygon.len() - 1 {
        out.push(polygon[0].clone());
        out.push(polygon[i].clone());
        out.push(polygon[i + 1].clone());
    }
    count
}
