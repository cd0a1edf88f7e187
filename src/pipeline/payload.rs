//! Interpolation contract for shader varyings

use crate::math::{Vec2, Vec3, Vec4};
use crate::types::Color;

/// A value the pipeline can blend across a primitive.
///
/// `lerp2` is used when clipping manufactures a vertex on a frustum plane,
/// `lerp3` when the rasterizer reconstructs a value inside a triangle. The
/// weights passed to `lerp3` are non-negative and sum to one.
pub trait Interpolate: Clone + Send + Sync {
    fn lerp2(a: &Self, b: &Self, t: f32) -> Self;
    fn lerp3(a: &Self, b: &Self, c: &Self, w: [f32; 3]) -> Self;
}

impl Interpolate for () {
    fn lerp2(_: &Self, _: &Self, _: f32) -> Self {}
    fn lerp3(_: &Self, _: &Self, _: &Self, _: [f32; 3]) -> Self {}
}

impl Interpolate for f32 {
    fn lerp2(a: &Self, b: &Self, t: f32) -> Self {
        a + (b - a) * t
    }

    fn lerp3(a: &Self, b: &Self, c: &Self, w: [f32; 3]) -> Self {
        a * w[0] + b * w[1] + c * w[2]
    }
}

macro_rules! impl_interpolate_vec {
    ($ty:ty) => {
        impl Interpolate for $ty {
            fn lerp2(a: &Self, b: &Self, t: f32) -> Self {
                *a + (*b - *a) * t
            }

            fn lerp3(a: &Self, b: &Self, c: &Self, w: [f32; 3]) -> Self {
                *a * w[0] + *b * w[1] + *c * w[2]
            }
        }
    };
}

impl_interpolate_vec!(Vec2);
impl_interpolate_vec!(Vec3);
impl_interpolate_vec!(Vec4);

impl Interpolate for Color {
    fn lerp2(a: &Self, b: &Self, t: f32) -> Self {
        Color::from_vec4(a.to_vec4().lerp(b.to_vec4(), t))
    }

    fn lerp3(a: &Self, b: &Self, c: &Self, w: [f32; 3]) -> Self {
        Color::from_vec4(Vec4::lerp3(&a.to_vec4(), &b.to_vec4(), &c.to_vec4(), w))
    }
}

macro_rules! impl_interpolate_tuple {
    ($($name:ident : $idx:tt),+) => {
        impl<$($name: Interpolate),+> Interpolate for ($($name,)+) {
            fn lerp2(a: &Self, b: &Self, t: f32) -> Self {
                ($($name::lerp2(&a.$idx, &b.$idx, t),)+)
            }

            fn lerp3(a: &Self, b: &Self, c: &Self, w: [f32; 3]) -> Self {
                ($($name::lerp3(&a.$idx, &b.$idx, &c.$idx, w),)+)
            }
        }
    };
}

impl_interpolate_tuple!(A: 0);
impl_interpolate_tuple!(A: 0, B: 1);
impl_interpolate_tuple!(A: 0, B: 1, C: 2);
impl_interpolate_tuple!(A: 0, B: 1, C: 2, D: 3);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp2_endpoints() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(3.0, 2.0, 1.0);
        assert_eq!(Vec3::lerp2(&a, &b, 0.0), a);
        assert_eq!(Vec3::lerp2(&a, &b, 1.0), b);
        assert_eq!(Vec3::lerp2(&a, &b, 0.5), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn lerp3_on_tuples_blends_every_field() {
        let a = (1.0f32, Vec2::new(0.0, 0.0));
        let b = (4.0f32, Vec2::new(3.0, 0.0));
        let c = (7.0f32, Vec2::new(0.0, 3.0));
        let (s, v) = <(f32, Vec2)>::lerp3(&a, &b, &c, [1.0 / 3.0; 3]);
        assert!((s - 4.0).abs() < 1e-5);
        assert!((v.x - 1.0).abs() < 1e-5 && (v.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn color_lerp_is_clamped_bytes() {
        let c = Color::lerp2(&Color::BLACK, &Color::WHITE, 0.5);
        assert_eq!(c, Color::new(128, 128, 128));
    }
}
