//! Stock shaders over [`MeshVertex`]

use crate::math::{Vec2, Vec3, Vec4};
use crate::pipeline::{Fragment, FrameContext, PixelSink, Shader};
use crate::texture::{Filter, Texture};
use crate::types::{Color, MeshVertex};

/// Ambient plus Lambert diffuse, clamped to [0, 1]
pub fn shade_intensity(normal: Vec3, light_dir: Vec3, ambient: f32) -> f32 {
    let diffuse = normal.dot(light_dir).max(0.0);
    (ambient + (1.0 - ambient) * diffuse).clamp(0.0, 1.0)
}

/// Single unlit color
#[derive(Debug, Clone, Copy)]
pub struct FlatShader {
    pub color: Color,
}

impl Shader for FlatShader {
    type Vertex = MeshVertex;
    type Varying = ();

    fn vertex(&self, ctx: &FrameContext, input: &MeshVertex) -> (Vec4, ()) {
        (ctx.to_clip(input.pos), ())
    }

    fn fragment(&self, _ctx: &FrameContext, _fragment: &Fragment<()>, out: &mut PixelSink<'_, '_>) {
        out.write_color(0, self.color);
    }
}

/// World-space normal mapped to RGB, useful for checking geometry
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalShader;

impl Shader for NormalShader {
    type Vertex = MeshVertex;
    type Varying = Vec3;

    fn vertex(&self, ctx: &FrameContext, input: &MeshVertex) -> (Vec4, Vec3) {
        let normal = ctx.model.normal_matrix().transform_vector(input.normal);
        (ctx.to_clip(input.pos), normal)
    }

    fn fragment(&self, _ctx: &FrameContext, fragment: &Fragment<Vec3>, out: &mut PixelSink<'_, '_>) {
        let n = fragment.varying.normalize();
        out.write_color(0, Color::from_vec3(n * 0.5 + Vec3::ONE * 0.5));
    }
}

/// Textured surface lit by one directional light.
///
/// Diffuse is ambient + Lambert; a Blinn-Phong highlight is added when
/// `specular` is non-zero. Without a texture `base_color` is the albedo.
#[derive(Debug, Clone, Copy)]
pub struct LitTextureShader<'t> {
    pub texture: Option<&'t Texture>,
    pub filter: Filter,
    pub base_color: Color,
    /// Direction towards the light, world space
    pub light_dir: Vec3,
    pub ambient: f32,
    pub specular: f32,
    pub shininess: f32,
}

impl<'t> LitTextureShader<'t> {
    pub fn new(texture: Option<&'t Texture>, filter: Filter) -> Self {
        Self {
            texture,
            filter,
            base_color: Color::WHITE,
            light_dir: Vec3::new(0.4, 0.8, 0.6).normalize(),
            ambient: 0.25,
            specular: 0.0,
            shininess: 32.0,
        }
    }

    fn albedo(&self, uv: Vec2) -> Vec4 {
        match self.texture {
            Some(tex) => tex.sample(uv, self.filter),
            None => self.base_color.to_vec4(),
        }
    }
}

impl Shader for LitTextureShader<'_> {
    type Vertex = MeshVertex;
    /// uv, world normal, world position
    type Varying = (Vec2, Vec3, Vec3);

    fn vertex(&self, ctx: &FrameContext, input: &MeshVertex) -> (Vec4, Self::Varying) {
        let world = ctx.model.transform_point(input.pos);
        let normal = ctx.model.normal_matrix().transform_vector(input.normal);
        (ctx.to_clip(input.pos), (input.uv, normal, world))
    }

    fn fragment(&self, ctx: &FrameContext, fragment: &Fragment<Self::Varying>, out: &mut PixelSink<'_, '_>) {
        let (uv, normal, world) = fragment.varying;
        let n = normal.normalize();
        let albedo = self.albedo(uv);
        let lit = shade_intensity(n, self.light_dir, self.ambient);

        let mut rgb = albedo.xyz() * lit;
        if self.specular > 0.0 {
            let view = (ctx.eye - world).normalize();
            let half = (view + self.light_dir).normalize();
            let highlight = n.dot(half).max(0.0).powf(self.shininess) * self.specular;
            rgb = rgb + Vec3::ONE * highlight;
        }
        out.write_color(0, Color::from_vec4(rgb.extend(albedo.w)));
    }
}
