//! Read-only textures with wrap addressing and nearest/bilinear filtering

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::math::{Vec2, Vec4};
use crate::types::Color;

/// Texture filtering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Filter {
    #[default]
    Nearest,
    Bilinear,
}

/// Simple texture (array of colors, row 0 is the top of the image)
#[derive(Debug, Clone)]
pub struct Texture {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
    name: String,
}

impl Texture {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::WHITE; width * height],
            name: String::new(),
        }
    }

    /// Wrap existing texels; `pixels` must hold exactly `width * height` colors
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Color>, name: String) -> PipelineResult<Self> {
        if pixels.len() != width * height {
            return Err(PipelineError::validation(format!(
                "texture {name:?} is {width}x{height} but has {} texels",
                pixels.len()
            )));
        }
        Ok(Self { width, height, pixels, name })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Load texture from an image file (PNG, JPEG, BMP)
    pub fn from_file<P: AsRef<std::path::Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let img = image::open(path)?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();

        let tex = Self::from_image(img, name);
        tracing::info!(name = %tex.name, width = tex.width, height = tex.height, "loaded texture");
        Ok(tex)
    }

    /// Load texture from encoded image bytes
    pub fn from_bytes(bytes: &[u8], name: String) -> PipelineResult<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_image(img, name))
    }

    fn from_image(img: image::DynamicImage, name: String) -> Self {
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let pixels: Vec<Color> = rgba
            .pixels()
            .map(|p| Color::with_alpha(p[0], p[1], p[2], p[3]))
            .collect();

        Self {
            width: width as usize,
            height: height as usize,
            pixels,
            name,
        }
    }

    /// Create a checkerboard test texture with `cell`-sized squares
    pub fn checkerboard(width: usize, height: usize, cell: usize, color1: Color, color2: Color) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                let checker = ((x / cell) + (y / cell)) % 2 == 0;
                pixels.push(if checker { color1 } else { color2 });
            }
        }
        Self { width, height, pixels, name: "checkerboard".to_string() }
    }

    /// Texel with wrap-around addressing
    pub fn texel_wrapped(&self, x: i64, y: i64) -> Color {
        if self.width == 0 || self.height == 0 {
            return Color::TRANSPARENT;
        }
        let tx = x.rem_euclid(self.width as i64) as usize;
        let ty = y.rem_euclid(self.height as i64) as usize;
        self.pixels.get(ty * self.width + tx).copied().unwrap_or(Color::TRANSPARENT)
    }

    /// Get pixel at x,y coordinates
    pub fn get_pixel(&self, x: usize, y: usize) -> Color {
        if x < self.width && y < self.height {
            self.pixels.get(y * self.width + x).copied().unwrap_or(Color::BLACK)
        } else {
            Color::BLACK
        }
    }

    /// Sample at normalized UV (v = 0 is the bottom row), returning RGBA in 0..1
    pub fn sample(&self, uv: Vec2, filter: Filter) -> Vec4 {
        if self.width == 0 || self.height == 0 || self.pixels.is_empty() {
            return Vec4::ZERO;
        }
        let x = uv.x * self.width as f32;
        let y = (1.0 - uv.y) * self.height as f32;
        if !x.is_finite() || !y.is_finite() {
            return Vec4::ZERO;
        }

        match filter {
            Filter::Nearest => self.texel_wrapped(x.floor() as i64, y.floor() as i64).to_vec4(),
            Filter::Bilinear => {
                // Texel centers sit at half-integer coordinates
                let fx = x - 0.5;
                let fy = y - 0.5;
                let x0 = fx.floor();
                let y0 = fy.floor();
                let tx = fx - x0;
                let ty = fy - y0;
                let (x0, y0) = (x0 as i64, y0 as i64);

                let c00 = self.texel_wrapped(x0, y0).to_vec4();
                let c10 = self.texel_wrapped(x0 + 1, y0).to_vec4();
                let c01 = self.texel_wrapped(x0, y0 + 1).to_vec4();
                let c11 = self.texel_wrapped(x0 + 1, y0 + 1).to_vec4();

                c00.lerp(c10, tx).lerp(c01.lerp(c11, tx), ty)
            }
        }
    }
}

/// Sample an optional texture; a missing texture reads as transparent black.
pub fn sample_texture(texture: Option<&Texture>, uv: Vec2, filter: Filter) -> Vec4 {
    match texture {
        Some(tex) => tex.sample(uv, filter),
        None => Vec4::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_by_two() -> Texture {
        // top row: red, green; bottom row: blue, white
        Texture::from_pixels(2, 2, vec![Color::RED, Color::GREEN, Color::BLUE, Color::WHITE], "quad".into()).unwrap()
    }

    #[test]
    fn nearest_uses_bottom_left_origin() {
        let tex = two_by_two();
        assert_eq!(tex.sample(Vec2::new(0.25, 0.25), Filter::Nearest), Color::BLUE.to_vec4());
        assert_eq!(tex.sample(Vec2::new(0.75, 0.75), Filter::Nearest), Color::GREEN.to_vec4());
    }

    #[test]
    fn nearest_wraps_out_of_range_uv() {
        let tex = two_by_two();
        let inside = tex.sample(Vec2::new(0.25, 0.75), Filter::Nearest);
        assert_eq!(tex.sample(Vec2::new(1.25, 0.75), Filter::Nearest), inside);
        assert_eq!(tex.sample(Vec2::new(-0.75, -0.25), Filter::Nearest), inside);
    }

    #[test]
    fn bilinear_blends_between_texel_centers() {
        let tex = Texture::from_pixels(2, 1, vec![Color::BLACK, Color::WHITE], "ramp".into()).unwrap();
        let mid = tex.sample(Vec2::new(0.5, 0.5), Filter::Bilinear);
        assert!((mid.x - 0.5).abs() < 1e-3);
        let at_center = tex.sample(Vec2::new(0.25, 0.5), Filter::Bilinear);
        assert!(at_center.x.abs() < 1e-3);
    }

    #[test]
    fn missing_texture_samples_transparent_black() {
        assert_eq!(sample_texture(None, Vec2::new(0.5, 0.5), Filter::Bilinear), Vec4::ZERO);
    }

    #[test]
    fn mismatched_texel_count_is_rejected() {
        let err = Texture::from_pixels(4, 4, vec![Color::WHITE; 3], "short".into());
        assert!(matches!(err, Err(PipelineError::Validation(_))));
    }

    #[test]
    fn empty_texture_samples_without_panicking() {
        let tex = Texture::new(0, 0);
        assert_eq!(tex.texel_wrapped(3, -2), Color::TRANSPARENT);
        assert_eq!(tex.sample(Vec2::new(0.5, 0.5), Filter::Bilinear), Vec4::ZERO);
        assert_eq!(tex.width(), 0);
        assert!(tex.pixels().is_empty());
    }

    #[test]
    fn checkerboard_alternates_cells() {
        let tex = Texture::checkerboard(8, 8, 4, Color::WHITE, Color::BLACK);
        assert_eq!(tex.get_pixel(0, 0), Color::WHITE);
        assert_eq!(tex.get_pixel(4, 0), Color::BLACK);
        assert_eq!(tex.get_pixel(4, 4), Color::WHITE);
    }
}
