//! Render settings stored as RON

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{CullMode, RenderMode};
use crate::texture::Filter;
use crate::types::Color;

/// Everything the renderer and viewer read at startup.
///
/// Missing fields fall back to [`RenderSettings::default`], so a settings
/// file only has to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Render target size in pixels
    pub width: usize,
    pub height: usize,
    /// Worker threads; `None` lets rayon pick
    pub threads: Option<usize>,
    /// Rows per fragment-stage band
    pub band_rows: usize,
    pub cull_mode: CullMode,
    pub render_mode: RenderMode,
    pub clear_color: Color,
    pub wire_color: Color,
    pub marker_color: Color,
    /// Vertical field of view, clamped to [15, 90] by the camera
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub texture_filter: Filter,
    /// Image to map onto the viewer's mesh; a checkerboard when unset
    pub texture_path: Option<String>,
    /// OBJ model for the viewer; the built-in cube when unset
    pub mesh_path: Option<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
            threads: None,
            band_rows: 16,
            cull_mode: CullMode::Back,
            render_mode: RenderMode::Shaded,
            clear_color: Color::new(24, 24, 32),
            wire_color: Color::WHITE,
            marker_color: Color::MAGENTA,
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 100.0,
            texture_filter: Filter::Nearest,
            texture_path: None,
            mesh_path: None,
        }
    }
}

impl RenderSettings {
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> PipelineResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PipelineError::validation(format!(
                "render target must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.threads == Some(0) {
            return Err(PipelineError::validation("threads must be >= 1 when set"));
        }
        if self.band_rows == 0 {
            return Err(PipelineError::validation("band_rows must be >= 1"));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(PipelineError::validation(format!(
                "clip range must satisfy 0 < near < far, got near={} far={}",
                self.near, self.far
            )));
        }
        Ok(())
    }
}

/// Load settings from a RON file
pub fn load_settings<P: AsRef<Path>>(path: P) -> PipelineResult<RenderSettings> {
    let contents = fs::read_to_string(path)?;
    settings_from_str(&contents)
}

/// Save settings to a RON file
pub fn save_settings<P: AsRef<Path>>(settings: &RenderSettings, path: P) -> PipelineResult<()> {
    let config = ron::ser::PrettyConfig::new()
        .depth_limit(3)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(settings, config)?;
    fs::write(path, contents)?;
    Ok(())
}

/// Parse settings from a RON string
pub fn settings_from_str(s: &str) -> PipelineResult<RenderSettings> {
    let settings: RenderSettings = ron::from_str(s)?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_keeps_every_field() {
        let settings = RenderSettings {
            width: 320,
            height: 240,
            threads: Some(3),
            cull_mode: CullMode::Front,
            render_mode: RenderMode::Wireframe,
            texture_filter: Filter::Bilinear,
            texture_path: Some("assets/crate.png".to_string()),
            mesh_path: Some("model/teapot.obj".to_string()),
            ..Default::default()
        };
        let path = std::env::temp_dir().join(format!("softraster-settings-{}.ron", std::process::id()));
        save_settings(&settings, &path).unwrap();
        let loaded = load_settings(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(loaded, settings);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let s = settings_from_str("(width: 640, render_mode: WireframeBare)").unwrap();
        assert_eq!(s.width, 640);
        assert_eq!(s.height, RenderSettings::default().height);
        assert_eq!(s.render_mode, RenderMode::WireframeBare);
    }

    #[test]
    fn bad_input_is_reported() {
        assert!(matches!(settings_from_str("(width: "), Err(PipelineError::SettingsParse(_))));
        assert!(matches!(settings_from_str("(near: 5.0, far: 1.0)"), Err(PipelineError::Validation(_))));
        assert!(matches!(settings_from_str("(threads: Some(0))"), Err(PipelineError::Validation(_))));
        assert!(matches!(load_settings("/nonexistent/softraster.ron"), Err(PipelineError::Io(_))));
    }
}
