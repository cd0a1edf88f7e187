//! Frame orchestration: vertex → raster → fragment, plus wireframe overlay

use serde::{Deserialize, Serialize};

use crate::config::RenderSettings;
use crate::error::PipelineResult;
use crate::types::Color;

use super::fragment::process_fragments;
use super::line::LinePixels;
use super::raster::{rasterize, CullMode};
use super::shader::{FrameContext, Shader};
use super::target::FrameAdapter;
use super::vertex::{process_vertices, ScreenVertex};

/// What a draw call produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    /// Depth-tested shaded triangles
    #[default]
    Shaded,
    /// Shaded triangles with edges and vertex markers on top
    ShadedWireframe,
    /// Edges and vertex markers only
    Wireframe,
    /// Edges only
    WireframeBare,
}

impl RenderMode {
    pub fn next(self) -> Self {
        match self {
            RenderMode::Shaded => RenderMode::ShadedWireframe,
            RenderMode::ShadedWireframe => RenderMode::Wireframe,
            RenderMode::Wireframe => RenderMode::WireframeBare,
            RenderMode::WireframeBare => RenderMode::Shaded,
        }
    }

    pub fn shades(self) -> bool {
        matches!(self, RenderMode::Shaded | RenderMode::ShadedWireframe)
    }

    pub fn draws_edges(self) -> bool {
        self != RenderMode::Shaded
    }

    pub fn draws_markers(self) -> bool {
        matches!(self, RenderMode::ShadedWireframe | RenderMode::Wireframe)
    }
}

/// Half the side of the square drawn on each vertex in wireframe modes
const MARKER_RADIUS: i32 = 4;

/// Counters for one draw call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Triangles submitted by the caller
    pub triangles: usize,
    /// Triangles left after frustum clipping (a clipped triangle may split)
    pub clipped_triangles: usize,
    pub culled: usize,
    pub degenerate: usize,
    pub fragments: usize,
    pub shaded: usize,
    pub occluded: usize,
}

/// Draws triangle lists through a shader into a [`FrameAdapter`].
///
/// Holds a worker pool that lives as long as the renderer and is reused
/// for the raster and fragment stages of every frame.
pub struct Renderer {
    cull_mode: CullMode,
    render_mode: RenderMode,
    band_rows: usize,
    wire_color: Color,
    marker_color: Color,
    pool: rayon::ThreadPool,
}

impl Renderer {
    pub fn new(settings: &RenderSettings) -> PipelineResult<Self> {
        settings.validate()?;
        let pool = build_thread_pool(settings.threads)?;
        tracing::info!(threads = pool.current_num_threads(), band_rows = settings.band_rows, "renderer ready");

        Ok(Self {
            cull_mode: settings.cull_mode,
            render_mode: settings.render_mode,
            band_rows: settings.band_rows,
            wire_color: settings.wire_color,
            marker_color: settings.marker_color,
            pool,
        })
    }

    pub fn cull_mode(&self) -> CullMode {
        self.cull_mode
    }

    pub fn set_cull_mode(&mut self, mode: CullMode) {
        self.cull_mode = mode;
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn set_render_mode(&mut self, mode: RenderMode) {
        self.render_mode = mode;
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Draw a non-indexed triangle list
    pub fn draw<S: Shader>(
        &self,
        ctx: &FrameContext,
        shader: &S,
        vertices: &[S::Vertex],
        adapter: &mut FrameAdapter<'_>,
    ) -> FrameStats {
        self.draw_inner(ctx, shader, vertices, None, adapter)
    }

    /// Draw a triangle list given by `indices` into `vertices`
    pub fn draw_indexed<S: Shader>(
        &self,
        ctx: &FrameContext,
        shader: &S,
        vertices: &[S::Vertex],
        indices: &[u32],
        adapter: &mut FrameAdapter<'_>,
    ) -> FrameStats {
        self.draw_inner(ctx, shader, vertices, Some(indices), adapter)
    }

    #[tracing::instrument(level = "trace", skip_all, fields(mode = ?self.render_mode))]
    fn draw_inner<S: Shader>(
        &self,
        ctx: &FrameContext,
        shader: &S,
        vertices: &[S::Vertex],
        indices: Option<&[u32]>,
        adapter: &mut FrameAdapter<'_>,
    ) -> FrameStats {
        let Some(viewport) = adapter.viewport() else {
            return FrameStats::default();
        };

        let mut stats = FrameStats {
            triangles: indices.map_or(vertices.len(), |i| i.len()) / 3,
            ..Default::default()
        };

        let screen = process_vertices(shader, ctx, vertices, indices, viewport);
        stats.clipped_triangles = screen.len() / 3;

        if self.render_mode.shades() {
            let raster = self.pool.install(|| rasterize(&screen, self.cull_mode, viewport));
            stats.culled = raster.culled;
            stats.degenerate = raster.degenerate;
            stats.fragments = raster.fragments.len();

            let shade = self
                .pool
                .install(|| process_fragments(shader, ctx, &raster.fragments, adapter, self.band_rows));
            stats.shaded = shade.shaded;
            stats.occluded = shade.occluded;
        }

        if self.render_mode.draws_edges() {
            self.draw_wireframe(&screen, adapter);
        }

        tracing::debug!(
            triangles = stats.triangles,
            clipped = stats.clipped_triangles,
            culled = stats.culled,
            fragments = stats.fragments,
            shaded = stats.shaded,
            "draw"
        );
        stats
    }

    /// Triangle edges (and optionally vertex markers) into color attachment 0,
    /// ignoring depth.
    fn draw_wireframe<V>(&self, screen: &[ScreenVertex<V>], adapter: &mut FrameAdapter<'_>) {
        let px = |v: &ScreenVertex<V>| (v.x.round() as i32, v.y.round() as i32);

        for tri in screen.chunks_exact(3) {
            let corners = [px(&tri[0]), px(&tri[1]), px(&tri[2])];
            for i in 0..3 {
                let (x0, y0) = corners[i];
                let (x1, y1) = corners[(i + 1) % 3];
                for (x, y) in LinePixels::new(x0, y0, x1, y1) {
                    adapter.write_color(0, x, y, self.wire_color);
                }
            }
        }

        if self.render_mode.draws_markers() {
            for v in screen {
                let (cx, cy) = px(v);
                for y in cy - MARKER_RADIUS..=cy + MARKER_RADIUS {
                    for x in cx - MARKER_RADIUS..=cx + MARKER_RADIUS {
                        adapter.write_color(0, x, y, self.marker_color);
                    }
                }
            }
        }
    }
}

fn build_thread_pool(threads: Option<usize>) -> PipelineResult<rayon::ThreadPool> {
    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("raster-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::math::{Vec3, Vec4};
    use crate::pipeline::shader::{Fragment, PixelSink};
    use crate::pipeline::target::{ColorBuffer, DepthBuffer, DEPTH_CLEAR};

    struct Solid(Color);

    impl Shader for Solid {
        type Vertex = Vec3;
        type Varying = ();

        fn vertex(&self, _ctx: &FrameContext, input: &Vec3) -> (Vec4, ()) {
            (input.extend(1.0), ())
        }

        fn fragment(&self, _ctx: &FrameContext, _fragment: &Fragment<()>, out: &mut PixelSink<'_, '_>) {
            out.write_color(0, self.0);
        }
    }

    fn settings(mode: RenderMode) -> RenderSettings {
        RenderSettings { threads: Some(2), render_mode: mode, ..Default::default() }
    }

    fn triangle() -> [Vec3; 3] {
        [Vec3::new(-0.5, -0.5, 0.0), Vec3::new(0.5, -0.5, 0.0), Vec3::new(0.0, 0.5, 0.0)]
    }

    fn draw(mode: RenderMode) -> (ColorBuffer, FrameStats) {
        let renderer = Renderer::new(&settings(mode)).unwrap();
        let mut color = ColorBuffer::new(32, 32, Color::BLACK);
        let mut depth = DepthBuffer::new(32, 32, DEPTH_CLEAR);
        let stats = {
            let mut adapter = FrameAdapter::new();
            adapter.bind_color(&mut color).unwrap();
            adapter.bind_depth(&mut depth).unwrap();
            renderer.draw(&FrameContext::default(), &Solid(Color::GREEN), &triangle(), &mut adapter)
        };
        (color, stats)
    }

    #[test]
    fn shaded_mode_fills_without_edges() {
        let (color, stats) = draw(RenderMode::Shaded);
        assert_eq!(stats.triangles, 1);
        assert!(stats.shaded > 0);
        assert_eq!(color.back_texel(16, 12), Some(Color::GREEN));
        assert!(!color.back().contains(&Color::WHITE));
    }

    #[test]
    fn wireframe_mode_skips_shading() {
        let (color, stats) = draw(RenderMode::WireframeBare);
        assert_eq!(stats.fragments, 0);
        assert!(!color.back().contains(&Color::GREEN));
        // bottom edge runs along y = 8
        assert_eq!(color.back_texel(16, 8), Some(Color::WHITE));
        assert!(!color.back().contains(&Color::MAGENTA));
    }

    #[test]
    fn overlay_draws_on_top_of_shading_with_markers() {
        let (color, _) = draw(RenderMode::ShadedWireframe);
        assert_eq!(color.back_texel(16, 12), Some(Color::GREEN));
        assert_eq!(color.back_texel(8, 8), Some(Color::MAGENTA));
        assert_eq!(color.back_texel(16, 9), Some(Color::GREEN));
    }

    #[test]
    fn nothing_bound_is_a_no_op() {
        let renderer = Renderer::new(&settings(RenderMode::Shaded)).unwrap();
        let mut adapter = FrameAdapter::new();
        let stats = renderer.draw(&FrameContext::default(), &Solid(Color::RED), &triangle(), &mut adapter);
        assert_eq!(stats, FrameStats::default());
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let zero_threads = RenderSettings { threads: Some(0), ..Default::default() };
        assert!(matches!(Renderer::new(&zero_threads), Err(PipelineError::Validation(_))));
        let zero_bands = RenderSettings { band_rows: 0, ..Default::default() };
        assert!(matches!(Renderer::new(&zero_bands), Err(PipelineError::Validation(_))));
        // Same checks as loading a settings file
        let inverted_clip = RenderSettings { near: 10.0, far: 1.0, ..Default::default() };
        assert!(matches!(Renderer::new(&inverted_clip), Err(PipelineError::Validation(_))));
        let empty = RenderSettings { width: 0, ..Default::default() };
        assert!(matches!(Renderer::new(&empty), Err(PipelineError::Validation(_))));
    }

    #[test]
    fn modes_cycle_through_all_four() {
        let mut mode = RenderMode::Shaded;
        for _ in 0..4 {
            mode = mode.next();
        }
        assert_eq!(mode, RenderMode::Shaded);
        assert_eq!(CullMode::None.next().next().next(), CullMode::None);
    }
}
