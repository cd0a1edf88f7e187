//! softraster viewer: spins a lit, textured model (or a cube) through the
//! software pipeline
//!
//! Controls:
//! - WASD / Q E: move, arrow keys: look, Z X: zoom
//! - M: cycle render mode, C: cycle cull mode, F: toggle texture filter
//! - Space: pause rotation, P: save a PNG screenshot

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use macroquad::prelude::*;
use softraster::math::{Mat4, Vec3};
use softraster::{
    load_settings, Camera, ColorBuffer, DepthBuffer, Filter, FrameAdapter, FrameStats, Mesh, PipelineResult,
    RenderSettings, Renderer, Texture, VERSION,
};
use softraster::shaders::LitTextureShader;
use softraster::pipeline::DEPTH_CLEAR;

const SETTINGS_PATH: &str = "softraster.ron";
const MOVE_SPEED: f32 = 4.0;
const LOOK_SPEED: f32 = 1.5;
const SPIN_SPEED: f32 = 0.6;

fn settings_or_default() -> RenderSettings {
    if !Path::new(SETTINGS_PATH).exists() {
        return RenderSettings::default();
    }
    match load_settings(SETTINGS_PATH) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(path = SETTINGS_PATH, error = %e, "failed to load settings, using defaults");
            RenderSettings::default()
        }
    }
}

fn window_conf() -> Conf {
    let settings = settings_or_default();
    Conf {
        window_title: format!("softraster v{}", VERSION),
        window_width: settings.width as i32,
        window_height: settings.height as i32,
        window_resizable: true,
        high_dpi: true,
        ..Default::default()
    }
}

fn load_texture(settings: &RenderSettings) -> Texture {
    let checker = || {
        Texture::checkerboard(
            64,
            64,
            8,
            softraster::Color::new(230, 200, 120),
            softraster::Color::new(90, 60, 40),
        )
    };
    match &settings.texture_path {
        Some(path) => Texture::from_file(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path, error = %e, "failed to load texture, using checkerboard");
            checker()
        }),
        None => checker(),
    }
}

fn load_mesh(settings: &RenderSettings) -> Mesh {
    match &settings.mesh_path {
        Some(path) => Mesh::from_obj(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path, error = %e, "failed to load mesh, using cube");
            Mesh::cube()
        }),
        None => Mesh::cube(),
    }
}

fn save_screenshot(color: &ColorBuffer) -> PipelineResult<PathBuf> {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    let path = PathBuf::from(format!("screenshot-{stamp}.png"));
    ::image::save_buffer(
        &path,
        &color.front_rgba8(),
        color.width() as u32,
        color.height() as u32,
        ::image::ColorType::Rgba8,
    )?;
    Ok(path)
}

fn bind_targets<'a>(color: &'a mut ColorBuffer, depth: &'a mut DepthBuffer) -> PipelineResult<FrameAdapter<'a>> {
    let mut adapter = FrameAdapter::new();
    adapter.bind_color(color)?;
    adapter.bind_depth(depth)?;
    Ok(adapter)
}

fn handle_camera_input(camera: &mut Camera, dt: f32) {
    let mut forward = 0.0;
    let mut right = 0.0;
    let mut up = 0.0;
    if is_key_down(KeyCode::W) {
        forward += MOVE_SPEED * dt;
    }
    if is_key_down(KeyCode::S) {
        forward -= MOVE_SPEED * dt;
    }
    if is_key_down(KeyCode::D) {
        right += MOVE_SPEED * dt;
    }
    if is_key_down(KeyCode::A) {
        right -= MOVE_SPEED * dt;
    }
    if is_key_down(KeyCode::E) {
        up += MOVE_SPEED * dt;
    }
    if is_key_down(KeyCode::Q) {
        up -= MOVE_SPEED * dt;
    }
    camera.translate(forward, right, up);

    let mut yaw = 0.0;
    let mut pitch = 0.0;
    if is_key_down(KeyCode::Left) {
        yaw -= LOOK_SPEED * dt;
    }
    if is_key_down(KeyCode::Right) {
        yaw += LOOK_SPEED * dt;
    }
    if is_key_down(KeyCode::Up) {
        pitch += LOOK_SPEED * dt;
    }
    if is_key_down(KeyCode::Down) {
        pitch -= LOOK_SPEED * dt;
    }
    camera.rotate(yaw, pitch);

    if is_key_down(KeyCode::Z) {
        camera.zoom(-30.0 * dt);
    }
    if is_key_down(KeyCode::X) {
        camera.zoom(30.0 * dt);
    }
}

fn draw_hud(renderer: &Renderer, filter: Filter, stats: &FrameStats) {
    let lines = [
        format!("{:?} | cull {:?} | {:?} | {} threads", renderer.render_mode(), renderer.cull_mode(), filter, renderer.threads()),
        format!(
            "tris {} -> {} clipped, {} culled | frags {} shaded {} | {} fps",
            stats.triangles,
            stats.clipped_triangles,
            stats.culled,
            stats.fragments,
            stats.shaded,
            get_fps()
        ),
    ];
    for (i, line) in lines.iter().enumerate() {
        draw_text(line, 10.0, 20.0 + i as f32 * 18.0, 18.0, WHITE);
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt::init();

    let settings = settings_or_default();
    let mut renderer = match Renderer::new(&settings) {
        Ok(r) => r,
        Err(e) => {
            tracing::error!(error = %e, "cannot start renderer");
            return;
        }
    };

    let texture = load_texture(&settings);
    let mesh = load_mesh(&settings);
    let mut camera = Camera::from_settings(Vec3::new(0.0, 0.0, 4.0), &settings);
    let mut filter = settings.texture_filter;

    let mut color = ColorBuffer::new(settings.width, settings.height, settings.clear_color);
    let mut depth = DepthBuffer::new(settings.width, settings.height, DEPTH_CLEAR);

    let mut spin = 0.0f32;
    let mut paused = false;

    tracing::info!(width = settings.width, height = settings.height, "viewer started");

    loop {
        let dt = get_frame_time();

        handle_camera_input(&mut camera, dt);
        if is_key_pressed(KeyCode::M) {
            renderer.set_render_mode(renderer.render_mode().next());
        }
        if is_key_pressed(KeyCode::C) {
            renderer.set_cull_mode(renderer.cull_mode().next());
        }
        if is_key_pressed(KeyCode::F) {
            filter = match filter {
                Filter::Nearest => Filter::Bilinear,
                Filter::Bilinear => Filter::Nearest,
            };
        }
        if is_key_pressed(KeyCode::Space) {
            paused = !paused;
        }
        if !paused {
            spin += SPIN_SPEED * dt;
        }

        let model = Mat4::rotation(Vec3::UP, spin) * Mat4::rotation(Vec3::new(1.0, 0.0, 0.0), spin * 0.5);
        let ctx = camera.frame_context(model, settings.aspect(), get_time() as f32);
        let mut shader = LitTextureShader::new(Some(&texture), filter);
        shader.specular = 0.4;

        let stats = {
            let mut adapter = match bind_targets(&mut color, &mut depth) {
                Ok(a) => a,
                Err(e) => {
                    tracing::error!(error = %e, "cannot bind render targets");
                    return;
                }
            };
            adapter.clear_color(settings.clear_color);
            adapter.clear_depth();
            let stats = renderer.draw_indexed(&ctx, &shader, &mesh.vertices, &mesh.indices, &mut adapter);
            adapter.swap();
            stats
        };

        if is_key_pressed(KeyCode::P) {
            match save_screenshot(&color) {
                Ok(path) => tracing::info!(path = %path.display(), "saved screenshot"),
                Err(e) => tracing::warn!(error = %e, "failed to save screenshot"),
            }
        }

        clear_background(BLACK);
        let frame = Texture2D::from_rgba8(color.width() as u16, color.height() as u16, &color.front_rgba8());
        frame.set_filter(FilterMode::Nearest);
        draw_texture_ex(
            &frame,
            0.0,
            0.0,
            WHITE,
            DrawTextureParams {
                dest_size: Some(vec2(screen_width(), screen_height())),
                ..Default::default()
            },
        );
        draw_hud(&renderer, filter, &stats);

        next_frame().await;
    }
}
