//! Free-fly camera producing view and projection matrices

use std::f32::consts::FRAC_PI_2;

use crate::config::RenderSettings;
use crate::math::{Mat4, Vec3};
use crate::pipeline::FrameContext;

pub const MIN_FOV_DEGREES: f32 = 15.0;
pub const MAX_FOV_DEGREES: f32 = 90.0;

/// Camera state. Yaw 0 and pitch 0 look down -Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vec3, fov_y_degrees: f32, near: f32, far: f32) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            fov_y_degrees: fov_y_degrees.clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES),
            near,
            far,
        }
    }

    pub fn from_settings(position: Vec3, settings: &RenderSettings) -> Self {
        Self::new(position, settings.fov_y_degrees, settings.near, settings.far)
    }

    pub fn fov_y_degrees(&self) -> f32 {
        self.fov_y_degrees
    }

    pub fn set_fov(&mut self, degrees: f32) {
        self.fov_y_degrees = degrees.clamp(MIN_FOV_DEGREES, MAX_FOV_DEGREES);
    }

    pub fn zoom(&mut self, delta_degrees: f32) {
        self.set_fov(self.fov_y_degrees + delta_degrees);
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            -self.pitch.cos() * self.yaw.cos(),
        )
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::UP).normalize()
    }

    /// Turn by `dyaw` and tilt by `dpitch` radians; pitch stops short of straight up/down
    pub fn rotate(&mut self, dyaw: f32, dpitch: f32) {
        self.yaw += dyaw;
        self.pitch = (self.pitch + dpitch).clamp(-FRAC_PI_2 + 0.01, FRAC_PI_2 - 0.01);
    }

    /// Move along the view direction, the right vector and world up
    pub fn translate(&mut self, forward: f32, right: f32, up: f32) {
        self.position = self.position + self.forward() * forward + self.right() * right + Vec3::UP * up;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.position + self.forward(), Vec3::UP)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective(self.fov_y_degrees.to_radians(), aspect, self.near, self.far)
    }

    /// Frame uniforms for drawing `model` from this camera
    pub fn frame_context(&self, model: Mat4, aspect: f32, time: f32) -> FrameContext {
        FrameContext {
            time,
            ..FrameContext::new(model, self.view_matrix(), self.projection_matrix(aspect), self.position)
        }
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 75.0, 0.1, 100.0)
    }
}
