use crate::camera::PerspectiveCamera;
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};
use vitrine_input::OrbitAction;

const EPS: f32 = 1e-6;
const DOLLY_BASE: f32 = 0.95;

/// Orbit controls with optional damping.
///
/// Input accumulates into pending deltas; [`update`] applies them to the
/// camera. With damping enabled each update applies `damping_factor` of the
/// pending rotation and pan and keeps the rest, so motion eases out over
/// the following frames.
///
/// [`update`]: OrbitControls::update
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    /// Pending (azimuth, polar) change in radians.
    spherical_delta: Vec2,
    pan_offset: Vec3,
    scale: f32,
}

impl OrbitControls {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            spherical_delta: Vec2::ZERO,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }

    pub fn with_damping(mut self, factor: f32) -> Self {
        self.enable_damping = true;
        self.damping_factor = factor;
        self
    }

    /// True while damped motion is still settling.
    pub fn is_settling(&self) -> bool {
        self.spherical_delta.length_squared() > EPS * EPS || self.pan_offset.length_squared() > EPS * EPS
    }

    /// Queue an input action. `viewport_height` is in logical pixels.
    pub fn apply(&mut self, action: OrbitAction, camera: &PerspectiveCamera, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        tracing::trace!(?action, "orbit input");
        match action {
            OrbitAction::Rotate(delta) => {
                self.spherical_delta.x -= TAU * delta.x / height * self.rotate_speed;
                self.spherical_delta.y -= TAU * delta.y / height * self.rotate_speed;
            }
            OrbitAction::Pan(delta) => {
                let distance = (camera.position - self.target).length()
                    * (camera.fov_degrees.to_radians() / 2.0).tan();
                let left = -camera.right() * (2.0 * delta.x * distance / height);
                let up = camera.camera_up() * (2.0 * delta.y * distance / height);
                self.pan_offset += (left + up) * self.pan_speed;
            }
            OrbitAction::Dolly(steps) => {
                self.scale *= DOLLY_BASE.powf(self.zoom_speed * steps);
            }
        }
    }

    /// Apply pending motion to `camera`. Returns true when the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > EPS {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.spherical_delta.x * step;
        phi += self.spherical_delta.y * step;
        phi = phi
            .clamp(self.min_polar_angle, self.max_polar_angle)
            .clamp(EPS, PI - EPS);
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.target += self.pan_offset * step;

        let sin_phi = phi.sin();
        let new_offset = Vec3::new(
            radius * sin_phi * theta.sin(),
            radius * phi.cos(),
            radius * sin_phi * theta.cos(),
        );
        let previous = camera.position;
        camera.position = self.target + new_offset;
        camera.look_at(self.target);

        if self.enable_damping {
            self.spherical_delta *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta = Vec2::ZERO;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        previous.distance_squared(camera.position) > EPS
    }
}
