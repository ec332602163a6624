//! Perspective camera and damped orbit controls.

use std::f32::consts::PI;

use glam::{Mat4, Vec3};

use crate::config::{CameraConfig, ControlsConfig};

/// Keeps the polar angle away from the poles where `look_at` degenerates.
const POLAR_EPSILON: f32 = 1e-4;

/// Remaining rotation below which damping is considered settled.
const SETTLE_EPSILON: f32 = 1e-6;

/// Camera displacement below which a frame counts as stationary.
const MOVE_EPSILON: f32 = 1e-4;

/// Perspective camera looking at a target point.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
    projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(config: &CameraConfig, aspect: f32) -> Self {
        let mut camera = Self {
            fov: config.fov,
            aspect,
            near: config.near,
            far: config.far,
            position: config.position,
            target: config.target,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Recompute the cached projection from fov, aspect and clip planes.
    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov.to_radians(), self.aspect, self.near, self.far);
    }

    /// Projection as of the last [`update_projection_matrix`](Self::update_projection_matrix).
    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }
}

/// Per-frame camera integration step.
pub trait CameraController {
    /// Advance the controller by one frame. Returns `true` if the camera moved.
    fn update(&mut self, camera: &mut PerspectiveCamera) -> bool;
}

/// Spherical offset of the camera from its target.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y.
    phi: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self::default();
        }
        Self {
            radius,
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            theta: offset.x.atan2(offset.z),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi = self.phi.sin();
        Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Orbit controls rotating the camera around its target.
///
/// Input accumulates a pending rotation; [`update`](CameraController::update)
/// applies a `damping_factor` share of it each frame so motion eases out.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    /// Radians per dragged pixel.
    pub rotate_speed: f32,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl OrbitControls {
    pub fn new(config: &ControlsConfig) -> Self {
        Self {
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            min_polar_angle: 0.0,
            max_polar_angle: config.max_polar_angle,
            rotate_speed: config.rotate_speed,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    /// Queue a rotation from a mouse drag in pixels.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32) {
        self.delta_theta -= dx * self.rotate_speed;
        self.delta_phi -= dy * self.rotate_speed;
    }

    /// Queue a zoom from wheel lines; positive values move closer.
    pub fn zoom_by_wheel(&mut self, lines: f32) {
        self.scale *= 0.95_f32.powf(lines);
    }

    /// Whether queued motion remains to be applied.
    pub fn is_settled(&self) -> bool {
        self.delta_theta.abs() < SETTLE_EPSILON
            && self.delta_phi.abs() < SETTLE_EPSILON
            && self.scale == 1.0
    }
}

impl CameraController for OrbitControls {
    fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let mut spherical = Spherical::from_offset(camera.position - camera.target);

        let share = if self.enable_damping { self.damping_factor } else { 1.0 };
        spherical.theta += self.delta_theta * share;
        spherical.phi += self.delta_phi * share;

        let max_phi = self.max_polar_angle.min(PI - POLAR_EPSILON);
        let min_phi = self.min_polar_angle.max(POLAR_EPSILON).min(max_phi);
        spherical.phi = spherical.phi.clamp(min_phi, max_phi);

        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.scale = 1.0;

        if self.enable_damping {
            self.delta_theta *= 1.0 - self.damping_factor;
            self.delta_phi *= 1.0 - self.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }

        camera.position = camera.target + spherical.to_offset();
        camera.position.distance(before) > MOVE_EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (PerspectiveCamera, OrbitControls) {
        (
            PerspectiveCamera::new(&CameraConfig::default(), 800.0 / 600.0),
            OrbitControls::new(&ControlsConfig::default()),
        )
    }

    #[test]
    fn test_projection_refresh() {
        let (mut camera, _) = setup();
        let before = camera.projection();
        camera.aspect = 2.0;
        assert_eq!(camera.projection(), before);
        camera.update_projection_matrix();
        assert_ne!(camera.projection(), before);
    }

    #[test]
    fn test_spherical_roundtrip() {
        let offset = Vec3::new(2.0, 4.0, 4.0);
        let back = Spherical::from_offset(offset).to_offset();
        assert!(back.abs_diff_eq(offset, 1e-5));
    }

    #[test]
    fn test_idle_update_keeps_position() {
        let (mut camera, mut controls) = setup();
        let start = camera.position;
        assert!(!controls.update(&mut camera));
        assert!(camera.position.abs_diff_eq(start, 1e-5));
    }

    #[test]
    fn test_damping_eases_out() {
        let (mut camera, mut controls) = setup();
        controls.rotate_by_pixels(100.0, 0.0);

        let mut steps = Vec::new();
        let mut last = camera.position;
        for _ in 0..5 {
            controls.update(&mut camera);
            steps.push(camera.position.distance(last));
            last = camera.position;
        }
        assert!(steps.windows(2).all(|w| w[1] < w[0]));
        assert!(!controls.is_settled());
    }

    #[test]
    fn test_never_below_horizon() {
        let (mut camera, mut controls) = setup();
        controls.rotate_by_pixels(0.0, -100_000.0);
        for _ in 0..500 {
            controls.update(&mut camera);
        }
        let phi = Spherical::from_offset(camera.position - camera.target).phi;
        assert!(phi <= controls.max_polar_angle + 1e-4);
        assert!(camera.position.y > camera.target.y);
    }

    #[test]
    fn test_distance_clamped() {
        let (mut camera, mut controls) = setup();
        controls.zoom_by_wheel(200.0);
        controls.update(&mut camera);
        assert!((camera.position.distance(camera.target) - 2.0).abs() < 1e-4);

        controls.zoom_by_wheel(-400.0);
        controls.update(&mut camera);
        assert!((camera.position.distance(camera.target) - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_without_damping_applies_fully() {
        let (mut camera, mut controls) = setup();
        controls.enable_damping = false;
        controls.rotate_by_pixels(10.0, 0.0);
        assert!(controls.update(&mut camera));
        assert!(controls.is_settled());
    }
}
