//! Perspective camera
//!
//! The projection matrix is cached and only refreshed by
//! `update_projection_matrix`, so callers decide when parameter changes take effect.

use crate::constants;
use glam::{Mat4, Vec3};

#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    projection: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(constants::camera::FOV_DEGREES, 1.0, constants::camera::NEAR, constants::camera::FAR)
    }
}

impl PerspectiveCamera {
    /// Create a camera at the origin looking down -Z; `fov` is vertical, in degrees
    pub fn new(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut camera = Self {
            position: Vec3::ZERO,
            target: Vec3::NEG_Z,
            up: Vec3::Y,
            fov,
            aspect,
            near,
            far,
            projection: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    /// Vertical field of view in radians
    pub fn fov_radians(&self) -> f32 {
        self.fov.to_radians()
    }

    /// Recompute the cached projection after any lens parameter changes
    pub fn update_projection_matrix(&mut self) {
        self.projection = Mat4::perspective_rh(self.fov_radians(), self.aspect, self.near, self.far);
    }

    /// Cached projection from the last `update_projection_matrix`
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Right-handed look-at from `position` toward `target`
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Combined projection * view matrix
    pub fn build_view_projection_matrix(&self) -> Mat4 {
        self.projection * self.view_matrix()
    }

    /// Set the aspect from a pixel size; zero-height sizes are ignored
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
        self.update_projection_matrix();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_is_cached_until_updated() {
        let mut camera = PerspectiveCamera::default();
        let before = camera.projection_matrix();
        camera.far = 5000.0;
        assert_eq!(camera.projection_matrix(), before);
        camera.update_projection_matrix();
        assert_ne!(camera.projection_matrix(), before);
    }

    #[test]
    fn test_set_viewport_updates_aspect() {
        let mut camera = PerspectiveCamera::default();
        camera.set_viewport(1920, 1080);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);

        camera.set_viewport(100, 0);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn test_target_projects_to_center() {
        let mut camera = PerspectiveCamera::default();
        camera.position = Vec3::new(0.0, 0.0, 100.0);
        camera.target = Vec3::ZERO;
        let ndc = camera.build_view_projection_matrix().project_point3(Vec3::ZERO);
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
    }
}
