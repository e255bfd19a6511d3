//! Bounding-box fit: normalize the object's size, center it, and frame it
//! with the camera.

use crate::camera::PerspectiveCamera;
use crate::scene::{Aabb, Object3D};
use glam::{EulerRot, Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitParams {
    /// Largest dimension after scaling
    pub target_size: f32,
    /// Applied to both the camera distance and the far plane
    pub padding: f32,
    /// XYZ Euler orientation given to the object
    pub orientation: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    /// Bounds of the object's geometry before fitting
    pub source_bounds: Aabb,
    pub scale: f32,
    /// World bounds after scaling, centering and orientation
    pub fitted_bounds: Aabb,
    pub camera_distance: f32,
    pub camera_far: f32,
}

/// Fit `object` and reposition `camera`; `None` when the object has no geometry
pub fn fit_object(object: &mut Object3D, camera: &mut PerspectiveCamera, params: &FitParams) -> Option<FitResult> {
    let source_bounds = object.local_bounds()?;
    let max_dim = source_bounds.max_dimension();
    let scale = if max_dim > f32::EPSILON { params.target_size / max_dim } else { 1.0 };

    // Center the scaled, oriented box on the origin
    let orientation = Quat::from_euler(EulerRot::XYZ, params.orientation.x, params.orientation.y, params.orientation.z);
    object.scale = Vec3::splat(scale);
    object.rotation = params.orientation;
    object.position = -(orientation * (source_bounds.center() * scale));

    let fitted_bounds = object.world_bounds()?;

    let scaled_max = max_dim * scale;
    let half_fov = camera.fov_radians() / 2.0;
    let camera_distance = (scaled_max / 2.0) / half_fov.tan() * params.padding;

    camera.position = Vec3::new(0.0, 0.0, camera_distance);
    camera.target = Vec3::ZERO;

    let min_z = fitted_bounds.min.z;
    let camera_to_far_edge = if min_z < 0.0 { -min_z + camera_distance } else { camera_distance - min_z };
    camera.far = camera_to_far_edge * params.padding;
    camera.update_projection_matrix();

    Some(FitResult {
        source_bounds,
        scale,
        fitted_bounds,
        camera_distance,
        camera_far: camera.far,
    })
}
