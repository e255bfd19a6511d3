//! Light sources and their debug helpers

use crate::constants::lights;
use glam::{Mat4, Vec3};

/// Near plane of the spot light's shadow camera
const SHADOW_NEAR: f32 = 0.5;

/// Cone light with a perspective shadow map
#[derive(Debug, Clone, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Half-angle of the cone in radians
    pub angle: f32,
    /// Fraction of the cone that fades out, 0..1
    pub penumbra: f32,
    pub decay: f32,
    /// Range cutoff; 0 means unlimited
    pub distance: f32,
    pub cast_shadow: bool,
}

impl Default for SpotLight {
    fn default() -> Self {
        Self {
            position: Vec3::from_array(lights::SPOT_POSITION),
            target: Vec3::ZERO,
            color: Vec3::ONE,
            intensity: lights::SPOT_INTENSITY,
            angle: lights::SPOT_ANGLE,
            penumbra: lights::SPOT_PENUMBRA,
            decay: lights::SPOT_DECAY,
            distance: lights::SPOT_DISTANCE,
            cast_shadow: true,
        }
    }
}

impl SpotLight {
    pub fn direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or(Vec3::NEG_Y)
    }

    /// Far plane of the shadow camera
    pub fn shadow_far(&self) -> f32 {
        if self.distance > 0.0 {
            self.distance
        } else {
            500.0
        }
    }

    pub fn shadow_view_projection(&self) -> Mat4 {
        // Avoid a degenerate look_at when the light points straight down
        let up = if self.direction().abs_diff_eq(Vec3::NEG_Y, 1e-4) { Vec3::Z } else { Vec3::Y };
        let view = Mat4::look_at_rh(self.position, self.target, up);
        let proj = Mat4::perspective_rh(self.angle * 2.0, 1.0, SHADOW_NEAR, self.shadow_far());
        proj * view
    }

    /// Cosines of the outer and inner cone edges
    pub fn cone_cosines(&self) -> (f32, f32) {
        let outer = self.angle.cos();
        let inner = (self.angle * (1.0 - self.penumbra)).cos();
        (outer, inner)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for AmbientLight {
    fn default() -> Self {
        Self {
            color: Vec3::ONE,
            intensity: lights::AMBIENT_INTENSITY,
        }
    }
}

/// Parallel light shining from `position` toward `target`
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionalLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            position: Vec3::from_array(lights::DIRECTIONAL_FROM).normalize(),
            target: Vec3::ZERO,
            color: Vec3::ONE,
            intensity: lights::DIRECTIONAL_INTENSITY,
        }
    }
}

impl DirectionalLight {
    /// Unit vector pointing toward the light
    pub fn to_light(&self) -> Vec3 {
        (self.position - self.target).normalize_or(Vec3::Y)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Light {
    Spot(SpotLight),
    Ambient(AmbientLight),
    Directional(DirectionalLight),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelperKind {
    SpotLight,
    ShadowCamera,
    DirectionalLight,
}

/// Line-segment visualization of a light, drawn unlit
#[derive(Debug, Clone, PartialEq)]
pub struct Helper {
    pub kind: HelperKind,
    pub color: Vec3,
    pub segments: Vec<[Vec3; 2]>,
}

impl Helper {
    /// Cone outline: apex to eight points on the rim, plus the rim itself
    pub fn spot_light(light: &SpotLight) -> Self {
        const RIM_POINTS: usize = 8;
        let dir = light.direction();
        let length = if light.distance > 0.0 { light.distance } else { 1.0 };
        let radius = length * light.angle.tan();
        let (right, up) = dir.any_orthonormal_pair();
        let base = light.position + dir * length;

        let rim: Vec<Vec3> = (0..RIM_POINTS)
            .map(|i| {
                let t = i as f32 / RIM_POINTS as f32 * std::f32::consts::TAU;
                base + (right * t.cos() + up * t.sin()) * radius
            })
            .collect();

        let mut segments: Vec<[Vec3; 2]> = rim.iter().map(|p| [light.position, *p]).collect();
        for i in 0..RIM_POINTS {
            segments.push([rim[i], rim[(i + 1) % RIM_POINTS]]);
        }

        Self {
            kind: HelperKind::SpotLight,
            color: light.color,
            segments,
        }
    }

    /// The twelve edges of the shadow camera frustum
    pub fn shadow_camera(light: &SpotLight) -> Self {
        let inverse = light.shadow_view_projection().inverse();
        // wgpu clip space: x,y in -1..1, z in 0..1
        let corner = |x: f32, y: f32, z: f32| inverse.project_point3(Vec3::new(x, y, z));
        let near = [corner(-1.0, -1.0, 0.0), corner(1.0, -1.0, 0.0), corner(1.0, 1.0, 0.0), corner(-1.0, 1.0, 0.0)];
        let far = [corner(-1.0, -1.0, 1.0), corner(1.0, -1.0, 1.0), corner(1.0, 1.0, 1.0), corner(-1.0, 1.0, 1.0)];

        let mut segments = Vec::with_capacity(12);
        for i in 0..4 {
            let j = (i + 1) % 4;
            segments.push([near[i], near[j]]);
            segments.push([far[i], far[j]]);
            segments.push([near[i], far[i]]);
        }

        Self {
            kind: HelperKind::ShadowCamera,
            color: Vec3::new(1.0, 0.67, 0.0),
            segments,
        }
    }

    pub fn directional_light(light: &DirectionalLight) -> Self {
        const HALF: f32 = 1.0;
        let p = light.position;
        let (right, up) = light.to_light().any_orthonormal_pair();
        let square = [
            p + (right + up) * HALF,
            p + (right - up) * HALF,
            p - (right + up) * HALF,
            p - (right - up) * HALF,
        ];
        let mut segments: Vec<[Vec3; 2]> = (0..4).map(|i| [square[i], square[(i + 1) % 4]]).collect();
        segments.push([p, light.target]);

        Self {
            kind: HelperKind::DirectionalLight,
            color: light.color,
            segments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spot_cone_cosines() {
        let light = SpotLight::default();
        let (outer, inner) = light.cone_cosines();
        assert!(inner > outer);
        assert!((outer - (std::f32::consts::PI / 3.5).cos()).abs() < 1e-6);
    }

    #[test]
    fn test_shadow_camera_sees_origin() {
        let light = SpotLight::default();
        let clip = light.shadow_view_projection().project_point3(Vec3::ZERO);
        assert!(clip.x.abs() < 1e-4 && clip.y.abs() < 1e-4);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn test_helper_segment_counts() {
        let spot = SpotLight::default();
        assert_eq!(Helper::spot_light(&spot).segments.len(), 16);
        assert_eq!(Helper::shadow_camera(&spot).segments.len(), 12);
        assert_eq!(Helper::directional_light(&DirectionalLight::default()).segments.len(), 5);
    }

    #[test]
    fn test_directional_defaults_are_normalized() {
        let light = DirectionalLight::default();
        assert!((light.position.length() - 1.0).abs() < 1e-6);
        assert_eq!(light.intensity, lights::DIRECTIONAL_INTENSITY);
    }
}
