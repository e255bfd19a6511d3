//! CPU-side snapshot of one frame
//!
//! `FramePacket::build` flattens the scene graph into uniforms, draw items
//! and helper lines. The packet is plain data, so it can cross into the egui
//! paint callback.

use crate::camera::PerspectiveCamera;
use crate::scene::{Light, MeshData, Scene};
use crate::surface::ShadowMode;
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};
use std::mem;
use std::sync::Arc;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }

    pub fn interleave(mesh: &MeshData) -> Vec<Vertex> {
        mesh.positions()
            .iter()
            .zip(mesh.normals())
            .map(|(position, normal)| Vertex {
                position: *position,
                normal: *normal,
            })
            .collect()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl LineVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<LineVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-frame uniforms shared by every pipeline; mirrors `Frame` in the shaders
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub light_view_proj: [[f32; 4]; 4],
    /// xyz camera position, w = 1 when the shader must encode gamma
    pub camera_pos: [f32; 4],
    pub ambient: [f32; 4],
    /// xyz unit vector toward the directional light
    pub dir_to_light: [f32; 4],
    pub dir_color: [f32; 4],
    /// xyz position, w = range cutoff
    pub spot_position: [f32; 4],
    /// xyz direction, w = decay
    pub spot_direction: [f32; 4],
    /// rgb * intensity, w = 1 when the spot light casts shadows
    pub spot_color: [f32; 4],
    /// x = cos outer, y = cos inner, z = 1 when PCF shadows are on, w = shadow texel size
    pub spot_cone: [f32; 4],
}

/// Per-draw uniforms; mirrors `Object` in the shaders
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct ObjectUniforms {
    pub model: [[f32; 4]; 4],
    pub normal_matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    /// x = roughness, y = metalness, z = receives shadow
    pub params: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct DrawItem {
    pub mesh: Arc<MeshData>,
    pub uniforms: ObjectUniforms,
    pub cast_shadow: bool,
}

#[derive(Debug, Clone)]
pub struct FramePacket {
    pub frame: FrameUniforms,
    pub draws: Vec<DrawItem>,
    pub lines: Vec<LineVertex>,
    pub shadows_enabled: bool,
}

fn shadow_mode_code(mode: ShadowMode) -> f32 {
    match mode {
        ShadowMode::Disabled => 0.0,
        ShadowMode::SoftPcf => 1.0,
    }
}

impl FramePacket {
    pub fn build(
        scene: &Scene,
        camera: &PerspectiveCamera,
        shadow_mode: ShadowMode,
        shadow_map_size: u32,
        manual_gamma: bool,
    ) -> Self {
        let mut frame = FrameUniforms::zeroed();
        frame.view_proj = camera.build_view_projection_matrix().to_cols_array_2d();
        frame.light_view_proj = Mat4::IDENTITY.to_cols_array_2d();
        frame.camera_pos = camera.position.extend(if manual_gamma { 1.0 } else { 0.0 }).to_array();

        let mut ambient = Vec3::ZERO;
        let mut spot_casts_shadow = false;
        for light in scene.lights() {
            match light {
                Light::Ambient(a) => ambient += a.color * a.intensity,
                Light::Directional(d) => {
                    frame.dir_to_light = d.to_light().extend(0.0).to_array();
                    frame.dir_color = (d.color * d.intensity).extend(0.0).to_array();
                }
                Light::Spot(s) => {
                    let (outer, inner) = s.cone_cosines();
                    spot_casts_shadow = s.cast_shadow;
                    frame.light_view_proj = s.shadow_view_projection().to_cols_array_2d();
                    frame.spot_position = s.position.extend(s.distance).to_array();
                    frame.spot_direction = s.direction().extend(s.decay).to_array();
                    frame.spot_color = (s.color * s.intensity)
                        .extend(if s.cast_shadow { 1.0 } else { 0.0 })
                        .to_array();
                    frame.spot_cone = [outer, inner, 0.0, 0.0];
                }
            }
        }
        frame.ambient = ambient.extend(0.0).to_array();

        let shadows_enabled = spot_casts_shadow && shadow_mode != ShadowMode::Disabled;
        if shadows_enabled {
            frame.spot_cone[2] = shadow_mode_code(shadow_mode);
            frame.spot_cone[3] = 1.0 / shadow_map_size.max(1) as f32;
        }

        let mut draws = Vec::new();
        for object in scene.objects() {
            object.borrow().traverse(Mat4::IDENTITY, &mut |node, world| {
                let Some(mesh) = &node.mesh else { return };
                let normal = Mat4::from_mat3(Mat3::from_mat4(world).inverse().transpose());
                let m = &mesh.material;
                draws.push(DrawItem {
                    mesh: Arc::clone(&mesh.data),
                    cast_shadow: mesh.cast_shadow,
                    uniforms: ObjectUniforms {
                        model: world.to_cols_array_2d(),
                        normal_matrix: normal.to_cols_array_2d(),
                        color: m.color.extend(1.0).to_array(),
                        params: [m.roughness, m.metalness, if mesh.receive_shadow { 1.0 } else { 0.0 }, 0.0],
                    },
                });
            });
        }

        let lines = scene
            .helpers()
            .flat_map(|helper| {
                let color = helper.color.to_array();
                helper.segments.iter().flat_map(move |[a, b]| {
                    [
                        LineVertex { position: a.to_array(), color },
                        LineVertex { position: b.to_array(), color },
                    ]
                })
            })
            .collect();

        Self {
            frame,
            draws,
            lines,
            shadows_enabled,
        }
    }

    pub fn shadow_casters(&self) -> impl Iterator<Item = (usize, &DrawItem)> {
        self.draws.iter().enumerate().filter(|(_, d)| d.cast_shadow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::add_ground_plane;
    use crate::scene::{AmbientLight, Helper, SceneNode, SpotLight};

    fn lit_scene() -> Scene {
        let mut scene = Scene::new();
        let spot = SpotLight::default();
        scene.add(SceneNode::Helper(Helper::shadow_camera(&spot)));
        scene.add_light(Light::Spot(spot));
        scene.add_light(Light::Ambient(AmbientLight::default()));
        add_ground_plane(&mut scene);
        scene
    }

    #[test]
    fn test_uniform_sizes_match_shader_layout() {
        assert_eq!(mem::size_of::<FrameUniforms>(), 64 * 2 + 16 * 8);
        assert_eq!(mem::size_of::<ObjectUniforms>(), 64 * 2 + 16 * 2);
        assert_eq!(mem::size_of::<Vertex>(), 24);
    }

    #[test]
    fn test_build_collects_draws_and_lines() {
        let scene = lit_scene();
        let packet = FramePacket::build(&scene, &PerspectiveCamera::default(), ShadowMode::SoftPcf, 2048, true);

        assert_eq!(packet.draws.len(), 1);
        assert_eq!(packet.draws[0].uniforms.params[2], 1.0);
        assert_eq!(packet.shadow_casters().count(), 0);
        assert_eq!(packet.lines.len(), 24);
        assert!(packet.shadows_enabled);
        assert_eq!(packet.frame.spot_cone[2], 1.0);
        assert_eq!(packet.frame.camera_pos[3], 1.0);
        assert!((packet.frame.ambient[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_disabled_shadows_zero_the_mode() {
        let scene = lit_scene();
        let packet = FramePacket::build(&scene, &PerspectiveCamera::default(), ShadowMode::Disabled, 2048, false);
        assert!(!packet.shadows_enabled);
        assert_eq!(packet.frame.spot_cone[2], 0.0);
    }
}
