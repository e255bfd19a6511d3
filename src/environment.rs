//! Static environment: the ground plane under the object

use crate::constants::ground;
use crate::scene::{Material, Mesh, MeshData, NodeId, Object3D, Scene};
use glam::Vec3;
use log::debug;

/// Add the shadow-receiving ground plane, replacing any previous one
pub fn add_ground_plane(scene: &mut Scene) -> NodeId {
    for stale in scene.find_objects_named(ground::NAME) {
        debug!("Replacing existing ground plane {:?}", stale);
        scene.remove(stale);
    }

    let mut mesh = Mesh::new(MeshData::plane(ground::SIZE), Material::matte(ground::COLOR));
    mesh.receive_shadow = true;

    let mut plane = Object3D::with_mesh(ground::NAME, mesh);
    plane.rotation.x = -std::f32::consts::FRAC_PI_2;
    plane.position = Vec3::new(0.0, ground::HEIGHT, 0.0);

    scene.add_object(plane).0
}

/// Returns false if the plane was already gone
pub fn remove_ground_plane(scene: &mut Scene, id: NodeId) -> bool {
    scene.remove(id).is_some()
}
