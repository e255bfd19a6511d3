//! Transform hierarchy nodes

use super::bounds::Aabb;
use super::mesh::Mesh;
use glam::{EulerRot, Mat4, Quat, Vec3};

/// A node in the object graph with an optional mesh and any number of children
#[derive(Debug, Clone)]
pub struct Object3D {
    pub name: String,
    pub position: Vec3,
    /// Euler angles in radians, applied in XYZ order
    pub rotation: Vec3,
    pub scale: Vec3,
    pub mesh: Option<Mesh>,
    pub children: Vec<Object3D>,
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            mesh: None,
            children: Vec::new(),
        }
    }
}

impl Object3D {
    pub fn group(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            mesh: Some(mesh),
            ..Self::default()
        }
    }

    pub fn add_child(&mut self, child: Object3D) {
        self.children.push(child);
    }

    pub fn local_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(EulerRot::XYZ, self.rotation.x, self.rotation.y, self.rotation.z);
        Mat4::from_scale_rotation_translation(self.scale, rotation, self.position)
    }

    /// Visit this node and all descendants with their world matrices
    pub fn traverse(&self, parent: Mat4, visit: &mut impl FnMut(&Object3D, Mat4)) {
        let world = parent * self.local_matrix();
        visit(self, world);
        for child in &self.children {
            child.traverse(world, visit);
        }
    }

    pub fn traverse_mut(&mut self, visit: &mut impl FnMut(&mut Object3D)) {
        visit(self);
        for child in &mut self.children {
            child.traverse_mut(visit);
        }
    }

    /// World-space bounds of every mesh under this node, treating it as a scene root
    pub fn world_bounds(&self) -> Option<Aabb> {
        self.bounds_under(self.local_matrix())
    }

    /// Bounds in this node's own space, ignoring its transform
    pub fn local_bounds(&self) -> Option<Aabb> {
        self.bounds_under(Mat4::IDENTITY)
    }

    fn bounds_under(&self, root: Mat4) -> Option<Aabb> {
        let mut bounds: Option<Aabb> = None;
        let mut accumulate = |node: &Object3D, world: Mat4| {
            let Some(local) = node.mesh.as_ref().and_then(|m| m.data.local_bounds()) else {
                return;
            };
            let b = local.transformed(world);
            bounds = Some(match bounds {
                Some(acc) => acc.union(&b),
                None => b,
            });
        };
        accumulate(self, root);
        for child in &self.children {
            child.traverse(root, &mut accumulate);
        }
        bounds
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.traverse(Mat4::IDENTITY, &mut |node, _| {
            if node.mesh.is_some() {
                count += 1;
            }
        });
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::mesh::{Material, MeshData};

    fn unit_square(name: &str) -> Object3D {
        Object3D::with_mesh(name, Mesh::new(MeshData::plane(2.0), Material::default()))
    }

    #[test]
    fn test_world_bounds_follow_parent_transform() {
        let mut root = Object3D::group("root");
        root.position = Vec3::new(0.0, 5.0, 0.0);
        root.scale = Vec3::splat(3.0);
        root.add_child(unit_square("a"));

        let bounds = root.world_bounds().unwrap();
        assert!((bounds.min - Vec3::new(-3.0, 2.0, 0.0)).length() < 1e-5);
        assert!((bounds.max - Vec3::new(3.0, 8.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_rotation_about_x_lays_plane_flat() {
        let mut plane = unit_square("floor");
        plane.rotation.x = -std::f32::consts::FRAC_PI_2;
        let bounds = plane.world_bounds().unwrap();
        assert!(bounds.size().y.abs() < 1e-5);
        assert!((bounds.size().z - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_traverse_mut_reaches_all_meshes() {
        let mut root = Object3D::group("root");
        root.add_child(unit_square("a"));
        let mut inner = Object3D::group("inner");
        inner.add_child(unit_square("b"));
        root.add_child(inner);

        root.traverse_mut(&mut |node| {
            if let Some(mesh) = node.mesh.as_mut() {
                mesh.cast_shadow = true;
            }
        });

        let mut casting = 0;
        root.traverse(Mat4::IDENTITY, &mut |node, _| {
            if node.mesh.as_ref().is_some_and(|m| m.cast_shadow) {
                casting += 1;
            }
        });
        assert_eq!(casting, 2);
        assert_eq!(root.mesh_count(), 2);
        assert!(Object3D::group("empty").world_bounds().is_none());
    }
}
