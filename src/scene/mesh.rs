//! Mesh geometry and materials

use super::bounds::Aabb;
use glam::Vec3;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

/// Immutable triangle geometry. The id keys GPU buffer caches.
#[derive(Debug)]
pub struct MeshData {
    id: u64,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl MeshData {
    /// `normals` must match `positions` in length; indices form a triangle list
    pub fn new(positions: Vec<[f32; 3]>, normals: Vec<[f32; 3]>, indices: Vec<u32>) -> Self {
        debug_assert_eq!(positions.len(), normals.len());
        debug_assert_eq!(indices.len() % 3, 0);
        Self {
            id: NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed),
            positions,
            normals,
            indices,
        }
    }

    /// Square in the XY plane facing +Z, centered on the origin
    pub fn plane(size: f32) -> Self {
        let h = size / 2.0;
        let positions = vec![[-h, -h, 0.0], [h, -h, 0.0], [h, h, 0.0], [-h, h, 0.0]];
        let normals = vec![[0.0, 0.0, 1.0]; 4];
        Self::new(positions, normals, vec![0, 1, 2, 0, 2, 3])
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn local_bounds(&self) -> Option<Aabb> {
        Aabb::from_points(self.positions.iter().map(|p| Vec3::from_array(*p)))
    }
}

/// Physically based surface description; only color and roughness drive shading
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Vec3,
    pub roughness: f32,
    pub metalness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec3::splat(1.0),
            roughness: 1.0,
            metalness: 0.0,
        }
    }
}

impl Material {
    pub fn matte(color: [f32; 3]) -> Self {
        Self {
            color: Vec3::from_array(color),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub data: Arc<MeshData>,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
}

impl Mesh {
    pub fn new(data: MeshData, material: Material) -> Self {
        Self {
            data: Arc::new(data),
            material,
            cast_shadow: false,
            receive_shadow: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_ids_are_unique() {
        let a = MeshData::plane(1.0);
        let b = MeshData::plane(1.0);
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_plane_bounds() {
        let plane = MeshData::plane(500.0);
        let bounds = plane.local_bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(-250.0, -250.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(250.0, 250.0, 0.0));
        assert_eq!(plane.triangle_count(), 2);
    }
}
