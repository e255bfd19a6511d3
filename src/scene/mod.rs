//! Scene graph
//!
//! A `Scene` is a flat, ordered list of nodes. Objects are shared through
//! `Rc<RefCell<_>>` because the frame loop and the pointer listeners both
//! write the loaded object's rotation; everything runs on the UI thread.

pub mod bounds;
pub mod light;
pub mod mesh;
pub mod object;

pub use bounds::Aabb;
pub use light::{AmbientLight, DirectionalLight, Helper, HelperKind, Light, SpotLight};
pub use mesh::{Material, Mesh, MeshData};
pub use object::Object3D;

use std::cell::RefCell;
use std::rc::Rc;

pub type SharedObject = Rc<RefCell<Object3D>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u64);

#[derive(Debug, Clone)]
pub enum SceneNode {
    Object(SharedObject),
    Light(Light),
    Helper(Helper),
}

#[derive(Debug, Default)]
pub struct Scene {
    nodes: Vec<(NodeId, SceneNode)>,
    next_id: u64,
}

impl Scene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node and return its id
    pub fn add(&mut self, node: SceneNode) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.push((id, node));
        id
    }

    /// Move `object` into the scene and hand back the shared handle
    pub fn add_object(&mut self, object: Object3D) -> (NodeId, SharedObject) {
        let shared = Rc::new(RefCell::new(object));
        let id = self.add(SceneNode::Object(Rc::clone(&shared)));
        (id, shared)
    }

    /// Shorthand for `add(SceneNode::Light(..))`
    pub fn add_light(&mut self, light: Light) -> NodeId {
        self.add(SceneNode::Light(light))
    }

    /// Remove a node, returning it if it was present
    pub fn remove(&mut self, id: NodeId) -> Option<SceneNode> {
        let index = self.nodes.iter().position(|(node_id, _)| *node_id == id)?;
        Some(self.nodes.remove(index).1)
    }

    /// Look up a node by id
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|(node_id, _)| *node_id == id).map(|(_, node)| node)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SceneNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// Object nodes in insertion order
    pub fn objects(&self) -> impl Iterator<Item = &SharedObject> {
        self.nodes.iter().filter_map(|(_, node)| match node {
            SceneNode::Object(object) => Some(object),
            _ => None,
        })
    }

    /// Light nodes in insertion order
    pub fn lights(&self) -> impl Iterator<Item = &Light> {
        self.nodes.iter().filter_map(|(_, node)| match node {
            SceneNode::Light(light) => Some(light),
            _ => None,
        })
    }

    /// Debug helper nodes in insertion order
    pub fn helpers(&self) -> impl Iterator<Item = &Helper> {
        self.nodes.iter().filter_map(|(_, node)| match node {
            SceneNode::Helper(helper) => Some(helper),
            _ => None,
        })
    }

    /// Ids of top-level objects with the given name
    pub fn find_objects_named(&self, name: &str) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|(_, node)| matches!(node, SceneNode::Object(o) if o.borrow().name == name))
            .map(|(id, _)| *id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove() {
        let mut scene = Scene::new();
        let light = scene.add_light(Light::Ambient(AmbientLight::default()));
        let (obj, handle) = scene.add_object(Object3D::group("sword"));

        assert_eq!(scene.len(), 2);
        assert_eq!(scene.find_objects_named("sword"), vec![obj]);
        assert_eq!(scene.lights().count(), 1);

        handle.borrow_mut().rotation.z = 1.0;
        let first = scene.objects().next().unwrap();
        assert_eq!(first.borrow().rotation.z, 1.0);

        assert!(scene.remove(light).is_some());
        assert!(scene.remove(light).is_none());
        assert!(!scene.contains(light));
        assert!(scene.contains(obj));
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut scene = Scene::new();
        let a = scene.add_object(Object3D::group("a")).0;
        scene.remove(a);
        let b = scene.add_object(Object3D::group("b")).0;
        assert_ne!(a, b);
    }
}
