//! Wavefront OBJ loading
//!
//! Supports `v`, `vn`, `f` (all four corner forms, negative indices), and
//! `o`/`g` groups. Each group becomes one child object. Polygons are fan
//! triangulated; corners without a normal get the face normal.
//!
//! Decoding runs on a worker thread. The result comes back through a
//! `PendingLoad` that the UI thread polls once per frame.

use crate::error::{Result, ViewerError};
use crate::scene::{Material, Mesh, MeshData, Object3D};
use glam::Vec3;
use log::{debug, info};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

/// Corner of a face: zero-based position index and optional normal index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Corner {
    position: usize,
    normal: Option<usize>,
}

#[derive(Default)]
struct GroupBuilder {
    name: String,
    positions: Vec<[f32; 3]>,
    normals: Vec<[f32; 3]>,
    indices: Vec<u32>,
    shared: HashMap<Corner, u32>,
}

impl GroupBuilder {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position.to_array());
        self.normals.push(normal.to_array());
        index
    }

    fn corner_index(&mut self, corner: Corner, positions: &[Vec3], normals: &[Vec3], face_normal: Vec3) -> u32 {
        match corner.normal {
            Some(n) => {
                if let Some(&index) = self.shared.get(&corner) {
                    return index;
                }
                let index = self.push_vertex(positions[corner.position], normals[n]);
                self.shared.insert(corner, index);
                index
            }
            // Flat-shaded corners are never shared between faces
            None => self.push_vertex(positions[corner.position], face_normal),
        }
    }

    fn finish(self) -> Option<Object3D> {
        if self.indices.is_empty() {
            return None;
        }
        let data = MeshData::new(self.positions, self.normals, self.indices);
        Some(Object3D::with_mesh(self.name, Mesh::new(data, Material::default())))
    }
}

fn parse_floats<const N: usize>(parts: &mut std::str::SplitWhitespace<'_>, line: usize) -> Result<[f32; N]> {
    let mut out = [0.0; N];
    for value in out.iter_mut() {
        let token = parts
            .next()
            .ok_or_else(|| ViewerError::parse(line, format!("expected {} components", N)))?;
        *value = token
            .parse()
            .map_err(|_| ViewerError::parse(line, format!("invalid number '{}'", token)))?;
    }
    Ok(out)
}

/// OBJ indices are 1-based; negative values count back from the end
fn resolve_index(token: &str, len: usize, line: usize) -> Result<usize> {
    let raw: i64 = token
        .parse()
        .map_err(|_| ViewerError::parse(line, format!("invalid index '{}'", token)))?;
    let resolved = match raw {
        0 => None,
        r if r > 0 => Some(r as usize - 1),
        r => (len as i64 + r).try_into().ok(),
    };
    match resolved {
        Some(i) if i < len => Ok(i),
        _ => Err(ViewerError::parse(line, format!("index {} out of range ({} available)", raw, len))),
    }
}

fn parse_corner(token: &str, positions: usize, normals: usize, line: usize) -> Result<Corner> {
    let mut fields = token.split('/');
    let position = resolve_index(fields.next().unwrap_or(""), positions, line)?;
    let _texcoord = fields.next();
    let normal = match fields.next() {
        Some(n) if !n.is_empty() => Some(resolve_index(n, normals, line)?),
        _ => None,
    };
    Ok(Corner { position, normal })
}

/// Parse OBJ text into an object whose children are the file's groups
pub fn parse_obj(source: &str, name: &str) -> Result<Object3D> {
    let mut positions: Vec<Vec3> = Vec::new();
    let mut normals: Vec<Vec3> = Vec::new();
    let mut groups: Vec<GroupBuilder> = Vec::new();
    let mut current = GroupBuilder::named(name);

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let mut parts = text.split_whitespace();
        let Some(tag) = parts.next() else { continue };

        match tag {
            "v" => positions.push(Vec3::from_array(parse_floats::<3>(&mut parts, line)?)),
            "vn" => normals.push(Vec3::from_array(parse_floats::<3>(&mut parts, line)?).normalize_or_zero()),
            "o" | "g" => {
                let group_name = parts.next().unwrap_or(name);
                let finished = std::mem::replace(&mut current, GroupBuilder::named(group_name));
                groups.push(finished);
            }
            "f" => {
                let corners = parts
                    .map(|t| parse_corner(t, positions.len(), normals.len(), line))
                    .collect::<Result<Vec<_>>>()?;
                if corners.len() < 3 {
                    return Err(ViewerError::parse(line, "face needs at least three vertices"));
                }

                let a = positions[corners[0].position];
                let b = positions[corners[1].position];
                let c = positions[corners[2].position];
                let face_normal = (b - a).cross(c - a).normalize_or(Vec3::Y);

                let resolved: Vec<u32> = corners
                    .iter()
                    .map(|corner| current.corner_index(*corner, &positions, &normals, face_normal))
                    .collect();
                for i in 1..resolved.len() - 1 {
                    current.indices.extend_from_slice(&[resolved[0], resolved[i], resolved[i + 1]]);
                }
            }
            // vt, mtllib, usemtl, s and friends carry nothing we draw
            _ => {}
        }
    }
    groups.push(current);

    let mut root = Object3D::group(name);
    for group in groups {
        if let Some(child) = group.finish() {
            root.add_child(child);
        }
    }
    debug!(
        "Parsed OBJ '{}': {} positions, {} normals, {} meshes",
        name,
        positions.len(),
        normals.len(),
        root.children.len()
    );
    Ok(root)
}

/// Read and parse an OBJ file; files without any faces are an error
pub fn load_obj(path: &Path) -> Result<Object3D> {
    let source = std::fs::read_to_string(path).map_err(|source| ViewerError::AssetIo {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "object".to_string());

    let object = parse_obj(&source, &name)?;
    if object.mesh_count() == 0 {
        return Err(ViewerError::EmptyMesh(path.to_path_buf()));
    }
    Ok(object)
}

/// Receiving end of an asynchronous load
#[derive(Debug)]
pub struct PendingLoad {
    receiver: Receiver<Result<Object3D>>,
}

/// Sending end of an asynchronous load
#[derive(Debug)]
pub struct LoadCompleter {
    sender: Sender<Result<Object3D>>,
}

impl LoadCompleter {
    pub fn complete(self, result: Result<Object3D>) {
        // The viewer may have been unmounted and dropped its receiver
        if self.sender.send(result).is_err() {
            debug!("Asset load finished after the viewer went away");
        }
    }
}

impl PendingLoad {
    pub fn channel() -> (LoadCompleter, PendingLoad) {
        let (sender, receiver) = mpsc::channel();
        (LoadCompleter { sender }, PendingLoad { receiver })
    }

    /// Non-blocking; `None` while the load is still in flight
    pub fn poll(&self) -> Option<Result<Object3D>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ViewerError::LoaderDisconnected)),
        }
    }
}

pub trait AssetLoader {
    fn load(&self, path: &Path) -> PendingLoad;
}

/// Decodes OBJ files on a short-lived worker thread
#[derive(Debug, Default, Clone, Copy)]
pub struct ObjLoader;

impl AssetLoader for ObjLoader {
    fn load(&self, path: &Path) -> PendingLoad {
        let (completer, pending) = PendingLoad::channel();
        let path: PathBuf = path.to_path_buf();
        info!("Loading asset {}", path.display());

        let spawned = thread::Builder::new()
            .name("obj-decode".to_string())
            .spawn(move || completer.complete(load_obj(&path)));
        if let Err(e) = spawned {
            log::error!("Could not start decode thread: {}", e);
        }
        // A failed spawn drops the completer, which the poller sees as a disconnect
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRIANGLE: &str = "\
# one triangle
v 0 0 0
v 1 0 0
v 0 1 0
f 1 2 3
";

    #[test]
    fn test_parse_single_triangle() {
        let object = parse_obj(TRIANGLE, "tri").unwrap();
        assert_eq!(object.name, "tri");
        assert_eq!(object.children.len(), 1);

        let mesh = object.children[0].mesh.as_ref().unwrap();
        assert_eq!(mesh.data.triangle_count(), 1);
        assert_eq!(mesh.data.normals()[0], [0.0, 0.0, 1.0]);
        assert!(!mesh.cast_shadow);
    }

    #[test]
    fn test_quad_is_fan_triangulated() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let object = parse_obj(src, "quad").unwrap();
        let mesh = object.children[0].mesh.as_ref().unwrap();
        assert_eq!(mesh.data.triangle_count(), 2);
    }

    #[test]
    fn test_corner_forms_and_negative_indices() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
vn 0 0 1
f -3/1/1 -2/1/1 -1/1/1
f 1//1 2//1 3//1
f 1/1 2/1 3/1
";
        let object = parse_obj(src, "forms").unwrap();
        let data = &object.children[0].mesh.as_ref().unwrap().data;
        assert_eq!(data.triangle_count(), 3);
        // Corners with normals are shared, flat corners are not
        assert_eq!(data.positions().len(), 3 + 3);
    }

    #[test]
    fn test_groups_become_children() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
o blade
f 1 2 3
g hilt
f 3 2 1
o empty
";
        let object = parse_obj(src, "sword").unwrap();
        let names: Vec<&str> = object.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["blade", "hilt"]);
        assert_eq!(object.mesh_count(), 2);
    }

    #[test]
    fn test_parse_errors_carry_line_numbers() {
        let err = parse_obj("v 0 0 0\nv 1 nope 0\n", "bad").unwrap_err();
        assert!(matches!(err, ViewerError::ObjParse { line: 2, .. }));

        let err = parse_obj("v 0 0 0\nf 1 2 3\n", "bad").unwrap_err();
        assert!(matches!(err, ViewerError::ObjParse { line: 2, .. }));

        let err = parse_obj("v 0 0 0\nv 1 0 0\nf 1 2\n", "bad").unwrap_err();
        assert!(matches!(err, ViewerError::ObjParse { line: 3, .. }));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_obj(Path::new("no/such/file.obj")).unwrap_err();
        assert!(matches!(err, ViewerError::AssetIo { .. }));
    }

    #[test]
    fn test_pending_load_delivers_once() {
        let (completer, pending) = PendingLoad::channel();
        assert!(pending.poll().is_none());

        completer.complete(parse_obj(TRIANGLE, "tri"));
        let object = pending.poll().unwrap().unwrap();
        assert_eq!(object.mesh_count(), 1);

        assert!(matches!(pending.poll(), Some(Err(ViewerError::LoaderDisconnected))));
    }

    #[test]
    fn test_obj_loader_reports_missing_file() {
        let pending = ObjLoader.load(Path::new("no/such/file.obj"));
        let result = loop {
            if let Some(result) = pending.poll() {
                break result;
            }
            thread::yield_now();
        };
        assert!(matches!(result, Err(ViewerError::AssetIo { .. })));
    }
}
