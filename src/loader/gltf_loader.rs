//! glTF model loader.
//!
//! Loads .glb/.gltf files into a [`Scene`]:
//! - Node hierarchy with TRS transforms
//! - Triangle meshes and their materials
//! - Lights from the KHR_lights_punctual extension

use std::collections::HashMap;
use std::path::Path;

use glam::{Quat, Vec3};

use crate::core::error::{DisplayError, DisplayResult};
use crate::core::scene::{
    Light, LightAim, LightKind, Material, MaterialId, Mesh, MeshId, Node, NodeId, Primitive, Scene,
};
use crate::core::types::{Color, Transform};

/// Geometry compression we cannot decode.
const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Load a glTF/GLB file from disk. External buffers are resolved
/// relative to the file.
pub fn load_gltf(path: impl AsRef<Path>) -> DisplayResult<Scene> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)?;
    check_extensions(&bytes)?;

    let (document, buffers, _images) = gltf::import(path)?;
    let scene = build_scene(&document, &buffers)?;

    log::info!(
        "Loaded glTF model {}: {} nodes, {} meshes, {} lights",
        path.display(),
        scene.nodes.len(),
        scene.meshes.len(),
        scene.lights.len()
    );
    Ok(scene)
}

/// Load a self-contained glTF (GLB or JSON with data URIs) from memory.
pub fn load_gltf_from_bytes(data: &[u8]) -> DisplayResult<Scene> {
    check_extensions(data)?;
    let (document, buffers, _images) = gltf::import_slice(data)?;
    build_scene(&document, &buffers)
}

fn check_extensions(data: &[u8]) -> DisplayResult<()> {
    let gltf = gltf::Gltf::from_slice_without_validation(data)?;
    let uses_draco = gltf
        .extensions_used()
        .chain(gltf.extensions_required())
        .any(|ext| ext == DRACO_EXTENSION);
    if uses_draco {
        return Err(DisplayError::UnsupportedExtension(DRACO_EXTENSION.to_string()));
    }
    Ok(())
}

/// Index remapping while walking the document.
struct Builder<'a> {
    buffers: &'a [gltf::buffer::Data],
    scene: Scene,
    meshes: HashMap<usize, MeshId>,
    materials: HashMap<Option<usize>, MaterialId>,
}

fn build_scene(document: &gltf::Document, buffers: &[gltf::buffer::Data]) -> DisplayResult<Scene> {
    let mut builder = Builder {
        buffers,
        scene: Scene::new(),
        meshes: HashMap::new(),
        materials: HashMap::new(),
    };

    let gltf_scene = document
        .default_scene()
        .or_else(|| document.scenes().next());

    match gltf_scene {
        Some(gltf_scene) => {
            for node in gltf_scene.nodes() {
                builder.process_node(&node, None)?;
            }
        }
        None => log::warn!("glTF document has no scene"),
    }

    Ok(builder.scene)
}

impl Builder<'_> {
    /// Process a glTF node and its children recursively.
    fn process_node(&mut self, node: &gltf::Node, parent: Option<NodeId>) -> DisplayResult<()> {
        let (translation, rotation, scale) = node.transform().decomposed();

        let mesh = node.mesh();
        let name = node
            .name()
            .or_else(|| mesh.as_ref().and_then(|m| m.name()))
            .unwrap_or("")
            .to_string();

        let mut scene_node = Node::new(name);
        scene_node.transform = Transform {
            translation: Vec3::from(translation),
            rotation: Quat::from_array(rotation),
            scale: Vec3::from(scale),
        };
        if let Some(mesh) = mesh {
            scene_node.mesh = Some(self.mesh(&mesh)?);
        }
        if let Some(light) = node.light() {
            scene_node.light = Some(self.scene.lights.len());
            self.scene.lights.push(convert_light(&light, node.name()));
        }

        let id = self.scene.add_node(scene_node, parent);
        for child in node.children() {
            self.process_node(&child, Some(id))?;
        }
        Ok(())
    }

    /// Scene mesh for a glTF mesh, converted once and shared between nodes.
    fn mesh(&mut self, mesh: &gltf::Mesh) -> DisplayResult<MeshId> {
        if let Some(&id) = self.meshes.get(&mesh.index()) {
            return Ok(id);
        }

        let name = mesh.name().unwrap_or("unnamed").to_string();
        let mut primitives = Vec::new();
        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                log::debug!("Skipping {:?} primitive in mesh {}", primitive.mode(), name);
                continue;
            }
            let (positions, normals, indices) =
                extract_primitive_data(&primitive, self.buffers, &name)?;
            let material = self.material(&primitive.material());
            primitives.push(Primitive {
                positions,
                normals,
                indices,
                material,
            });
        }

        let id = self.scene.add_mesh(Mesh { name, primitives });
        self.meshes.insert(mesh.index(), id);
        Ok(id)
    }

    fn material(&mut self, material: &gltf::Material) -> MaterialId {
        if let Some(&id) = self.materials.get(&material.index()) {
            return id;
        }

        let [r, g, b, a] = material.pbr_metallic_roughness().base_color_factor();
        let id = self.scene.add_material(Material::new(
            material.name().unwrap_or("default"),
            Color { r, g, b, a },
        ));
        self.materials.insert(material.index(), id);
        id
    }
}

/// Extract vertex positions, normals, and indices from a glTF primitive.
fn extract_primitive_data(
    primitive: &gltf::Primitive,
    buffers: &[gltf::buffer::Data],
    mesh_name: &str,
) -> DisplayResult<(Vec<Vec3>, Vec<Vec3>, Vec<u32>)> {
    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

    let positions: Vec<Vec3> = reader
        .read_positions()
        .ok_or_else(|| DisplayError::MissingPositions(mesh_name.to_string()))?
        .map(Vec3::from)
        .collect();

    // Flat +Y normals when the asset carries none.
    let normals: Vec<Vec3> = reader
        .read_normals()
        .map(|iter| iter.map(Vec3::from).collect())
        .unwrap_or_else(|| vec![Vec3::Y; positions.len()]);

    let indices: Vec<u32> = reader
        .read_indices()
        .map(|iter| iter.into_u32().collect())
        .unwrap_or_else(|| (0..positions.len() as u32).collect());

    Ok((positions, normals, indices))
}

fn convert_light(light: &gltf::khr_lights_punctual::Light, node_name: Option<&str>) -> Light {
    use gltf::khr_lights_punctual::Kind;

    let kind = match light.kind() {
        Kind::Directional => LightKind::Directional,
        Kind::Point => LightKind::Point,
        Kind::Spot { .. } => LightKind::Spot,
    };
    let [r, g, b] = light.color();

    Light {
        // Scenes address lights by their node, e.g. node "Sun" with light "Sun.001".
        name: node_name.or(light.name()).unwrap_or("light").to_string(),
        kind,
        color: Color::rgb(r, g, b),
        intensity: light.intensity(),
        aim: LightAim::Forward,
        shadow: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One triangle shared by a case and three hands, plus a sun light.
    const CLOCK_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "extensionsUsed": ["KHR_lights_punctual"],
        "extensions": {
            "KHR_lights_punctual": {
                "lights": [{ "name": "Sun", "type": "directional", "color": [1.0, 0.9, 0.8], "intensity": 3.0 }]
            }
        },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "Clock", "children": [1, 2, 3, 4, 5] },
            { "name": "Circle", "mesh": 0 },
            { "name": "heure", "mesh": 1, "translation": [0.0, 0.1, 0.0] },
            { "name": "minute", "mesh": 1 },
            { "name": "seconde", "mesh": 1 },
            { "name": "Sun", "translation": [0.0, 4.0, 2.0], "extensions": { "KHR_lights_punctual": { "light": 0 } } }
        ],
        "meshes": [
            { "name": "case", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 0 }] },
            { "name": "hand", "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "material": 1 }] }
        ],
        "materials": [
            { "name": "block texture", "pbrMetallicRoughness": { "baseColorFactor": [1.0, 1.0, 1.0, 1.0] } },
            { "name": "steel", "pbrMetallicRoughness": { "baseColorFactor": [0.1, 0.1, 0.1, 1.0] } }
        ],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0] },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
        ],
        "buffers": [{
            "byteLength": 44,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA="
        }]
    }"#;

    #[test]
    fn test_load_embedded_clock() {
        let scene = load_gltf_from_bytes(CLOCK_GLTF.as_bytes()).unwrap();

        assert_eq!(scene.roots.len(), 1);
        assert_eq!(scene.nodes.len(), 6);
        let root = scene.roots[0];
        assert_eq!(scene.node(root).name, "Clock");
        assert_eq!(scene.node(root).children.len(), 5);

        // Hands share one converted mesh.
        assert_eq!(scene.meshes.len(), 2);
        let hour = scene.find_by_name(root, "heure")[0];
        let minute = scene.find_by_name(root, "minute")[0];
        assert_eq!(scene.node(hour).mesh, scene.node(minute).mesh);
        assert!((scene.node(hour).transform.translation.y - 0.1).abs() < 1e-6);

        let circle = scene.find_by_name(root, "Circle")[0];
        let mesh = &scene.meshes[scene.node(circle).mesh.unwrap()];
        let prim = &mesh.primitives[0];
        assert_eq!(prim.positions.len(), 3);
        assert_eq!(prim.indices, vec![0, 1, 2]);
        assert_eq!(prim.normals, vec![Vec3::Y; 3]);
        assert_eq!(scene.materials[prim.material].name, "block texture");
    }

    #[test]
    fn test_load_punctual_light() {
        let scene = load_gltf_from_bytes(CLOCK_GLTF.as_bytes()).unwrap();
        assert_eq!(scene.lights.len(), 1);
        let light = &scene.lights[0];
        assert_eq!(light.name, "Sun");
        assert_eq!(light.kind, LightKind::Directional);
        assert_eq!(light.intensity, 3.0);
        assert_eq!(light.aim, LightAim::Forward);

        let sun = scene.find_by_name(scene.roots[0], "Sun")[0];
        assert_eq!(scene.node(sun).light, Some(0));
    }

    #[test]
    fn test_light_takes_node_name() {
        let renamed = CLOCK_GLTF.replace(
            r#""name": "Sun", "type": "directional""#,
            r#""name": "Sun.001", "type": "directional""#,
        );
        let scene = load_gltf_from_bytes(renamed.as_bytes()).unwrap();
        assert_eq!(scene.lights[0].name, "Sun");
    }

    #[test]
    fn test_draco_is_rejected() {
        let draco = r#"{
            "asset": { "version": "2.0" },
            "extensionsUsed": ["KHR_draco_mesh_compression"],
            "extensionsRequired": ["KHR_draco_mesh_compression"]
        }"#;
        let err = load_gltf_from_bytes(draco.as_bytes()).unwrap_err();
        assert!(matches!(err, DisplayError::UnsupportedExtension(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_gltf("does/not/exist.gltf").unwrap_err();
        assert!(matches!(err, DisplayError::Io(_)));
    }
}
