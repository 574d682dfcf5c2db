//! Scene graph: nodes, meshes, materials and lights.
//!
//! Nodes live in a flat arena and reference each other by [`NodeId`].
//! Meshes and materials are shared by index so recoloring a material
//! affects every node that draws with it.

use bitflags::bitflags;
use glam::{Mat4, Vec3};

use crate::core::types::{Color, Transform};

pub type NodeId = usize;
pub type MeshId = usize;
pub type MaterialId = usize;
pub type LightId = usize;

bitflags! {
    /// Per-node shadow participation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShadowFlags: u8 {
        const CAST = 0b01;
        const RECEIVE = 0b10;
    }
}

/// A single node of the hierarchy.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub transform: Transform,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub mesh: Option<MeshId>,
    pub light: Option<LightId>,
    pub shadow: ShadowFlags,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            parent: None,
            children: Vec::new(),
            mesh: None,
            light: None,
            shadow: ShadowFlags::empty(),
        }
    }
}

/// Surface appearance shared between primitives.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    /// Base color in linear space
    pub base_color: Color,
    pub wireframe: bool,
}

impl Material {
    pub fn new(name: impl Into<String>, base_color: Color) -> Self {
        Self {
            name: name.into(),
            base_color,
            wireframe: false,
        }
    }
}

/// Triangle list with a single material.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
    pub material: MaterialId,
}

impl Primitive {
    /// Local-space bounds, `None` when the primitive has no vertices.
    pub fn bounds(&self) -> Option<Box3> {
        let mut bounds = Box3::EMPTY;
        for p in &self.positions {
            bounds.expand_by_point(*p);
        }
        (!bounds.is_empty()).then_some(bounds)
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: String,
    pub primitives: Vec<Primitive>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    Directional,
    Point,
    Spot,
}

/// Where a directional or spot light points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightAim {
    /// Towards a world-space point
    Target(Vec3),
    /// Along the node's local -Z axis
    Forward,
}

/// Shadow map parameters of a shadow-casting light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightShadow {
    pub map_size: u32,
    pub near: f32,
    pub far: f32,
    pub bias: f32,
    pub half_extent: f32,
}

#[derive(Debug, Clone)]
pub struct Light {
    pub name: String,
    pub kind: LightKind,
    pub color: Color,
    pub intensity: f32,
    pub aim: LightAim,
    /// `Some` when the light casts shadows
    pub shadow: Option<LightShadow>,
}

impl Light {
    pub fn ambient(color: Color, intensity: f32) -> Self {
        Self {
            name: "ambient".to_string(),
            kind: LightKind::Ambient,
            color,
            intensity,
            aim: LightAim::Forward,
            shadow: None,
        }
    }

    pub fn directional(name: impl Into<String>, color: Color, intensity: f32) -> Self {
        Self {
            name: name.into(),
            kind: LightKind::Directional,
            color,
            intensity,
            aim: LightAim::Target(Vec3::ZERO),
            shadow: None,
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Box3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Box3 {
    pub const EMPTY: Box3 = Box3 {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn is_empty(&self) -> bool {
        self.max.x < self.min.x || self.max.y < self.min.y || self.max.z < self.min.z
    }

    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&mut self, other: &Box3) {
        if !other.is_empty() {
            self.expand_by_point(other.min);
            self.expand_by_point(other.max);
        }
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of this box after transformation by `matrix`.
    pub fn transformed(&self, matrix: &Mat4) -> Box3 {
        let mut out = Box3::EMPTY;
        if !self.is_empty() {
            for corner in self.corners() {
                out.expand_by_point(matrix.transform_point3(corner));
            }
        }
        out
    }
}

/// The scene graph.
#[derive(Debug, Clone)]
pub struct Scene {
    pub nodes: Vec<Node>,
    pub roots: Vec<NodeId>,
    pub meshes: Vec<Mesh>,
    pub materials: Vec<Material>,
    pub lights: Vec<Light>,
    /// Clear color, sRGB encoded
    pub background: Color,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            roots: Vec::new(),
            meshes: Vec::new(),
            materials: Vec::new(),
            lights: Vec::new(),
            background: Color::BLACK,
        }
    }

    /// Add a node under `parent`, or as a root when `parent` is `None`.
    pub fn add_node(&mut self, mut node: Node, parent: Option<NodeId>) -> NodeId {
        let id = self.nodes.len();
        node.parent = parent;
        self.nodes.push(node);
        match parent {
            Some(p) => self.nodes[p].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        self.meshes.len() - 1
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Add a light attached to a new node.
    pub fn add_light(&mut self, light: Light, transform: Transform, parent: Option<NodeId>) -> NodeId {
        let mut node = Node::new(light.name.clone());
        node.transform = transform;
        node.light = Some(self.lights.len());
        self.lights.push(light);
        self.add_node(node, parent)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id]
    }

    /// Depth-first, pre-order list of `root` and everything below it.
    pub fn descendants(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            out.push(id);
            // Reverse so children come out in declaration order.
            stack.extend(self.nodes[id].children.iter().rev().copied());
        }
        out
    }

    /// All nodes below `root` (inclusive) whose name is `name`.
    pub fn find_by_name(&self, root: NodeId, name: &str) -> Vec<NodeId> {
        self.descendants(root)
            .into_iter()
            .filter(|&id| self.nodes[id].name == name)
            .collect()
    }

    /// Materials drawn by the mesh nodes below `root`, without duplicates.
    pub fn materials_under(&self, root: NodeId) -> Vec<MaterialId> {
        let mut out: Vec<MaterialId> = Vec::new();
        for id in self.descendants(root) {
            if let Some(mesh) = self.nodes[id].mesh {
                for prim in &self.meshes[mesh].primitives {
                    if !out.contains(&prim.material) {
                        out.push(prim.material);
                    }
                }
            }
        }
        out
    }

    /// World matrix of every node, indexed by `NodeId`.
    pub fn world_matrices(&self) -> Vec<Mat4> {
        let mut world = vec![Mat4::IDENTITY; self.nodes.len()];
        let mut stack: Vec<(NodeId, Mat4)> =
            self.roots.iter().map(|&r| (r, Mat4::IDENTITY)).collect();
        while let Some((id, parent)) = stack.pop() {
            let node = &self.nodes[id];
            let m = parent * node.transform.matrix();
            world[id] = m;
            stack.extend(node.children.iter().map(|&c| (c, m)));
        }
        world
    }

    /// World-space bounds of the meshes below `root`.
    pub fn bounding_box(&self, root: NodeId) -> Box3 {
        let world = self.world_matrices();
        let mut bounds = Box3::EMPTY;
        for id in self.descendants(root) {
            if let Some(mesh) = self.nodes[id].mesh {
                for prim in &self.meshes[mesh].primitives {
                    if let Some(local) = prim.bounds() {
                        bounds.union(&local.transformed(&world[id]));
                    }
                }
            }
        }
        bounds
    }

    /// Move another scene's content into this one, grouped under a new
    /// node named `name`. Returns the group node.
    pub fn import(&mut self, other: Scene, name: &str, parent: Option<NodeId>) -> NodeId {
        let node_offset = self.nodes.len() + 1;
        let mesh_offset = self.meshes.len();
        let material_offset = self.materials.len();
        let light_offset = self.lights.len();

        let group = self.add_node(Node::new(name), parent);

        for mut mesh in other.meshes {
            for prim in &mut mesh.primitives {
                prim.material += material_offset;
            }
            self.meshes.push(mesh);
        }
        self.materials.extend(other.materials);
        self.lights.extend(other.lights);

        for mut node in other.nodes {
            node.parent = Some(node.parent.map_or(group, |p| p + node_offset));
            for child in &mut node.children {
                *child += node_offset;
            }
            node.mesh = node.mesh.map(|m| m + mesh_offset);
            node.light = node.light.map(|l| l + light_offset);
            self.nodes.push(node);
        }
        let imported_roots: Vec<NodeId> = other.roots.iter().map(|r| r + node_offset).collect();
        self.nodes[group].children.extend(imported_roots);

        group
    }
}
