//! Engine-side model aggregate
//!
//! A [`Model`] is filled in by the import pipeline during one synchronous load
//! and is treated as read-only afterwards. Scene nodes live in an arena owned
//! by the model and refer to each other through [`NodeId`]s; node 0 is the root.

use std::ops::Range;
use std::path::PathBuf;

use glam::{Mat4, Quat, Vec3};

use crate::packing::{Face, Vertex};

/// Index of a node in [`Model::nodes`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// The model root is always the first node created
    pub const ROOT: Self = Self(0);

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a material in [`Model::materials`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub u32);

impl MaterialId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a texture in [`Model::textures`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u32);

impl TextureId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Opaque handle to a GPU texture issued by a graphics device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u32);

/// Pixel layout of texture data handed to the graphics device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit RGBA, sRGB encoded (albedo/diffuse maps)
    Rgba8UnormSrgb,
    /// 8-bit RGBA, linear
    Rgba8Unorm,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgba8UnormSrgb | Self::Rgba8Unorm => 4,
        }
    }
}

/// GPU texture owned by a model
#[derive(Debug, Clone)]
pub struct Texture {
    pub handle: TextureHandle,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// File the pixels were decoded from
    pub path: PathBuf,
}

/// Surface material
///
/// Owned by the model, referenced by scene nodes through [`MaterialId`].
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub texture: Option<TextureId>,
}

impl Default for Material {
    /// White diffuse, black ambient, untextured
    fn default() -> Self {
        Self {
            name: String::from("default"),
            ambient: Vec3::ZERO,
            diffuse: Vec3::ONE,
            texture: None,
        }
    }
}

/// Span of one mesh inside the model's flattened vertex and face buffers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshRange {
    pub first_vertex: u32,
    pub vertex_count: u32,
    pub first_face: u32,
    pub face_count: u32,
}

impl MeshRange {
    pub fn vertices(&self) -> Range<usize> {
        let start = self.first_vertex as usize;
        start..start + self.vertex_count as usize
    }

    pub fn faces(&self) -> Range<usize> {
        let start = self.first_face as usize;
        start..start + self.face_count as usize
    }

    pub fn is_empty(&self) -> bool {
        self.vertex_count == 0
    }
}

/// One bone's bind pose and the vertices it influences
#[derive(Debug, Clone, PartialEq)]
pub struct SkinCluster {
    pub bone_name: String,
    /// Maps mesh-space positions into bone space at bind time
    pub inverse_bind_pose: Mat4,
    /// (vertex index, normalized weight) pairs
    pub influences: Vec<(u32, f32)>,
}

/// Node of the output hierarchy
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub name: String,
    pub scaling: Vec3,
    pub rotation: Quat,
    pub translation: Vec3,
    pub local_transform: Mat4,
    /// `parent.global_transform * local_transform`
    pub global_transform: Mat4,
    pub parent: Option<NodeId>,
    /// Children in the order the source scene listed them
    pub children: Vec<NodeId>,
    pub mesh: Option<MeshRange>,
    pub material: Option<MaterialId>,
}

impl SceneNode {
    /// Detached node; its global transform is fixed up by [`Model::add_node`]
    pub fn new(name: impl Into<String>, local_transform: Mat4) -> Self {
        let (scaling, rotation, translation) = local_transform.to_scale_rotation_translation();
        Self {
            name: name.into(),
            scaling,
            rotation,
            translation,
            local_transform,
            global_transform: local_transform,
            parent: None,
            children: Vec::new(),
            mesh: None,
            material: None,
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Inverted box that any point extends
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Imported model, ready for rendering once the loader returns it
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub name: String,
    /// Node arena; index 0 is the root
    pub nodes: Vec<SceneNode>,
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,
    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,
    /// Bone index stored in [`Vertex::bone_indices`] is the cluster's position here
    pub skin_clusters: Vec<SkinCluster>,
    /// Object-space bounds of all mesh vertices
    pub bounds: Aabb,
    /// Vertex format flags (`FORMAT_*`)
    pub format: u8,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// True if nothing has been loaded into the model
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn root(&self) -> Option<&SceneNode> {
        self.nodes.first()
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(id.index())
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(id.index())
    }

    pub fn material(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.index())
    }

    pub fn texture(&self, id: TextureId) -> Option<&Texture> {
        self.textures.get(id.index())
    }

    /// Insert a node into the arena and link it under `parent`
    ///
    /// `None` makes the node the model root; only the first node may be inserted
    /// that way. The node's global transform is derived from the parent's.
    pub fn add_node(&mut self, mut node: SceneNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        debug_assert!(
            parent.is_some() || self.nodes.is_empty(),
            "only the first node may be a root"
        );

        node.parent = parent;
        node.global_transform = match parent.and_then(|p| self.nodes.get_mut(p.index())) {
            Some(parent_node) => {
                parent_node.children.push(id);
                parent_node.global_transform * node.local_transform
            }
            None => node.local_transform,
        };

        self.nodes.push(node);
        id
    }

    pub fn add_material(&mut self, material: Material) -> MaterialId {
        let id = MaterialId(self.materials.len() as u32);
        self.materials.push(material);
        id
    }

    pub fn add_texture(&mut self, texture: Texture) -> TextureId {
        let id = TextureId(self.textures.len() as u32);
        self.textures.push(texture);
        id
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn is_skinned(&self) -> bool {
        !self.skin_clusters.is_empty()
    }

    /// Vertex buffer contents for GPU upload
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index buffer contents (u32 triangle list) for GPU upload
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.faces)
    }

    /// Depth-first pre-order walk from the root, yielding `(node, depth)`
    ///
    /// Children are visited in stored order. Every node is visited at most
    /// once, so a corrupted arena cannot make the walk loop forever.
    pub fn traverse(&self) -> Vec<(NodeId, usize)> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if self.nodes.is_empty() {
            return order;
        }

        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![(NodeId::ROOT, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let Some(node) = self.nodes.get(id.index()) else {
                continue;
            };
            if std::mem::replace(&mut visited[id.index()], true) {
                continue;
            }
            order.push((id, depth));
            stack.extend(node.children.iter().rev().map(|&child| (child, depth + 1)));
        }
        order
    }
}
