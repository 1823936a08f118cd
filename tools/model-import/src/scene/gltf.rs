//! glTF/GLB scene importer
//!
//! Exposes a glTF document through the foreign scene traits. Per node, every
//! triangle primitive of its mesh is merged into one control-point list, and
//! the node's skin is regrouped into one cluster per joint.

use std::path::Path;

use anyhow::Context as _;
use glam::Mat4;

use super::{
    ForeignMaterial, ForeignMatrix, ForeignMesh, ForeignNode, ForeignScene, SceneImporter,
    SkinClusterSource, SkinDeformer, FOREIGN_IDENTITY,
};
use crate::error::ImportError;
use crate::matrix::to_foreign;

/// Scene importer backed by the `gltf` crate
///
/// Images are not decoded here; texture files are resolved later by the
/// texture resolver so that a missing image never fails the whole import.
#[derive(Debug, Default)]
pub struct GltfImporter {
    opened: u32,
}

impl GltfImporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scenes opened by this importer
    pub fn opened_count(&self) -> u32 {
        self.opened
    }
}

impl SceneImporter for GltfImporter {
    fn open_file(&mut self, path: &Path) -> Result<Box<dyn ForeignScene>, ImportError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())
            .unwrap_or_default();
        if ext != "gltf" && ext != "glb" {
            return Err(ImportError::Unsupported(ext));
        }

        let scene = GltfScene::open(path)?;
        self.opened += 1;
        Ok(Box::new(scene))
    }
}

/// Decoded glTF document plus its binary buffers
pub struct GltfScene {
    name: String,
    document: gltf::Document,
    buffers: Vec<gltf::buffer::Data>,
}

impl GltfScene {
    pub fn open(path: &Path) -> Result<Self, ImportError> {
        let gltf::Gltf { document, blob } = gltf::Gltf::open(path)?;
        let buffers = gltf::import_buffers(&document, path.parent(), blob)?;

        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("scene")
            .to_string();

        tracing::debug!(
            "Opened glTF {:?}: {} nodes, {} meshes, {} skins",
            path,
            document.nodes().count(),
            document.meshes().count(),
            document.skins().count()
        );

        Ok(Self {
            name,
            document,
            buffers,
        })
    }

    fn buffer(&self, buffer: gltf::Buffer<'_>) -> Option<&[u8]> {
        self.buffers.get(buffer.index()).map(|data| data.0.as_slice())
    }
}

impl ForeignScene for GltfScene {
    fn root(&self) -> Option<Box<dyn ForeignNode + '_>> {
        let scene = self
            .document
            .default_scene()
            .or_else(|| self.document.scenes().next())?;
        let mut roots: Vec<gltf::Node<'_>> = scene.nodes().collect();

        if roots.len() == 1 {
            let node = roots.remove(0);
            return Some(Box::new(GltfNode::new(self, node, Mat4::IDENTITY)));
        }

        Some(Box::new(GltfSceneRoot { scene: self, roots }))
    }
}

/// Synthetic root used when a glTF scene lists several top-level nodes
struct GltfSceneRoot<'a> {
    scene: &'a GltfScene,
    roots: Vec<gltf::Node<'a>>,
}

impl ForeignNode for GltfSceneRoot<'_> {
    fn name(&self) -> String {
        self.scene.name.clone()
    }

    fn local_transform(&self) -> ForeignMatrix {
        FOREIGN_IDENTITY
    }

    fn children(&self) -> Vec<Box<dyn ForeignNode + '_>> {
        self.roots
            .iter()
            .map(|node| {
                Box::new(GltfNode::new(self.scene, node.clone(), Mat4::IDENTITY))
                    as Box<dyn ForeignNode + '_>
            })
            .collect()
    }

    fn mesh(&self) -> Option<Box<dyn ForeignMesh + '_>> {
        None
    }

    fn material(&self) -> Option<Box<dyn ForeignMaterial + '_>> {
        None
    }
}

struct GltfNode<'a> {
    scene: &'a GltfScene,
    node: gltf::Node<'a>,
    global: Mat4,
}

impl<'a> GltfNode<'a> {
    fn new(scene: &'a GltfScene, node: gltf::Node<'a>, parent_global: Mat4) -> Self {
        let local = Mat4::from_cols_array_2d(&node.transform().matrix());
        Self {
            scene,
            node,
            global: parent_global * local,
        }
    }
}

impl ForeignNode for GltfNode<'_> {
    fn name(&self) -> String {
        self.node
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("node{}", self.node.index()))
    }

    fn local_transform(&self) -> ForeignMatrix {
        // glTF stores column-major column-vector matrices; each column is a
        // row of the row-vector form.
        self.node
            .transform()
            .matrix()
            .map(|col| col.map(|value| value as f64))
    }

    fn children(&self) -> Vec<Box<dyn ForeignNode + '_>> {
        self.node
            .children()
            .map(|child| {
                Box::new(GltfNode::new(self.scene, child, self.global)) as Box<dyn ForeignNode + '_>
            })
            .collect()
    }

    fn mesh(&self) -> Option<Box<dyn ForeignMesh + '_>> {
        let mesh = self.node.mesh()?;
        Some(Box::new(GltfMesh {
            scene: self.scene,
            mesh,
            skin: self.node.skin(),
            global: self.global,
        }))
    }

    fn material(&self) -> Option<Box<dyn ForeignMaterial + '_>> {
        let primitive = self
            .node
            .mesh()?
            .primitives()
            .find(is_triangle_primitive)?;
        let material = primitive.material();
        // No index means glTF's implicit default material
        material.index()?;
        Some(Box::new(GltfMaterial { material }))
    }
}

struct GltfMesh<'a> {
    scene: &'a GltfScene,
    mesh: gltf::Mesh<'a>,
    skin: Option<gltf::Skin<'a>>,
    global: Mat4,
}

impl<'a> GltfMesh<'a> {
    /// Primitives that contribute geometry: triangle lists with positions
    fn triangle_primitives(&self) -> impl Iterator<Item = gltf::Primitive<'a>> + '_ {
        self.mesh.primitives().filter(|primitive| {
            let usable = is_triangle_primitive(primitive);
            if !usable {
                tracing::debug!(
                    "Skipping primitive {} of mesh '{}' (mode {:?})",
                    primitive.index(),
                    self.mesh.name().unwrap_or("unnamed"),
                    primitive.mode()
                );
            }
            usable
        })
    }

    fn vertex_count(primitive: &gltf::Primitive<'_>) -> usize {
        primitive
            .get(&gltf::Semantic::Positions)
            .map(|accessor| accessor.count())
            .unwrap_or(0)
    }
}

impl ForeignMesh for GltfMesh<'_> {
    fn control_points(&self) -> Vec<[f64; 3]> {
        let mut points = Vec::new();
        for primitive in self.triangle_primitives() {
            let reader = primitive.reader(|buffer| self.scene.buffer(buffer));
            if let Some(positions) = reader.read_positions() {
                points.extend(positions.map(|p| p.map(f64::from)));
            }
        }
        points
    }

    fn normals(&self) -> Option<Vec<[f64; 3]>> {
        let mut normals = Vec::new();
        let mut any = false;
        for primitive in self.triangle_primitives() {
            let reader = primitive.reader(|buffer| self.scene.buffer(buffer));
            let count = Self::vertex_count(&primitive);
            match reader.read_normals() {
                Some(iter) => {
                    any = true;
                    normals.extend(iter.take(count).map(|n| n.map(f64::from)));
                }
                None => normals.resize(normals.len() + count, [0.0; 3]),
            }
        }
        any.then_some(normals)
    }

    fn uvs(&self) -> Option<Vec<[f64; 2]>> {
        let mut uvs = Vec::new();
        let mut any = false;
        for primitive in self.triangle_primitives() {
            let reader = primitive.reader(|buffer| self.scene.buffer(buffer));
            let count = Self::vertex_count(&primitive);
            match reader.read_tex_coords(0) {
                Some(iter) => {
                    any = true;
                    uvs.extend(iter.into_f32().take(count).map(|uv| uv.map(f64::from)));
                }
                None => uvs.resize(uvs.len() + count, [0.0; 2]),
            }
        }
        any.then_some(uvs)
    }

    fn polygons(&self) -> Vec<Vec<u32>> {
        let mut polygons = Vec::new();
        let mut base = 0u32;
        for primitive in self.triangle_primitives() {
            let reader = primitive.reader(|buffer| self.scene.buffer(buffer));
            let count = Self::vertex_count(&primitive) as u32;
            let indices: Vec<u32> = match reader.read_indices() {
                Some(iter) => iter.into_u32().collect(),
                None => (0..count).collect(),
            };

            let mut dropped = 0usize;
            for tri in indices.chunks_exact(3) {
                // Indices are local to the primitive; rebase only those inside it
                let rebased: Option<Vec<u32>> = tri
                    .iter()
                    .map(|&i| if i < count { base.checked_add(i) } else { None })
                    .collect();
                match rebased {
                    Some(polygon) => polygons.push(polygon),
                    None => dropped += 1,
                }
            }
            if dropped > 0 {
                tracing::warn!(
                    "Primitive {} of mesh '{}': dropped {} triangles indexing past its {} vertices",
                    primitive.index(),
                    self.mesh.name().unwrap_or("unnamed"),
                    dropped,
                    count
                );
            }
            base = base.saturating_add(count);
        }
        polygons
    }

    fn global_transform(&self) -> ForeignMatrix {
        to_foreign(&self.global)
    }

    fn skin_deformers(&self) -> Vec<SkinDeformer> {
        let Some(skin) = &self.skin else {
            return Vec::new();
        };

        let joints: Vec<gltf::Node<'_>> = skin.joints().collect();

        let skin_reader = skin.reader(|buffer| self.scene.buffer(buffer));
        let inverse_bind_matrices: Vec<Mat4> = skin_reader
            .read_inverse_bind_matrices()
            .map(|iter| iter.map(|m| Mat4::from_cols_array_2d(&m)).collect())
            .unwrap_or_default();

        let mut clusters: Vec<SkinClusterSource> = joints
            .iter()
            .enumerate()
            .map(|(slot, joint)| {
                let inverse_bind = inverse_bind_matrices
                    .get(slot)
                    .copied()
                    .unwrap_or(Mat4::IDENTITY);
                SkinClusterSource {
                    bone_name: joint
                        .name()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("joint{}", joint.index())),
                    link_transform: to_foreign(&(self.global * inverse_bind.inverse())),
                    control_point_indices: Vec::new(),
                    weights: Vec::new(),
                }
            })
            .collect();

        let mut base = 0u32;
        for primitive in self.triangle_primitives() {
            let reader = primitive.reader(|buffer| self.scene.buffer(buffer));
            let count = Self::vertex_count(&primitive) as u32;
            if let (Some(joint_sets), Some(weight_sets)) =
                (reader.read_joints(0), reader.read_weights(0))
            {
                for (vertex, (joint_set, weight_set)) in joint_sets
                    .into_u16()
                    .zip(weight_sets.into_f32())
                    .take(count as usize)
                    .enumerate()
                {
                    let control_point = base.saturating_add(vertex as u32);
                    for (&joint, &weight) in joint_set.iter().zip(&weight_set) {
                        if weight <= 0.0 {
                            continue;
                        }
                        match clusters.get_mut(joint as usize) {
                            Some(cluster) => {
                                cluster.control_point_indices.push(control_point);
                                cluster.weights.push(f64::from(weight));
                            }
                            None => tracing::warn!(
                                "Vertex {} references joint {} outside skin '{}'",
                                control_point,
                                joint,
                                skin.name().unwrap_or("unnamed")
                            ),
                        }
                    }
                }
            }
            base = base.saturating_add(count);
        }

        tracing::debug!(
            "Skin '{}': {} joints",
            skin.name().unwrap_or("unnamed"),
            clusters.len()
        );

        vec![SkinDeformer { clusters }]
    }
}

struct GltfMaterial<'a> {
    material: gltf::Material<'a>,
}

impl ForeignMaterial for GltfMaterial<'_> {
    fn name(&self) -> String {
        self.material
            .name()
            .map(str::to_string)
            .or_else(|| self.material.index().map(|i| format!("material{i}")))
            .unwrap_or_else(|| "default".to_string())
    }

    fn ambient(&self) -> Option<[f64; 3]> {
        None
    }

    fn diffuse(&self) -> Option<[f64; 3]> {
        let [r, g, b, _] = self.material.pbr_metallic_roughness().base_color_factor();
        Some([r, g, b].map(f64::from))
    }

    fn diffuse_texture_path(&self) -> Option<String> {
        let info = self.material.pbr_metallic_roughness().base_color_texture()?;
        match info.texture().source().source() {
            gltf::image::Source::Uri { uri, .. } => Some(uri.to_string()),
            gltf::image::Source::View { .. } => {
                tracing::debug!(
                    "Material '{}' embeds its texture; embedded images are not resolved",
                    self.name()
                );
                None
            }
        }
    }
}

/// Triangle lists with positions; other primitives contribute nothing
fn is_triangle_primitive(primitive: &gltf::Primitive<'_>) -> bool {
    primitive.mode() == gltf::mesh::Mode::Triangles
        && primitive.get(&gltf::Semantic::Positions).is_some()
}

impl std::fmt::Debug for GltfScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GltfScene")
            .field("name", &self.name)
            .field("nodes", &self.document.nodes().count())
            .field("buffers", &self.buffers.len())
            .finish()
    }
}

/// One line per node of a glTF file, for the CLI `nodes` listing
pub fn describe_nodes(path: &Path) -> anyhow::Result<Vec<String>> {
    let scene =
        GltfScene::open(path).with_context(|| format!("Failed to load glTF: {:?}", path))?;
    Ok(scene
        .document
        .nodes()
        .map(|node| {
            format!(
                "[{}] '{}' mesh={} skin={} children={}",
                node.index(),
                node.name().unwrap_or("unnamed"),
                node.mesh().is_some(),
                node.skin().is_some(),
                node.children().count()
            )
        })
        .collect())
}
