//! Foreign scene capability
//!
//! The pipeline reads source scenes only through these traits, so any scene
//! SDK (or a test double) can feed it. Implementations hand out short-lived
//! views borrowing from the scene; nothing here is mutated.
//!
//! Foreign matrices are row-major with the row-vector convention: the
//! translation lives in row 3. See [`crate::matrix`] for the engine mapping.

mod gltf;

pub use self::gltf::{describe_nodes, GltfImporter, GltfScene};

use std::path::Path;

use crate::error::ImportError;

/// 4x4 matrix as supplied by the scene SDK (row-major, row-vector convention)
pub type ForeignMatrix = [[f64; 4]; 4];

/// Foreign identity matrix
pub const FOREIGN_IDENTITY: ForeignMatrix = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// Opens model files and produces scenes
pub trait SceneImporter {
    fn open_file(&mut self, path: &Path) -> Result<Box<dyn ForeignScene>, ImportError>;
}

/// A decoded scene
pub trait ForeignScene {
    /// Root of the node tree, `None` if the file holds no usable scene
    fn root(&self) -> Option<Box<dyn ForeignNode + '_>>;
}

/// One node of the source hierarchy
pub trait ForeignNode {
    fn name(&self) -> String;
    fn local_transform(&self) -> ForeignMatrix;
    /// Children in source order
    fn children(&self) -> Vec<Box<dyn ForeignNode + '_>>;
    fn mesh(&self) -> Option<Box<dyn ForeignMesh + '_>>;
    fn material(&self) -> Option<Box<dyn ForeignMaterial + '_>>;
}

/// Geometry attached to a node
pub trait ForeignMesh {
    fn control_points(&self) -> Vec<[f64; 3]>;
    /// First normal layer, one entry per control point
    fn normals(&self) -> Option<Vec<[f64; 3]>>;
    /// First UV layer, one entry per control point
    fn uvs(&self) -> Option<Vec<[f64; 2]>>;
    /// Polygons as control-point indices; any vertex count
    fn polygons(&self) -> Vec<Vec<u32>>;
    /// Global transform of the node carrying the mesh
    fn global_transform(&self) -> ForeignMatrix;
    fn skin_deformers(&self) -> Vec<SkinDeformer>;
}

/// Surface material slot of a node
pub trait ForeignMaterial {
    fn name(&self) -> String;
    fn ambient(&self) -> Option<[f64; 3]>;
    fn diffuse(&self) -> Option<[f64; 3]>;
    /// Diffuse texture file reference, as stored in the source file
    fn diffuse_texture_path(&self) -> Option<String>;
}

/// Skin deformer: a set of bone clusters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkinDeformer {
    pub clusters: Vec<SkinClusterSource>,
}

/// One bone's influence as stored in the source scene
#[derive(Debug, Clone, PartialEq)]
pub struct SkinClusterSource {
    pub bone_name: String,
    /// Global transform of the bone at bind time
    pub link_transform: ForeignMatrix,
    pub control_point_indices: Vec<u32>,
    /// Parallel to `control_point_indices`
    pub weights: Vec<f64>,
}
