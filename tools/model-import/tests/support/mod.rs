//! Scripted in-memory scenes for driving the import pipeline in tests.
//!
//! The importer ignores file contents: it hands out the scene registered
//! under the file stem, so an asset tree only needs placeholder model files.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use hashbrown::HashMap;
use model_import::{
    ForeignMaterial, ForeignMatrix, ForeignMesh, ForeignNode, ForeignScene, HeadlessDevice,
    ImportError, LoaderConfig, ModelLoader, SceneImporter, SkinClusterSource, SkinDeformer,
    FOREIGN_IDENTITY,
};
use tempfile::TempDir;

pub const DEFAULT_TEXTURE: &str = "white1x1.png";

/// Foreign matrix translating by (x, y, z)
pub fn translation(x: f64, y: f64, z: f64) -> ForeignMatrix {
    let mut m = FOREIGN_IDENTITY;
    m[3] = [x, y, z, 1.0];
    m
}

#[derive(Debug, Clone)]
pub struct ScriptedMaterial {
    pub name: String,
    pub ambient: Option<[f64; 3]>,
    pub diffuse: Option<[f64; 3]>,
    pub texture: Option<String>,
}

impl ScriptedMaterial {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ambient: None,
            diffuse: None,
            texture: None,
        }
    }

    pub fn with_diffuse(mut self, rgb: [f64; 3]) -> Self {
        self.diffuse = Some(rgb);
        self
    }

    pub fn with_ambient(mut self, rgb: [f64; 3]) -> Self {
        self.ambient = Some(rgb);
        self
    }

    pub fn with_texture(mut self, path: &str) -> Self {
        self.texture = Some(path.to_string());
        self
    }
}

impl ForeignMaterial for ScriptedMaterial {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn ambient(&self) -> Option<[f64; 3]> {
        self.ambient
    }

    fn diffuse(&self) -> Option<[f64; 3]> {
        self.diffuse
    }

    fn diffuse_texture_path(&self) -> Option<String> {
        self.texture.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedMesh {
    pub points: Vec<[f64; 3]>,
    pub normals: Option<Vec<[f64; 3]>>,
    pub uvs: Option<Vec<[f64; 2]>>,
    pub polygons: Vec<Vec<u32>>,
    pub global: Option<ForeignMatrix>,
    pub deformers: Vec<SkinDeformer>,
}

impl ScriptedMesh {
    /// Unit cube: 8 corners, 6 quads
    pub fn cube() -> Self {
        Self {
            points: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
                [1.0, 0.0, 1.0],
                [1.0, 1.0, 1.0],
                [0.0, 1.0, 1.0],
            ],
            polygons: vec![
                vec![0, 3, 2, 1],
                vec![4, 5, 6, 7],
                vec![0, 1, 5, 4],
                vec![2, 3, 7, 6],
                vec![1, 2, 6, 5],
                vec![0, 4, 7, 3],
            ],
            ..Default::default()
        }
    }

    /// Single quad in the XY plane
    pub fn quad() -> Self {
        Self {
            points: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            polygons: vec![vec![0, 1, 2, 3]],
            ..Default::default()
        }
    }

    pub fn with_normals(mut self) -> Self {
        self.normals = Some(vec![[0.0, 0.0, 1.0]; self.points.len()]);
        self
    }

    pub fn with_uvs(mut self) -> Self {
        self.uvs = Some(self.points.iter().map(|p| [p[0], p[1]]).collect());
        self
    }

    pub fn with_global(mut self, global: ForeignMatrix) -> Self {
        self.global = Some(global);
        self
    }

    pub fn with_deformer(mut self, clusters: Vec<SkinClusterSource>) -> Self {
        self.deformers.push(SkinDeformer { clusters });
        self
    }
}

impl ForeignMesh for ScriptedMesh {
    fn control_points(&self) -> Vec<[f64; 3]> {
        self.points.clone()
    }

    fn normals(&self) -> Option<Vec<[f64; 3]>> {
        self.normals.clone()
    }

    fn uvs(&self) -> Option<Vec<[f64; 2]>> {
        self.uvs.clone()
    }

    fn polygons(&self) -> Vec<Vec<u32>> {
        self.polygons.clone()
    }

    fn global_transform(&self) -> ForeignMatrix {
        self.global.unwrap_or(FOREIGN_IDENTITY)
    }

    fn skin_deformers(&self) -> Vec<SkinDeformer> {
        self.deformers.clone()
    }
}

/// Bone cluster with identity link transform
pub fn cluster(bone: &str, influences: &[(u32, f64)]) -> SkinClusterSource {
    SkinClusterSource {
        bone_name: bone.to_string(),
        link_transform: FOREIGN_IDENTITY,
        control_point_indices: influences.iter().map(|&(i, _)| i).collect(),
        weights: influences.iter().map(|&(_, w)| w).collect(),
    }
}

#[derive(Debug, Clone)]
pub struct ScriptedNode {
    pub name: String,
    pub local: ForeignMatrix,
    pub children: Vec<ScriptedNode>,
    pub mesh: Option<ScriptedMesh>,
    pub material: Option<ScriptedMaterial>,
}

impl ScriptedNode {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            local: FOREIGN_IDENTITY,
            children: Vec::new(),
            mesh: None,
            material: None,
        }
    }

    pub fn with_local(mut self, local: ForeignMatrix) -> Self {
        self.local = local;
        self
    }

    pub fn with_child(mut self, child: ScriptedNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_mesh(mut self, mesh: ScriptedMesh) -> Self {
        self.mesh = Some(mesh);
        self
    }

    pub fn with_material(mut self, material: ScriptedMaterial) -> Self {
        self.material = Some(material);
        self
    }
}

struct NodeView<'a>(&'a ScriptedNode);

impl ForeignNode for NodeView<'_> {
    fn name(&self) -> String {
        self.0.name.clone()
    }

    fn local_transform(&self) -> ForeignMatrix {
        self.0.local
    }

    fn children(&self) -> Vec<Box<dyn ForeignNode + '_>> {
        self.0
            .children
            .iter()
            .map(|child| Box::new(NodeView(child)) as Box<dyn ForeignNode + '_>)
            .collect()
    }

    fn mesh(&self) -> Option<Box<dyn ForeignMesh + '_>> {
        self.0
            .mesh
            .clone()
            .map(|mesh| Box::new(mesh) as Box<dyn ForeignMesh>)
    }

    fn material(&self) -> Option<Box<dyn ForeignMaterial + '_>> {
        self.0
            .material
            .clone()
            .map(|material| Box::new(material) as Box<dyn ForeignMaterial>)
    }
}

/// Scene with an optional root
#[derive(Debug, Clone)]
pub struct ScriptedScene {
    pub root: Option<ScriptedNode>,
}

impl ForeignScene for ScriptedScene {
    fn root(&self) -> Option<Box<dyn ForeignNode + '_>> {
        self.root
            .as_ref()
            .map(|root| Box::new(NodeView(root)) as Box<dyn ForeignNode + '_>)
    }
}

/// Importer serving scripted scenes by file stem
#[derive(Debug, Default)]
pub struct ScriptedImporter {
    scenes: HashMap<String, ScriptedScene>,
    pub opened: Vec<PathBuf>,
}

impl ScriptedImporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scene(mut self, name: &str, root: ScriptedNode) -> Self {
        self.scenes
            .insert(name.to_string(), ScriptedScene { root: Some(root) });
        self
    }

    pub fn with_empty_scene(mut self, name: &str) -> Self {
        self.scenes
            .insert(name.to_string(), ScriptedScene { root: None });
        self
    }
}

impl SceneImporter for ScriptedImporter {
    fn open_file(&mut self, path: &Path) -> Result<Box<dyn ForeignScene>, ImportError> {
        self.opened.push(path.to_path_buf());
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        match self.scenes.get(stem) {
            Some(scene) => Ok(Box::new(scene.clone())),
            None => Err(ImportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("no scripted scene for {:?}", path),
            ))),
        }
    }
}

/// Write a solid white RGBA PNG
pub fn write_png(path: &Path, width: u32, height: u32) {
    image::RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]))
        .save(path)
        .expect("Failed to write PNG");
}

/// Asset root with one directory per model, each holding a placeholder
/// `<name>.gltf` and the default texture
pub fn asset_tree(models: &[&str]) -> TempDir {
    let root = tempfile::tempdir().expect("Failed to create temp dir");
    for name in models {
        let dir = root.path().join(name);
        std::fs::create_dir_all(&dir).expect("Failed to create model dir");
        std::fs::write(dir.join(format!("{}.gltf", name)), b"{}").expect("Failed to write model");
        write_png(&dir.join(DEFAULT_TEXTURE), 1, 1);
    }
    root
}

/// Initialized loader over `asset_root`
pub fn loader(
    importer: ScriptedImporter,
    asset_root: &Path,
) -> ModelLoader<ScriptedImporter, HeadlessDevice> {
    let config = LoaderConfig::default().with_asset_root(asset_root);
    let mut loader = ModelLoader::new(importer, config);
    assert!(loader.initialize(HeadlessDevice::new()));
    loader
}
