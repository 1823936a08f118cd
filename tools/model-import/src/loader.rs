//! Node Hierarchy Walker and loader context
//!
//! [`ModelLoader`] owns the scene importer and, once initialized, the graphics
//! device. Each load builds a fresh [`Model`] and only hands it out when the
//! whole walk succeeded.

use std::path::PathBuf;

use model_common::{format_name, Model, NodeId, SceneNode};

use crate::config::LoaderConfig;
use crate::device::GraphicsDevice;
use crate::error::LoadError;
use crate::material::parse_material;
use crate::matrix::convert_matrix;
use crate::mesh::parse_mesh;
use crate::scene::{ForeignNode, SceneImporter};
use crate::texture::TextureResolver;

/// Loads models by name from the configured asset root
///
/// Not thread-safe; use one loader per thread.
#[derive(Debug)]
pub struct ModelLoader<I, D> {
    importer: I,
    config: LoaderConfig,
    device: Option<D>,
}

impl<I: SceneImporter, D: GraphicsDevice> ModelLoader<I, D> {
    pub fn new(importer: I, config: LoaderConfig) -> Self {
        Self {
            importer,
            config,
            device: None,
        }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn importer(&self) -> &I {
        &self.importer
    }

    pub fn device(&self) -> Option<&D> {
        self.device.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.device.is_some()
    }

    /// Bind the graphics device
    ///
    /// Returns false (and drops `device`) if a device is already bound.
    pub fn initialize(&mut self, device: D) -> bool {
        if self.device.is_some() {
            tracing::warn!("Model loader already initialized");
            return false;
        }
        self.device = Some(device);
        tracing::debug!("Model loader initialized, asset root {:?}", self.config.asset_root);
        true
    }

    /// Release the graphics device
    pub fn finalize(&mut self) -> Option<D> {
        let device = self.device.take();
        if device.is_some() {
            tracing::debug!("Model loader finalized");
        }
        device
    }

    /// Path of the model file for `name`: `<asset_root>/<name>/<name>.<ext>`
    ///
    /// The configured extensions are probed in order.
    pub fn model_path(&self, name: &str) -> Result<PathBuf, LoadError> {
        let dir = self.config.model_dir(name);
        self.config
            .model_extensions
            .iter()
            .map(|ext| dir.join(format!("{}.{}", name, ext)))
            .find(|path| path.is_file())
            .ok_or_else(|| LoadError::ModelNotFound {
                name: name.to_string(),
                dir,
            })
    }

    /// Load a model by name into a new [`Model`]
    pub fn load_model(&mut self, name: &str) -> Result<Model, LoadError> {
        if !self.is_initialized() {
            return Err(LoadError::NotInitialized);
        }
        let path = self.model_path(name)?;
        let dir = self.config.model_dir(name);

        tracing::info!("Loading model '{}' from {:?}", name, path);

        let scene = self
            .importer
            .open_file(&path)
            .map_err(|source| LoadError::Import {
                path: path.clone(),
                source,
            })?;
        let root = scene
            .root()
            .ok_or_else(|| LoadError::MissingRoot { path: path.clone() })?;

        let device = self.device.as_mut().ok_or(LoadError::NotInitialized)?;
        let mut model = Model::new(name);
        let mut resolver = TextureResolver::new(dir, self.config.default_texture.as_str());
        parse_node_recursive(&mut model, root.as_ref(), None, &mut resolver, device);

        tracing::info!(
            "Loaded '{}': {} nodes, {} vertices, {} faces, {} materials, {} textures, {} clusters ({})",
            model.name,
            model.nodes.len(),
            model.vertex_count(),
            model.face_count(),
            model.materials.len(),
            model.textures.len(),
            model.skin_clusters.len(),
            format_name(model.format)
        );

        Ok(model)
    }

    /// Load a model by name into `out`
    ///
    /// `out` is replaced only when the load succeeds; on error it keeps its
    /// previous contents.
    pub fn load_model_from_file(&mut self, out: &mut Model, name: &str) -> Result<(), LoadError> {
        match self.load_model(name) {
            Ok(model) => {
                *out = model;
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to load model '{}': {}", name, e);
                Err(e)
            }
        }
    }
}

/// Mirror `node` and its subtree into the model's node arena
///
/// Children are visited depth-first in source order. Nodes carrying a mesh
/// also get their geometry, skin and material parsed. Returns the id of the
/// node created for `node`.
pub fn parse_node_recursive<D: GraphicsDevice + ?Sized>(
    model: &mut Model,
    node: &dyn ForeignNode,
    parent: Option<NodeId>,
    resolver: &mut TextureResolver,
    device: &mut D,
) -> NodeId {
    let local = convert_matrix(&node.local_transform());
    let id = model.add_node(SceneNode::new(node.name(), local), parent);

    if parse_mesh(model, id, node).is_some() {
        parse_material(model, id, node, resolver, device);
    }

    for child in node.children() {
        parse_node_recursive(model, child.as_ref(), Some(id), resolver, device);
    }

    id
}
