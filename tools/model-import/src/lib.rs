//! model-import library
//!
//! Converts foreign scene graphs into engine [`Model`]s. The pipeline reads
//! source scenes through the capability traits in [`scene`] and allocates
//! textures through [`GraphicsDevice`], so both ends can be swapped out.
//!
//! A load runs leaf-first through these stages:
//!
//! - [`matrix`] - foreign transforms to engine matrices
//! - [`texture`] - texture path resolution and upload
//! - [`material`] - node materials
//! - [`mesh`] - vertices and fan-triangulated faces
//! - [`skin`] - bone influences and inverse bind poses
//! - [`loader`] - hierarchy walk and the [`ModelLoader`] context

pub mod config;
pub mod device;
pub mod error;
pub mod formats;
pub mod loader;
pub mod material;
pub mod matrix;
pub mod mesh;
pub mod scene;
pub mod skin;
pub mod texture;

pub use model_common::Model;

pub use config::LoaderConfig;
pub use device::{GraphicsDevice, HeadlessDevice};
pub use error::{ConfigError, ImportError, LoadError, TextureError};
pub use loader::{parse_node_recursive, ModelLoader};
pub use matrix::convert_matrix;
pub use scene::{
    ForeignMaterial, ForeignMatrix, ForeignMesh, ForeignNode, ForeignScene, GltfImporter,
    SceneImporter, SkinClusterSource, SkinDeformer, FOREIGN_IDENTITY,
};
pub use texture::{TexturePath, TextureResolver};
