//! Shared model types for the engine
//!
//! This crate provides the engine-side model representation shared between:
//! - `model-import` (asset pipeline)
//! - the renderer, which consumes finished [`Model`]s
//!
//! # Modules
//!
//! - [`model`] - Model aggregate, node arena, materials, textures, skin clusters
//! - [`packing`] - GPU vertex/face layouts and vertex format flags
//! - [`formats`] - Binary model file header

pub mod formats;
pub mod model;
pub mod packing;

// Re-export the model aggregate and its parts
pub use model::{
    Aabb, Material, MaterialId, MeshRange, Model, NodeId, PixelFormat, SceneNode, SkinCluster,
    Texture, TextureHandle, TextureId,
};

// Re-export commonly used packing items
pub use packing::{
    FORMAT_NORMAL, FORMAT_SKINNED, FORMAT_UV, Face, MAX_BONE_INFLUENCES, Vertex, format_name,
};

pub use formats::ModelHeader;
