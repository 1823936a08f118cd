//! GPU vertex and face layouts
//!
//! The import pipeline writes [`Vertex`] and [`Face`] values straight into the
//! model's flattened buffers, and the renderer uploads them unchanged via
//! [`bytemuck`].
//!
//! Vertex layout (64 bytes, tightly packed):
//! ```text
//! 0x00: position     f32x3
//! 0x0C: normal       f32x3
//! 0x18: uv           f32x2
//! 0x20: bone_indices u32x4
//! 0x30: bone_weights f32x4
//! ```

use bytemuck::{Pod, Zeroable};

// ============================================================================
// Vertex Format Constants
// ============================================================================

/// Vertex format flag: at least one mesh supplied UV coordinates
pub const FORMAT_UV: u8 = 1;
/// Vertex format flag: at least one mesh supplied normals
pub const FORMAT_NORMAL: u8 = 2;
/// Vertex format flag: bone indices/weights are meaningful (model is skinned)
pub const FORMAT_SKINNED: u8 = 4;

/// Maximum number of bone influences stored per vertex
pub const MAX_BONE_INFLUENCES: usize = 4;

/// Human readable name of a format flag set (e.g. "POS_UV_NORMAL")
pub fn format_name(format: u8) -> String {
    let mut name = String::from("POS");
    if format & FORMAT_UV != 0 {
        name.push_str("_UV");
    }
    if format & FORMAT_NORMAL != 0 {
        name.push_str("_NORMAL");
    }
    if format & FORMAT_SKINNED != 0 {
        name.push_str("_SKINNED");
    }
    name
}

// ============================================================================
// Vertex
// ============================================================================

/// One entry of the model's flattened vertex buffer
///
/// Bone weights either sum to 1.0 or are all zero (rigid vertex).
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    pub bone_indices: [u32; MAX_BONE_INFLUENCES],
    pub bone_weights: [f32; MAX_BONE_INFLUENCES],
}

impl Vertex {
    /// Size of one vertex in bytes
    pub const STRIDE: usize = std::mem::size_of::<Self>();

    /// Rigid vertex with the given attributes
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
            ..Self::default()
        }
    }

    /// Sum of all bone weights
    pub fn weight_sum(&self) -> f32 {
        self.bone_weights.iter().sum()
    }

    /// Number of bones with a non-zero weight
    pub fn influence_count(&self) -> usize {
        self.bone_weights.iter().filter(|&&w| w != 0.0).count()
    }

    /// True if no bone influences this vertex
    pub fn is_rigid(&self) -> bool {
        self.influence_count() == 0
    }
}

// ============================================================================
// Face
// ============================================================================

/// Triangle referencing three entries of the model's vertex buffer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
#[repr(C)]
pub struct Face {
    pub indices: [u32; 3],
}

impl Face {
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self { indices: [a, b, c] }
    }

    /// True if every index is below `vertex_count`
    pub fn in_bounds(&self, vertex_count: usize) -> bool {
        self.indices.iter().all(|&i| (i as usize) < vertex_count)
    }
}
