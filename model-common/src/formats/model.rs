//! Exported model binary format (.ncmodel)
//!
//! GPU-ready model with the flattened vertex and index buffers followed by the
//! skin clusters. POD format - no magic bytes, little-endian throughout.
//!
//! # Layout
//! ```text
//! 0x00: vertex_count u32
//! 0x04: face_count u32
//! 0x08: cluster_count u32
//! 0x0C: format u8 (vertex format flags)
//! 0x0D: padding (3 bytes)
//! 0x10: vertex_data (vertex_count * 64 bytes)
//! var:  index_data (face_count * 3 * 4 bytes)
//! var:  clusters, each:
//!         name_len u16, name (UTF-8),
//!         inverse_bind_pose (16 × f32, column-major)
//! ```

/// File extension for exported models
pub const MODEL_EXT: &str = "ncmodel";

/// Size of one serialized inverse bind pose (16 × f32)
pub const INVERSE_BIND_POSE_SIZE: usize = 64;

/// Exported model header (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ModelHeader {
    pub vertex_count: u32,
    pub face_count: u32,
    pub cluster_count: u32,
    pub format: u8,
    pub _padding: [u8; 3],
}

impl ModelHeader {
    pub const SIZE: usize = 16;

    pub fn new(vertex_count: u32, face_count: u32, cluster_count: u32, format: u8) -> Self {
        Self {
            vertex_count,
            face_count,
            cluster_count,
            format,
            _padding: [0; 3],
        }
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.vertex_count.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.face_count.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.cluster_count.to_le_bytes());
        bytes[12] = self.format;
        // padding bytes stay 0
        bytes
    }

    /// Read header from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            vertex_count: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            face_count: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            cluster_count: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
            format: bytes[12],
            _padding: [0; 3],
        })
    }

    /// Byte length of the vertex and index sections that follow the header
    pub fn buffer_size(&self) -> usize {
        self.vertex_count as usize * crate::Vertex::STRIDE + self.face_count as usize * 12
    }
}
