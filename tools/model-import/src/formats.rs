//! Binary model export
//!
//! Re-exports the file header from model-common and writes whole models.

pub use model_common::formats::*;

use anyhow::{Context, Result};
use std::io::Write;

use model_common::Model;

/// Write a complete model file
///
/// Layout: [`ModelHeader`], vertex buffer, index buffer, then each skin
/// cluster as a u16 name length, the UTF-8 name and the inverse bind pose
/// (16 × f32, column-major).
pub fn write_model<W: Write>(w: &mut W, model: &Model) -> Result<()> {
    let header = ModelHeader::new(
        model.vertex_count() as u32,
        model.face_count() as u32,
        model.skin_clusters.len() as u32,
        model.format,
    );
    w.write_all(&header.to_bytes())?;
    w.write_all(model.vertex_bytes())?;
    w.write_all(model.index_bytes())?;

    for cluster in &model.skin_clusters {
        let name = cluster.bone_name.as_bytes();
        let name_len = u16::try_from(name.len())
            .with_context(|| format!("Bone name too long: {}", cluster.bone_name))?;
        w.write_all(&name_len.to_le_bytes())?;
        w.write_all(name)?;
        for value in cluster.inverse_bind_pose.to_cols_array() {
            w.write_all(&value.to_le_bytes())?;
        }
    }

    Ok(())
}
