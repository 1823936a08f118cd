//! Matrix bridge
//!
//! Foreign matrices are row-major and multiply row vectors (`v * M`); glam
//! matrices are column-major and multiply column vectors (`M * v`). Row `i`
//! of the foreign matrix is therefore column `i` of the engine matrix, and the
//! sixteen elements keep their memory order. No axis is flipped.

use glam::Mat4;

use crate::scene::ForeignMatrix;

/// Convert a foreign matrix into the engine's native matrix
pub fn convert_matrix(src: &ForeignMatrix) -> Mat4 {
    let mut cols = [[0.0f32; 4]; 4];
    for (dst_col, src_row) in cols.iter_mut().zip(src) {
        for (dst, &src) in dst_col.iter_mut().zip(src_row) {
            *dst = src as f32;
        }
    }
    Mat4::from_cols_array_2d(&cols)
}

/// Inverse of [`convert_matrix`]
pub fn to_foreign(src: &Mat4) -> ForeignMatrix {
    src.to_cols_array_2d()
        .map(|col| col.map(|value| value as f64))
}
