//! Skin Parser
//!
//! Bone index stored on a vertex is the position of the bone's cluster in
//! [`Model::skin_clusters`]. Each vertex keeps at most
//! [`MAX_BONE_INFLUENCES`] influences; once full, a new influence replaces the
//! weakest one only if it is strictly heavier.

use glam::Mat4;
use model_common::{MeshRange, Model, SkinCluster, FORMAT_SKINNED, MAX_BONE_INFLUENCES};

use crate::matrix::convert_matrix;
use crate::scene::ForeignMesh;

/// Determinant below which a link transform is treated as non-invertible
const SINGULAR_EPSILON: f32 = 1e-12;

/// Bounded set of bone influences for one vertex
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Influences {
    bones: [u32; MAX_BONE_INFLUENCES],
    weights: [f32; MAX_BONE_INFLUENCES],
    len: usize,
}

impl Influences {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f32)> + '_ {
        self.bones[..self.len]
            .iter()
            .copied()
            .zip(self.weights[..self.len].iter().copied())
    }

    pub fn total_weight(&self) -> f32 {
        self.weights[..self.len].iter().sum()
    }

    /// Add an influence, returning whether it was kept
    ///
    /// Non-positive, infinite and NaN weights are ignored. A bone already
    /// present has the weight added to its existing influence, saturating at
    /// `f32::MAX`. When full, the weakest
    /// influence is evicted only by a strictly larger weight; ties keep the
    /// existing influence.
    pub fn insert(&mut self, bone: u32, weight: f32) -> bool {
        if !(weight > 0.0) || !weight.is_finite() {
            return false;
        }

        if let Some(slot) = self.bones[..self.len].iter().position(|&b| b == bone) {
            self.weights[slot] = (self.weights[slot] + weight).min(f32::MAX);
            return true;
        }

        if self.len < MAX_BONE_INFLUENCES {
            self.bones[self.len] = bone;
            self.weights[self.len] = weight;
            self.len += 1;
            return true;
        }

        let (weakest, &min_weight) = self
            .weights
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .unwrap_or((0, &0.0));
        if weight > min_weight {
            self.bones[weakest] = bone;
            self.weights[weakest] = weight;
            true
        } else {
            false
        }
    }

    /// Bone indices and weights scaled to sum to 1, or `None` if rigid
    ///
    /// Unused slots are zero.
    pub fn normalized(&self) -> Option<([u32; MAX_BONE_INFLUENCES], [f32; MAX_BONE_INFLUENCES])> {
        // Summed in f64 so several weights near f32::MAX stay finite
        let total: f64 = self.weights[..self.len].iter().map(|&w| f64::from(w)).sum();
        if !(total > 0.0) || !total.is_finite() {
            return None;
        }

        let mut bones = [0u32; MAX_BONE_INFLUENCES];
        let mut weights = [0f32; MAX_BONE_INFLUENCES];
        for (i, (bone, weight)) in self.iter().enumerate() {
            bones[i] = bone;
            weights[i] = (f64::from(weight) / total) as f32;
        }
        Some((bones, weights))
    }
}

/// Inverse bind pose of a bone: mesh space to bone space at bind time
///
/// Falls back to the mesh transform alone when the link is not invertible.
pub fn inverse_bind_pose(link: Mat4, mesh_global: Mat4, bone_name: &str) -> Mat4 {
    if link.determinant().abs() <= SINGULAR_EPSILON {
        tracing::warn!("Bone '{}' has a singular link transform", bone_name);
        return mesh_global;
    }
    link.inverse() * mesh_global
}

/// Read every skin deformer of `mesh` and bind the vertices in `range`
///
/// Appends one [`SkinCluster`] per deformer cluster. Vertex weights are
/// normalized once all clusters are in; vertices no cluster reaches stay
/// rigid. Returns the number of clusters added.
pub fn parse_skin(model: &mut Model, mesh: &dyn ForeignMesh, range: &MeshRange) -> usize {
    let deformers = mesh.skin_deformers();
    if deformers.is_empty() {
        return 0;
    }

    let mesh_global = convert_matrix(&mesh.global_transform());
    let vertex_count = range.vertex_count as usize;
    let first_cluster = model.skin_clusters.len();
    let mut influences = vec![Influences::default(); vertex_count];
    let mut dropped = 0usize;

    for deformer in &deformers {
        for cluster in &deformer.clusters {
            let bone = model.skin_clusters.len() as u32;

            if cluster.control_point_indices.len() != cluster.weights.len() {
                tracing::warn!(
                    "Bone '{}' has {} indices but {} weights",
                    cluster.bone_name,
                    cluster.control_point_indices.len(),
                    cluster.weights.len()
                );
            }

            let mut out_of_range = 0usize;
            for (&control_point, &weight) in cluster
                .control_point_indices
                .iter()
                .zip(cluster.weights.iter())
            {
                match influences.get_mut(control_point as usize) {
                    Some(slot) => {
                        // Saturate at f32::MAX; NaN passes through and is ignored
                        let clamped = weight.clamp(0.0, f64::from(f32::MAX)) as f32;
                        if !slot.insert(bone, clamped) && weight > 0.0 {
                            dropped += 1;
                        }
                    }
                    None => out_of_range += 1,
                }
            }
            if out_of_range > 0 {
                tracing::warn!(
                    "Bone '{}' references {} control points outside the mesh",
                    cluster.bone_name,
                    out_of_range
                );
            }

            let link = convert_matrix(&cluster.link_transform);
            model.skin_clusters.push(SkinCluster {
                bone_name: cluster.bone_name.clone(),
                inverse_bind_pose: inverse_bind_pose(link, mesh_global, &cluster.bone_name),
                influences: Vec::new(),
            });
        }
    }

    let mut rigid = 0usize;
    for (i, vertex_influences) in influences.iter().enumerate() {
        let vertex_index = range.first_vertex + i as u32;
        let Some((bones, weights)) = vertex_influences.normalized() else {
            rigid += 1;
            continue;
        };

        let vertex = &mut model.vertices[vertex_index as usize];
        vertex.bone_indices = bones;
        vertex.bone_weights = weights;

        for (&bone, &weight) in bones.iter().zip(&weights).take(vertex_influences.len()) {
            if let Some(cluster) = model.skin_clusters.get_mut(bone as usize) {
                cluster.influences.push((vertex_index, weight));
            }
        }
    }

    let added = model.skin_clusters.len() - first_cluster;
    if added > 0 {
        model.format |= FORMAT_SKINNED;
    }
    if dropped > 0 {
        tracing::debug!(
            "Dropped {} influences beyond {} per vertex",
            dropped,
            MAX_BONE_INFLUENCES
        );
    }
    if rigid > 0 {
        tracing::debug!("{} of {} vertices have no skin influence", rigid, vertex_count);
    }

    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_insert_fills_then_evicts_weakest() {
        let mut influences = Influences::default();
        for (bone, weight) in [(0, 0.4), (1, 0.1), (2, 0.3), (3, 0.2)] {
            assert!(influences.insert(bone, weight));
        }
        assert_eq!(influences.len(), MAX_BONE_INFLUENCES);

        assert!(influences.insert(4, 0.25));
        let bones: Vec<u32> = influences.iter().map(|(b, _)| b).collect();
        assert!(!bones.contains(&1));
        assert!(bones.contains(&4));
    }

    #[test]
    fn test_insert_drops_lighter_and_ties() {
        let mut influences = Influences::default();
        for bone in 0..4 {
            influences.insert(bone, 0.25);
        }
        assert!(!influences.insert(9, 0.1));
        assert!(!influences.insert(9, 0.25));
        assert!(influences.iter().all(|(b, _)| b < 4));
    }

    #[test]
    fn test_insert_ignores_non_positive() {
        let mut influences = Influences::default();
        assert!(!influences.insert(0, 0.0));
        assert!(!influences.insert(0, -1.0));
        assert!(!influences.insert(0, f32::NAN));
        assert!(influences.is_empty());
    }

    #[test]
    fn test_insert_accumulates_same_bone() {
        let mut influences = Influences::default();
        influences.insert(7, 0.25);
        influences.insert(7, 0.5);
        assert_eq!(influences.len(), 1);
        assert_eq!(influences.total_weight(), 0.75);
    }

    #[test]
    fn test_normalized_sums_to_one() {
        let mut influences = Influences::default();
        influences.insert(0, 2.0);
        influences.insert(1, 6.0);
        let (bones, weights) = influences.normalized().unwrap();
        assert_eq!(bones, [0, 1, 0, 0]);
        assert!((weights.iter().sum::<f32>() - 1.0).abs() < 1e-6);
        assert!((weights[1] - 0.75).abs() < 1e-6);
        assert_eq!(weights[2], 0.0);
    }

    #[test]
    fn test_weights_at_f32_limit_stay_bound() {
        let mut influences = Influences::default();
        assert!(influences.insert(0, f32::MAX));
        assert!(influences.insert(1, f32::MAX));
        assert!(influences.insert(1, f32::MAX));
        assert!(!influences.insert(2, f32::INFINITY));

        let (bones, weights) = influences.normalized().unwrap();
        assert_eq!(&bones[..2], &[0, 1]);
        assert!((weights[0] - 0.5).abs() < 1e-6);
        assert!((weights[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_normalized_empty_is_rigid() {
        assert!(Influences::default().normalized().is_none());
    }

    #[test]
    fn test_inverse_bind_pose_undoes_link() {
        let link = Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0));
        let mesh_global = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let inverse = inverse_bind_pose(link, mesh_global, "bone");

        let p = inverse.transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(1.0, -2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_singular_link_falls_back() {
        let mesh_global = Mat4::from_translation(Vec3::X);
        assert_eq!(
            inverse_bind_pose(Mat4::ZERO, mesh_global, "bone"),
            mesh_global
        );
    }
}
