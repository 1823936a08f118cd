//! Mesh Geometry Parser
//!
//! Appends one foreign mesh to the model's flattened buffers. Control points
//! become vertices one-to-one; polygons are fan-triangulated into faces whose
//! indices are rebased onto the mesh's first vertex.

use glam::Vec3;
use model_common::{Face, MeshRange, Model, NodeId, Vertex, FORMAT_NORMAL, FORMAT_UV};

use crate::scene::{ForeignMesh, ForeignNode};
use crate::skin;

/// Parse the node's mesh (if any) into the model and attach its range
///
/// Vertices are built first, then faces, then skin weights. A node without a
/// mesh is left alone.
pub fn parse_mesh(model: &mut Model, node_id: NodeId, node: &dyn ForeignNode) -> Option<MeshRange> {
    let mesh = node.mesh()?;

    let mut range = parse_mesh_vertices(model, mesh.as_ref());
    parse_mesh_faces(model, mesh.as_ref(), &mut range);
    skin::parse_skin(model, mesh.as_ref(), &range);

    if range.is_empty() {
        tracing::debug!("Node '{}' has an empty mesh", node.name());
    }

    if let Some(scene_node) = model.node_mut(node_id) {
        scene_node.mesh = Some(range);
    }
    Some(range)
}

/// Append one vertex per control point
///
/// Missing normal/UV layers (or layers shorter than the control point list)
/// are zero-filled. Returns a range with no faces yet.
pub fn parse_mesh_vertices(model: &mut Model, mesh: &dyn ForeignMesh) -> MeshRange {
    let positions = mesh.control_points();
    let normals = mesh.normals();
    let uvs = mesh.uvs();

    let first_vertex = model.vertices.len() as u32;
    let vertex_count = positions.len();

    if let Some(normals) = &normals {
        model.format |= FORMAT_NORMAL;
        if normals.len() < vertex_count {
            tracing::warn!(
                "Normal layer has {} entries for {} control points, zero-filling",
                normals.len(),
                vertex_count
            );
        }
    } else if vertex_count > 0 {
        tracing::debug!("Mesh has no normal layer");
    }

    if let Some(uvs) = &uvs {
        model.format |= FORMAT_UV;
        if uvs.len() < vertex_count {
            tracing::warn!(
                "UV layer has {} entries for {} control points, zero-filling",
                uvs.len(),
                vertex_count
            );
        }
    } else if vertex_count > 0 {
        tracing::debug!("Mesh has no UV layer");
    }

    model.vertices.reserve(vertex_count);
    for (i, p) in positions.iter().enumerate() {
        let position = [p[0] as f32, p[1] as f32, p[2] as f32];
        let normal = normals
            .as_ref()
            .and_then(|layer| layer.get(i))
            .map_or([0.0; 3], |n| [n[0] as f32, n[1] as f32, n[2] as f32]);
        let uv = uvs
            .as_ref()
            .and_then(|layer| layer.get(i))
            .map_or([0.0; 2], |t| [t[0] as f32, t[1] as f32]);

        model.bounds.extend(Vec3::from_array(position));
        model.vertices.push(Vertex::new(position, normal, uv));
    }

    MeshRange {
        first_vertex,
        vertex_count: vertex_count as u32,
        first_face: model.faces.len() as u32,
        face_count: 0,
    }
}

/// Fan-triangulate every polygon against the vertices in `range`
///
/// A polygon with k corners yields k-2 faces sharing its first corner.
/// Degenerate polygons and polygons referencing missing control points are
/// skipped.
pub fn parse_mesh_faces(model: &mut Model, mesh: &dyn ForeignMesh, range: &mut MeshRange) {
    let base = range.first_vertex;
    let vertex_count = range.vertex_count;
    range.first_face = model.faces.len() as u32;

    let mut skipped = 0usize;
    for (polygon_index, polygon) in mesh.polygons().iter().enumerate() {
        if polygon.len() < 3 {
            tracing::warn!(
                "Polygon {} has {} vertices, skipping",
                polygon_index,
                polygon.len()
            );
            skipped += 1;
            continue;
        }
        if let Some(&bad) = polygon.iter().find(|&&index| index >= vertex_count) {
            tracing::warn!(
                "Polygon {} references control point {} (mesh has {}), skipping",
                polygon_index,
                bad,
                vertex_count
            );
            skipped += 1;
            continue;
        }

        let anchor = base + polygon[0];
        for pair in polygon[1..].windows(2) {
            model.faces.push(Face::new(anchor, base + pair[0], base + pair[1]));
        }
    }

    range.face_count = model.faces.len() as u32 - range.first_face;
    if skipped > 0 {
        tracing::warn!("Skipped {} malformed polygons", skipped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ForeignMatrix, SkinDeformer, FOREIGN_IDENTITY};

    #[derive(Default)]
    struct TestMesh {
        points: Vec<[f64; 3]>,
        normals: Option<Vec<[f64; 3]>>,
        uvs: Option<Vec<[f64; 2]>>,
        polygons: Vec<Vec<u32>>,
    }

    impl ForeignMesh for TestMesh {
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
            FOREIGN_IDENTITY
        }
        fn skin_deformers(&self) -> Vec<SkinDeformer> {
            Vec::new()
        }
    }

    fn quad() -> TestMesh {
        TestMesh {
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

    fn parse(model: &mut Model, mesh: &TestMesh) -> MeshRange {
        let mut range = parse_mesh_vertices(model, mesh);
        parse_mesh_faces(model, mesh, &mut range);
        range
    }

    #[test]
    fn test_quad_fan_shares_first_vertex() {
        let mut model = Model::new("quad");
        let range = parse(&mut model, &quad());

        assert_eq!(range.face_count, 2);
        assert_eq!(model.faces[0].indices, [0, 1, 2]);
        assert_eq!(model.faces[1].indices, [0, 2, 3]);
    }

    #[test]
    fn test_ngon_yields_k_minus_two_faces() {
        let mut mesh = quad();
        mesh.points.push([0.5, 2.0, 0.0]);
        mesh.points.push([-0.5, 1.5, 0.0]);
        mesh.polygons = vec![vec![0, 1, 2, 3, 4, 5]];

        let mut model = Model::new("hex");
        let range = parse(&mut model, &mesh);
        assert_eq!(range.face_count, 4);
        assert!(model.faces.iter().all(|f| f.indices[0] == 0));
    }

    #[test]
    fn test_missing_layers_zero_filled() {
        let mut model = Model::new("bare");
        parse(&mut model, &quad());

        assert_eq!(model.vertices.len(), 4);
        assert!(model.vertices.iter().all(|v| v.normal == [0.0; 3] && v.uv == [0.0; 2]));
        assert_eq!(model.format & (FORMAT_NORMAL | FORMAT_UV), 0);
    }

    #[test]
    fn test_short_layers_zero_filled() {
        let mut mesh = quad();
        mesh.normals = Some(vec![[0.0, 0.0, 1.0]]);
        mesh.uvs = Some(vec![[0.5, 0.5], [1.0, 0.0]]);

        let mut model = Model::new("short");
        parse(&mut model, &mesh);

        assert_eq!(model.vertices[0].normal, [0.0, 0.0, 1.0]);
        assert_eq!(model.vertices[3].normal, [0.0; 3]);
        assert_eq!(model.vertices[1].uv, [1.0, 0.0]);
        assert_eq!(model.vertices[2].uv, [0.0; 2]);
        assert_ne!(model.format & FORMAT_NORMAL, 0);
        assert_ne!(model.format & FORMAT_UV, 0);
    }

    #[test]
    fn test_malformed_polygons_skipped() {
        let mut mesh = quad();
        mesh.polygons = vec![vec![0, 1], vec![0, 1, 9], vec![0, 1, 2]];

        let mut model = Model::new("bad");
        let range = parse(&mut model, &mesh);
        assert_eq!(range.face_count, 1);
        assert!(model.faces.iter().all(|f| f.in_bounds(model.vertices.len())));
    }

    #[test]
    fn test_second_mesh_is_rebased() {
        let mut model = Model::new("two");
        parse(&mut model, &quad());
        let second = parse(&mut model, &quad());

        assert_eq!(second.first_vertex, 4);
        assert_eq!(second.first_face, 2);
        assert_eq!(model.faces[second.first_face as usize].indices, [4, 5, 6]);
        assert!(model.faces.iter().all(|f| f.in_bounds(model.vertices.len())));
    }

    #[test]
    fn test_empty_mesh_contributes_nothing() {
        let mut model = Model::new("empty");
        let range = parse(&mut model, &TestMesh::default());
        assert!(range.is_empty());
        assert_eq!(range.face_count, 0);
        assert!(model.bounds.is_empty());
    }

    #[test]
    fn test_bounds_cover_vertices() {
        let mut model = Model::new("bounds");
        parse(&mut model, &quad());
        assert_eq!(model.bounds.min, Vec3::ZERO);
        assert_eq!(model.bounds.max, Vec3::new(1.0, 1.0, 0.0));
    }
}
