//! Mesh construction utilities.
//!
//! This module builds [`SurfaceMesh`] values from the raw arrays a host
//! pipeline hands over, validating every index before the mesh is accepted.

use nalgebra::Point3;

use super::scalar::CoordScalar;
use super::surface::{Edge, NodeKind, SurfaceMesh};
use crate::error::{MeshError, Result};

/// Build a surface mesh from vertices and triangle faces.
///
/// Empty inputs are accepted here; the smoothing driver reports missing
/// vertices or triangles as setup errors. Faces that repeat a vertex index are
/// rejected, faces whose vertices merely coincide in space are not.
///
/// # Example
/// ```
/// use mfesmooth::mesh::{build_surface_mesh, SurfaceMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0f32, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: SurfaceMesh = build_surface_mesh(vertices, faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_surface_mesh<T: CoordScalar>(
    vertices: Vec<Point3<T>>,
    faces: Vec<[usize; 3]>,
) -> Result<SurfaceMesh<T>> {
    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    Ok(SurfaceMesh {
        vertices,
        faces,
        node_kinds: None,
        edges: None,
    })
}

impl<T: CoordScalar> SurfaceMesh<T> {
    /// Attach a per-vertex node classification.
    ///
    /// The array must contain exactly one entry per vertex.
    pub fn with_node_kinds(mut self, kinds: Vec<NodeKind>) -> Result<Self> {
        if kinds.len() != self.vertices.len() {
            return Err(MeshError::NodeKindMismatch {
                expected: self.vertices.len(),
                found: kinds.len(),
            });
        }
        self.node_kinds = Some(kinds);
        Ok(self)
    }

    /// Attach a classified edge list.
    pub fn with_edges(mut self, edges: Vec<Edge>) -> Result<Self> {
        for (ei, edge) in edges.iter().enumerate() {
            for &vi in &edge.verts {
                if vi >= self.vertices.len() {
                    return Err(MeshError::InvalidEdgeIndex { edge: ei, vertex: vi });
                }
            }
        }
        self.edges = Some(edges);
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> (Vec<Point3<f32>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        (vertices, vec![[0, 1, 2], [0, 2, 3]])
    }

    #[test]
    fn test_build_valid() {
        let (v, f) = square();
        let mesh = build_surface_mesh(v, f).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert!(mesh.node_kinds().is_none());
        assert!(mesh.edges().is_none());
    }

    #[test]
    fn test_build_empty_is_accepted() {
        let mesh = build_surface_mesh::<f32>(Vec::new(), Vec::new()).unwrap();
        assert_eq!(mesh.num_vertices(), 0);
    }

    #[test]
    fn test_invalid_index() {
        let (v, _) = square();
        let err = build_surface_mesh(v, vec![[0, 1, 9]]).unwrap_err();
        assert!(matches!(err, MeshError::InvalidVertexIndex { face: 0, vertex: 9 }));
    }

    #[test]
    fn test_duplicate_index() {
        let (v, _) = square();
        let err = build_surface_mesh(v, vec![[0, 1, 2], [3, 3, 1]]).unwrap_err();
        assert!(matches!(err, MeshError::DegenerateFace { face: 1 }));
    }

    #[test]
    fn test_coincident_positions_accepted() {
        let vertices = vec![
            Point3::new(0.0f32, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        assert!(build_surface_mesh(vertices, vec![[0, 1, 2]]).is_ok());
    }

    #[test]
    fn test_node_kind_length_checked() {
        let (v, f) = square();
        let mesh = build_surface_mesh(v, f).unwrap();
        let err = mesh.with_node_kinds(vec![NodeKind::DEFAULT; 3]).unwrap_err();
        assert!(matches!(err, MeshError::NodeKindMismatch { expected: 4, found: 3 }));
    }

    #[test]
    fn test_edge_indices_checked() {
        let (v, f) = square();
        let mesh = build_surface_mesh(v, f).unwrap();
        let err = mesh
            .with_edges(vec![Edge::triple_line(0, 1), Edge::triple_line(2, 4)])
            .unwrap_err();
        assert!(matches!(err, MeshError::InvalidEdgeIndex { edge: 1, vertex: 4 }));
    }
}
