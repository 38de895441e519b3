//! Indexed triangle surface mesh with node and edge classifications.

use nalgebra::Point3;

use super::scalar::CoordScalar;

/// Classification of a mesh node, supplied by the host pipeline.
///
/// The values follow the surface-meshing convention: `0` is an ordinary node,
/// `3` and `13` are triple-junction nodes, `4` is a quad point and values
/// above `10` mark nodes on the outer domain boundary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NodeKind(pub i8);

impl NodeKind {
    /// Ordinary (or unclassified) node.
    pub const ORDINARY: NodeKind = NodeKind(0);
    /// Default interior node on a two-grain boundary.
    pub const DEFAULT: NodeKind = NodeKind(2);
    /// Interior triple-junction node.
    pub const TRIPLE_LINE: NodeKind = NodeKind(3);
    /// Quad point.
    pub const QUAD_POINT: NodeKind = NodeKind(4);
    /// Triple-junction node on the domain surface.
    pub const SURFACE_TRIPLE_LINE: NodeKind = NodeKind(13);

    /// Whether the node lies on a triple line.
    #[inline]
    pub fn is_triple_line(self) -> bool {
        self == Self::TRIPLE_LINE || self == Self::SURFACE_TRIPLE_LINE
    }

    /// Whether the node is a quad point.
    #[inline]
    pub fn is_quad_point(self) -> bool {
        self == Self::QUAD_POINT
    }

    /// Whether the node carries a "special" (domain boundary) marker.
    #[inline]
    pub fn is_special(self) -> bool {
        self.0 > 10
    }
}

/// Classification of a mesh edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct EdgeKind(pub i8);

impl EdgeKind {
    /// Ordinary two-sided boundary edge.
    pub const ORDINARY: EdgeKind = EdgeKind(2);
    /// Triple-junction edge.
    pub const TRIPLE_LINE: EdgeKind = EdgeKind(3);

    /// Whether the edge lies on a triple line.
    #[inline]
    pub fn is_triple_line(self) -> bool {
        self == Self::TRIPLE_LINE
    }
}

/// A classified mesh edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// Endpoint vertex indices.
    pub verts: [usize; 2],
    /// Edge classification.
    pub kind: EdgeKind,
}

impl Edge {
    /// Create an edge between two vertices.
    pub fn new(v0: usize, v1: usize, kind: EdgeKind) -> Self {
        Self {
            verts: [v0, v1],
            kind,
        }
    }

    /// Create a triple-junction edge.
    pub fn triple_line(v0: usize, v1: usize) -> Self {
        Self::new(v0, v1, EdgeKind::TRIPLE_LINE)
    }
}

/// An indexed triangle mesh as handed over by a host pipeline.
///
/// Connectivity is fixed once the mesh is built; only vertex positions can be
/// changed afterwards. Positions are stored in the host's precision `T` and
/// converted to `f64` by [`positions_f64`](Self::positions_f64) before any
/// numerical work.
#[derive(Debug, Clone)]
pub struct SurfaceMesh<T: CoordScalar = f32> {
    pub(super) vertices: Vec<Point3<T>>,
    pub(super) faces: Vec<[usize; 3]>,
    pub(super) node_kinds: Option<Vec<NodeKind>>,
    pub(super) edges: Option<Vec<Edge>>,
}

impl<T: CoordScalar> Default for SurfaceMesh<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CoordScalar> SurfaceMesh<T> {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            node_kinds: None,
            edges: None,
        }
    }

    /// Number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of triangles.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Vertex positions in storage precision.
    #[inline]
    pub fn vertices(&self) -> &[Point3<T>] {
        &self.vertices
    }

    /// Triangle connectivity.
    #[inline]
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Per-vertex node classification, if supplied.
    #[inline]
    pub fn node_kinds(&self) -> Option<&[NodeKind]> {
        self.node_kinds.as_deref()
    }

    /// Classified edge list, if supplied.
    #[inline]
    pub fn edges(&self) -> Option<&[Edge]> {
        self.edges.as_deref()
    }

    /// Position of a vertex.
    #[inline]
    pub fn position(&self, v: usize) -> &Point3<T> {
        &self.vertices[v]
    }

    /// Copy all positions into double precision.
    pub fn positions_f64(&self) -> Vec<Point3<f64>> {
        self.vertices
            .iter()
            .map(|p| Point3::new(p.x.to_f64(), p.y.to_f64(), p.z.to_f64()))
            .collect()
    }

    /// Write double precision positions back into storage precision.
    ///
    /// # Panics
    ///
    /// Panics if `positions` does not have one entry per vertex.
    pub fn store_positions(&mut self, positions: &[Point3<f64>]) {
        assert_eq!(
            positions.len(),
            self.vertices.len(),
            "position count does not match vertex count"
        );
        for (dst, src) in self.vertices.iter_mut().zip(positions) {
            *dst = Point3::new(T::from_f64(src.x), T::from_f64(src.y), T::from_f64(src.z));
        }
    }

    /// Axis-aligned bounding box of the vertices, in double precision.
    ///
    /// Returns `None` for a mesh without vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        if self.vertices.is_empty() {
            return None;
        }
        let mut min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let mut max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in &self.vertices {
            let q = [p.x.to_f64(), p.y.to_f64(), p.z.to_f64()];
            for axis in 0..3 {
                min[axis] = min[axis].min(q[axis]);
                max[axis] = max[axis].max(q[axis]);
            }
        }
        Some((min, max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_kind_classes() {
        assert!(NodeKind::TRIPLE_LINE.is_triple_line());
        assert!(NodeKind::SURFACE_TRIPLE_LINE.is_triple_line());
        assert!(!NodeKind::QUAD_POINT.is_triple_line());
        assert!(NodeKind::QUAD_POINT.is_quad_point());
        assert!(NodeKind::SURFACE_TRIPLE_LINE.is_special());
        assert!(NodeKind(12).is_special());
        assert!(!NodeKind::DEFAULT.is_special());
        assert_eq!(NodeKind::default(), NodeKind::ORDINARY);
    }

    #[test]
    fn test_edge_kind() {
        assert!(Edge::triple_line(0, 1).kind.is_triple_line());
        assert!(!Edge::new(0, 1, EdgeKind::ORDINARY).kind.is_triple_line());
    }

    #[test]
    fn test_precision_round_trip() {
        let mut mesh: SurfaceMesh<f32> = SurfaceMesh::new();
        mesh.vertices = vec![Point3::new(0.1, 0.2, 0.3), Point3::new(-1.5, 2.0, 7.25)];
        let original = mesh.vertices.clone();

        let wide = mesh.positions_f64();
        assert_eq!(wide[0].x, 0.1f32 as f64);
        mesh.store_positions(&wide);
        assert_eq!(mesh.vertices, original);
    }

    #[test]
    fn test_bounding_box() {
        let mut mesh: SurfaceMesh<f64> = SurfaceMesh::new();
        assert!(mesh.bounding_box().is_none());
        mesh.vertices = vec![
            Point3::new(-1.0, 2.0, 0.5),
            Point3::new(3.0, -2.0, 0.0),
            Point3::new(0.0, 0.0, 4.0),
        ];
        let (min, max) = mesh.bounding_box().unwrap();
        assert_eq!(min, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(max, Point3::new(3.0, 2.0, 4.0));
    }
}
