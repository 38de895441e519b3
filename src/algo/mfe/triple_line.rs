//! Triple-line adjacency.
//!
//! Along a triple line every interior node has exactly two neighbours on the
//! same line. The table built here records them so that the line-length term
//! can be evaluated per node.

use crate::error::{MeshError, Result};
use crate::mesh::{Edge, NodeKind};

/// Two neighbour slots per node, filled only for triple-line nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TripleLineAdjacency {
    slots: Vec<[Option<usize>; 2]>,
}

impl TripleLineAdjacency {
    /// Build the table from a classified edge list.
    ///
    /// Every triple-line edge connects each of its endpoints whose node kind is
    /// a triple-line kind to the other endpoint. Quad points are never given
    /// neighbours.
    ///
    /// # Errors
    ///
    /// Returns [`MeshError::TripleLineOverflow`] when a node would receive a
    /// third neighbour, and index or length errors for inconsistent input.
    ///
    /// # Example
    ///
    /// ```
    /// use mfesmooth::algo::mfe::TripleLineAdjacency;
    /// use mfesmooth::mesh::{Edge, NodeKind};
    ///
    /// let kinds = vec![NodeKind::TRIPLE_LINE; 3];
    /// let edges = vec![Edge::triple_line(0, 1), Edge::triple_line(1, 2)];
    /// let adjacency = TripleLineAdjacency::build(3, &edges, &kinds).unwrap();
    ///
    /// assert_eq!(adjacency.neighbors(1), Some([0, 2]));
    /// assert_eq!(adjacency.neighbors(0), None);
    /// ```
    pub fn build(num_nodes: usize, edges: &[Edge], kinds: &[NodeKind]) -> Result<Self> {
        if kinds.len() != num_nodes {
            return Err(MeshError::NodeKindMismatch {
                expected: num_nodes,
                found: kinds.len(),
            });
        }

        let mut slots = vec![[None, None]; num_nodes];
        let mut triple_edges = 0usize;

        for (ei, edge) in edges.iter().enumerate() {
            if let Some(&vertex) = edge.verts.iter().find(|&&v| v >= num_nodes) {
                return Err(MeshError::InvalidEdgeIndex { edge: ei, vertex });
            }
            if !edge.kind.is_triple_line() {
                continue;
            }
            triple_edges += 1;

            let [a, b] = edge.verts;
            if kinds[a].is_triple_line() {
                assign(&mut slots, a, b)?;
            }
            if kinds[b].is_triple_line() {
                assign(&mut slots, b, a)?;
            }
        }

        log::debug!(
            "Triple-line adjacency: {} of {} edges on triple lines",
            triple_edges,
            edges.len()
        );

        Ok(Self { slots })
    }

    /// Number of nodes covered by the table.
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.slots.len()
    }

    /// Raw neighbour slots of a node.
    #[inline]
    pub fn neighbor_slots(&self, node: usize) -> [Option<usize>; 2] {
        self.slots[node]
    }

    /// Both neighbours of a node, if it has two.
    #[inline]
    pub fn neighbors(&self, node: usize) -> Option<[usize; 2]> {
        match self.slots[node] {
            [Some(a), Some(b)] => Some([a, b]),
            _ => None,
        }
    }

    /// Number of nodes with both neighbour slots filled.
    pub fn num_complete(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| matches!(s, [Some(_), Some(_)]))
            .count()
    }
}

fn assign(slots: &mut [[Option<usize>; 2]], node: usize, neighbor: usize) -> Result<()> {
    let slot = &mut slots[node];
    match *slot {
        [None, _] => slot[0] = Some(neighbor),
        [Some(_), None] => slot[1] = Some(neighbor),
        [Some(_), Some(_)] => return Err(MeshError::TripleLineOverflow { node, neighbor }),
    }
    Ok(())
}
