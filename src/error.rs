//! Error types for mfesmooth.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while preparing or smoothing a surface mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no vertices.
    #[error("surface mesh is missing nodes")]
    MissingVertices,

    /// The mesh has no triangles.
    #[error("surface mesh is missing triangles")]
    MissingFaces,

    /// A per-vertex node-kind array is required but was not supplied.
    #[error("{feature} requires a node-kind array")]
    MissingNodeKinds {
        /// The option that needs the array.
        feature: &'static str,
    },

    /// An edge list is required but was not supplied.
    #[error("{feature} requires an edge array")]
    MissingEdges {
        /// The option that needs the array.
        feature: &'static str,
    },

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// An edge references an invalid vertex index.
    #[error("edge {edge} references invalid vertex index {vertex}")]
    InvalidEdgeIndex {
        /// The edge index.
        edge: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices.
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// The node-kind array does not have one entry per vertex.
    #[error("node-kind array has {found} entries but the mesh has {expected} vertices")]
    NodeKindMismatch {
        /// Number of vertices.
        expected: usize,
        /// Number of node kinds supplied.
        found: usize,
    },

    /// A triple-line node was offered a third neighbour.
    #[error("triple-line node {node} already has two neighbours, cannot add {neighbor}")]
    TripleLineOverflow {
        /// The over-connected node.
        node: usize,
        /// The neighbour that could not be assigned.
        neighbor: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Negative status code reported to a host pipeline.
    ///
    /// Setup errors use the codes of the surface-meshing filter family,
    /// input-consistency errors use `-666`, everything else `-1`.
    pub fn code(&self) -> i32 {
        match self {
            MeshError::MissingVertices => -384,
            MeshError::MissingFaces => -385,
            MeshError::MissingEdges { .. } => -385,
            MeshError::MissingNodeKinds { .. } | MeshError::NodeKindMismatch { .. } => -386,
            MeshError::InvalidVertexIndex { .. }
            | MeshError::InvalidEdgeIndex { .. }
            | MeshError::DegenerateFace { .. } => -596,
            MeshError::TripleLineOverflow { .. } => -666,
            _ => -1,
        }
    }

    /// Whether this error is raised before any vertex is moved.
    pub fn is_setup_error(&self) -> bool {
        matches!(
            self,
            MeshError::MissingVertices
                | MeshError::MissingFaces
                | MeshError::MissingNodeKinds { .. }
                | MeshError::MissingEdges { .. }
                | MeshError::InvalidVertexIndex { .. }
                | MeshError::InvalidEdgeIndex { .. }
                | MeshError::DegenerateFace { .. }
                | MeshError::NodeKindMismatch { .. }
                | MeshError::InvalidParameter { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(MeshError::MissingVertices.code(), -384);
        assert_eq!(MeshError::MissingFaces.code(), -385);
        assert_eq!(
            MeshError::TripleLineOverflow { node: 3, neighbor: 7 }.code(),
            -666
        );
        assert_eq!(MeshError::invalid_param("iterations", 3, "bad").code(), -1);
    }

    #[test]
    fn test_setup_classification() {
        assert!(MeshError::MissingFaces.is_setup_error());
        assert!(MeshError::MissingEdges { feature: "triple-line smoothing" }.is_setup_error());
        assert!(MeshError::invalid_param("time_step", -1.0, "must be positive").is_setup_error());
        assert!(!MeshError::TripleLineOverflow { node: 0, neighbor: 1 }.is_setup_error());
    }

    #[test]
    fn test_messages() {
        let err = MeshError::TripleLineOverflow { node: 4, neighbor: 9 };
        assert_eq!(
            err.to_string(),
            "triple-line node 4 already has two neighbours, cannot add 9"
        );
    }
}
