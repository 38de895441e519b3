//! Core mesh data structures.
//!
//! This module provides the indexed surface mesh handed to the smoothing
//! engine, together with the node and edge classifications a host pipeline
//! attaches to it.
//!
//! # Overview
//!
//! [`SurfaceMesh`] stores vertex positions in the host's precision (see
//! [`CoordScalar`]), an immutable triangle list, and optionally a per-vertex
//! [`NodeKind`] array and a classified [`Edge`] list. Only vertex positions
//! can change once the mesh is built.
//!
//! # Construction
//!
//! ```
//! use mfesmooth::mesh::{build_surface_mesh, NodeKind, SurfaceMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0f32, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: SurfaceMesh = build_surface_mesh(vertices, faces)
//!     .and_then(|m| m.with_node_kinds(vec![NodeKind::DEFAULT; 3]))
//!     .unwrap();
//! assert_eq!(mesh.node_kinds().map(|k| k.len()), Some(3));
//! ```

mod builder;
mod scalar;
mod surface;

pub use builder::build_surface_mesh;
pub use scalar::CoordScalar;
pub use surface::{Edge, EdgeKind, NodeKind, SurfaceMesh};
