//! # mfesmooth
//!
//! Moving finite element (MFE) smoothing of triangulated surface meshes, as
//! produced by microstructure surface meshing.
//!
//! The smoother relaxes node positions to improve triangle quality
//! (circularity, minimum angle) while respecting per-node constraints: nodes
//! on the bounding box of the model, quad points, and optionally the length
//! of triple lines. Only positions change; connectivity is never modified.
//!
//! ## Features
//!
//! - **Surface mesh container**: f32 or f64 storage with node kinds and
//!   classified edges ([`mesh`])
//! - **Geometric primitives**: area, normal, circularity, minimum angle, line
//!   curvature ([`geometry`])
//! - **Linear algebra kernel**: sparse assembly, CSR, CG / CR / GMRES,
//!   tridiagonal solve ([`linalg`])
//! - **MFE driver** with progress, cancellation and per-iteration
//!   diagnostics ([`algo::mfe`])
//! - **File formats**: STL, node/triangle/edge text tables, UCD snapshots ([`io`])
//!
//! ## Quick Start
//!
//! ```no_run
//! use mfesmooth::prelude::*;
//!
//! let mut mesh: SurfaceMesh = mfesmooth::io::load("grains.stl").unwrap();
//!
//! let options = SmoothOptions::default()
//!     .with_quad_point_constraints(false) // STL carries no node kinds
//!     .with_iterations(50);
//! let report = mfe_smooth(&mut mesh, &options).unwrap();
//! println!("final Q_max: {:?}", report.final_quality().map(|q| q.q_max));
//!
//! mfesmooth::io::save(&mesh, "smoothed.stl").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use mfesmooth::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0f32, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//! let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
//! let kinds = vec![NodeKind::DEFAULT, NodeKind::DEFAULT, NodeKind::QUAD_POINT, NodeKind::DEFAULT];
//!
//! let mut mesh: SurfaceMesh = build_surface_mesh(vertices, faces)
//!     .and_then(|m| m.with_node_kinds(kinds))
//!     .unwrap();
//!
//! let report = mfe_smooth(&mut mesh, &SmoothOptions::default()).unwrap();
//! assert_eq!(report.iterations_run, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod geometry;
pub mod io;
pub mod linalg;
pub mod mesh;

pub use error::{MeshError, Result};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use mfesmooth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::mfe::{
        mfe_smooth, mfe_smooth_with_observer, mfe_smooth_with_progress, SmoothOptions, SmoothReport,
    };
    pub use crate::algo::{CancelFlag, Progress};
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{build_surface_mesh, Edge, EdgeKind, NodeKind, SurfaceMesh};
}

// Re-export nalgebra types for convenience
pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_tetrahedron_keeps_connectivity() {
        let vertices = vec![
            Point3::new(0.0f32, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];

        let mut mesh: SurfaceMesh = build_surface_mesh(vertices, faces.clone()).unwrap();
        let report = mfe_smooth(&mut mesh, &SmoothOptions::unconstrained().with_iterations(3)).unwrap();

        assert_eq!(report.iterations_run, 3);
        assert_eq!(mesh.faces(), faces.as_slice());
        assert_eq!(mesh.num_vertices(), 4);
    }
}
