//! Mesh file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | STL | `.stl` | ✓ | ✓ | Binary and ASCII; no node kinds |
//! | AVS UCD | `.inp` | ✗ | ✓ | Snapshot with node kinds |
//! | Text tables | (any) | ✓ | ✓ | Separate node/triangle/edge files, see [`tables`] |
//!
//! # Usage
//!
//! ```no_run
//! use mfesmooth::io::{load, save};
//! use mfesmooth::mesh::SurfaceMesh;
//!
//! let mesh: SurfaceMesh = load("grains.stl").unwrap();
//! save(&mesh, "grains.inp").unwrap();
//! ```

pub mod stl;
pub mod tables;
pub mod ucd;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::SurfaceMesh;

/// Single-file mesh formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// STL (stereolithography) format.
    Stl,
    /// AVS UCD format.
    Ucd,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "stl" => Some(Format::Stl),
            "inp" | "ucd" => Some(Format::Ucd),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })
}

/// Load a mesh from a file with automatic format detection.
pub fn load<P: AsRef<Path>>(path: P) -> Result<SurfaceMesh<f32>> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Stl => stl::load(path),
        Format::Ucd => Err(MeshError::LoadError {
            path: path.to_path_buf(),
            message: "UCD files can only be written".to_string(),
        }),
    }
}

/// Save a mesh to a file with automatic format detection.
pub fn save<P: AsRef<Path>>(mesh: &SurfaceMesh<f32>, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Stl => stl::save(mesh, path),
        Format::Ucd => ucd::save_snapshot(
            path,
            &mesh.positions_f64(),
            mesh.faces(),
            mesh.node_kinds(),
            None,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/mesh.STL"), Some(Format::Stl));
        assert_eq!(Format::from_path("step_010.inp"), Some(Format::Ucd));
        assert_eq!(Format::from_path("mesh.obj"), None);
        assert_eq!(Format::from_path("nodes"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load("mesh.obj").unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedFormat { ref extension } if extension == "obj"));
        assert!(matches!(load("snapshot.inp"), Err(MeshError::LoadError { .. })));
    }
}
