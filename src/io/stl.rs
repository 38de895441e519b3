//! STL (stereolithography) format support.
//!
//! STL stores every triangle with its own copy of the corner coordinates;
//! corners are welded into shared nodes by exact coordinate equality when a
//! mesh is loaded. STL carries no node kinds or edges.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::geometry::normal;
use crate::mesh::{build_surface_mesh, SurfaceMesh};

/// Load a surface mesh from an STL file.
///
/// Automatically detects binary vs ASCII format. Triangles whose corners weld
/// onto fewer than three distinct nodes are dropped.
///
/// # Example
///
/// ```no_run
/// use mfesmooth::io::stl;
/// use mfesmooth::mesh::SurfaceMesh;
///
/// let mesh: SurfaceMesh = stl::load("grains.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<SurfaceMesh<f32>> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    // read_stl already shares bit-identical corners between triangles
    let stl = stl_io::read_stl(&mut file).map_err(|e| MeshError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let vertices: Vec<Point3<f32>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0], v[1], v[2]))
        .collect();

    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(stl.faces.len());
    let mut collapsed = 0usize;
    for tri in &stl.faces {
        let [i0, i1, i2] = tri.vertices;
        if i0 != i1 && i1 != i2 && i0 != i2 {
            faces.push([i0, i1, i2]);
        } else {
            collapsed += 1;
        }
    }
    if collapsed > 0 {
        log::warn!("{}: dropped {} collapsed triangles", path.display(), collapsed);
    }

    if faces.is_empty() {
        return Err(MeshError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    log::debug!(
        "{}: {} nodes, {} triangles",
        path.display(),
        vertices.len(),
        faces.len()
    );

    build_surface_mesh(vertices, faces)
}

/// Save a surface mesh to a binary STL file.
///
/// Node kinds and edges are not stored.
///
/// # Example
///
/// ```no_run
/// use mfesmooth::io::stl;
/// use mfesmooth::mesh::SurfaceMesh;
///
/// let mesh: SurfaceMesh = SurfaceMesh::new();
/// stl::save(&mesh, "smoothed.stl").unwrap();
/// ```
pub fn save<P: AsRef<Path>>(mesh: &SurfaceMesh<f32>, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let positions = mesh.positions_f64();

    let triangles: Vec<stl_io::Triangle> = mesh
        .faces()
        .iter()
        .map(|&[a, b, c]| {
            let n = normal(&positions[a], &positions[b], &positions[c]);
            let corner = |v: usize| {
                let p = mesh.position(v);
                stl_io::Vertex::new([p.x, p.y, p.z])
            };

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [corner(a), corner(b), corner(c)],
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_welds_nodes() {
        let vertices = vec![
            Point3::new(0.0f32, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.25),
        ];
        let mesh = build_surface_mesh(vertices, vec![[0, 1, 2], [0, 2, 3]]).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.stl");
        save(&mesh, &path).unwrap();
        let loaded = load(&path).unwrap();

        assert_eq!(loaded.num_vertices(), 4);
        assert_eq!(loaded.num_faces(), 2);
        assert!(loaded.node_kinds().is_none());

        let mut expected: Vec<[u32; 3]> = mesh
            .vertices()
            .iter()
            .map(|p| [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()])
            .collect();
        let mut actual: Vec<[u32; 3]> = loaded
            .vertices()
            .iter()
            .map(|p| [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()])
            .collect();
        expected.sort_unstable();
        actual.sort_unstable();
        assert_eq!(expected, actual);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path().join("absent.stl")).is_err());
    }
}
