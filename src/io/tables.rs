//! Plain-text node, triangle and edge tables.
//!
//! Each table starts with its row count, followed by one whitespace-separated
//! row per entry:
//!
//! | table | row |
//! |---|---|
//! | nodes | `id kind x y z` |
//! | triangles | `id n0 n1 n2 ...` |
//! | edges | `id n0 n1 kind ...` |
//!
//! Trailing columns (region ids, spins) are ignored on input. Node ids must run
//! from 0 in file order since triangles and edges refer to nodes by id. Blank
//! lines and lines starting with `#` are skipped.

use std::fmt::Display;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_surface_mesh, Edge, EdgeKind, NodeKind, SurfaceMesh};

type ParseResult<T> = std::result::Result<T, String>;

/// Load a mesh from a node table, a triangle table and optionally an edge
/// table.
///
/// The resulting mesh always carries node kinds; it carries edges when an
/// edge table is given.
///
/// # Example
///
/// ```no_run
/// use mfesmooth::io::tables;
/// use std::path::Path;
///
/// let mesh = tables::load("nodes.txt", "triangles.txt", Some(Path::new("edges.txt"))).unwrap();
/// assert!(mesh.node_kinds().is_some());
/// ```
pub fn load<P: AsRef<Path>, Q: AsRef<Path>>(
    nodes: P,
    triangles: Q,
    edges: Option<&Path>,
) -> Result<SurfaceMesh<f32>> {
    let (vertices, kinds) = with_reader(nodes.as_ref(), read_nodes)?;
    let faces = with_reader(triangles.as_ref(), read_triangles)?;

    let mesh = build_surface_mesh(vertices, faces)?.with_node_kinds(kinds)?;
    match edges {
        Some(path) => {
            let edges = with_reader(path, read_edges)?;
            mesh.with_edges(edges)
        }
        None => Ok(mesh),
    }
}

fn with_reader<T>(path: &Path, parse: fn(BufReader<File>) -> ParseResult<T>) -> Result<T> {
    let file = File::open(path)?;
    parse(BufReader::new(file)).map_err(|message| MeshError::LoadError {
        path: path.to_path_buf(),
        message,
    })
}

/// Parse a node table into positions and node kinds.
pub fn read_nodes<R: BufRead>(reader: R) -> ParseResult<(Vec<Point3<f32>>, Vec<NodeKind>)> {
    let rows = read_rows(reader, 5, |line, cols| {
        let id: usize = field(line, cols[0], "node id")?;
        let kind: i8 = field(line, cols[1], "node kind")?;
        let x: f32 = field(line, cols[2], "x")?;
        let y: f32 = field(line, cols[3], "y")?;
        let z: f32 = field(line, cols[4], "z")?;
        Ok((id, NodeKind(kind), Point3::new(x, y, z)))
    })?;

    let mut vertices = Vec::with_capacity(rows.len());
    let mut kinds = Vec::with_capacity(rows.len());
    for (expected, (id, kind, p)) in rows.into_iter().enumerate() {
        if id != expected {
            return Err(format!("node ids must be consecutive from 0, found {id} at row {expected}"));
        }
        vertices.push(p);
        kinds.push(kind);
    }
    Ok((vertices, kinds))
}

/// Parse a triangle table into vertex index triples.
pub fn read_triangles<R: BufRead>(reader: R) -> ParseResult<Vec<[usize; 3]>> {
    read_rows(reader, 4, |line, cols| {
        Ok([
            field(line, cols[1], "n0")?,
            field(line, cols[2], "n1")?,
            field(line, cols[3], "n2")?,
        ])
    })
}

/// Parse an edge table into classified edges.
pub fn read_edges<R: BufRead>(reader: R) -> ParseResult<Vec<Edge>> {
    read_rows(reader, 4, |line, cols| {
        let v0 = field(line, cols[1], "n0")?;
        let v1 = field(line, cols[2], "n1")?;
        let kind: i8 = field(line, cols[3], "edge kind")?;
        Ok(Edge::new(v0, v1, EdgeKind(kind)))
    })
}

fn field<T: FromStr>(line: usize, token: &str, what: &str) -> ParseResult<T>
where
    T::Err: Display,
{
    token
        .parse()
        .map_err(|e| format!("line {line}: invalid {what} '{token}': {e}"))
}

/// Read the row count and then that many rows of at least `min_cols` columns.
fn read_rows<R, T, F>(reader: R, min_cols: usize, mut parse: F) -> ParseResult<Vec<T>>
where
    R: BufRead,
    F: FnMut(usize, &[&str]) -> ParseResult<T>,
{
    let mut count: Option<usize> = None;
    let mut rows = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| e.to_string())?;
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let cols: Vec<&str> = trimmed.split_whitespace().collect();

        match count {
            None => {
                let n = field(line_no, cols[0], "row count")?;
                rows.reserve(n);
                count = Some(n);
            }
            Some(n) if rows.len() < n => {
                if cols.len() < min_cols {
                    return Err(format!(
                        "line {line_no}: expected at least {min_cols} columns, found {}",
                        cols.len()
                    ));
                }
                rows.push(parse(line_no, &cols)?);
            }
            Some(_) => break,
        }
    }

    match count {
        None => Err("missing row count".to_string()),
        Some(n) if rows.len() < n => Err(format!("expected {n} rows, found {}", rows.len())),
        Some(_) => Ok(rows),
    }
}

/// Write the node table of a mesh. Nodes without a kind are written as kind 0.
pub fn save_nodes<P: AsRef<Path>>(mesh: &SurfaceMesh<f32>, path: P) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_nodes(&mut w, mesh)?;
    w.flush()?;
    Ok(())
}

/// Write the triangle table of a mesh.
pub fn save_triangles<P: AsRef<Path>>(mesh: &SurfaceMesh<f32>, path: P) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_triangles(&mut w, mesh)?;
    w.flush()?;
    Ok(())
}

/// Write the edge table of a mesh.
///
/// # Errors
///
/// Returns [`MeshError::MissingEdges`] if the mesh has no edge list.
pub fn save_edges<P: AsRef<Path>>(mesh: &SurfaceMesh<f32>, path: P) -> Result<()> {
    let edges = mesh.edges().ok_or(MeshError::MissingEdges {
        feature: "writing an edge table",
    })?;
    let mut w = BufWriter::new(File::create(path)?);
    writeln!(w, "{}", edges.len())?;
    for (i, e) in edges.iter().enumerate() {
        writeln!(w, "{}\t{}\t{}\t{}", i, e.verts[0], e.verts[1], e.kind.0)?;
    }
    w.flush()?;
    Ok(())
}

/// Write a node table to any writer.
pub fn write_nodes<W: Write>(w: &mut W, mesh: &SurfaceMesh<f32>) -> std::io::Result<()> {
    writeln!(w, "{}", mesh.num_vertices())?;
    for (i, p) in mesh.vertices().iter().enumerate() {
        let kind = mesh.node_kinds().map_or(NodeKind::ORDINARY, |k| k[i]);
        writeln!(w, "{}\t{}\t{}\t{}\t{}", i, kind.0, p.x, p.y, p.z)?;
    }
    Ok(())
}

/// Write a triangle table to any writer.
pub fn write_triangles<W: Write>(w: &mut W, mesh: &SurfaceMesh<f32>) -> std::io::Result<()> {
    writeln!(w, "{}", mesh.num_faces())?;
    for (i, f) in mesh.faces().iter().enumerate() {
        writeln!(w, "{}\t{}\t{}\t{}", i, f[0], f[1], f[2])?;
    }
    Ok(())
}
