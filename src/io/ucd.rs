//! AVS UCD (`.inp`) snapshots.
//!
//! Writes node positions, triangles and per-node data (node kind and axis
//! lock) so intermediate smoothing states can be inspected in a viewer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::algo::mfe::AxisLock;
use crate::error::Result;
use crate::mesh::NodeKind;

/// Write a UCD snapshot to a file.
///
/// Columns for node kinds and locks are only written when those arrays are
/// given.
pub fn save_snapshot<P: AsRef<Path>>(
    path: P,
    positions: &[Point3<f64>],
    faces: &[[usize; 3]],
    kinds: Option<&[NodeKind]>,
    locks: Option<&[AxisLock]>,
) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_snapshot(&mut w, positions, faces, kinds, locks)?;
    w.flush()?;
    Ok(())
}

/// Write a UCD snapshot to any writer.
pub fn write_snapshot<W: Write>(
    w: &mut W,
    positions: &[Point3<f64>],
    faces: &[[usize; 3]],
    kinds: Option<&[NodeKind]>,
    locks: Option<&[AxisLock]>,
) -> std::io::Result<()> {
    let components = usize::from(kinds.is_some()) + usize::from(locks.is_some());
    writeln!(w, "{} {} {} 0 0", positions.len(), faces.len(), components)?;

    for (i, p) in positions.iter().enumerate() {
        writeln!(w, "{} {} {} {}", i, p.x, p.y, p.z)?;
    }
    for (i, f) in faces.iter().enumerate() {
        writeln!(w, "{} 0 tri {} {} {}", i, f[0], f[1], f[2])?;
    }

    if components == 0 {
        return Ok(());
    }

    write!(w, "{}", components)?;
    for _ in 0..components {
        write!(w, " 1")?;
    }
    writeln!(w)?;
    if kinds.is_some() {
        writeln!(w, "Node_Type, none")?;
    }
    if locks.is_some() {
        writeln!(w, "Node_Constraint, none")?;
    }

    for i in 0..positions.len() {
        write!(w, "{}", i)?;
        if let Some(kinds) = kinds {
            write!(w, " {}", kinds[i].0)?;
        }
        if let Some(locks) = locks {
            write!(w, " {}", locks[i].bits())?;
        }
        writeln!(w)?;
    }
    Ok(())
}
