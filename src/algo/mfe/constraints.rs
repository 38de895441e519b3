//! Per-node axis locking.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use nalgebra::Point3;

use crate::mesh::NodeKind;

use super::SmoothOptions;

/// Distance to a bounding-box face within which a node counts as touching it.
pub const BOUNDARY_TOLERANCE: f64 = 1e-5;

/// Set of coordinate axes along which a node may not move.
///
/// Bit 0 locks X, bit 1 locks Y, bit 2 locks Z, so the mask ranges over `0..=7`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AxisLock(u8);

impl AxisLock {
    /// No axis locked.
    pub const NONE: AxisLock = AxisLock(0);
    /// X locked.
    pub const X: AxisLock = AxisLock(1);
    /// Y locked.
    pub const Y: AxisLock = AxisLock(2);
    /// Z locked.
    pub const Z: AxisLock = AxisLock(4);
    /// Fully pinned.
    pub const ALL: AxisLock = AxisLock(7);

    /// Build a lock from a raw mask. Bits above bit 2 are ignored.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        AxisLock(bits & 7)
    }

    /// The raw mask.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Lock for a single axis index (0, 1 or 2).
    #[inline]
    pub const fn axis(axis: usize) -> Self {
        AxisLock(1 << axis)
    }

    /// Whether `axis` (0, 1 or 2) is locked.
    #[inline]
    pub const fn is_locked(self, axis: usize) -> bool {
        self.0 & (1 << axis) != 0
    }

    /// Whether no axis is locked.
    #[inline]
    pub const fn is_free(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for AxisLock {
    type Output = AxisLock;

    fn bitor(self, rhs: AxisLock) -> AxisLock {
        AxisLock(self.0 | rhs.0)
    }
}

impl BitOrAssign for AxisLock {
    fn bitor_assign(&mut self, rhs: AxisLock) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for AxisLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut axes = String::new();
        for (axis, name) in ['x', 'y', 'z'].into_iter().enumerate() {
            if self.is_locked(axis) {
                axes.push(name);
            }
        }
        if axes.is_empty() {
            axes.push('-');
        }
        write!(f, "AxisLock({axes})")
    }
}

/// Compute the axis lock of every node from its initial position.
///
/// `bounds` is the `(min, max)` corner pair of the mesh bounding box. The
/// node-kind array is only consulted for quad points and for the special-node
/// check; pass `None` when the mesh has none.
pub fn compute_node_constraints(
    positions: &[Point3<f64>],
    kinds: Option<&[NodeKind]>,
    bounds: (Point3<f64>, Point3<f64>),
    options: &SmoothOptions,
) -> Vec<AxisLock> {
    let (min, max) = bounds;

    positions
        .iter()
        .enumerate()
        .map(|(node, p)| {
            let kind = kinds.map(|k| k[node]);
            let mut lock = AxisLock::NONE;

            if options.apply_node_constraints {
                for axis in 0..3 {
                    if (p[axis] - max[axis]).abs() < BOUNDARY_TOLERANCE
                        || (p[axis] - min[axis]).abs() < BOUNDARY_TOLERANCE
                    {
                        lock |= AxisLock::axis(axis);
                    }
                }

                if let Some(special) = kind.filter(|k| k.is_special() && lock.is_free()) {
                    log::warn!(
                        "Boundary node {} (kind {}) at ({}, {}, {}) is not on the bounding box",
                        node,
                        special.0,
                        p.x,
                        p.y,
                        p.z
                    );
                }

                if options.constrain_surface_nodes && !lock.is_free() {
                    lock = AxisLock::ALL;
                }
            }

            if options.constrain_quad_points && kind.is_some_and(NodeKind::is_quad_point) {
                lock = AxisLock::ALL;
            }

            lock
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_bounds() -> (Point3<f64>, Point3<f64>) {
        (Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    fn options(nodes: bool, surface: bool, quads: bool) -> SmoothOptions {
        SmoothOptions::default()
            .with_node_constraints(nodes)
            .with_surface_node_constraints(surface)
            .with_quad_point_constraints(quads)
    }

    #[test]
    fn test_axis_lock_bits() {
        let lock = AxisLock::X | AxisLock::Z;
        assert_eq!(lock.bits(), 5);
        assert!(lock.is_locked(0));
        assert!(!lock.is_locked(1));
        assert!(lock.is_locked(2));
        assert_eq!(AxisLock::from_bits(0xff), AxisLock::ALL);
        assert_eq!(format!("{:?}", lock), "AxisLock(xz)");
        assert_eq!(format!("{:?}", AxisLock::NONE), "AxisLock(-)");
    }

    #[test]
    fn test_boundary_proximity_per_axis() {
        let positions = vec![
            Point3::new(0.5, 0.5, 0.5),
            Point3::new(0.0, 0.5, 0.5),
            Point3::new(0.5, 1.0 - 1e-6, 0.0),
            Point3::new(0.5, 1.0 - 1e-3, 0.5),
        ];
        let locks = compute_node_constraints(&positions, None, unit_bounds(), &options(true, false, false));
        assert_eq!(locks[0], AxisLock::NONE);
        assert_eq!(locks[1], AxisLock::X);
        assert_eq!(locks[2], AxisLock::Y | AxisLock::Z);
        assert_eq!(locks[3], AxisLock::NONE);
    }

    #[test]
    fn test_surface_nodes_fully_locked() {
        let positions = vec![Point3::new(0.0, 0.5, 0.5), Point3::new(0.5, 0.5, 0.5)];
        let locks = compute_node_constraints(&positions, None, unit_bounds(), &options(true, true, false));
        assert_eq!(locks, vec![AxisLock::ALL, AxisLock::NONE]);
    }

    #[test]
    fn test_surface_flag_needs_node_constraints() {
        let positions = vec![Point3::new(0.0, 0.5, 0.5)];
        let locks = compute_node_constraints(&positions, None, unit_bounds(), &options(false, true, false));
        assert_eq!(locks, vec![AxisLock::NONE]);
    }

    #[test]
    fn test_quad_points_locked_anywhere() {
        let positions = vec![Point3::new(0.5, 0.5, 0.5), Point3::new(0.5, 0.5, 0.5)];
        let kinds = [NodeKind::QUAD_POINT, NodeKind::TRIPLE_LINE];
        let locks = compute_node_constraints(&positions, Some(&kinds), unit_bounds(), &options(false, false, true));
        assert_eq!(locks, vec![AxisLock::ALL, AxisLock::NONE]);

        let locks = compute_node_constraints(&positions, Some(&kinds), unit_bounds(), &options(false, false, false));
        assert_eq!(locks, vec![AxisLock::NONE, AxisLock::NONE]);
    }
}
