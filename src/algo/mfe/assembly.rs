//! Assembly of the per-iteration linear system `K x = F`.
//!
//! Every triangle contributes a finite-difference force on each of its
//! corners and a normal-weighted stiffness block for each corner pair. The
//! per-triangle work is independent, so it can run on rayon; contributions are
//! always folded into `K` and `F` in triangle order, which keeps the parallel
//! and sequential paths bit-identical.

use nalgebra::{DVector, Point3, Vector3};
use rayon::prelude::*;

use crate::geometry::{area, circularity, distance, min_dihedral, normal};
use crate::linalg::SparseMatrix;

use super::constraints::AxisLock;
use super::diagnostics::QualityAccumulator;
use super::triple_line::TripleLineAdjacency;

/// Forward finite-difference step.
pub const PERTURBATION: f64 = 1e-12;

/// Added to every diagonal entry of `K`.
pub const REGULARIZATION: f64 = 1.0;

/// Diagonal value that pins a locked coordinate.
pub const LOCKED_DIAGONAL: f64 = 1e50;

const ONE_TWELFTH: f64 = 1.0 / 12.0;

/// Weights of the objective terms for one iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceWeights {
    /// Area term.
    pub area: f64,
    /// Circularity term.
    pub quality: f64,
    /// Triple-line length term.
    pub triple_line: f64,
}

impl ForceWeights {
    /// Weights for `step` of a run ending at `final_step`.
    ///
    /// The quality weight ramps from 500 towards 550 over the run; the other
    /// two are constant.
    pub fn for_step(step: usize, final_step: usize) -> Self {
        Self {
            area: 4000.0,
            quality: 500.0 + 50.0 * step as f64 / final_step as f64,
            triple_line: 19000.0,
        }
    }
}

/// Everything one triangle contributes to an iteration.
#[derive(Debug, Clone)]
pub(crate) struct TriangleTerms {
    pub verts: [usize; 3],
    pub normal: Vector3<f64>,
    pub area: f64,
    pub quality: f64,
    pub min_angle: f64,
    /// `force[c][j]`: contribution to coordinate `j` of corner `c`.
    pub force: [[f64; 3]; 3],
    pub dropped: usize,
}

/// Evaluate one triangle at the current positions.
pub(crate) fn triangle_terms(
    verts: [usize; 3],
    positions: &[Point3<f64>],
    weights: ForceWeights,
    triple_lines: Option<&TripleLineAdjacency>,
) -> TriangleTerms {
    let corners = verts.map(|v| positions[v]);
    let [p0, p1, p2] = &corners;

    let a = area(p0, p1, p2);
    let q = circularity(p0, p1, p2, a);

    let mut force = [[0.0; 3]; 3];
    let mut dropped = 0;

    for (c, &node) in verts.iter().enumerate() {
        let line = triple_lines.and_then(|adj| adj.neighbors(node));

        for j in 0..3 {
            let mut f = 0.0;

            if let Some([n1, n2]) = line {
                let (q1, q2) = (&positions[n1], &positions[n2]);
                let here = &corners[c];
                let mut moved = *here;
                moved[j] += PERTURBATION;
                let before = distance(here, q1) + distance(q2, here);
                let after = distance(&moved, q1) + distance(q2, &moved);
                f -= weights.triple_line * (after - before);
            }

            let mut perturbed = corners;
            perturbed[c][j] += PERTURBATION;
            let [t0, t1, t2] = &perturbed;
            let a_new = area(t0, t1, t2);
            let q_new = circularity(t0, t1, t2, a_new);
            f -= (weights.area * (a_new - a) + weights.quality * (q_new - q) * a) / PERTURBATION;

            if f.is_finite() {
                force[c][j] = f;
            } else {
                dropped += 1;
            }
        }
    }

    TriangleTerms {
        verts,
        normal: normal(p0, p1, p2),
        area: a,
        quality: q,
        min_angle: min_dihedral(p0, p1, p2),
        force,
        dropped,
    }
}

/// The assembled system of one iteration.
#[derive(Debug, Clone)]
pub(crate) struct LinearSystem {
    pub stiffness: SparseMatrix<f64>,
    pub force: DVector<f64>,
    pub quality: QualityAccumulator,
    pub dropped: usize,
}

/// Assemble `K` and `F`, including regularization and locked diagonals.
pub(crate) fn assemble(
    positions: &[Point3<f64>],
    faces: &[[usize; 3]],
    constraints: &[AxisLock],
    weights: ForceWeights,
    triple_lines: Option<&TripleLineAdjacency>,
    parallel: bool,
) -> LinearSystem {
    let n = 3 * positions.len();

    let terms: Vec<TriangleTerms> = if parallel {
        faces
            .par_iter()
            .map(|&face| triangle_terms(face, positions, weights, triple_lines))
            .collect()
    } else {
        faces
            .iter()
            .map(|&face| triangle_terms(face, positions, weights, triple_lines))
            .collect()
    };

    let mut stiffness = SparseMatrix::new(n, n);
    let mut force = DVector::zeros(n);
    let mut quality = QualityAccumulator::default();
    let mut dropped = 0;

    for (t, term) in terms.iter().enumerate() {
        if term.quality > super::diagnostics::POOR_QUALITY {
            log::warn!("Triangle {} has Q = {}", t, term.quality);
        }
        quality.add(term.quality, term.min_angle);
        dropped += term.dropped;
        accumulate(&mut stiffness, &mut force, term);
    }

    for row in 0..n {
        *stiffness.entry(row, row) += REGULARIZATION;
    }

    for (node, lock) in constraints.iter().enumerate() {
        for axis in 0..3 {
            if lock.is_locked(axis) {
                let row = 3 * node + axis;
                stiffness.set(row, row, LOCKED_DIAGONAL);
            }
        }
    }

    LinearSystem {
        stiffness,
        force,
        quality,
        dropped,
    }
}

fn accumulate(stiffness: &mut SparseMatrix<f64>, force: &mut DVector<f64>, term: &TriangleTerms) {
    let nrm = &term.normal;

    for (c, &i) in term.verts.iter().enumerate() {
        for j in 0..3 {
            force[3 * i + j] += term.force[c][j];
        }

        for &h in &term.verts {
            let delta = if i == h { 1.0 } else { 0.0 };
            let weight = ONE_TWELFTH * (1.0 + delta) * term.area;
            for k in 0..3 {
                for j in 0..3 {
                    *stiffness.entry(3 * h + k, 3 * i + j) += weight * nrm[j] * nrm[k];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Edge, NodeKind};

    fn right_triangle() -> Vec<Point3<f64>> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    #[test]
    fn test_weights_ramp() {
        let first = ForceWeights::for_step(1, 10);
        let last = ForceWeights::for_step(10, 10);
        assert_eq!(first.area, 4000.0);
        assert_eq!(first.triple_line, 19000.0);
        assert!((first.quality - 505.0).abs() < 1e-12);
        assert!((last.quality - 550.0).abs() < 1e-12);
    }

    #[test]
    fn test_triangle_terms_finite() {
        let positions = right_triangle();
        let terms = triangle_terms([0, 1, 2], &positions, ForceWeights::for_step(1, 1), None);
        assert!((terms.area - 0.5).abs() < 1e-15);
        assert!(terms.quality.is_finite());
        assert_eq!(terms.dropped, 0);
        assert!(terms.force.iter().flatten().all(|f| f.is_finite()));
        // In-plane triangle: no force out of the plane.
        for c in 0..3 {
            assert_eq!(terms.force[c][2], 0.0);
        }
    }

    #[test]
    fn test_degenerate_triangle_drops_terms() {
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let terms = triangle_terms([0, 1, 2], &positions, ForceWeights::for_step(1, 1), None);
        assert!(!terms.quality.is_finite());
        assert!(terms.dropped > 0);
        assert!(terms.force.iter().flatten().all(|f| f.is_finite()));
        assert_eq!(terms.normal, Vector3::zeros());
    }

    #[test]
    fn test_stiffness_block() {
        let positions = right_triangle();
        let system = assemble(
            &positions,
            &[[0, 1, 2]],
            &[AxisLock::NONE; 3],
            ForceWeights::for_step(1, 1),
            None,
            false,
        );
        let k = &system.stiffness;
        // Normal is +z, area 0.5: only zz entries pick up the mass term.
        assert!((k.get(2, 2) - (1.0 + 2.0 / 12.0 * 0.5)).abs() < 1e-15);
        assert!((k.get(2, 5) - 0.5 / 12.0).abs() < 1e-15);
        assert_eq!(k.get(2, 5), k.get(5, 2));
        assert_eq!(k.get(0, 0), REGULARIZATION);
        assert_eq!(k.get(0, 3), 0.0);
        assert_eq!(system.quality.finish().triangles, 1);
    }

    #[test]
    fn test_locked_diagonal() {
        let positions = right_triangle();
        let constraints = [AxisLock::ALL, AxisLock::Y, AxisLock::NONE];
        let system = assemble(
            &positions,
            &[[0, 1, 2]],
            &constraints,
            ForceWeights::for_step(1, 1),
            None,
            false,
        );
        let k = &system.stiffness;
        for row in 0..3 {
            assert_eq!(k.get(row, row), LOCKED_DIAGONAL);
        }
        assert_eq!(k.get(4, 4), LOCKED_DIAGONAL);
        assert_eq!(k.get(3, 3), REGULARIZATION);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let positions: Vec<Point3<f64>> = (0..12)
            .map(|i| {
                let t = i as f64 * 0.7;
                Point3::new(t.cos() * 3.0, t.sin() * 2.0, (i % 3) as f64 * 0.4)
            })
            .collect();
        let faces: Vec<[usize; 3]> = (0..10).map(|i| [i, i + 1, i + 2]).collect();
        let constraints = vec![AxisLock::NONE; positions.len()];
        let weights = ForceWeights::for_step(2, 5);

        let seq = assemble(&positions, &faces, &constraints, weights, None, false);
        let par = assemble(&positions, &faces, &constraints, weights, None, true);

        assert_eq!(seq.force, par.force);
        for row in 0..positions.len() * 3 {
            let a: Vec<_> = seq.stiffness.row(row).iter().collect();
            let b: Vec<_> = par.stiffness.row(row).iter().collect();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_triple_line_term_pulls_node_straight() {
        // Node 1 sits above the line through its triple-line neighbours 0 and 2.
        let positions = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.5, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let kinds = vec![NodeKind::TRIPLE_LINE; 3];
        let edges = vec![Edge::triple_line(0, 1), Edge::triple_line(1, 2)];
        let adjacency = TripleLineAdjacency::build(3, &edges, &kinds).unwrap();
        let weights = ForceWeights::for_step(1, 1);

        let with = triangle_terms([0, 1, 2], &positions, weights, Some(&adjacency));
        let without = triangle_terms([0, 1, 2], &positions, weights, None);

        // Shortening the line means moving node 1 down in y.
        assert!(with.force[1][1] < without.force[1][1]);
        // Nodes with a single neighbour get no line term.
        assert_eq!(with.force[0], without.force[0]);
    }
}
