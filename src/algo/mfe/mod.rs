//! Moving finite element (MFE) surface smoothing.
//!
//! Each iteration treats the vertex positions as the unknowns of a small
//! physical system: every triangle exerts a force derived from a weighted
//! area + circularity objective (plus, optionally, a triple-line length term),
//! a normal-weighted mass matrix `K` is assembled, `K x = F` is solved with
//! the conjugate residual method, and the nodes advance by an explicit step
//! `dt * x`. Coordinates locked by [`AxisLock`] never move, and single-axis
//! updates with `|dt * x| > 1` are skipped.
//!
//! # Example
//!
//! ```
//! use mfesmooth::algo::mfe::{mfe_smooth, SmoothOptions};
//! use mfesmooth::mesh::{build_surface_mesh, SurfaceMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0f32, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mut mesh: SurfaceMesh = build_surface_mesh(vertices, vec![[0, 1, 2]]).unwrap();
//!
//! let options = SmoothOptions::unconstrained().with_iterations(2);
//! let report = mfe_smooth(&mut mesh, &options).unwrap();
//!
//! assert_eq!(report.iterations_run, 2);
//! assert!(mesh.vertices().iter().all(|p| p.iter().all(|c| c.is_finite())));
//! ```

mod assembly;
mod constraints;
mod diagnostics;
mod triple_line;

pub use assembly::{ForceWeights, LOCKED_DIAGONAL, PERTURBATION, REGULARIZATION};
pub use constraints::{compute_node_constraints, AxisLock, BOUNDARY_TOLERANCE};
pub use diagnostics::{
    IterationDiagnostics, QualityHistory, QualityStats, HISTORY_LEN, POOR_QUALITY,
};
pub use triple_line::TripleLineAdjacency;

use nalgebra::{DVector, Point3};

use crate::error::{MeshError, Result};
use crate::linalg::{conjugate_residual, CsrMatrix};
use crate::mesh::{CoordScalar, SurfaceMesh};

use super::progress::{CancelFlag, Progress};

/// Iteration cap of the velocity solve.
pub const SOLVER_MAX_ITERATIONS: usize = 4000;

/// Relative residual tolerance of the velocity solve.
pub const SOLVER_TOLERANCE: f64 = 1e-5;

/// Time step derived from the largest Y coordinate of the model.
#[inline]
pub fn derived_time_step(max_y: f64) -> f64 {
    40.0e-6 * (10.0 / max_y)
}

/// Options for MFE smoothing.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothOptions {
    /// Last iteration of the run (the ramp schedule ends here).
    pub iterations: usize,

    /// Lock coordinates of nodes lying on the bounding box.
    pub apply_node_constraints: bool,

    /// Fully lock any node that touches the bounding box on some axis.
    /// Only effective together with `apply_node_constraints`.
    pub constrain_surface_nodes: bool,

    /// Fully lock quad points. Requires node kinds.
    pub constrain_quad_points: bool,

    /// Add the triple-line length term. Requires node kinds and an edge list.
    ///
    /// This term is experimental: it is tiny next to the area and quality
    /// terms and has not been validated on real microstructures.
    pub smooth_triple_lines: bool,

    /// First iteration to run, for resuming an interrupted schedule.
    pub start_iteration: usize,

    /// Explicit time step. When `None` it is derived from the model's
    /// largest Y coordinate (see [`derived_time_step`]). Meshes whose largest
    /// Y coordinate is not positive have no derived step and need one here;
    /// otherwise setup fails with [`MeshError::InvalidParameter`].
    pub time_step: Option<f64>,

    /// Whether to assemble triangle contributions in parallel (default: true).
    pub parallel: bool,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        Self {
            iterations: 1,
            apply_node_constraints: true,
            constrain_surface_nodes: true,
            constrain_quad_points: true,
            smooth_triple_lines: false,
            start_iteration: 1,
            time_step: None,
            parallel: true,
        }
    }
}

impl SmoothOptions {
    /// Default options with every constraint switched off.
    pub fn unconstrained() -> Self {
        Self {
            apply_node_constraints: false,
            constrain_surface_nodes: false,
            constrain_quad_points: false,
            ..Self::default()
        }
    }

    /// Set the number of iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set whether bounding-box nodes are locked.
    pub fn with_node_constraints(mut self, enabled: bool) -> Self {
        self.apply_node_constraints = enabled;
        self
    }

    /// Set whether bounding-box nodes are locked on all axes.
    pub fn with_surface_node_constraints(mut self, enabled: bool) -> Self {
        self.constrain_surface_nodes = enabled;
        self
    }

    /// Set whether quad points are locked.
    pub fn with_quad_point_constraints(mut self, enabled: bool) -> Self {
        self.constrain_quad_points = enabled;
        self
    }

    /// Set whether the triple-line term is used.
    pub fn with_triple_lines(mut self, enabled: bool) -> Self {
        self.smooth_triple_lines = enabled;
        self
    }

    /// Resume the schedule at `step`.
    pub fn with_start_iteration(mut self, step: usize) -> Self {
        self.start_iteration = step;
        self
    }

    /// Use a fixed time step instead of the derived one.
    pub fn with_time_step(mut self, dt: f64) -> Self {
        self.time_step = Some(dt);
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Number of iterations a run with these options performs.
    pub fn scheduled_iterations(&self) -> usize {
        if self.iterations == 0 {
            0
        } else {
            (self.iterations + 1).saturating_sub(self.start_iteration)
        }
    }
}

/// Summary of a smoothing run.
#[derive(Debug, Clone, Default)]
pub struct SmoothReport {
    /// Iterations that ran to completion.
    pub iterations_run: usize,
    /// Whether the run stopped on a cancellation request.
    pub cancelled: bool,
    /// Time step used.
    pub time_step: f64,
    /// Nodes with at least one locked axis.
    pub constrained_nodes: usize,
    /// One entry per completed iteration.
    pub diagnostics: Vec<IterationDiagnostics>,
}

impl SmoothReport {
    /// Quality measured at the start of the first iteration.
    pub fn initial_quality(&self) -> Option<&QualityStats> {
        self.diagnostics.first().map(|d| &d.quality)
    }

    /// Quality measured at the start of the last iteration.
    pub fn final_quality(&self) -> Option<&QualityStats> {
        self.diagnostics.last().map(|d| &d.quality)
    }

    /// Coordinate updates skipped by the step guard over the whole run.
    pub fn skipped_updates(&self) -> usize {
        self.diagnostics.iter().map(|d| d.skipped_updates).sum()
    }

    /// Velocity solves that hit the iteration cap.
    pub fn unconverged_solves(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| !d.solve.is_converged())
            .count()
    }
}

/// Check that a mesh and options can be smoothed, without touching the mesh.
///
/// # Errors
///
/// Missing vertices or triangles, node kinds or edges missing for the
/// requested constraints, an invalid start iteration, or a time step that can
/// neither be used nor derived.
pub fn check_setup<T: CoordScalar>(mesh: &SurfaceMesh<T>, options: &SmoothOptions) -> Result<()> {
    if mesh.num_vertices() == 0 {
        return Err(MeshError::MissingVertices);
    }
    if mesh.num_faces() == 0 {
        return Err(MeshError::MissingFaces);
    }
    if options.constrain_quad_points && mesh.node_kinds().is_none() {
        return Err(MeshError::MissingNodeKinds {
            feature: "quad-point constraints",
        });
    }
    if options.smooth_triple_lines {
        if mesh.node_kinds().is_none() {
            return Err(MeshError::MissingNodeKinds {
                feature: "triple-line smoothing",
            });
        }
        if mesh.edges().is_none() {
            return Err(MeshError::MissingEdges {
                feature: "triple-line smoothing",
            });
        }
    }
    if options.iterations > 0
        && (options.start_iteration == 0 || options.start_iteration > options.iterations)
    {
        return Err(MeshError::invalid_param(
            "start_iteration",
            options.start_iteration,
            "must lie in 1..=iterations",
        ));
    }
    resolve_time_step(mesh, options)?;
    Ok(())
}

fn resolve_time_step<T: CoordScalar>(mesh: &SurfaceMesh<T>, options: &SmoothOptions) -> Result<f64> {
    match options.time_step {
        Some(dt) if dt.is_finite() && dt > 0.0 => Ok(dt),
        Some(dt) => Err(MeshError::invalid_param(
            "time_step",
            dt,
            "must be finite and positive",
        )),
        None => {
            let max_y = mesh.bounding_box().map_or(f64::NAN, |(_, max)| max.y);
            if max_y.is_finite() && max_y > 0.0 {
                Ok(derived_time_step(max_y))
            } else {
                Err(MeshError::invalid_param(
                    "time_step",
                    max_y,
                    "cannot be derived unless the largest Y coordinate is positive",
                ))
            }
        }
    }
}

/// Step-by-step MFE smoother.
///
/// Owns a double precision copy of the mesh state, so a run can be inspected
/// between iterations (for snapshots, say) and written back at the end with
/// [`write_back`](Self::write_back). [`mfe_smooth_with_progress`] wraps this
/// in the usual run-to-completion loop.
#[derive(Debug, Clone)]
pub struct MfeSmoother {
    faces: Vec<[usize; 3]>,
    positions: Vec<Point3<f64>>,
    constraints: Vec<AxisLock>,
    triple_lines: Option<TripleLineAdjacency>,
    time_step: f64,
    velocity: DVector<f64>,
    history: QualityHistory,
    next_step: usize,
    final_step: usize,
    parallel: bool,
}

impl MfeSmoother {
    /// Validate the input, compute node constraints and, if requested, the
    /// triple-line adjacency.
    ///
    /// # Errors
    ///
    /// Any error of [`check_setup`], or [`MeshError::TripleLineOverflow`].
    pub fn new<T: CoordScalar>(mesh: &SurfaceMesh<T>, options: &SmoothOptions) -> Result<Self> {
        check_setup(mesh, options)?;
        let time_step = resolve_time_step(mesh, options)?;

        let positions = mesh.positions_f64();
        let bounds = mesh
            .bounding_box()
            .ok_or(MeshError::MissingVertices)?;
        log::debug!(
            "Model dimensions: X [{}, {}], Y [{}, {}], Z [{}, {}]",
            bounds.0.x,
            bounds.1.x,
            bounds.0.y,
            bounds.1.y,
            bounds.0.z,
            bounds.1.z
        );

        let constraints = compute_node_constraints(&positions, mesh.node_kinds(), bounds, options);

        let triple_lines = match (options.smooth_triple_lines, mesh.node_kinds(), mesh.edges()) {
            (true, Some(kinds), Some(edges)) => {
                log::warn!("Triple-line smoothing is experimental");
                let adjacency = TripleLineAdjacency::build(positions.len(), edges, kinds)?;
                log::debug!(
                    "{} triple-line nodes with two neighbours",
                    adjacency.num_complete()
                );
                Some(adjacency)
            }
            _ => None,
        };

        let smoother = Self {
            faces: mesh.faces().to_vec(),
            velocity: DVector::zeros(3 * positions.len()),
            positions,
            constraints,
            triple_lines,
            time_step,
            history: QualityHistory::default(),
            next_step: options.start_iteration.max(1),
            final_step: options.iterations,
            parallel: options.parallel,
        };

        log::debug!(
            "MFE setup: {} nodes, {} triangles, {} constrained, dt = {}",
            smoother.positions.len(),
            smoother.faces.len(),
            smoother.constrained_nodes(),
            time_step
        );

        Ok(smoother)
    }

    /// Step the next call to [`step`](Self::step) will run, if any.
    pub fn next_step(&self) -> Option<usize> {
        (self.next_step <= self.final_step).then_some(self.next_step)
    }

    /// Iterations left in the schedule.
    pub fn remaining(&self) -> usize {
        (self.final_step + 1).saturating_sub(self.next_step)
    }

    /// Time step in use.
    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    /// Current double precision positions.
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Triangle list.
    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    /// Per-node axis locks.
    pub fn constraints(&self) -> &[AxisLock] {
        &self.constraints
    }

    /// Number of nodes with at least one locked axis.
    pub fn constrained_nodes(&self) -> usize {
        self.constraints.iter().filter(|c| !c.is_free()).count()
    }

    /// Triple-line adjacency, when triple-line smoothing is on.
    pub fn triple_lines(&self) -> Option<&TripleLineAdjacency> {
        self.triple_lines.as_ref()
    }

    /// Run one iteration. Returns `None` once the schedule is exhausted.
    pub fn step(&mut self) -> Option<IterationDiagnostics> {
        let step = self.next_step()?;

        let weights = ForceWeights::for_step(step, self.final_step);
        let system = assembly::assemble(
            &self.positions,
            &self.faces,
            &self.constraints,
            weights,
            self.triple_lines.as_ref(),
            self.parallel,
        );
        if system.dropped > 0 {
            log::warn!("Dropped {} non-finite force terms", system.dropped);
        }

        let k = CsrMatrix::from_sparse(&system.stiffness);
        let solve = conjugate_residual(
            &k,
            &mut self.velocity,
            &system.force,
            SOLVER_MAX_ITERATIONS,
            SOLVER_TOLERANCE,
        );
        if solve.is_converged() {
            log::debug!("Velocity solve converged in {} iterations", solve.iterations);
        } else {
            log::warn!(
                "Velocity solve did not converge in {} iterations (relative residual {:e})",
                solve.iterations,
                solve.relative_residual
            );
        }

        let quality = system.quality.finish();
        self.history.push(quality.q_max);
        let q_max_rolling = self.history.rolling_average();

        let skipped_updates = self.integrate();
        if skipped_updates > 0 {
            log::warn!("Skipped {} coordinate updates with |dt * x| > 1", skipped_updates);
        }

        log::info!(
            "Iteration: {} Q_max = {:.4} Q_ave = {:.4} rolling Q_max = {} min angle [{:.2}, {:.2}] ave {:.2} deg",
            step,
            quality.q_max,
            quality.q_ave,
            q_max_rolling.map_or_else(|| "-".to_string(), |q| format!("{q:.4}")),
            quality.min_angle_min.to_degrees(),
            quality.min_angle_max.to_degrees(),
            quality.min_angle_ave.to_degrees()
        );

        self.next_step += 1;

        Some(IterationDiagnostics {
            step,
            quality,
            q_max_rolling,
            dropped_force_terms: system.dropped,
            skipped_updates,
            solve,
        })
    }

    /// Advance positions by `dt * x`, returning the number of skipped updates.
    ///
    /// Locked axes use a zero step. `|dt * x| == 1` and `NaN` velocities fall
    /// through both branches and leave the coordinate alone.
    fn integrate(&mut self) -> usize {
        let dt = self.time_step;
        let mut skipped = 0;

        for (node, (p, lock)) in self.positions.iter_mut().zip(&self.constraints).enumerate() {
            for axis in 0..3 {
                let v = self.velocity[3 * node + axis];
                let displacement = (dt * v).abs();
                if displacement > 1.0 {
                    skipped += 1;
                } else if displacement < 1.0 && !lock.is_locked(axis) {
                    p[axis] += dt * v;
                }
            }
        }

        skipped
    }

    /// Copy the current positions into `mesh` in its storage precision.
    ///
    /// # Panics
    ///
    /// Panics if `mesh` does not have the vertex count this smoother was
    /// built from.
    pub fn write_back<T: CoordScalar>(&self, mesh: &mut SurfaceMesh<T>) {
        mesh.store_positions(&self.positions);
    }
}

/// Smooth a surface mesh in place.
///
/// See [`mfe_smooth_with_progress`].
pub fn mfe_smooth<T: CoordScalar>(
    mesh: &mut SurfaceMesh<T>,
    options: &SmoothOptions,
) -> Result<SmoothReport> {
    mfe_smooth_with_progress(mesh, options, &Progress::none(), &CancelFlag::new())
}

/// Smooth a surface mesh in place, reporting progress and polling for
/// cancellation.
///
/// Setup errors are returned before the mesh is touched. Cancellation is
/// checked before the constraint and triple-line setup, before the first
/// iteration and at the top of every iteration; on cancellation the positions
/// of all completed iterations are kept and the report has `cancelled` set.
///
/// # Errors
///
/// See [`MfeSmoother::new`].
pub fn mfe_smooth_with_progress<T: CoordScalar>(
    mesh: &mut SurfaceMesh<T>,
    options: &SmoothOptions,
    progress: &Progress,
    cancel: &CancelFlag,
) -> Result<SmoothReport> {
    mfe_smooth_with_observer(mesh, options, progress, cancel, |_, _| Ok(()))
}

/// Like [`mfe_smooth_with_progress`], calling `observer` after every
/// completed iteration with the smoother state and that iteration's
/// diagnostics (to write snapshots, say).
///
/// # Errors
///
/// See [`MfeSmoother::new`]. An error returned by `observer` aborts the run
/// and leaves the mesh untouched.
pub fn mfe_smooth_with_observer<T, F>(
    mesh: &mut SurfaceMesh<T>,
    options: &SmoothOptions,
    progress: &Progress,
    cancel: &CancelFlag,
    mut observer: F,
) -> Result<SmoothReport>
where
    T: CoordScalar,
    F: FnMut(&MfeSmoother, &IterationDiagnostics) -> Result<()>,
{
    check_setup(mesh, options)?;

    log::info!(
        "MFE smoothing: {} nodes, {} triangles, {} iterations",
        mesh.num_vertices(),
        mesh.num_faces(),
        options.scheduled_iterations()
    );

    let mut report = SmoothReport::default();
    if cancel.is_cancelled() {
        report.cancelled = true;
        return Ok(report);
    }

    let mut smoother = MfeSmoother::new(mesh, options)?;
    report.time_step = smoother.time_step();
    report.constrained_nodes = smoother.constrained_nodes();

    let total = smoother.remaining();
    while let Some(step) = smoother.next_step() {
        if cancel.is_cancelled() {
            report.cancelled = true;
            break;
        }
        progress.report(report.iterations_run, total, &format!("Iteration: {step}"));
        if let Some(diagnostics) = smoother.step() {
            observer(&smoother, &diagnostics)?;
            report.diagnostics.push(diagnostics);
            report.iterations_run += 1;
        }
    }

    if report.iterations_run > 0 {
        smoother.write_back(mesh);
    }
    if report.cancelled {
        log::info!("MFE smoothing cancelled after {} iterations", report.iterations_run);
    } else {
        progress.report(total, total, "Complete");
    }

    Ok(report)
}
