//! Quality bookkeeping for the smoothing loop.
//!
//! Nothing in here feeds back into the numerical result; the values are
//! returned to the caller and logged.

use std::collections::VecDeque;

use nalgebra::Point3;

use crate::geometry::{area, circularity, min_dihedral};
use crate::linalg::SolveReport;

/// Circularity above which a triangle is reported as poor.
pub const POOR_QUALITY: f64 = 100.0;

/// Number of recent `Q_max` values in the rolling average.
pub const HISTORY_LEN: usize = 10;

/// Shape statistics over a set of triangles.
///
/// Circularity is `R/r`-based (2 for an equilateral triangle, larger is
/// worse). Non-finite values from degenerate triangles are counted in
/// `non_finite` and left out of every other statistic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityStats {
    /// Number of triangles measured.
    pub triangles: usize,
    /// Largest finite circularity (0 if there is none).
    pub q_max: f64,
    /// Mean finite circularity (`NaN` if there is none).
    pub q_ave: f64,
    /// Triangles with circularity above [`POOR_QUALITY`].
    pub poor: usize,
    /// Triangles whose circularity is not finite.
    pub non_finite: usize,
    /// Smallest per-triangle minimum angle, radians.
    pub min_angle_min: f64,
    /// Largest per-triangle minimum angle, radians.
    pub min_angle_max: f64,
    /// Mean per-triangle minimum angle, radians.
    pub min_angle_ave: f64,
}

impl QualityStats {
    /// Measure every triangle of a mesh at the given positions.
    ///
    /// # Example
    ///
    /// ```
    /// use mfesmooth::algo::mfe::QualityStats;
    /// use nalgebra::Point3;
    ///
    /// let h = 3f64.sqrt() / 2.0;
    /// let positions = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), Point3::new(0.5, h, 0.0)];
    /// let stats = QualityStats::measure(&positions, &[[0, 1, 2]]);
    ///
    /// assert!((stats.q_max - 2.0).abs() < 1e-9);
    /// assert_eq!(stats.poor, 0);
    /// ```
    pub fn measure(positions: &[Point3<f64>], faces: &[[usize; 3]]) -> Self {
        let mut acc = QualityAccumulator::default();
        for &[a, b, c] in faces {
            let (p0, p1, p2) = (&positions[a], &positions[b], &positions[c]);
            let q = circularity(p0, p1, p2, area(p0, p1, p2));
            acc.add(q, min_dihedral(p0, p1, p2));
        }
        acc.finish()
    }
}

/// Running sums behind [`QualityStats`].
#[derive(Debug, Clone)]
pub(crate) struct QualityAccumulator {
    triangles: usize,
    q_max: f64,
    q_sum: f64,
    q_count: usize,
    poor: usize,
    non_finite: usize,
    angle_min: f64,
    angle_max: f64,
    angle_sum: f64,
    angle_count: usize,
}

impl Default for QualityAccumulator {
    fn default() -> Self {
        Self {
            triangles: 0,
            q_max: 0.0,
            q_sum: 0.0,
            q_count: 0,
            poor: 0,
            non_finite: 0,
            angle_min: f64::INFINITY,
            angle_max: f64::NEG_INFINITY,
            angle_sum: 0.0,
            angle_count: 0,
        }
    }
}

impl QualityAccumulator {
    pub(crate) fn add(&mut self, quality: f64, min_angle: f64) {
        self.triangles += 1;

        if quality.is_finite() {
            self.q_sum += quality;
            self.q_count += 1;
            self.q_max = self.q_max.max(quality);
            if quality > POOR_QUALITY {
                self.poor += 1;
            }
        } else {
            self.non_finite += 1;
        }

        if min_angle.is_finite() {
            self.angle_sum += min_angle;
            self.angle_count += 1;
            self.angle_min = self.angle_min.min(min_angle);
            self.angle_max = self.angle_max.max(min_angle);
        }
    }

    pub(crate) fn finish(&self) -> QualityStats {
        let mean = |sum: f64, count: usize| {
            if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            }
        };
        let (angle_min, angle_max) = if self.angle_count == 0 {
            (f64::NAN, f64::NAN)
        } else {
            (self.angle_min, self.angle_max)
        };

        QualityStats {
            triangles: self.triangles,
            q_max: self.q_max,
            q_ave: mean(self.q_sum, self.q_count),
            poor: self.poor,
            non_finite: self.non_finite,
            min_angle_min: angle_min,
            min_angle_max: angle_max,
            min_angle_ave: mean(self.angle_sum, self.angle_count),
        }
    }
}

/// Rolling window over the most recent `Q_max` values.
#[derive(Debug, Clone)]
pub struct QualityHistory {
    values: VecDeque<f64>,
    capacity: usize,
}

impl Default for QualityHistory {
    fn default() -> Self {
        Self::new(HISTORY_LEN)
    }
}

impl QualityHistory {
    /// Create an empty window of the given length.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "history window must not be empty");
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a value, dropping the oldest one once the window is full.
    pub fn push(&mut self, q_max: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(q_max);
    }

    /// Mean of the window, available once it is full.
    pub fn rolling_average(&self) -> Option<f64> {
        (self.values.len() == self.capacity)
            .then(|| self.values.iter().sum::<f64>() / self.capacity as f64)
    }

    /// Number of values currently held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value has been recorded.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// What happened during one smoothing iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationDiagnostics {
    /// Iteration number within `start_iteration..=iterations`.
    pub step: usize,
    /// Triangle quality at the start of the iteration.
    pub quality: QualityStats,
    /// Rolling average of the last [`HISTORY_LEN`] `Q_max` values.
    pub q_max_rolling: Option<f64>,
    /// Non-finite force terms that were left out of the assembly.
    pub dropped_force_terms: usize,
    /// Coordinate updates skipped by the step-size guard.
    pub skipped_updates: usize,
    /// Velocity solve outcome.
    pub solve: SolveReport,
}
