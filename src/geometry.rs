//! Geometric primitives over nodes, triangles and edges.
//!
//! All functions are pure and operate on double precision points. None of them
//! reject degenerate input: a zero-area triangle yields `inf`/`NaN` where a
//! division by its area occurs, and callers decide what to do with that.

use nalgebra::{Point3, Vector3};

use crate::mesh::Edge;

/// Euclidean distance between two nodes.
#[inline]
pub fn distance(n0: &Point3<f64>, n1: &Point3<f64>) -> f64 {
    (n0 - n1).norm()
}

/// Area of the triangle `(n0, n1, n2)`.
#[inline]
pub fn area(n0: &Point3<f64>, n1: &Point3<f64>, n2: &Point3<f64>) -> f64 {
    0.5 * (n1 - n0).cross(&(n2 - n0)).norm()
}

/// Unit normal of the triangle `(n0, n1, n2)`.
///
/// For a degenerate triangle the cross product is exactly zero and is returned
/// as-is.
pub fn normal(n0: &Point3<f64>, n1: &Point3<f64>, n2: &Point3<f64>) -> Vector3<f64> {
    let n = (n1 - n0).cross(&(n2 - n0));
    let norm = n.norm();
    if norm > 0.0 {
        n / norm
    } else {
        n
    }
}

/// Ratio of the longest to the shortest edge.
pub fn aspect(n0: &Point3<f64>, n1: &Point3<f64>, n2: &Point3<f64>) -> f64 {
    let a = distance(n0, n1);
    let b = distance(n1, n2);
    let c = distance(n2, n0);
    a.max(b).max(c) / a.min(b).min(c)
}

/// Circularity quality of a triangle with precomputed `area`.
///
/// Ratio of circumradius `abc / 4A` to inradius `A / s`, with `s` the
/// semi-perimeter. An equilateral triangle scores 2; larger is worse.
pub fn circularity(n0: &Point3<f64>, n1: &Point3<f64>, n2: &Point3<f64>, area: f64) -> f64 {
    let a = distance(n0, n1);
    let b = distance(n1, n2);
    let c = distance(n2, n0);
    let s = 0.5 * (a + b + c);
    let inradius = area / s;
    let circumradius = a * b * c / 4.0 / area;
    circumradius / inradius
}

/// Smallest interior angle of a triangle, in radians.
///
/// Cosines are clamped to `[-1, 1]` before `acos`.
pub fn min_dihedral(n0: &Point3<f64>, n1: &Point3<f64>, n2: &Point3<f64>) -> f64 {
    let corners = [(n0, n1, n2), (n1, n2, n0), (n2, n0, n1)];
    corners
        .iter()
        .map(|(apex, p, q)| {
            let u = (*p - *apex).normalize();
            let v = (*q - *apex).normalize();
            u.dot(&v).clamp(-1.0, 1.0).acos()
        })
        .fold(f64::INFINITY, f64::min)
}

/// Length of an edge, looked up in a node array.
#[inline]
pub fn edge_length(positions: &[Point3<f64>], edge: &Edge) -> f64 {
    distance(&positions[edge.verts[0]], &positions[edge.verts[1]])
}

/// Direction along which the curvature of the polyline `n0 - n1 - n2` points
/// at `n1`.
#[inline]
pub fn line_curvature_direction(
    n0: &Point3<f64>,
    n1: &Point3<f64>,
    n2: &Point3<f64>,
) -> Vector3<f64> {
    2.0 * n1.coords - n2.coords - n0.coords
}

/// Discrete curvature of the polyline `n0 - n1 - n2` at `n1`.
///
/// Turning angle at `n1` divided by the mean length of the two segments.
pub fn line_curvature(n0: &Point3<f64>, n1: &Point3<f64>, n2: &Point3<f64>) -> f64 {
    let d1 = distance(n0, n1);
    let d2 = distance(n1, n2);
    let cos = ((n1 - n0).dot(&(n2 - n1)) / d1 / d2).clamp(-1.0, 1.0);
    2.0 * cos.acos() / (d1 + d2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::EdgeKind;
    use std::f64::consts::PI;

    fn right_triangle() -> [Point3<f64>; 3] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]
    }

    fn equilateral() -> [Point3<f64>; 3] {
        [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 3.0_f64.sqrt() / 2.0, 0.0),
        ]
    }

    #[test]
    fn test_distance() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(4.0, 6.0, 3.0);
        assert!((distance(&a, &b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_area_and_normal() {
        let [a, b, c] = right_triangle();
        assert!((area(&a, &b, &c) - 0.5).abs() < 1e-15);
        let n = normal(&a, &b, &c);
        assert!((n - Vector3::new(0.0, 0.0, 1.0)).norm() < 1e-15);
        // Winding flips the normal.
        assert!((normal(&a, &c, &b) + n).norm() < 1e-15);
    }

    #[test]
    fn test_degenerate_normal_is_zero() {
        let a = Point3::new(1.0, 1.0, 1.0);
        let b = Point3::new(2.0, 2.0, 2.0);
        assert_eq!(normal(&a, &a, &b), Vector3::zeros());
        assert_eq!(area(&a, &a, &b), 0.0);
    }

    #[test]
    fn test_aspect() {
        let [a, b, c] = right_triangle();
        assert!((aspect(&a, &b, &c) - 2.0_f64.sqrt()).abs() < 1e-12);
        let [a, b, c] = equilateral();
        assert!((aspect(&a, &b, &c) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_circularity() {
        let [a, b, c] = equilateral();
        let q = circularity(&a, &b, &c, area(&a, &b, &c));
        assert!((q - 2.0).abs() < 1e-12, "equilateral circularity = {}", q);

        let [a, b, c] = right_triangle();
        let q_right = circularity(&a, &b, &c, area(&a, &b, &c));
        assert!(q_right.is_finite());
        assert!(q_right > q);
    }

    #[test]
    fn test_circularity_degenerate_is_non_finite() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let q = circularity(&a, &a, &b, area(&a, &a, &b));
        assert!(!q.is_finite());
    }

    #[test]
    fn test_min_dihedral() {
        let [a, b, c] = equilateral();
        assert!((min_dihedral(&a, &b, &c) - PI / 3.0).abs() < 1e-12);
        let [a, b, c] = right_triangle();
        assert!((min_dihedral(&a, &b, &c) - PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_min_dihedral_collinear() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 0.0);
        assert!(min_dihedral(&a, &b, &c).abs() < 1e-12);
    }

    #[test]
    fn test_edge_length() {
        let [a, b, c] = right_triangle();
        let positions = vec![a, b, c];
        let e = Edge::new(1, 2, EdgeKind::ORDINARY);
        assert!((edge_length(&positions, &e) - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_line_curvature() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 0.0);
        assert!(line_curvature(&a, &b, &c).abs() < 1e-12);
        assert_eq!(line_curvature_direction(&a, &b, &c), Vector3::zeros());

        let bent = Point3::new(1.0, 1.0, 0.0);
        // Right-angle turn over two unit-length segments.
        assert!((line_curvature(&a, &b, &bent) - PI / 2.0).abs() < 1e-12);
        assert_eq!(
            line_curvature_direction(&a, &b, &bent),
            Vector3::new(1.0, -1.0, 0.0)
        );
    }
}
