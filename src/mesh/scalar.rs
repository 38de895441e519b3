//! Coordinate storage precision.
//!
//! Host pipelines commonly store vertex positions in single precision while the
//! smoothing engine needs double precision. [`CoordScalar`] abstracts the
//! storage type so that a [`SurfaceMesh`](super::SurfaceMesh) can hold either,
//! with an explicit widening copy on the way in and a narrowing copy on the way
//! out.

use std::fmt::Debug;

/// Trait for types that can be used as stored vertex coordinates.
///
/// This trait is implemented for `f32` and `f64`.
pub trait CoordScalar:
    Copy + Clone + PartialEq + PartialOrd + Debug + Default + Send + Sync + 'static
{
    /// Number of bits of the underlying floating point type.
    const BITS: u32;

    /// Widen to `f64`.
    fn to_f64(self) -> f64;

    /// Narrow (or copy) from `f64`.
    fn from_f64(v: f64) -> Self;
}

impl CoordScalar for f32 {
    const BITS: u32 = 32;

    #[inline]
    fn to_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v as f32
    }
}

impl CoordScalar for f64 {
    const BITS: u32 = 64;

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }

    #[inline]
    fn from_f64(v: f64) -> Self {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_f32_round_trip_is_exact() {
        for v in [0.0f32, 1.0, -3.25, 1.0e-7, 12345.678] {
            assert_eq!(f32::from_f64(v.to_f64()), v);
        }
    }

    #[test]
    fn test_f64_identity() {
        let v = 0.1_f64 + 0.2;
        assert_eq!(f64::from_f64(v), v);
        assert_eq!(v.to_f64(), v);
        assert_eq!(<f64 as CoordScalar>::BITS, 64);
    }
}
