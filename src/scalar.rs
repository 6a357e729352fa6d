//! Coordinate scalar types.
//!
//! Vessel endpoints may be stored as `f32` or `f64`. Junction coordinates are
//! reported in the same type as the input, and exact point matching hashes the
//! raw bit patterns of the coordinates.

use std::fmt::Debug;

/// Trait for floating-point types that can be used as vessel coordinates.
///
/// This trait is implemented for `f32` and `f64`.
pub trait Scalar: nalgebra::Scalar + Copy + PartialOrd + Debug + Send + Sync + 'static {
    /// Hashable key for exact equality.
    ///
    /// Two values have the same key exactly when they compare equal, so
    /// `-0.0` and `0.0` share a key.
    fn exact_key(self) -> u64;

    /// Check that the value is neither NaN nor infinite.
    fn is_finite(self) -> bool;

    /// Widen to `f64`.
    fn to_f64(self) -> f64;
}

impl Scalar for f32 {
    #[inline]
    fn exact_key(self) -> u64 {
        // Adding 0.0 maps -0.0 to +0.0 and leaves every other value alone.
        u64::from((self + 0.0).to_bits())
    }

    #[inline]
    fn is_finite(self) -> bool {
        f32::is_finite(self)
    }

    #[inline]
    fn to_f64(self) -> f64 {
        f64::from(self)
    }
}

impl Scalar for f64 {
    #[inline]
    fn exact_key(self) -> u64 {
        (self + 0.0).to_bits()
    }

    #[inline]
    fn is_finite(self) -> bool {
        f64::is_finite(self)
    }

    #[inline]
    fn to_f64(self) -> f64 {
        self
    }
}

/// Exact hash key of a 3D point.
#[inline]
pub(crate) fn exact_point_key<T: Scalar>(p: &nalgebra::Point3<T>) -> [u64; 3] {
    [p.x.exact_key(), p.y.exact_key(), p.z.exact_key()]
}

/// Grid-cell key of a 3D point for cells of size `cell`.
#[inline]
pub(crate) fn grid_point_key<T: Scalar>(p: &nalgebra::Point3<T>, cell: f64) -> [i64; 3] {
    let q = |v: T| (v.to_f64() / cell).floor() as i64;
    [q(p.x), q(p.y), q(p.z)]
}

/// Euclidean distance between two points, widened to `f64`.
#[inline]
pub(crate) fn distance<T: Scalar>(a: &nalgebra::Point3<T>, b: &nalgebra::Point3<T>) -> f64 {
    let d = |u: T, v: T| u.to_f64() - v.to_f64();
    let (dx, dy, dz) = (d(a.x, b.x), d(a.y, b.y), d(a.z, b.z));
    (dx * dx + dy * dy + dz * dz).sqrt()
}
