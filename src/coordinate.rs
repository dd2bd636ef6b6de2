//! Numeric types that can be stored in a [`KdTree`](crate::KdTree).
//!
//! Integer differences are taken in a wider integer type before converting
//! to `f64`, so distances between extreme `i64` values never overflow.

use std::cmp::Ordering;
use std::fmt::{Debug, Display};

/// A single coordinate value.
///
/// Implemented for `i32`, `i64`, `f32` and `f64`.
pub trait Coordinate: Copy + PartialOrd + Debug + Display + Send + Sync + 'static {
    /// Tag written into the persisted header
    const TYPE_TAG: u8;
    /// Encoded size in bytes
    const BYTES: usize;

    /// Signed difference `self - other` as `f64`
    fn delta(self, other: Self) -> f64;

    /// Whether the value can take part in distance computations
    fn is_valid(self) -> bool;

    /// Total order used when partitioning along an axis
    fn axis_cmp(&self, other: &Self) -> Ordering;

    /// Appends the little-endian encoding to `out`
    fn write_le(self, out: &mut Vec<u8>);

    /// Decodes a value from exactly [`Self::BYTES`] little-endian bytes.
    ///
    /// Returns `None` when `bytes` has the wrong length.
    fn read_le(bytes: &[u8]) -> Option<Self>;
}

macro_rules! int_coordinate {
    ($ty:ty, $wide:ty, $tag:expr) => {
        impl Coordinate for $ty {
            const TYPE_TAG: u8 = $tag;
            const BYTES: usize = size_of::<$ty>();

            #[inline]
            fn delta(self, other: Self) -> f64 {
                (<$wide>::from(self) - <$wide>::from(other)) as f64
            }

            #[inline]
            fn is_valid(self) -> bool {
                true
            }

            #[inline]
            fn axis_cmp(&self, other: &Self) -> Ordering {
                self.cmp(other)
            }

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Option<Self> {
                Some(Self::from_le_bytes(bytes.try_into().ok()?))
            }
        }
    };
}

macro_rules! float_coordinate {
    ($ty:ty, $tag:expr) => {
        impl Coordinate for $ty {
            const TYPE_TAG: u8 = $tag;
            const BYTES: usize = size_of::<$ty>();

            #[inline]
            fn delta(self, other: Self) -> f64 {
                f64::from(self) - f64::from(other)
            }

            #[inline]
            fn is_valid(self) -> bool {
                self.is_finite()
            }

            #[inline]
            fn axis_cmp(&self, other: &Self) -> Ordering {
                self.total_cmp(other)
            }

            fn write_le(self, out: &mut Vec<u8>) {
                out.extend_from_slice(&self.to_le_bytes());
            }

            fn read_le(bytes: &[u8]) -> Option<Self> {
                Some(Self::from_le_bytes(bytes.try_into().ok()?))
            }
        }
    };
}

int_coordinate!(i32, i64, 0x01);
int_coordinate!(i64, i128, 0x02);
float_coordinate!(f32, 0x11);
float_coordinate!(f64, 0x12);
