//! Flat row-major point matrix used for training sets and query results.

use std::fmt;
use std::slice::ChunksExact;

use crate::coordinate::Coordinate;
use crate::error::{KnnError, Result};

/// A set of points with a fixed dimension, stored row-major in one buffer.
///
/// # Example
/// ```
/// use knn::PointSet;
///
/// let train = PointSet::from_rows(&[[1_i64, 2], [3, 4], [5, 6]]).unwrap();
/// assert_eq!(train.len(), 3);
/// assert_eq!(train.dim(), 2);
/// assert_eq!(train.row(1), Some(&[3_i64, 4][..]));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct PointSet<T> {
    data: Vec<T>,
    dim: usize,
}

impl<T: Coordinate> PointSet<T> {
    /// Wraps a flat row-major coordinate buffer.
    ///
    /// # Errors
    /// `ZeroDimension` when `dim` is 0, `RaggedPoints` when `data` does not
    /// split into whole rows.
    pub fn new(data: Vec<T>, dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(KnnError::ZeroDimension);
        }
        if data.len() % dim != 0 {
            return Err(KnnError::RaggedPoints { len: data.len(), dim });
        }
        Ok(Self { data, dim })
    }

    /// An empty point set of the given dimension.
    ///
    /// # Errors
    /// `ZeroDimension` when `dim` is 0.
    pub fn empty(dim: usize) -> Result<Self> {
        Self::new(Vec::new(), dim)
    }

    /// Builds a point set from fixed-size rows.
    ///
    /// # Errors
    /// `ZeroDimension` when `D` is 0.
    pub fn from_rows<const D: usize>(rows: &[[T; D]]) -> Result<Self> {
        Self::new(rows.iter().flatten().copied().collect(), D)
    }

    /// Builds a point set from variable-length rows that must all agree.
    ///
    /// An empty slice yields an empty set of dimension 1.
    ///
    /// # Errors
    /// `ZeroDimension` for zero-width rows, `DimensionMismatch` when a row
    /// differs in length from the first.
    pub fn from_vecs(rows: &[Vec<T>]) -> Result<Self> {
        let dim = rows.first().map_or(1, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * dim);
        for row in rows {
            if row.len() != dim {
                return Err(KnnError::DimensionMismatch { expected: dim, got: row.len() });
            }
            data.extend_from_slice(row);
        }
        Self::new(data, dim)
    }

    /// Number of points
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    /// Whether the set holds no points
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Coordinates per point
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Coordinates of point `index`
    pub fn row(&self, index: usize) -> Option<&[T]> {
        let start = index.checked_mul(self.dim)?;
        self.data.get(start..start.checked_add(self.dim)?)
    }

    /// Iterates over the points in order
    pub fn rows(&self) -> ChunksExact<'_, T> {
        self.data.chunks_exact(self.dim)
    }

    /// The flat row-major buffer
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consumes the set and returns the flat buffer
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    pub(crate) fn push_row(&mut self, row: &[T]) {
        debug_assert_eq!(row.len(), self.dim, "row width must match the set dimension");
        self.data.extend_from_slice(row);
    }
}

/// Prints the matrix the way numpy does: `[[5 6]\n [5 5]]`.
impl<T: Coordinate> fmt::Display for PointSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, row) in self.rows().enumerate() {
            if i > 0 {
                f.write_str("\n ")?;
            }
            f.write_str("[")?;
            for (j, value) in row.iter().enumerate() {
                if j > 0 {
                    f.write_str(" ")?;
                }
                write!(f, "{value}")?;
            }
            f.write_str("]")?;
        }
        f.write_str("]")
    }
}
