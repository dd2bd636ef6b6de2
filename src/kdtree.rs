//! Static KD-tree over fixed-dimension points.
//!
//! Points live in a single row-major buffer. `build()` reorders that buffer
//! into an implicit balanced tree, so no child pointers are stored:
//!
//! - the node for slot range `[begin, end)` is the point at `mid = (begin + end) / 2`
//! - its left subtree is `[begin, mid)`, its right subtree `[mid + 1, end)`
//! - the split axis of a node at depth `d` is `d % dim`
//!
//! Every point on the left of a node is `<=` the node on its axis, and every
//! point on the right is `>=`. A parallel index array remembers where each
//! point came from, so results are reported in insertion order indices.

use std::cmp::Ordering;

use log::debug;

use crate::coordinate::Coordinate;
use crate::error::{KnnError, Result};
use crate::metric::Metric;
use crate::point_set::PointSet;

/// Static KD-tree for nearest-neighbor queries.
///
/// # Example
/// ```
/// use knn::KdTree;
///
/// let mut tree = KdTree::new(2).unwrap();
/// tree.add(&[1_i64, 2]).unwrap();
/// tree.add(&[3, 4]).unwrap();
/// tree.add(&[5, 5]).unwrap();
/// tree.build();
///
/// let neighbors = tree.nearest_k(&[6, 6], 2).unwrap();
/// assert_eq!(neighbors[0].index, 2);
/// assert_eq!(neighbors[1].index, 1);
/// ```
#[derive(Clone, Debug)]
pub struct KdTree<T> {
    /// Row-major coordinates; tree order once built
    pub(crate) points: Vec<T>,
    /// Original index of the point in each slot
    pub(crate) ids: Vec<u32>,
    /// Slot holding each original index (inverse of `ids`)
    pub(crate) slots: Vec<u32>,
    /// Coordinates per point
    pub(crate) dim: usize,
    /// Distance used by queries
    pub(crate) metric: Metric,
    /// Whether `points` is in tree order
    pub(crate) built: bool,
}

impl<T: Coordinate> KdTree<T> {
    /// Creates an empty, unbuilt tree for points of dimension `dim`.
    ///
    /// # Errors
    /// `ZeroDimension` when `dim` is 0.
    pub fn new(dim: usize) -> Result<Self> {
        Self::with_capacity(dim, 0)
    }

    /// Creates an empty tree with room for `capacity` points.
    ///
    /// # Errors
    /// `ZeroDimension` when `dim` is 0.
    pub fn with_capacity(dim: usize, capacity: usize) -> Result<Self> {
        if dim == 0 {
            return Err(KnnError::ZeroDimension);
        }
        Ok(Self {
            points: Vec::with_capacity(capacity * dim),
            ids: Vec::with_capacity(capacity),
            slots: Vec::with_capacity(capacity),
            dim,
            metric: Metric::default(),
            built: false,
        })
    }

    /// Sets the distance metric used by queries.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Builds a Euclidean tree over every row of `train`.
    ///
    /// # Errors
    /// `EmptyTrainingSet` for zero rows, plus anything [`add`](Self::add) rejects.
    ///
    /// # Example
    /// ```
    /// use knn::{KdTree, PointSet};
    ///
    /// let train = PointSet::from_rows(&[[1_i64, 2], [3, 4], [5, 6]]).unwrap();
    /// let tree = KdTree::from_points(&train).unwrap();
    /// assert!(tree.is_built());
    /// assert_eq!(tree.len(), 3);
    /// ```
    pub fn from_points(train: &PointSet<T>) -> Result<Self> {
        if train.is_empty() {
            return Err(KnnError::EmptyTrainingSet);
        }
        let mut tree = Self::with_capacity(train.dim(), train.len())?;
        for row in train.rows() {
            let _index = tree.add(row)?;
        }
        tree.build();
        Ok(tree)
    }

    /// Appends a point and returns its index.
    ///
    /// Adding to a built tree marks it unbuilt; call [`build`](Self::build)
    /// again before querying.
    ///
    /// # Errors
    /// `DimensionMismatch` for a wrong-length point, `NonFiniteCoordinate`
    /// for NaN or infinite values, `TooManyPoints` past `u32::MAX` points.
    pub fn add(&mut self, point: &[T]) -> Result<usize> {
        self.check_point(point)?;
        let index = self.ids.len();
        let id = u32::try_from(index).map_err(|_| KnnError::TooManyPoints(index))?;

        self.points.extend_from_slice(point);
        self.ids.push(id);
        self.slots.push(id);
        self.built = false;
        Ok(index)
    }

    /// Builds the KD-tree index.
    ///
    /// Must be called after adding points and before querying. Building is
    /// O(n log n): each level runs a linear-time median selection over its
    /// slot ranges. Calling it on an empty tree or more than once is fine.
    pub fn build(&mut self) {
        let num_items = self.len();
        if num_items > 1 {
            self.build_range(0, num_items, 0);
        }
        for (slot, &id) in self.ids.iter().enumerate() {
            // `add` keeps the point count within u32
            self.slots[id as usize] = slot as u32;
        }
        self.built = true;
        debug!(
            "built kd-tree: {} points, {} dimensions, depth {}",
            num_items,
            self.dim,
            tree_depth(num_items)
        );
    }

    /// Returns the number of points
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns whether the tree is empty
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Coordinates per point
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Distance metric used by queries
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Whether the tree can be queried
    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Coordinates of the point with the given insertion index
    pub fn point(&self, index: usize) -> Option<&[T]> {
        let slot = *self.slots.get(index)? as usize;
        Some(self.row(slot))
    }

    // --- Crate helpers ---

    #[inline]
    pub(crate) fn row(&self, slot: usize) -> &[T] {
        &self.points[slot * self.dim..(slot + 1) * self.dim]
    }

    #[inline]
    pub(crate) fn id(&self, slot: usize) -> usize {
        self.ids[slot] as usize
    }

    /// Validates length and finiteness of a point or query
    pub(crate) fn check_point(&self, point: &[T]) -> Result<()> {
        if point.len() != self.dim {
            return Err(KnnError::DimensionMismatch { expected: self.dim, got: point.len() });
        }
        match point.iter().position(|v| !v.is_valid()) {
            Some(axis) => Err(KnnError::NonFiniteCoordinate { axis }),
            None => Ok(()),
        }
    }

    /// Whether every node splits its subtrees on its axis: left `<=`, right `>=`.
    /// O(n log n); used to vet trees that were not built here.
    pub(crate) fn split_order_holds(&self) -> bool {
        self.subtree_order_holds(0, self.len(), 0)
    }

    fn subtree_order_holds(&self, begin: usize, end: usize, axis: usize) -> bool {
        if end - begin <= 1 {
            return true;
        }
        let mid = (begin + end) / 2;
        let split = self.coord(mid, axis);
        let left_ok = (begin..mid).all(|slot| self.coord(slot, axis).axis_cmp(&split) != Ordering::Greater);
        let right_ok = (mid + 1..end).all(|slot| self.coord(slot, axis).axis_cmp(&split) != Ordering::Less);
        let next_axis = (axis + 1) % self.dim;
        left_ok
            && right_ok
            && self.subtree_order_holds(begin, mid, next_axis)
            && self.subtree_order_holds(mid + 1, end, next_axis)
    }

    // --- Construction ---

    /// Places the median of `[begin, end)` at its middle slot, then recurses
    fn build_range(&mut self, begin: usize, end: usize, axis: usize) {
        if end - begin <= 1 {
            return;
        }
        let mid = (begin + end) / 2;
        self.select(begin, end, mid, axis);

        let next_axis = (axis + 1) % self.dim;
        self.build_range(begin, mid, next_axis);
        self.build_range(mid + 1, end, next_axis);
    }

    /// Quickselect: moves the `nth` smallest point on `axis` into slot `nth`,
    /// with smaller-or-equal points before it and greater-or-equal after.
    ///
    /// Uses a three-way partition so runs of equal coordinates finish in one pass.
    fn select(&mut self, mut begin: usize, mut end: usize, nth: usize, axis: usize) {
        while end - begin > 1 {
            let pivot = self.median_of_three(begin, end - 1, axis);
            let (mut lt, mut i, mut gt) = (begin, begin, end);

            while i < gt {
                match self.coord(i, axis).axis_cmp(&pivot) {
                    Ordering::Less => {
                        self.swap_elements(lt, i);
                        lt += 1;
                        i += 1;
                    }
                    Ordering::Greater => {
                        gt -= 1;
                        self.swap_elements(i, gt);
                    }
                    Ordering::Equal => i += 1,
                }
            }

            if nth < lt {
                end = lt;
            } else if nth >= gt {
                begin = gt;
            } else {
                return;
            }
        }
    }

    /// Median of first, middle and last coordinate on `axis`, as pivot value
    fn median_of_three(&self, left: usize, right: usize, axis: usize) -> T {
        let a = self.coord(left, axis);
        let b = self.coord((left + right) / 2, axis);
        let c = self.coord(right, axis);

        let (lo, hi) = if a.axis_cmp(&b) == Ordering::Greater { (b, a) } else { (a, b) };
        if c.axis_cmp(&lo) == Ordering::Less {
            lo
        } else if c.axis_cmp(&hi) == Ordering::Greater {
            hi
        } else {
            c
        }
    }

    #[inline]
    fn coord(&self, slot: usize, axis: usize) -> T {
        self.points[slot * self.dim + axis]
    }

    /// Swap two slots (coordinates and indices)
    fn swap_elements(&mut self, left: usize, right: usize) {
        if left == right {
            return;
        }
        for axis in 0..self.dim {
            self.points.swap(left * self.dim + axis, right * self.dim + axis);
        }
        self.ids.swap(left, right);
    }
}

/// Levels in an implicit tree over `n` points
fn tree_depth(n: usize) -> u32 {
    usize::BITS - n.leading_zeros()
}
