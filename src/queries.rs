//! Query implementations for [`KdTree`].
//!
//! All searches walk the implicit tree from the root, descend first into the
//! child on the query's side of each split, and only cross a split when the
//! plane distance could still beat the current worst candidate.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::trace;

use crate::coordinate::Coordinate;
use crate::error::{KnnError, Result};
use crate::kdtree::KdTree;
use crate::point_set::PointSet;

/// A query result: which point, and how far away it is.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    /// Insertion index of the point in the tree
    pub index: usize,
    /// Distance from the query under the tree's metric
    pub distance: f64,
}

impl Neighbor {
    /// Result order: by distance, then by index
    fn rank(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.index.cmp(&other.index))
    }
}

/// Heap entry ordered by [`Neighbor::rank`], so the heap top is the worst kept result
#[derive(Clone, Copy, Debug)]
struct Candidate(Neighbor);

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.rank(&other.0)
    }
}

/// Bounded max-heap holding the best `k` candidates seen so far
#[derive(Debug)]
struct KnnState {
    k: usize,
    heap: BinaryHeap<Candidate>,
    visited: usize,
}

impl KnnState {
    fn new(k: usize) -> Self {
        Self { k, heap: BinaryHeap::with_capacity(k + 1), visited: 0 }
    }

    fn offer(&mut self, neighbor: Neighbor) {
        self.visited += 1;
        if self.heap.len() < self.k {
            self.heap.push(Candidate(neighbor));
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if Candidate(neighbor) < *worst {
                *worst = Candidate(neighbor);
            }
        }
    }

    /// Whether a subtree at least `bound` away may still hold a result.
    /// Equal bounds are explored so index tie-breaking stays exact.
    fn admits(&self, bound: f64) -> bool {
        self.heap.len() < self.k || self.heap.peek().is_some_and(|worst| bound <= worst.0.distance)
    }

    fn into_sorted(self) -> Vec<Neighbor> {
        self.heap.into_sorted_vec().into_iter().map(|c| c.0).collect()
    }
}

impl<T: Coordinate> KdTree<T> {
    /// Finds the `k` points nearest to `query`, closest first.
    ///
    /// Returns fewer than `k` neighbors only when the tree holds fewer points.
    /// Equal distances are ordered by ascending index.
    ///
    /// # Errors
    /// `NotBuilt` before [`build`](Self::build), `DimensionMismatch` or
    /// `NonFiniteCoordinate` for a bad query.
    ///
    /// # Example
    /// ```
    /// use knn::{KdTree, PointSet};
    ///
    /// let train = PointSet::from_rows(&[[1_i64, 2], [3, 4], [5, 6], [7, 8], [9, 10], [5, 5]]).unwrap();
    /// let tree = KdTree::from_points(&train).unwrap();
    ///
    /// let found = tree.nearest_k(&[6, 6], 3).unwrap();
    /// let indices: Vec<usize> = found.iter().map(|n| n.index).collect();
    /// assert_eq!(indices, vec![2, 5, 3]);
    /// assert_eq!(found[0].distance, 1.0);
    /// ```
    pub fn nearest_k(&self, query: &[T], k: usize) -> Result<Vec<Neighbor>> {
        self.check_query(query)?;
        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let mut state = KnnState::new(k.min(self.len()));
        self.search_k(query, &mut state, 0, self.len(), 0);
        trace!("nearest_k(k={}): visited {} of {} points", k, state.visited, self.len());
        Ok(state.into_sorted())
    }

    /// Finds the `k` nearest points and writes their indices to `results`.
    ///
    /// `results` is cleared first and can be reused across queries.
    ///
    /// # Errors
    /// Same as [`nearest_k`](Self::nearest_k).
    pub fn query_nearest_k(&self, query: &[T], k: usize, results: &mut Vec<usize>) -> Result<()> {
        results.clear();
        results.extend(self.nearest_k(query, k)?.iter().map(|n| n.index));
        Ok(())
    }

    /// Returns the coordinates of the `k` nearest points, closest first.
    ///
    /// # Errors
    /// Same as [`nearest_k`](Self::nearest_k).
    ///
    /// # Example
    /// ```
    /// use knn::{KdTree, PointSet};
    ///
    /// let train = PointSet::from_rows(&[[1_i64, 2], [3, 4], [5, 6], [7, 8], [9, 10], [5, 5]]).unwrap();
    /// let tree = KdTree::from_points(&train).unwrap();
    /// let points = tree.k_nearest(&[6, 6], 3).unwrap();
    /// assert_eq!(points.as_slice(), &[5, 6, 5, 5, 7, 8]);
    /// ```
    pub fn k_nearest(&self, query: &[T], k: usize) -> Result<PointSet<T>> {
        let neighbors = self.nearest_k(query, k)?;
        let mut points = PointSet::empty(self.dim)?;
        for neighbor in &neighbors {
            points.push_row(self.row(self.slots[neighbor.index] as usize));
        }
        Ok(points)
    }

    /// Finds the single nearest point, or `None` for an empty tree.
    ///
    /// # Errors
    /// Same as [`nearest_k`](Self::nearest_k).
    pub fn nearest(&self, query: &[T]) -> Result<Option<Neighbor>> {
        Ok(self.nearest_k(query, 1)?.into_iter().next())
    }

    /// Finds every point within `radius` of `query` (inclusive), closest first.
    ///
    /// # Errors
    /// `InvalidRadius` for a negative or non-finite radius, plus the errors of
    /// [`nearest_k`](Self::nearest_k).
    pub fn within_radius(&self, query: &[T], radius: f64) -> Result<Vec<Neighbor>> {
        self.check_query(query)?;
        if !radius.is_finite() || radius < 0.0 {
            return Err(KnnError::InvalidRadius(radius));
        }

        let mut found = Vec::new();
        self.search_radius(query, radius, &mut found, 0, self.len(), 0);
        found.sort_by(Neighbor::rank);
        trace!("within_radius(r={}): {} of {} points", radius, found.len(), self.len());
        Ok(found)
    }

    /// Finds every point within `radius` and writes their indices to `results`.
    ///
    /// # Errors
    /// Same as [`within_radius`](Self::within_radius).
    pub fn query_radius(&self, query: &[T], radius: f64, results: &mut Vec<usize>) -> Result<()> {
        results.clear();
        results.extend(self.within_radius(query, radius)?.iter().map(|n| n.index));
        Ok(())
    }

    /// Runs [`nearest_k`](Self::nearest_k) for every row of `queries`.
    ///
    /// Queries run on the rayon thread pool when the `parallel` feature is
    /// enabled. The tree is only borrowed immutably.
    ///
    /// # Errors
    /// `DimensionMismatch` when `queries` has a different dimension, or the
    /// first error any single query produces.
    pub fn nearest_k_batch(&self, queries: &PointSet<T>, k: usize) -> Result<Vec<Vec<Neighbor>>> {
        if queries.dim() != self.dim {
            return Err(KnnError::DimensionMismatch { expected: self.dim, got: queries.dim() });
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::{ParallelIterator, ParallelSlice};
            queries
                .as_slice()
                .par_chunks_exact(self.dim)
                .map(|query| self.nearest_k(query, k))
                .collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            queries.rows().map(|query| self.nearest_k(query, k)).collect()
        }
    }

    // --- Private helpers ---

    fn check_query(&self, query: &[T]) -> Result<()> {
        if !self.built {
            return Err(KnnError::NotBuilt);
        }
        self.check_point(query)
    }

    /// Signed offset of the query from the split of slot `mid`, and the next axis
    #[inline]
    fn split_offset(&self, query: &[T], mid: usize, axis: usize) -> (f64, usize) {
        let delta = query[axis].delta(self.row(mid)[axis]);
        (delta, (axis + 1) % self.dim)
    }

    fn search_k(&self, query: &[T], state: &mut KnnState, begin: usize, end: usize, axis: usize) {
        if begin >= end {
            return;
        }
        let mid = (begin + end) / 2;
        state.offer(Neighbor {
            index: self.id(mid),
            distance: self.metric.distance(self.row(mid), query),
        });
        if end - begin == 1 {
            return;
        }

        let (delta, next_axis) = self.split_offset(query, mid, axis);
        let (near, far) = if delta < 0.0 {
            ((begin, mid), (mid + 1, end))
        } else {
            ((mid + 1, end), (begin, mid))
        };

        self.search_k(query, state, near.0, near.1, next_axis);
        if state.admits(self.metric.plane_distance(delta)) {
            self.search_k(query, state, far.0, far.1, next_axis);
        }
    }

    fn search_radius(
        &self,
        query: &[T],
        radius: f64,
        found: &mut Vec<Neighbor>,
        begin: usize,
        end: usize,
        axis: usize,
    ) {
        if begin >= end {
            return;
        }
        let mid = (begin + end) / 2;
        let distance = self.metric.distance(self.row(mid), query);
        if distance <= radius {
            found.push(Neighbor { index: self.id(mid), distance });
        }
        if end - begin == 1 {
            return;
        }

        let (delta, next_axis) = self.split_offset(query, mid, axis);
        let crosses = self.metric.plane_distance(delta) <= radius;
        if delta < 0.0 || crosses {
            self.search_radius(query, radius, found, begin, mid, next_axis);
        }
        if delta >= 0.0 || crosses {
            self.search_radius(query, radius, found, mid + 1, end, next_axis);
        }
    }
}

/// One-shot k-nearest search: builds a Euclidean tree over `train` and
/// returns the `k` training points closest to `query`, nearest first.
///
/// # Errors
/// `EmptyTrainingSet`, or any error from building or querying the tree.
///
/// # Example
/// ```
/// use knn::PointSet;
///
/// let train = PointSet::from_rows(&[[1_i64, 2], [3, 4], [5, 6], [7, 8], [9, 10], [5, 5]]).unwrap();
/// let nearest = knn::knn(&train, &[6, 6], 3).unwrap();
/// assert_eq!(nearest.to_string(), "[[5 6]\n [5 5]\n [7 8]]");
/// ```
pub fn knn<T: Coordinate>(train: &PointSet<T>, query: &[T], k: usize) -> Result<PointSet<T>> {
    KdTree::from_points(train)?.k_nearest(query, k)
}
