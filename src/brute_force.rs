//! Reference linear-scan implementation.

use crate::coordinate::Coordinate;
use crate::metric::Metric;
use crate::queries::Neighbor;

/// Linear-scan nearest-neighbor index
///
/// Measures the query against every stored point. Used as the reference the
/// KD-tree is checked against in tests and benchmarks; it follows the same
/// result ordering (distance, then index).
///
/// # Examples
/// ```
/// use knn::{BruteForce, Metric};
///
/// let mut scan = BruteForce::new(2, Metric::Euclidean);
/// scan.add(&[0.0, 0.0]);
/// scan.add(&[3.0, 4.0]);
///
/// let found = scan.nearest_k(&[2.5, 3.5], 1);
/// assert_eq!(found[0].index, 1);
/// ```
#[doc(hidden)]
#[derive(Clone, Debug)]
pub struct BruteForce<T> {
    points: Vec<T>,
    dim: usize,
    metric: Metric,
}

impl<T: Coordinate> BruteForce<T> {
    /// Creates an empty scan over points of dimension `dim`
    pub fn new(dim: usize, metric: Metric) -> Self {
        Self { points: Vec::new(), dim: dim.max(1), metric }
    }

    /// Appends a point; its index is its insertion position
    ///
    /// # Panics
    /// When `point` does not have `dim` coordinates.
    pub fn add(&mut self, point: &[T]) {
        assert_eq!(point.len(), self.dim, "point dimension must match the scan");
        self.points.extend_from_slice(point);
    }

    /// Returns the number of points
    pub fn len(&self) -> usize {
        self.points.len() / self.dim
    }

    /// Returns whether no points were added
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The `k` nearest points, closest first
    pub fn nearest_k(&self, query: &[T], k: usize) -> Vec<Neighbor> {
        let mut all = self.distances(query);
        all.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)));
        all.truncate(k);
        all
    }

    /// Every point within `radius` (inclusive), closest first
    pub fn within_radius(&self, query: &[T], radius: f64) -> Vec<Neighbor> {
        let mut all = self.distances(query);
        all.retain(|n| n.distance <= radius);
        all.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)));
        all
    }

    fn distances(&self, query: &[T]) -> Vec<Neighbor> {
        self.points
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(index, point)| Neighbor { index, distance: self.metric.distance(point, query) })
            .collect()
    }
}
