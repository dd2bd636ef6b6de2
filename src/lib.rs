//! # knn - static KD-tree for nearest-neighbor search
//!
//! A Rust library providing a compact KD-tree over fixed-dimension points,
//! answering k-nearest-neighbor and radius queries.
//!
//! ## Features
//!
//! - **Implicit layout**: points are reordered into a balanced tree in place, no child pointers
//! - **Median splits**: quickselect on a cycling axis gives a tree of depth `ceil(log2(n + 1))`
//! - **Pruned search**: subtrees are skipped once the splitting plane is farther than the worst kept result
//! - **Deterministic results**: nearest first, equal distances ordered by index
//! - **Several metrics**: Euclidean, squared Euclidean, Manhattan and Chebyshev
//! - **Save/load**: built trees serialize to a small binary format
//!
//! ## Quick Start
//!
//! ```rust
//! use knn::prelude::*;
//!
//! let train = PointSet::from_rows(&[[1_i64, 2], [3, 4], [5, 6], [7, 8], [9, 10], [5, 5]]).unwrap();
//!
//! // Build the index once
//! let tree = KdTree::from_points(&train).unwrap();
//!
//! // Three nearest training points to (6, 6), nearest first
//! let nearest = tree.k_nearest(&[6, 6], 3).unwrap();
//! println!("{nearest}");
//! // Output:
//! // [[5 6]
//! //  [5 5]
//! //  [7 8]]
//! assert_eq!(nearest.as_slice(), &[5, 6, 5, 5, 7, 8]);
//!
//! // Indices and distances are available too
//! let mut results = Vec::new();
//! tree.query_nearest_k(&[6, 6], 3, &mut results).unwrap();
//! assert_eq!(results, vec![2, 5, 3]);
//! ```
//!
//! Points can also be added one at a time; the tree must then be built
//! before it is queried:
//!
//! ```rust
//! use knn::prelude::*;
//!
//! let mut tree = KdTree::new(3).unwrap().with_metric(Metric::Manhattan);
//! tree.add(&[0.0, 0.0, 0.0]).unwrap();
//! tree.add(&[1.0, 1.0, 1.0]).unwrap();
//! tree.build();
//!
//! let hits = tree.within_radius(&[0.0, 0.0, 0.5], 1.0).unwrap();
//! assert_eq!(hits.len(), 1);
//! ```

pub mod brute_force;
pub mod coordinate;
pub mod error;
pub mod kdtree;
pub mod metric;
pub mod persist;
pub mod point_set;
pub mod prelude;
pub mod queries;

#[cfg(test)]
mod integration_test;

#[doc(hidden)]
pub use brute_force::BruteForce;
pub use coordinate::Coordinate;
pub use error::{KnnError, Result};
pub use kdtree::KdTree;
pub use metric::Metric;
pub use point_set::PointSet;
pub use queries::{Neighbor, knn};
