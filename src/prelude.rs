//! Prelude module for convenient imports
//!
//! This module re-exports the most commonly used types from the crate.
//! Users can import everything they need with:
//!
//! ```
//! use knn::prelude::*;
//! ```

pub use crate::{Coordinate, KdTree, KnnError, Metric, Neighbor, PointSet, knn};
