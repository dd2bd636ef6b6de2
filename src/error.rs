//! Error types for KD-tree construction, queries and persistence

use thiserror::Error;

/// Main error type for `knn` operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum KnnError {
    /// Points must have at least one coordinate
    #[error("dimension must be at least 1")]
    ZeroDimension,

    /// A point or query has the wrong number of coordinates
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        /// Dimension of the tree or point set
        expected: usize,
        /// Dimension that was supplied
        got: usize,
    },

    /// A flat coordinate buffer does not divide into whole points
    #[error("point buffer of length {len} is not a multiple of dimension {dim}")]
    RaggedPoints {
        /// Length of the coordinate buffer
        len: usize,
        /// Requested dimension
        dim: usize,
    },

    /// A tree cannot be built from zero training points
    #[error("training set is empty")]
    EmptyTrainingSet,

    /// NaN or infinite coordinate
    #[error("coordinate on axis {axis} is not finite")]
    NonFiniteCoordinate {
        /// Axis of the offending coordinate
        axis: usize,
    },

    /// Radius queries need a finite, non-negative radius
    #[error("invalid search radius: {0}")]
    InvalidRadius(f64),

    /// The tree was modified or never built
    #[error("tree must be built before it is queried or saved")]
    NotBuilt,

    /// Point indices are stored as u32
    #[error("too many points: index {0} does not fit in u32")]
    TooManyPoints(usize),

    /// Metric name not recognised by `Metric::from_str`
    #[error("unknown distance metric: {0}")]
    UnknownMetric(String),

    /// Serialized tree has a bad header
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// Serialized tree body is inconsistent with its header
    #[error("corrupt tree data: {0}")]
    CorruptData(String),

    /// Underlying I/O failure while saving or loading
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias for `knn` operations
pub type Result<T> = std::result::Result<T, KnnError>;
