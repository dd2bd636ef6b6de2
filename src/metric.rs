//! Distance metrics supported by the tree.

use std::fmt;
use std::str::FromStr;

use crate::coordinate::Coordinate;
use crate::error::KnnError;

/// Distance function used by queries.
///
/// Every metric here is monotone in each per-axis difference, so the distance
/// to a splitting plane bounds the distance to every point behind it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Metric {
    /// L2 norm
    #[default]
    Euclidean,
    /// Squared L2 norm (same ordering as Euclidean, no square root)
    SquaredEuclidean,
    /// L1 norm
    Manhattan,
    /// L-infinity norm
    Chebyshev,
}

impl Metric {
    /// Distance between two points of equal dimension
    #[inline]
    pub fn distance<T: Coordinate>(self, a: &[T], b: &[T]) -> f64 {
        let deltas = a.iter().zip(b).map(|(&x, &y)| x.delta(y));
        match self {
            Self::Euclidean => deltas.map(|d| d * d).sum::<f64>().sqrt(),
            Self::SquaredEuclidean => deltas.map(|d| d * d).sum(),
            Self::Manhattan => deltas.map(f64::abs).sum(),
            Self::Chebyshev => deltas.map(f64::abs).fold(0.0, f64::max),
        }
    }

    /// Lower bound on the distance to any point across a split at offset `delta`.
    ///
    /// Uses the same floating-point steps as [`distance`](Self::distance), so the
    /// bound never exceeds a computed distance, even when squares underflow.
    #[inline]
    pub fn plane_distance(self, delta: f64) -> f64 {
        match self {
            Self::Euclidean => (delta * delta).sqrt(),
            Self::SquaredEuclidean => delta * delta,
            Self::Manhattan | Self::Chebyshev => delta.abs(),
        }
    }

    pub(crate) fn tag(self) -> u8 {
        match self {
            Self::Euclidean => 0,
            Self::SquaredEuclidean => 1,
            Self::Manhattan => 2,
            Self::Chebyshev => 3,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(Self::Euclidean),
            1 => Some(Self::SquaredEuclidean),
            2 => Some(Self::Manhattan),
            3 => Some(Self::Chebyshev),
            _ => None,
        }
    }
}

impl FromStr for Metric {
    type Err = KnnError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.to_lowercase().as_str() {
            "euclidean" | "l2" => Ok(Self::Euclidean),
            "squared_euclidean" | "sqeuclidean" => Ok(Self::SquaredEuclidean),
            "manhattan" | "cityblock" | "l1" => Ok(Self::Manhattan),
            "chebyshev" | "linf" | "max" => Ok(Self::Chebyshev),
            _ => Err(KnnError::UnknownMetric(name.to_owned())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Euclidean => "euclidean",
            Self::SquaredEuclidean => "squared_euclidean",
            Self::Manhattan => "manhattan",
            Self::Chebyshev => "chebyshev",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::Metric;

    const ALL: [Metric; 4] = [
        Metric::Euclidean,
        Metric::SquaredEuclidean,
        Metric::Manhattan,
        Metric::Chebyshev,
    ];

    #[test]
    fn test_distances() {
        let a = [0_i64, 0];
        let b = [3_i64, -4];
        assert_eq!(Metric::Euclidean.distance(&a, &b), 5.0);
        assert_eq!(Metric::SquaredEuclidean.distance(&a, &b), 25.0);
        assert_eq!(Metric::Manhattan.distance(&a, &b), 7.0);
        assert_eq!(Metric::Chebyshev.distance(&a, &b), 4.0);
    }

    #[test]
    fn test_plane_distance_is_lower_bound() {
        let q = [1.0_f64, 2.0, 3.0];
        let p = [4.0_f64, -1.0, 3.5];
        for metric in ALL {
            let full = metric.distance(&q, &p);
            for axis in 0..3 {
                let bound = metric.plane_distance(q[axis] - p[axis]);
                assert!(bound <= full, "{metric} bound {bound} exceeds {full} on axis {axis}");
            }
        }
    }

    #[test]
    fn test_plane_distance_follows_underflow() {
        // 1e-200 squared underflows to zero, so the point distance is zero too
        let full = Metric::Euclidean.distance(&[1e-200_f64], &[-1e-200]);
        assert_eq!(full, 0.0);
        assert_eq!(Metric::Euclidean.plane_distance(2e-200), full);
        assert_eq!(Metric::Manhattan.plane_distance(-2e-200), 2e-200);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("L2".parse::<Metric>().unwrap(), Metric::Euclidean);
        assert_eq!("cityblock".parse::<Metric>().unwrap(), Metric::Manhattan);
        assert_eq!("sqeuclidean".parse::<Metric>().unwrap(), Metric::SquaredEuclidean);
        assert_eq!("LINF".parse::<Metric>().unwrap(), Metric::Chebyshev);
        assert!("cosine".parse::<Metric>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for metric in ALL {
            assert_eq!(metric.to_string().parse::<Metric>().unwrap(), metric);
        }
    }

    #[test]
    fn test_tags_round_trip() {
        for metric in ALL {
            assert_eq!(Metric::from_tag(metric.tag()), Some(metric));
        }
        assert_eq!(Metric::from_tag(9), None);
    }
}
