//! Binary save/load for built trees.
//!
//! Layout (little endian):
//! - Header: 16 bytes (magic `KD`, version, coordinate type, metric, 3 zero bytes,
//!   `dim` as u32, `num_items` as u32)
//! - Coordinates: `num_items * dim` values in tree order
//! - Indices: `num_items` u32 original indices, one per slot
//!
//! The tree is stored already built, so loading does not rebuild.

use std::fs;
use std::path::Path;

use log::debug;

use crate::coordinate::Coordinate;
use crate::error::{KnnError, Result};
use crate::kdtree::KdTree;
use crate::metric::Metric;

const MAGIC: [u8; 2] = *b"KD";
const VERSION: u8 = 1;
const HEADER_SIZE: usize = 16; // bytes

impl<T: Coordinate> KdTree<T> {
    /// Serializes the built tree.
    ///
    /// # Errors
    /// `NotBuilt` when the tree has pending changes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if !self.built {
            return Err(KnnError::NotBuilt);
        }
        let dim = u32::try_from(self.dim).map_err(|_| {
            KnnError::InvalidHeader(format!("dimension {} does not fit in u32", self.dim))
        })?;
        let num_items = u32::try_from(self.len()).map_err(|_| KnnError::TooManyPoints(self.len()))?;

        let mut data = Vec::with_capacity(
            HEADER_SIZE + self.points.len() * T::BYTES + self.ids.len() * size_of::<u32>(),
        );
        data.extend_from_slice(&MAGIC);
        data.push(VERSION);
        data.push(T::TYPE_TAG);
        data.push(self.metric.tag());
        data.extend_from_slice(&[0; 3]);
        data.extend_from_slice(&dim.to_le_bytes());
        data.extend_from_slice(&num_items.to_le_bytes());

        for &value in &self.points {
            value.write_le(&mut data);
        }
        for &id in &self.ids {
            data.extend_from_slice(&id.to_le_bytes());
        }
        Ok(data)
    }

    /// Restores a tree written by [`to_bytes`](Self::to_bytes).
    ///
    /// # Errors
    /// `InvalidHeader` for a foreign or incompatible header, `CorruptData`
    /// when the body does not match it.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(KnnError::InvalidHeader(format!(
                "need {HEADER_SIZE} header bytes, found {}",
                data.len()
            )));
        }
        if data[0..2] != MAGIC {
            return Err(KnnError::InvalidHeader("bad magic".into()));
        }
        if data[2] != VERSION {
            return Err(KnnError::InvalidHeader(format!("unsupported version {}", data[2])));
        }
        if data[3] != T::TYPE_TAG {
            return Err(KnnError::InvalidHeader(format!(
                "coordinate type tag {:#04x}, expected {:#04x}",
                data[3],
                T::TYPE_TAG
            )));
        }
        let metric = Metric::from_tag(data[4])
            .ok_or_else(|| KnnError::InvalidHeader(format!("unknown metric tag {}", data[4])))?;
        let dim = read_u32(&data[8..12]) as usize;
        let num_items = read_u32(&data[12..16]) as usize;
        if dim == 0 {
            return Err(KnnError::InvalidHeader("zero dimension".into()));
        }

        let coords_len = num_items
            .checked_mul(dim)
            .and_then(|n| n.checked_mul(T::BYTES))
            .ok_or_else(|| KnnError::CorruptData("point count overflows".into()))?;
        let expected = num_items
            .checked_mul(size_of::<u32>())
            .and_then(|n| n.checked_add(HEADER_SIZE + coords_len))
            .ok_or_else(|| KnnError::CorruptData("point count overflows".into()))?;
        if data.len() != expected {
            return Err(KnnError::CorruptData(format!(
                "expected {expected} bytes, found {}",
                data.len()
            )));
        }

        let body = &data[HEADER_SIZE..];
        let (coords, indices) = body.split_at(coords_len);

        let mut tree = Self::with_capacity(dim, num_items)?.with_metric(metric);
        for (i, chunk) in coords.chunks_exact(T::BYTES).enumerate() {
            let value = T::read_le(chunk)
                .ok_or_else(|| KnnError::CorruptData("truncated coordinate".into()))?;
            if !value.is_valid() {
                return Err(KnnError::CorruptData(format!(
                    "point {} has a non-finite coordinate on axis {}",
                    i / dim,
                    i % dim
                )));
            }
            tree.points.push(value);
        }

        tree.slots = vec![u32::MAX; num_items];
        for (slot, chunk) in indices.chunks_exact(size_of::<u32>()).enumerate() {
            let id = read_u32(chunk);
            match tree.slots.get_mut(id as usize) {
                Some(entry) if *entry == u32::MAX => *entry = slot as u32,
                _ => {
                    return Err(KnnError::CorruptData(format!(
                        "index {id} at slot {slot} is out of range or repeated"
                    )));
                }
            }
            tree.ids.push(id);
        }
        if !tree.split_order_holds() {
            return Err(KnnError::CorruptData("points are not in kd-tree order".into()));
        }
        tree.built = true;
        Ok(tree)
    }

    /// Writes the built tree to a file.
    ///
    /// # Errors
    /// `NotBuilt`, or `Io` when the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let data = self.to_bytes()?;
        fs::write(path.as_ref(), &data)?;
        debug!("saved kd-tree ({} points, {} bytes) to {}", self.len(), data.len(), path.as_ref().display());
        Ok(())
    }

    /// Reads a tree saved with [`save`](Self::save).
    ///
    /// # Errors
    /// `Io` when the file cannot be read, plus the errors of
    /// [`from_bytes`](Self::from_bytes).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        let tree = Self::from_bytes(&data)?;
        debug!("loaded kd-tree ({} points) from {}", tree.len(), path.as_ref().display());
        Ok(tree)
    }
}

/// Callers always pass exactly 4 bytes
fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0_u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::HEADER_SIZE;
    use crate::error::KnnError;
    use crate::kdtree::KdTree;
    use crate::metric::Metric;
    use crate::point_set::PointSet;

    fn sample_tree() -> KdTree<i64> {
        let train = PointSet::from_rows(&[[1_i64, 2], [3, 4], [5, 6], [7, 8], [9, 10], [5, 5]]).unwrap();
        KdTree::from_points(&train).unwrap()
    }

    #[test]
    fn test_bytes_round_trip_preserves_queries() {
        let tree = sample_tree();
        let loaded = KdTree::<i64>::from_bytes(&tree.to_bytes().unwrap()).unwrap();
        assert_eq!(loaded.len(), tree.len());
        assert_eq!(loaded.dim(), 2);
        assert_eq!(loaded.point(4), Some(&[9_i64, 10][..]));
        assert_eq!(loaded.nearest_k(&[6, 6], 3).unwrap(), tree.nearest_k(&[6, 6], 3).unwrap());
    }

    #[test]
    fn test_metric_is_persisted() {
        let mut tree = KdTree::new(3).unwrap().with_metric(Metric::Chebyshev);
        let _ = tree.add(&[1.0_f32, 2.0, 3.0]).unwrap();
        tree.build();
        let loaded = KdTree::<f32>::from_bytes(&tree.to_bytes().unwrap()).unwrap();
        assert_eq!(loaded.metric(), Metric::Chebyshev);
    }

    #[test]
    fn test_unbuilt_tree_cannot_be_saved() {
        let mut tree = KdTree::<i32>::new(2).unwrap();
        let _ = tree.add(&[1, 1]).unwrap();
        assert!(matches!(tree.to_bytes(), Err(KnnError::NotBuilt)));
    }

    #[test]
    fn test_rejects_wrong_coordinate_type() {
        let bytes = sample_tree().to_bytes().unwrap();
        assert!(matches!(KdTree::<f64>::from_bytes(&bytes), Err(KnnError::InvalidHeader(_))));
    }

    #[test]
    fn test_rejects_bad_magic_and_short_input() {
        let mut bytes = sample_tree().to_bytes().unwrap();
        assert!(matches!(KdTree::<i64>::from_bytes(&bytes[..10]), Err(KnnError::InvalidHeader(_))));
        bytes[0] = b'X';
        assert!(matches!(KdTree::<i64>::from_bytes(&bytes), Err(KnnError::InvalidHeader(_))));
    }

    #[test]
    fn test_rejects_truncated_body() {
        let bytes = sample_tree().to_bytes().unwrap();
        let cut = &bytes[..bytes.len() - 1];
        assert!(matches!(KdTree::<i64>::from_bytes(cut), Err(KnnError::CorruptData(_))));
    }

    #[test]
    fn test_rejects_points_out_of_split_order() {
        let mut tree = KdTree::new(1).unwrap();
        for x in 1..=5_i64 {
            let _ = tree.add(&[x]).unwrap();
        }
        tree.build();
        let mut bytes = tree.to_bytes().unwrap();
        // swap the coordinates of slot 0 (left of the root) and slot 4 (right of it)
        let (first, last) = (HEADER_SIZE..HEADER_SIZE + 8, HEADER_SIZE + 32..HEADER_SIZE + 40);
        let saved: Vec<u8> = bytes[first.clone()].to_vec();
        bytes.copy_within(last.clone(), first.start);
        bytes[last].copy_from_slice(&saved);
        assert!(matches!(KdTree::<i64>::from_bytes(&bytes), Err(KnnError::CorruptData(_))));
    }

    #[test]
    fn test_rejects_repeated_index() {
        let mut bytes = sample_tree().to_bytes().unwrap();
        let n = bytes.len();
        // overwrite the last slot's index with the previous one
        let prev: [u8; 4] = bytes[n - 8..n - 4].try_into().unwrap();
        bytes[n - 4..].copy_from_slice(&prev);
        assert!(matches!(KdTree::<i64>::from_bytes(&bytes), Err(KnnError::CorruptData(_))));
    }

    #[test]
    fn test_save_and_load_file() {
        let path = std::env::temp_dir().join(format!("knn_persist_test_{}.bin", std::process::id()));
        let tree = sample_tree();
        tree.save(&path).unwrap();
        let loaded = KdTree::<i64>::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded.k_nearest(&[6, 6], 3).unwrap(), tree.k_nearest(&[6, 6], 3).unwrap());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("knn_persist_test_missing_file.bin");
        assert!(matches!(KdTree::<i64>::load(&path), Err(KnnError::Io(_))));
    }
}
