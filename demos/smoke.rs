//! Smoke run: the 3 nearest training points to (6, 6).
use knn::prelude::*;

fn main() -> Result<(), KnnError> {
    env_logger::init();

    let train = PointSet::from_rows(&[[1_i64, 2], [3, 4], [5, 6], [7, 8], [9, 10], [5, 5]])?;
    let query = [6_i64, 6];
    let tree = KdTree::from_points(&train)?;
    println!("{}", tree.k_nearest(&query, 3)?);
    Ok(())
}
