//! Save and restore a built KD-tree
use knn::prelude::*;

fn main() -> Result<(), KnnError> {
    env_logger::init();

    let path = std::env::temp_dir().join("knn_tree_i64.bin");

    let train = PointSet::from_rows(&[[10_i64, 10], [20, 20], [30, 10], [15, 25]])?;
    let tree = KdTree::from_points(&train)?;
    tree.save(&path)?;
    println!("Saved i64 tree to {}", path.display());

    let before = tree.k_nearest(&[18, 18], 2)?;
    let loaded = KdTree::<i64>::load(&path)?;
    let after = loaded.k_nearest(&[18, 18], 2)?;
    println!("original: {before}\nloaded:   {after}");
    assert_eq!(before, after, "loaded tree should answer identically");

    // Loading with the wrong coordinate type is rejected by the header check
    match KdTree::<f64>::load(&path) {
        Ok(_) => println!("✗ Should have failed loading i64 file as f64"),
        Err(e) => println!("✓ Correctly rejected i64 file: {e}"),
    }

    std::fs::remove_file(&path)?;
    Ok(())
}
