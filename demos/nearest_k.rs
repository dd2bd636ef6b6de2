//! Find K nearest points to a query point, with indices, distances and metrics.
//!
//! ```bash
//! RUST_LOG=debug cargo run --example nearest_k
//! ```

use knn::prelude::*;

fn main() -> Result<(), KnnError> {
    env_logger::init();

    let mut tree = KdTree::with_capacity(2, 6)?;
    let _ = tree.add(&[0.0, 0.0])?;      // Point 0
    let _ = tree.add(&[1.0, 0.0])?;      // Point 1: distance 1 from (0, 0)
    let _ = tree.add(&[0.0, 1.0])?;      // Point 2: distance 1 from (0, 0)
    let _ = tree.add(&[1.0, 1.0])?;      // Point 3: distance sqrt(2) from (0, 0)
    let _ = tree.add(&[3.0, 3.0])?;      // Point 4: distance sqrt(18) from (0, 0)
    let _ = tree.add(&[10.0, 10.0])?;    // Point 5: distance sqrt(200) from (0, 0)
    tree.build();

    println!("=== Query Nearest K Example ===\n");

    println!("Query 1: 3 nearest points to (0, 0):");
    for n in tree.nearest_k(&[0.0, 0.0], 3)? {
        println!("  point {} at distance {:.3}", n.index, n.distance);
    }
    println!("  (points 1 and 2 tie; the lower index comes first)\n");

    println!("Query 2: 100 nearest points (only 6 exist):");
    let mut results = Vec::new();
    tree.query_nearest_k(&[0.0, 0.0], 100, &mut results)?;
    println!("  {:?}\n", results);

    println!("Query 3: everything within 1.5 of (1, 1):");
    tree.query_radius(&[1.0, 1.0], 1.5, &mut results)?;
    println!("  {:?}\n", results);

    println!("Query 4: nearest to (2.5, 0.5) under each metric:");
    for name in ["euclidean", "manhattan", "chebyshev"] {
        let metric: Metric = name.parse()?;
        let tree = tree.clone().with_metric(metric);
        if let Some(n) = tree.nearest(&[2.5, 0.5])? {
            println!("  {:<10} -> point {} ({:.3})", metric, n.index, n.distance);
        }
    }
    Ok(())
}
