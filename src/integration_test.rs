#[cfg(test)]
mod integration_tests {
    use crate::prelude::*;

    #[test]
    fn test_smoke_script() {
        // Smoke run: 6 training points in 2-D, k = 3 around (6, 6)
        let train = PointSet::from_rows(&[[1_i64, 2], [3, 4], [5, 6], [7, 8], [9, 10], [5, 5]]).unwrap();
        let query = [6_i64, 6];

        let tree = KdTree::from_points(&train).unwrap();
        let nearest = tree.k_nearest(&query, 3).unwrap();
        assert_eq!(nearest.to_string(), "[[5 6]\n [5 5]\n [7 8]]");

        // Same answer through the one-shot function
        assert_eq!(knn(&train, &query, 3).unwrap(), nearest);

        // Distances are 1, sqrt(2), sqrt(5)
        let distances: Vec<f64> = tree.nearest_k(&query, 3).unwrap().iter().map(|n| n.distance).collect();
        assert_eq!(distances, vec![1.0, 2.0_f64.sqrt(), 5.0_f64.sqrt()]);

        // And after a save/load round trip
        let restored = KdTree::<i64>::from_bytes(&tree.to_bytes().unwrap()).unwrap();
        assert_eq!(restored.k_nearest(&query, 3).unwrap(), nearest);
    }

    #[test]
    fn test_incremental_api() {
        let mut tree = KdTree::with_capacity(2, 4).unwrap();
        assert_eq!(tree.add(&[0.0, 0.0]).unwrap(), 0);
        assert_eq!(tree.add(&[2.0, 2.0]).unwrap(), 1);
        assert_eq!(tree.add(&[4.0, 4.0]).unwrap(), 2);
        assert_eq!(tree.add(&[6.0, 6.0]).unwrap(), 3);
        tree.build();

        let mut results = Vec::new();
        tree.query_nearest_k(&[2.5, 2.5], 2, &mut results).unwrap();
        assert_eq!(results, vec![1, 2]);

        tree.query_radius(&[3.0, 3.0], 1.5, &mut results).unwrap();
        assert_eq!(results, vec![1, 2]);
    }
}
