//! Python bindings for the knn KD-tree.
//!
//! Exposes the `knn` module with a `KDTree` class over `int64` matrices and a
//! one-shot `knn()` function. Build with `maturin develop` from this directory.

use std::fmt::Display;

use numpy::ndarray::Array2;
use numpy::{IntoPyArray, PyArray1, PyArray2, PyReadonlyArray1, PyReadonlyArray2};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use ::knn::{KdTree, Metric, PointSet};

/// Convert a crate error to a Python `ValueError`
fn to_py_error(e: impl Display) -> PyErr {
    PyValueError::new_err(e.to_string())
}

fn train_points(train: &PyReadonlyArray2<'_, i64>) -> PyResult<PointSet<i64>> {
    let view = train.as_array();
    PointSet::new(view.iter().copied().collect(), view.ncols()).map_err(to_py_error)
}

fn query_point(query: &PyReadonlyArray1<'_, i64>) -> Vec<i64> {
    query.as_array().iter().copied().collect()
}

fn into_matrix(py: Python<'_>, points: PointSet<i64>) -> PyResult<Bound<'_, PyArray2<i64>>> {
    let shape = (points.len(), points.dim());
    let array = Array2::from_shape_vec(shape, points.into_vec()).map_err(to_py_error)?;
    Ok(array.into_pyarray(py))
}

/// KD-tree over the rows of an `int64` matrix.
#[pyclass(name = "KDTree", module = "knn", frozen)]
#[derive(Debug)]
pub struct PyKdTree {
    inner: KdTree<i64>,
}

#[pymethods]
impl PyKdTree {
    #[new]
    #[pyo3(signature = (train, metric = "euclidean"))]
    fn new(train: PyReadonlyArray2<'_, i64>, metric: &str) -> PyResult<Self> {
        let metric: Metric = metric.parse().map_err(to_py_error)?;
        let inner = KdTree::from_points(&train_points(&train)?)
            .map_err(to_py_error)?
            .with_metric(metric);
        Ok(Self { inner })
    }

    /// The `k` training points closest to `query`, nearest first
    fn k_nearest<'py>(
        &self,
        py: Python<'py>,
        query: PyReadonlyArray1<'py, i64>,
        k: usize,
    ) -> PyResult<Bound<'py, PyArray2<i64>>> {
        let found = self.inner.k_nearest(&query_point(&query), k).map_err(to_py_error)?;
        into_matrix(py, found)
    }

    /// `(indices, distances)` of the `k` nearest training points
    fn query<'py>(
        &self,
        py: Python<'py>,
        query: PyReadonlyArray1<'py, i64>,
        k: usize,
    ) -> PyResult<(Bound<'py, PyArray1<usize>>, Bound<'py, PyArray1<f64>>)> {
        let found = self.inner.nearest_k(&query_point(&query), k).map_err(to_py_error)?;
        let indices = found.iter().map(|n| n.index).collect::<Vec<_>>();
        let distances = found.iter().map(|n| n.distance).collect::<Vec<_>>();
        Ok((PyArray1::from_vec(py, indices), PyArray1::from_vec(py, distances)))
    }

    #[getter]
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        format!(
            "KDTree(n={}, dim={}, metric={})",
            self.inner.len(),
            self.inner.dim(),
            self.inner.metric()
        )
    }
}

/// One-shot k-nearest search over `train`
#[pyfunction]
#[pyo3(name = "knn")]
fn knn_once<'py>(
    py: Python<'py>,
    train: PyReadonlyArray2<'py, i64>,
    query: PyReadonlyArray1<'py, i64>,
    k: usize,
) -> PyResult<Bound<'py, PyArray2<i64>>> {
    let found = ::knn::knn(&train_points(&train)?, &query_point(&query), k).map_err(to_py_error)?;
    into_matrix(py, found)
}

/// The `knn` Python module
#[pymodule]
#[pyo3(name = "knn")]
fn knn_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyKdTree>()?;
    m.add_function(wrap_pyfunction!(knn_once, m)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use numpy::{PyArray1, PyArray2, PyArrayMethods, PyUntypedArrayMethods};
    use pyo3::prelude::*;

    use super::{PyKdTree, knn_module};

    fn smoke_arrays(py: Python<'_>) -> (Bound<'_, PyArray2<i64>>, Bound<'_, PyArray1<i64>>) {
        let rows = vec![vec![1_i64, 2], vec![3, 4], vec![5, 6], vec![7, 8], vec![9, 10], vec![5, 5]];
        let train = PyArray2::from_vec2(py, &rows).unwrap();
        let query = PyArray1::from_slice(py, &[6_i64, 6]);
        (train, query)
    }

    /// The array tests need numpy in the linked interpreter
    fn numpy_available(py: Python<'_>) -> bool {
        py.import("numpy").is_ok()
    }

    #[test]
    fn test_kdtree_k_nearest() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            if !numpy_available(py) {
                return;
            }
            let (train, query) = smoke_arrays(py);
            let tree = PyKdTree::new(train.readonly(), "euclidean").unwrap();
            assert_eq!(tree.__len__(), 6);
            assert_eq!(tree.dim(), 2);
            assert_eq!(tree.__repr__(), "KDTree(n=6, dim=2, metric=euclidean)");

            let found = tree.k_nearest(py, query.readonly(), 3).unwrap();
            assert_eq!(found.shape(), [3, 2]);
            let values: Vec<i64> = found.readonly().as_array().iter().copied().collect();
            assert_eq!(values, vec![5, 6, 5, 5, 7, 8]);

            let (indices, distances) = tree.query(py, query.readonly(), 2).unwrap();
            assert_eq!(indices.to_vec().unwrap(), vec![2, 5]);
            assert_eq!(distances.to_vec().unwrap(), vec![1.0, 2.0_f64.sqrt()]);
        });
    }

    #[test]
    fn test_kdtree_rejects_bad_input() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            if !numpy_available(py) {
                return;
            }
            let (train, _) = smoke_arrays(py);
            assert!(PyKdTree::new(train.readonly(), "cosine").is_err());

            let tree = PyKdTree::new(train.readonly(), "l1").unwrap();
            let wrong_dim = PyArray1::from_slice(py, &[1_i64, 2, 3]);
            let err = tree.k_nearest(py, wrong_dim.readonly(), 1).unwrap_err();
            assert!(err.is_instance_of::<pyo3::exceptions::PyValueError>(py));
        });
    }

    #[test]
    fn test_module_exports() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let module = pyo3::wrap_pymodule!(knn_module)(py);
            let module = module.bind(py);
            assert!(module.hasattr("KDTree").unwrap());
            assert!(module.hasattr("knn").unwrap());
        });
    }
}
