//! Compressed sparse row matrices and the terminal sparse-conversion stage.

use ndarray::Array2;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

use super::StageTrace;
use crate::error::TransformError;
use crate::frame::to_feature_matrix;

/// Row-compressed sparse matrix. Explicit zeros are never stored.
///
/// Row `i` owns `indices[indptr[i]..indptr[i + 1]]` (column positions, ascending)
/// and the matching slice of `values`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsrMatrix {
    pub indptr: Vec<usize>,
    pub indices: Vec<usize>,
    pub values: Vec<f64>,
    pub shape: (usize, usize),
}

impl CsrMatrix {
    pub fn from_dense(dense: &Array2<f64>) -> Self {
        let (nrows, ncols) = dense.dim();
        let mut indptr = Vec::with_capacity(nrows + 1);
        let mut indices = Vec::new();
        let mut values = Vec::new();
        indptr.push(0);
        for row in dense.rows() {
            for (j, &v) in row.iter().enumerate() {
                if v != 0.0 {
                    indices.push(j);
                    values.push(v);
                }
            }
            indptr.push(indices.len());
        }
        Self {
            indptr,
            indices,
            values,
            shape: (nrows, ncols),
        }
    }

    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    pub fn nrows(&self) -> usize {
        self.shape.0
    }

    pub fn ncols(&self) -> usize {
        self.shape.1
    }

    /// Fraction of cells that are stored.
    pub fn density(&self) -> f64 {
        let cells = self.shape.0 * self.shape.1;
        if cells == 0 {
            0.0
        } else {
            self.nnz() as f64 / cells as f64
        }
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::<f64>::zeros(self.shape);
        for i in 0..self.nrows() {
            for k in self.indptr[i]..self.indptr[i + 1] {
                dense[[i, self.indices[k]]] = self.values[k];
            }
        }
        dense
    }
}

/// Terminal stage turning a numeric frame into a [`CsrMatrix`].
///
/// It does not implement `FeatureTransform` because its output is no longer
/// a DataFrame.
#[derive(Debug, Clone, Default)]
pub struct ToSparse {
    trace: StageTrace,
}

impl ToSparse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        "to_sparse"
    }

    pub fn fit(&mut self, df: &DataFrame) -> Result<(), TransformError> {
        self.trace.record_fit(df);
        Ok(())
    }

    pub fn transform(&mut self, df: &DataFrame) -> Result<CsrMatrix, TransformError> {
        self.trace.check_fitted(self.name())?;
        let dense = to_feature_matrix(df)?;
        self.trace.record_transform(df);
        Ok(CsrMatrix::from_dense(&dense))
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<CsrMatrix, TransformError> {
        self.fit(df)?;
        self.transform(df)
    }

    pub fn feature_names_in(&self) -> Option<&[String]> {
        self.trace.names_in()
    }

    /// Column order of the produced matrix.
    pub fn feature_names_out(&self) -> Option<&[String]> {
        self.trace.names_out(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use polars::prelude::*;

    #[test]
    fn stores_only_non_zeros() {
        let dense = array![[0.0, 2.0, 0.0], [0.0, 0.0, 0.0], [1.0, 0.0, 3.0]];
        let csr = CsrMatrix::from_dense(&dense);
        assert_eq!(csr.indptr, vec![0, 1, 1, 3]);
        assert_eq!(csr.indices, vec![1, 0, 2]);
        assert_eq!(csr.values, vec![2.0, 1.0, 3.0]);
        assert_eq!(csr.nnz(), 3);
        assert_eq!(csr.to_dense(), dense);
    }

    #[test]
    fn converts_numeric_frame() {
        let df = df!("a" => [0.0, 1.0], "b" => [0i64, 0]).unwrap();
        let mut stage = ToSparse::new();
        let csr = stage.fit_transform(&df).unwrap();
        assert_eq!(csr.shape, (2, 2));
        assert_eq!(csr.nnz(), 1);
        assert!((csr.density() - 0.25).abs() < 1e-12);
        assert_eq!(stage.feature_names_out().unwrap(), &["a", "b"]);
    }

    #[test]
    fn text_columns_are_rejected() {
        let df = df!("sentiment" => ["positive"]).unwrap();
        assert!(ToSparse::new().fit_transform(&df).is_err());
    }
}
