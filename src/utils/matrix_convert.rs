//! Conversion utilities between ndarray and nalgebra.
//!
//! The public API works on `ndarray` types; the trust-region subproblem
//! needs an SVD, which is taken from `nalgebra`.

use crate::error::{EisFitError, Result};
use nalgebra::DMatrix;
use ndarray::Array2;

/// Convert an ndarray Array2 to a nalgebra DMatrix.
///
/// # Errors
///
/// * `EisFitError::DimensionMismatch` if the matrix is empty
pub fn ndarray_to_nalgebra(arr: &Array2<f64>) -> Result<DMatrix<f64>> {
    let (rows, cols) = arr.dim();
    if rows == 0 || cols == 0 {
        return Err(EisFitError::DimensionMismatch(format!(
            "Cannot convert an empty {}x{} matrix",
            rows, cols
        )));
    }

    Ok(DMatrix::from_fn(rows, cols, |i, j| arr[[i, j]]))
}

/// Convert a nalgebra DMatrix to an ndarray Array2.
pub fn nalgebra_to_ndarray(mat: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_matrix_roundtrip_preserves_layout() {
        let arr = Array2::from_shape_vec((2, 3), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        let mat = ndarray_to_nalgebra(&arr).unwrap();

        assert_eq!(mat.nrows(), 2);
        assert_eq!(mat.ncols(), 3);
        assert_relative_eq!(mat[(1, 0)], 4.0);
        assert_relative_eq!(mat[(0, 2)], 3.0);

        assert_eq!(nalgebra_to_ndarray(&mat), arr);
    }

    #[test]
    fn test_empty_matrix_is_rejected() {
        let arr = Array2::<f64>::zeros((0, 3));
        assert!(ndarray_to_nalgebra(&arr).is_err());
    }
}
