//! Problem definition trait.
//!
//! This module defines the `Problem` trait, which represents a nonlinear
//! least squares problem to be solved by the trust-region-reflective solver.

use crate::error::Result;
use ndarray::{Array1, Array2};

/// A trait representing a nonlinear least squares problem.
///
/// Implementations must be pure: evaluating the same parameters twice gives
/// the same residuals. The solver relies on this when it reuses the residual
/// vector of the current iterate for finite differences.
pub trait Problem {
    /// Evaluate the residuals at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate the residuals
    ///
    /// # Returns
    ///
    /// * A vector of residuals, or an error if the evaluation fails
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the Jacobian matrix at the given parameters.
    ///
    /// The default implementation uses unbounded forward differences. The
    /// solver only calls this when [`Problem::has_custom_jacobian`] returns
    /// true; otherwise it differentiates inside the feasible box itself and
    /// rejects the analytical method.
    fn jacobian(&self, params: &Array1<f64>) -> Result<Array2<f64>>
    where
        Self: Sized,
    {
        crate::utils::finite_difference::jacobian(self, params, None)
    }

    /// Check if this problem provides a custom Jacobian implementation.
    fn has_custom_jacobian(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EisFitError;
    use approx::assert_relative_eq;
    use ndarray::array;

    /// A simple linear model for testing: f(x) = a * x + b
    struct LinearModel {
        x_data: Array1<f64>,
        y_data: Array1<f64>,
    }

    impl Problem for LinearModel {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            if params.len() != 2 {
                return Err(EisFitError::DimensionMismatch(format!(
                    "Expected 2 parameters, got {}",
                    params.len()
                )));
            }

            let (a, b) = (params[0], params[1]);
            Ok(&self.x_data * a + b - &self.y_data)
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            self.x_data.len()
        }
    }

    fn model() -> LinearModel {
        LinearModel {
            x_data: array![1.0, 2.0, 3.0, 4.0, 5.0],
            y_data: array![2.0, 4.0, 6.0, 8.0, 10.0],
        }
    }

    #[test]
    fn test_default_jacobian_is_finite_difference() {
        let problem = model();
        let jacobian = problem.jacobian(&array![2.0, 0.0]).unwrap();

        assert_eq!(jacobian.shape(), &[5, 2]);
        for i in 0..5 {
            assert_relative_eq!(jacobian[[i, 0]], (i + 1) as f64, epsilon = 1e-5);
            assert_relative_eq!(jacobian[[i, 1]], 1.0, epsilon = 1e-5);
        }
        assert!(!problem.has_custom_jacobian());
    }

    #[test]
    fn test_dimension_check() {
        let problem = model();
        assert!(matches!(
            problem.eval(&array![1.0]),
            Err(EisFitError::DimensionMismatch(_))
        ));
    }
}
