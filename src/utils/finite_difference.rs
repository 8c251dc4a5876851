//! Finite difference methods for numerical differentiation.
//!
//! This module provides Jacobian approximations for [`Problem`]s. The
//! bounded variants keep every perturbed point inside the feasible box so the
//! residual function is never evaluated where the caller did not allow it.

use crate::error::{EisFitError, Result};
use crate::problem::Problem;
use ndarray::{Array1, Array2};

/// Default relative step size for forward differences (√ε).
const FORWARD_EPSILON: f64 = 1.4901161193847656e-8;

/// Default relative step size for central differences (∛ε).
const CENTRAL_EPSILON: f64 = 6.0554544523933395e-6;

/// Adapt the step size to the parameter scale.
fn scaled_step(value: f64, eps: f64) -> f64 {
    if value.abs() > eps {
        value.abs() * eps
    } else {
        eps
    }
}

fn check_residual_len(expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(EisFitError::DimensionMismatch(format!(
            "Expected {} residuals, got {}",
            expected, actual
        )));
    }
    Ok(())
}

/// Compute the Jacobian matrix using unbounded forward finite differences.
///
/// J[i,j] = ∂residual[i]/∂param[j].
///
/// # Arguments
///
/// * `problem` - The problem to evaluate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `epsilon` - The relative step size (optional)
pub fn jacobian(
    problem: &dyn Problem,
    params: &Array1<f64>,
    epsilon: Option<f64>,
) -> Result<Array2<f64>> {
    let eps = epsilon.unwrap_or(FORWARD_EPSILON);
    let n_params = params.len();
    let n_residuals = problem.residual_count();

    let residuals = problem.eval(params)?;
    check_residual_len(n_residuals, residuals.len())?;

    let mut jac = Array2::zeros((n_residuals, n_params));
    let mut perturbed = params.clone();

    for j in 0..n_params {
        let h = scaled_step(params[j], eps);
        perturbed[j] = params[j] + h;
        let residuals_perturbed = problem.eval(&perturbed)?;
        perturbed[j] = params[j];

        check_residual_len(n_residuals, residuals_perturbed.len())?;
        let mut column = jac.column_mut(j);
        column.assign(&((&residuals_perturbed - &residuals) / h));
    }

    Ok(jac)
}

/// Forward differences that stay inside `[lower, upper]`.
///
/// `residuals` must be the residual vector already evaluated at `params`, so
/// exactly one extra evaluation is spent per column. A column whose forward
/// point would leave the box is differenced backwards instead.
pub fn jacobian_forward_bounded(
    problem: &dyn Problem,
    params: &Array1<f64>,
    residuals: &Array1<f64>,
    lower: &Array1<f64>,
    upper: &Array1<f64>,
) -> Result<Array2<f64>> {
    let n_params = params.len();
    let n_residuals = residuals.len();
    let mut jac = Array2::zeros((n_residuals, n_params));
    let mut perturbed = params.clone();

    for j in 0..n_params {
        let x = params[j];
        let mut h = scaled_step(x, FORWARD_EPSILON);
        if x + h > upper[j] {
            h = if x - h >= lower[j] { -h } else { upper[j] - x };
        }

        perturbed[j] = x + h;
        // Use the realised step to cancel rounding in x + h.
        let h_actual = perturbed[j] - x;
        let residuals_perturbed = problem.eval(&perturbed)?;
        perturbed[j] = x;

        check_residual_len(n_residuals, residuals_perturbed.len())?;
        jac.column_mut(j)
            .assign(&((&residuals_perturbed - residuals) / h_actual));
    }

    Ok(jac)
}

/// Central differences that stay inside `[lower, upper]`.
///
/// Falls back to a one-sided three-point formula next to a bound. Two
/// evaluations are spent per column.
pub fn jacobian_central_bounded(
    problem: &dyn Problem,
    params: &Array1<f64>,
    residuals: &Array1<f64>,
    lower: &Array1<f64>,
    upper: &Array1<f64>,
) -> Result<Array2<f64>> {
    let n_params = params.len();
    let n_residuals = residuals.len();
    let mut jac = Array2::zeros((n_residuals, n_params));
    let mut perturbed = params.clone();

    for j in 0..n_params {
        let x = params[j];
        let h = scaled_step(x, CENTRAL_EPSILON);

        let column = if x - h >= lower[j] && x + h <= upper[j] {
            perturbed[j] = x + h;
            let forward = problem.eval(&perturbed)?;
            perturbed[j] = x - h;
            let backward = problem.eval(&perturbed)?;
            check_residual_len(n_residuals, forward.len())?;
            check_residual_len(n_residuals, backward.len())?;
            (&forward - &backward) / (2.0 * h)
        } else {
            // One-sided: f'(x) ≈ (-3f(x) + 4f(x+s) - f(x+2s)) / 2s
            let s = if x + 2.0 * h <= upper[j] {
                h
            } else if x - 2.0 * h >= lower[j] {
                -h
            } else if upper[j] - x >= x - lower[j] {
                0.5 * (upper[j] - x)
            } else {
                -0.5 * (x - lower[j])
            };
            perturbed[j] = x + s;
            let one = problem.eval(&perturbed)?;
            perturbed[j] = x + 2.0 * s;
            let two = problem.eval(&perturbed)?;
            check_residual_len(n_residuals, one.len())?;
            check_residual_len(n_residuals, two.len())?;
            (residuals * -3.0 + &one * 4.0 - &two) / (2.0 * s)
        };
        perturbed[j] = x;

        jac.column_mut(j).assign(&column);
    }

    Ok(jac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;
    use std::cell::RefCell;

    // Test problem: r1 = x^2 - 1, r2 = y^2 - 2; records every evaluated point
    struct TestProblem {
        visited: RefCell<Vec<Array1<f64>>>,
    }

    impl TestProblem {
        fn new() -> Self {
            Self {
                visited: RefCell::new(Vec::new()),
            }
        }
    }

    impl Problem for TestProblem {
        fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
            self.visited.borrow_mut().push(params.clone());
            let x = params[0];
            let y = params[1];
            Ok(array![x.powi(2) - 1.0, y.powi(2) - 2.0])
        }

        fn parameter_count(&self) -> usize {
            2
        }

        fn residual_count(&self) -> usize {
            2
        }
    }

    #[test]
    fn test_jacobian() {
        let params = array![2.0, 3.0];
        let problem = TestProblem::new();

        // Analytical Jacobian: [[2*x, 0], [0, 2*y]] = [[4, 0], [0, 6]]
        let jac = jacobian(&problem, &params, None).unwrap();

        assert_eq!(jac.shape(), &[2, 2]);
        assert_relative_eq!(jac[[0, 0]], 4.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[0, 1]], 0.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[1, 0]], 0.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[1, 1]], 6.0, epsilon = 1e-5);
    }

    #[test]
    fn test_forward_bounded_stays_in_box() {
        let problem = TestProblem::new();
        let params = array![2.0, 3.0];
        let residuals = problem.eval(&params).unwrap();
        let lower = array![0.0, 0.0];
        // Upper bound sits exactly on the first parameter
        let upper = array![2.0, 10.0];

        let jac =
            jacobian_forward_bounded(&problem, &params, &residuals, &lower, &upper).unwrap();

        assert_relative_eq!(jac[[0, 0]], 4.0, epsilon = 1e-5);
        assert_relative_eq!(jac[[1, 1]], 6.0, epsilon = 1e-5);
        for point in problem.visited.borrow().iter() {
            assert!(point[0] <= 2.0 && point[0] >= 0.0);
        }
        // One base evaluation plus one per column
        assert_eq!(problem.visited.borrow().len(), 3);
    }

    #[test]
    fn test_central_bounded_matches_analytic() {
        let problem = TestProblem::new();
        let params = array![2.0, 3.0];
        let residuals = problem.eval(&params).unwrap();
        let lower = array![0.0, 3.0];
        let upper = array![10.0, 10.0];

        let jac =
            jacobian_central_bounded(&problem, &params, &residuals, &lower, &upper).unwrap();

        assert_relative_eq!(jac[[0, 0]], 4.0, epsilon = 1e-7);
        // Second column is differenced one-sided from the lower bound
        assert_relative_eq!(jac[[1, 1]], 6.0, epsilon = 1e-7);
        for point in problem.visited.borrow().iter() {
            assert!(point[1] >= 3.0);
        }
    }
}
