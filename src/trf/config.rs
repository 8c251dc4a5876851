//! Configuration options for the trust-region-reflective solver.

use serde::{Deserialize, Serialize};

/// Method for calculating the Jacobian matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiffMethod {
    /// Two-point forward differences (one evaluation per parameter)
    #[default]
    Forward,

    /// Three-point central differences (two evaluations per parameter)
    Central,

    /// Use the analytical Jacobian provided by the problem implementation
    Analytical,
}

/// Characteristic scale of each variable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum XScale {
    /// All variables have unit scale
    #[default]
    Unit,

    /// Inverse norms of the Jacobian columns, updated every iteration
    Jacobian,

    /// Fixed, user supplied positive scales
    Fixed(Vec<f64>),
}

/// Configuration options for the trust-region-reflective solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrfConfig {
    /// Tolerance for the relative cost reduction. Default: 1e-12
    pub ftol: f64,

    /// Tolerance for the relative step size. Default: 1e-12
    pub xtol: f64,

    /// Tolerance for the scaled gradient norm. Default: 1e-8
    pub gtol: f64,

    /// Budget of residual evaluations at trial points, the initial point
    /// included. Finite-difference evaluations are counted separately.
    /// Default: 100 × number of parameters
    pub max_nfev: Option<usize>,

    /// Method to use for calculating the Jacobian. Default: Forward
    pub diff_method: DiffMethod,

    /// Variable scaling. Default: Unit
    pub x_scale: XScale,

    /// Relative distance by which a starting point on a bound is moved
    /// inside the box. Default: 1e-10
    pub initial_rstep: f64,
}

impl Default for TrfConfig {
    fn default() -> Self {
        Self {
            ftol: 1e-12,
            xtol: 1e-12,
            gtol: 1e-8,
            max_nfev: None,
            diff_method: DiffMethod::default(),
            x_scale: XScale::default(),
            initial_rstep: 1e-10,
        }
    }
}

impl TrfConfig {
    /// The evaluation budget for a problem with `n_params` parameters.
    pub fn max_nfev_for(&self, n_params: usize) -> usize {
        self.max_nfev.unwrap_or(100 * n_params.max(1))
    }
}
