//! Implementation of the trust-region-reflective algorithm.
//!
//! This module contains the bounded nonlinear least-squares solver: it
//! minimises `½‖r(x)‖²` subject to `lower ≤ x ≤ upper`, keeping every
//! iterate strictly inside the box through Coleman-Li scaling and reflected
//! steps.

use log::{debug, info, warn};
use ndarray::{s, Array1, Array2};
use std::fmt;

use crate::error::{ConfigurationError, EisFitError, Result};
use crate::problem::Problem;
use crate::utils::finite_difference::{jacobian_central_bounded, jacobian_forward_bounded};

use super::bounds::BoxBounds;
use super::config::{DiffMethod, TrfConfig, XScale};
use super::convergence::{ConvergenceCriteria, TerminationReason};
use super::step::{QuadraticModel, StepContext};
use super::trust_region::{Subproblem, TrustRegion};

/// Result of a trust-region-reflective solve.
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// Last accepted iterate; always finite and inside the bounds
    pub params: Array1<f64>,

    /// Residuals at `params`
    pub residuals: Array1<f64>,

    /// Cost `½‖r‖²` at `params`
    pub cost: f64,

    /// Scaled gradient norm `‖g·v‖∞` at `params`
    pub optimality: f64,

    /// Per-parameter active bounds: -1 lower, 1 upper, 0 free
    pub active_mask: Vec<i8>,

    /// Number of outer iterations performed
    pub iterations: usize,

    /// Residual evaluations at the initial point and at trial points
    pub nfev: usize,

    /// Jacobian evaluations
    pub njev: usize,

    /// Why the solver stopped
    pub termination: TerminationReason,
}

impl SolverResult {
    /// Whether one of the convergence criteria was met.
    pub fn success(&self) -> bool {
        self.termination.is_converged()
    }
}

impl fmt::Display for SolverResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimization Result:")?;
        writeln!(f, "  Success: {}", self.success())?;
        writeln!(f, "  Termination: {}", self.termination)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  Optimality: {:.6e}", self.optimality)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.nfev)?;
        writeln!(f, "  Jacobian evaluations: {}", self.njev)?;
        writeln!(f, "  Parameters: {}", self.params)?;
        Ok(())
    }
}

fn norm(v: &Array1<f64>) -> f64 {
    v.dot(v).sqrt()
}

fn inf_norm(v: &Array1<f64>) -> f64 {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

fn all_finite<'a>(values: impl IntoIterator<Item = &'a f64>) -> bool {
    values.into_iter().all(|x| x.is_finite())
}

/// Column-norm variable scaling; never lets a scale shrink below `previous`.
fn jacobian_scale(jac: &Array2<f64>, previous: Option<&Array1<f64>>) -> (Array1<f64>, Array1<f64>) {
    let mut scale_inv = Array1::from_iter(jac.columns().into_iter().map(|c| c.dot(&c).sqrt()));
    if let Some(previous) = previous {
        scale_inv.zip_mut_with(previous, |s, &p| *s = s.max(p));
    }
    scale_inv.mapv_inplace(|s| if s == 0.0 { 1.0 } else { s });
    (scale_inv.mapv(|s| 1.0 / s), scale_inv)
}

/// The trust-region-reflective bounded least-squares solver.
#[derive(Debug, Clone, Default)]
pub struct TrustRegionReflective {
    /// Configuration options
    config: TrfConfig,
}

impl TrustRegionReflective {
    /// Create a solver with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a solver with the given configuration.
    pub fn with_config(config: TrfConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &TrfConfig {
        &self.config
    }

    /// Set the tolerance for the relative cost reduction.
    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    /// Set the tolerance for the relative step size.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    /// Set the tolerance for the scaled gradient norm.
    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    /// Set the residual evaluation budget.
    pub fn with_max_nfev(mut self, max_nfev: usize) -> Self {
        self.config.max_nfev = Some(max_nfev);
        self
    }

    /// Set the method used for calculating the Jacobian.
    pub fn with_diff_method(mut self, method: DiffMethod) -> Self {
        self.config.diff_method = method;
        self
    }

    /// Set the variable scaling.
    pub fn with_x_scale(mut self, x_scale: XScale) -> Self {
        self.config.x_scale = x_scale;
        self
    }

    fn validate(&self, n_params: usize) -> Result<()> {
        let config = &self.config;
        for (name, tol) in [("ftol", config.ftol), ("xtol", config.xtol), ("gtol", config.gtol)] {
            if !(tol >= 0.0) {
                return Err(ConfigurationError::InvalidSetting(format!(
                    "{} must be non-negative, got {}",
                    name, tol
                ))
                .into());
            }
        }

        if config.max_nfev == Some(0) {
            return Err(ConfigurationError::InvalidSetting(
                "max_nfev must be at least 1".to_string(),
            )
            .into());
        }

        if !(config.initial_rstep >= 0.0) {
            return Err(ConfigurationError::InvalidSetting(format!(
                "initial_rstep must be non-negative, got {}",
                config.initial_rstep
            ))
            .into());
        }

        if let XScale::Fixed(scale) = &config.x_scale {
            if scale.len() != n_params {
                return Err(ConfigurationError::LengthMismatch {
                    expected: n_params,
                    actual: scale.len(),
                }
                .into());
            }
            if scale.iter().any(|s| !(s.is_finite() && *s > 0.0)) {
                return Err(ConfigurationError::InvalidSetting(
                    "x_scale entries must be positive and finite".to_string(),
                )
                .into());
            }
        }

        Ok(())
    }

    fn jacobian<P: Problem>(
        &self,
        problem: &P,
        x: &Array1<f64>,
        f: &Array1<f64>,
        bounds: &BoxBounds,
    ) -> Result<Array2<f64>> {
        let jac = match self.config.diff_method {
            DiffMethod::Analytical => problem.jacobian(x)?,
            _ if problem.has_custom_jacobian() => problem.jacobian(x)?,
            DiffMethod::Forward => {
                jacobian_forward_bounded(problem, x, f, bounds.lower(), bounds.upper())?
            }
            DiffMethod::Central => {
                jacobian_central_bounded(problem, x, f, bounds.lower(), bounds.upper())?
            }
        };

        if jac.dim() != (f.len(), x.len()) {
            return Err(EisFitError::DimensionMismatch(format!(
                "Expected a {}x{} Jacobian, got {}x{}",
                f.len(),
                x.len(),
                jac.nrows(),
                jac.ncols()
            )));
        }

        Ok(jac)
    }

    /// Minimize `½‖r(x)‖²` over the box for the given problem.
    ///
    /// # Arguments
    ///
    /// * `problem` - The problem to solve
    /// * `x0` - Starting point; must lie within `bounds`
    /// * `bounds` - Box constraints
    ///
    /// # Errors
    ///
    /// Configuration errors (wrong lengths, `x0` outside the bounds, invalid
    /// tolerances, the analytical method on a problem without a Jacobian)
    /// are returned before the problem is evaluated. Errors raised
    /// by the problem itself are propagated. Non-finite residuals are not an
    /// error: they end the solve with [`TerminationReason::NumericalFailure`].
    pub fn minimize<P: Problem>(
        &self,
        problem: &P,
        x0: Array1<f64>,
        bounds: &BoxBounds,
    ) -> Result<SolverResult> {
        let n = problem.parameter_count();
        let m = problem.residual_count();

        if x0.len() != n {
            return Err(ConfigurationError::LengthMismatch {
                expected: n,
                actual: x0.len(),
            }
            .into());
        }
        if bounds.len() != n {
            return Err(ConfigurationError::LengthMismatch {
                expected: n,
                actual: bounds.len(),
            }
            .into());
        }
        if n == 0 || m == 0 {
            return Err(EisFitError::DimensionMismatch(format!(
                "Problem needs at least one parameter and one residual, got {} and {}",
                n, m
            )));
        }
        bounds.check_feasible(&x0)?;
        self.validate(n)?;
        if self.config.diff_method == DiffMethod::Analytical && !problem.has_custom_jacobian() {
            return Err(ConfigurationError::InvalidSetting(
                "the analytical Jacobian method needs a problem that provides a Jacobian"
                    .to_string(),
            )
            .into());
        }

        let max_nfev = self.config.max_nfev_for(n);
        let criteria =
            ConvergenceCriteria::new(self.config.ftol, self.config.xtol, self.config.gtol);

        let mut x = bounds.make_strictly_feasible(&x0, self.config.initial_rstep);
        let mut f = problem.eval(&x)?;
        let mut nfev = 1;
        if f.len() != m {
            return Err(EisFitError::DimensionMismatch(format!(
                "Expected {} residuals, got {}",
                m,
                f.len()
            )));
        }

        let mut cost = 0.5 * f.dot(&f);
        if !all_finite(f.iter()) {
            warn!("Residuals are not finite at the starting point");
            return Ok(SolverResult {
                active_mask: bounds.active_constraints(&x, self.config.xtol),
                params: x,
                residuals: f,
                cost,
                optimality: f64::NAN,
                iterations: 0,
                nfev,
                njev: 0,
                termination: TerminationReason::NumericalFailure,
            });
        }

        let mut jac = self.jacobian(problem, &x, &f, bounds)?;
        let mut njev = 1;
        let mut g = jac.t().dot(&f);
        let mut termination = if all_finite(jac.iter()) {
            None
        } else {
            warn!("Jacobian is not finite at the starting point");
            Some(TerminationReason::NumericalFailure)
        };

        let (mut scale, mut scale_inv) = match &self.config.x_scale {
            XScale::Unit => (Array1::ones(n), Array1::ones(n)),
            XScale::Fixed(values) => {
                let scale = Array1::from_vec(values.clone());
                let scale_inv = scale.mapv(|s| 1.0 / s);
                (scale, scale_inv)
            }
            XScale::Jacobian => jacobian_scale(&jac, None),
        };

        let (mut v, dv) = bounds.scaling_vector(&x, &g);
        for i in 0..n {
            if dv[i] != 0.0 {
                v[i] *= scale_inv[i];
            }
        }
        let initial_radius = norm(&(&x * &scale_inv / &v.mapv(f64::sqrt)));
        let mut region = TrustRegion::new(initial_radius);

        let mut iterations = 0;

        while termination.is_none() {
            let (mut v, dv) = bounds.scaling_vector(&x, &g);
            let g_norm = inf_norm(&(&g * &v));
            termination = criteria.check_gradient(g_norm);
            if termination.is_some() || nfev >= max_nfev {
                break;
            }

            // Coleman-Li scaling on top of the variable scaling
            for i in 0..n {
                if dv[i] != 0.0 {
                    v[i] *= scale_inv[i];
                }
            }
            let d = v.mapv(f64::sqrt) * &scale;
            let diag_h = &g * &dv * &scale;
            let g_h = &d * &g;
            let j_h = &jac * &d;

            let mut j_augmented = Array2::zeros((m + n, n));
            j_augmented.slice_mut(s![..m, ..]).assign(&j_h);
            for i in 0..n {
                j_augmented[[m + i, i]] = diag_h[i].sqrt();
            }
            let mut f_augmented = Array1::zeros(m + n);
            f_augmented.slice_mut(s![..m]).assign(&f);

            let subproblem = Subproblem::new(&j_augmented, &f_augmented)?;
            let theta = (1.0 - g_norm).max(0.995);
            let x_norm = norm(&x);

            let mut actual_reduction = -1.0;
            let mut accepted = None;

            while actual_reduction <= 0.0 && nfev < max_nfev {
                if region.has_collapsed() {
                    termination = Some(TerminationReason::TrustRegionCollapsed);
                    break;
                }

                let (p_h, alpha) = subproblem.solve(region.radius, region.alpha);
                region.alpha = alpha;

                let context = StepContext {
                    x: &x,
                    bounds,
                    model: QuadraticModel {
                        jacobian: &j_h,
                        gradient: &g_h,
                        diag: Some(&diag_h),
                    },
                    d: &d,
                    delta: region.radius,
                    theta,
                };
                let selected = context.select(p_h);

                let x_new = bounds.make_strictly_feasible(&(&x + &selected.step), 0.0);
                let f_new = problem.eval(&x_new)?;
                nfev += 1;

                if !all_finite(f_new.iter()) {
                    warn!(
                        "Non-finite residuals at trial point after {} evaluations",
                        nfev
                    );
                    termination = Some(TerminationReason::NumericalFailure);
                    break;
                }

                let cost_new = 0.5 * f_new.dot(&f_new);
                actual_reduction = cost - cost_new;

                let step_h_norm = norm(&selected.step_h);
                let (radius_new, ratio) = region.propose(
                    actual_reduction,
                    selected.predicted_reduction,
                    step_h_norm,
                    step_h_norm > 0.95 * region.radius,
                );

                termination =
                    criteria.check_step(actual_reduction, cost, norm(&selected.step), x_norm, ratio);

                if actual_reduction > 0.0 {
                    accepted = Some((x_new, f_new, cost_new));
                }
                if termination.is_some() {
                    break;
                }

                region.resize(radius_new);
            }

            if let Some((x_new, f_new, cost_new)) = accepted {
                x = x_new;
                f = f_new;
                cost = cost_new;

                if termination.is_none() {
                    jac = self.jacobian(problem, &x, &f, bounds)?;
                    njev += 1;
                    if !all_finite(jac.iter()) {
                        warn!("Jacobian is not finite after {} iterations", iterations);
                        termination = Some(TerminationReason::NumericalFailure);
                    }
                    g = jac.t().dot(&f);
                    if matches!(self.config.x_scale, XScale::Jacobian) {
                        let (new_scale, new_scale_inv) = jacobian_scale(&jac, Some(&scale_inv));
                        scale = new_scale;
                        scale_inv = new_scale_inv;
                    }
                }

                debug!(
                    "iteration {}: cost = {:.6e}, nfev = {}, radius = {:.3e}",
                    iterations, cost, nfev, region.radius
                );
            }

            iterations += 1;
        }

        let termination = termination.unwrap_or(TerminationReason::MaxEvaluationsReached);
        let (v, _) = bounds.scaling_vector(&x, &g);
        let optimality = inf_norm(&(&g * &v));

        info!(
            "Solver finished after {} iterations ({} evaluations): {}, cost = {:.6e}",
            iterations, nfev, termination, cost
        );

        Ok(SolverResult {
            active_mask: bounds.active_constraints(&x, self.config.xtol),
            params: x,
            residuals: f,
            cost,
            optimality,
            iterations,
            nfev,
            njev,
            termination,
        })
    }
}
