//! Termination criteria for the trust-region-reflective solver.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// Relative reduction of the cost fell below `ftol`.
    ConvergedFtol,

    /// Relative step size fell below `xtol`.
    ConvergedXtol,

    /// Scaled gradient norm fell below `gtol`.
    ConvergedGradient,

    /// The function-evaluation budget `max_nfev` was exhausted.
    MaxEvaluationsReached,

    /// The trust radius shrank below machine precision without progress.
    TrustRegionCollapsed,

    /// Residuals or the Jacobian became non-finite.
    NumericalFailure,
}

impl TerminationReason {
    /// Returns true if one of the convergence tests was met.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            TerminationReason::ConvergedFtol
                | TerminationReason::ConvergedXtol
                | TerminationReason::ConvergedGradient
        )
    }

    /// Returns true if the fit stopped early without failing numerically.
    pub fn is_non_convergence(&self) -> bool {
        matches!(
            self,
            TerminationReason::MaxEvaluationsReached | TerminationReason::TrustRegionCollapsed
        )
    }

    /// Returns true if the fit was aborted on non-finite values.
    pub fn is_failure(&self) -> bool {
        matches!(self, TerminationReason::NumericalFailure)
    }

    /// Returns a description of the termination reason.
    pub fn description(&self) -> &'static str {
        match self {
            TerminationReason::ConvergedFtol => "Converged: relative cost reduction below ftol",
            TerminationReason::ConvergedXtol => "Converged: relative step size below xtol",
            TerminationReason::ConvergedGradient => "Converged: scaled gradient below gtol",
            TerminationReason::MaxEvaluationsReached => {
                "Stopped early: function evaluation budget exhausted"
            }
            TerminationReason::TrustRegionCollapsed => {
                "Stopped early: trust region collapsed below machine precision"
            }
            TerminationReason::NumericalFailure => "Failed: non-finite residuals or Jacobian",
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Tolerances checked after every trial step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceCriteria {
    /// Tolerance for the relative change in cost.
    pub ftol: f64,

    /// Tolerance for the relative step size.
    pub xtol: f64,

    /// Tolerance for the scaled gradient norm.
    pub gtol: f64,
}

impl ConvergenceCriteria {
    /// Creates a new set of convergence criteria with the given tolerances.
    pub fn new(ftol: f64, xtol: f64, gtol: f64) -> Self {
        Self { ftol, xtol, gtol }
    }

    /// Check the step-based criteria after a trial step.
    ///
    /// # Arguments
    ///
    /// * `actual_reduction` - Cost decrease achieved by the step (dF)
    /// * `cost` - Cost before the step (F)
    /// * `step_norm` - Euclidean norm of the step
    /// * `x_norm` - Euclidean norm of the iterate before the step
    /// * `ratio` - Actual over predicted reduction
    pub fn check_step(
        &self,
        actual_reduction: f64,
        cost: f64,
        step_norm: f64,
        x_norm: f64,
        ratio: f64,
    ) -> Option<TerminationReason> {
        let ftol_satisfied = actual_reduction < self.ftol * cost && ratio > 0.25;
        let xtol_satisfied = step_norm < self.xtol * (self.xtol + x_norm);

        if ftol_satisfied {
            Some(TerminationReason::ConvergedFtol)
        } else if xtol_satisfied {
            Some(TerminationReason::ConvergedXtol)
        } else {
            None
        }
    }

    /// Check the first-order optimality criterion.
    pub fn check_gradient(&self, scaled_gradient_norm: f64) -> Option<TerminationReason> {
        (scaled_gradient_norm < self.gtol).then_some(TerminationReason::ConvergedGradient)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_criteria() {
        let criteria = ConvergenceCriteria::new(1e-8, 1e-8, 1e-8);

        // Tiny cost reduction on a well-predicted step
        assert_eq!(
            criteria.check_step(1e-10, 10.0, 0.1, 1.0, 0.9),
            Some(TerminationReason::ConvergedFtol)
        );

        // Same reduction but poorly predicted: ftol does not fire
        assert_eq!(criteria.check_step(1e-10, 10.0, 0.1, 1.0, 0.1), None);

        // Tiny step
        assert_eq!(
            criteria.check_step(1.0, 10.0, 1e-12, 1.0, 0.1),
            Some(TerminationReason::ConvergedXtol)
        );

        // Both satisfied reports ftol
        assert_eq!(
            criteria.check_step(1e-10, 10.0, 1e-12, 1.0, 0.9),
            Some(TerminationReason::ConvergedFtol)
        );

        // Still running
        assert_eq!(criteria.check_step(1.0, 10.0, 0.1, 1.0, 0.9), None);
    }

    #[test]
    fn test_gradient_criterion() {
        let criteria = ConvergenceCriteria::new(1e-8, 1e-8, 1e-8);
        assert_eq!(
            criteria.check_gradient(1e-9),
            Some(TerminationReason::ConvergedGradient)
        );
        assert_eq!(criteria.check_gradient(1e-3), None);
    }

    #[test]
    fn test_termination_reason_classification() {
        assert!(TerminationReason::ConvergedFtol.is_converged());
        assert!(TerminationReason::ConvergedXtol.is_converged());
        assert!(TerminationReason::ConvergedGradient.is_converged());
        assert!(!TerminationReason::MaxEvaluationsReached.is_converged());
        assert!(!TerminationReason::NumericalFailure.is_converged());

        assert!(TerminationReason::MaxEvaluationsReached.is_non_convergence());
        assert!(TerminationReason::TrustRegionCollapsed.is_non_convergence());
        assert!(TerminationReason::NumericalFailure.is_failure());
    }

    #[test]
    fn test_serialized_names() {
        let json = serde_json::to_string(&TerminationReason::MaxEvaluationsReached).unwrap();
        assert_eq!(json, "\"max_evaluations_reached\"");
    }
}
