//! Trust-region-reflective algorithm for bound-constrained least squares.
//!
//! The solver minimises `½‖r(x)‖²` subject to `lower ≤ x ≤ upper`. Iterates
//! stay strictly inside the box: the trust-region subproblem is posed in
//! variables scaled by the distance to the bounds, and steps that would leave
//! the box are truncated, reflected, or replaced by a constrained Cauchy step.

pub mod algorithm;
pub mod bounds;
pub mod config;
pub mod convergence;
pub mod step;
pub mod trust_region;

// Re-export key types
pub use algorithm::{SolverResult, TrustRegionReflective};
pub use bounds::BoxBounds;
pub use config::{DiffMethod, TrfConfig, XScale};
pub use convergence::{ConvergenceCriteria, TerminationReason};
pub use step::{QuadraticModel, SelectedStep, StepContext};
pub use trust_region::{Subproblem, TrustRegion};
