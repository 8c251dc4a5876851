//! # eisfit-rs
//!
//! `eisfit-rs` fits equivalent-circuit models to electrochemical impedance
//! spectra. Parameters are estimated by bound-constrained nonlinear least
//! squares with a trust-region-reflective solver.
//!
//! The library provides:
//! - Three circuit models (Randles, two-RC Thevenin, and a modified Randles
//!   circuit with an SEI layer and constant phase elements) built from shared
//!   primitive elements
//! - A trust-region-reflective solver for box-constrained least squares
//! - Measurement loading and validation, fit summaries and Nyquist series
//!
//! ## Basic Usage
//!
//! ```
//! use eisfit_rs::measurement::Measurement;
//! use eisfit_rs::models::{ImpedanceModel, Randles};
//! use eisfit_rs::parameters::ParameterVector;
//! use eisfit_rs::session::fit;
//! use eisfit_rs::trf::TrfConfig;
//! use ndarray::Array1;
//!
//! let truth = Randles { rs: 10.0, rct: 100.0, cdl: 1e-5, aw: 50.0 };
//! let measurement = Measurement::synthetic(&truth, Array1::logspace(10.0, -1.0, 5.0, 40)).unwrap();
//!
//! let start = Randles { rs: 12.0, rct: 80.0, cdl: 1.2e-5, aw: 40.0 };
//! let params = ParameterVector::with_default_bounds(start).unwrap();
//! let report = fit(&measurement, &params, &TrfConfig::default()).unwrap();
//!
//! println!("{}", report.summary());
//! ```

// Public modules
pub mod error;
pub mod measurement;
pub mod models;
pub mod parameters;
pub mod problem;
pub mod residual;
pub mod session;
pub mod trf;
pub mod utils;

// Re-exports for convenience
pub use error::{ConfigurationError, EisFitError, Result};
pub use measurement::{ImpedanceRecord, Measurement};
pub use models::{ImpedanceModel, ModelKind, ModifiedRandles, Randles, TwoRcThevenin};
pub use parameters::ParameterVector;
pub use problem::Problem;
pub use residual::ResidualFunction;
pub use session::{fit, fit_batch, FitOutcome, FitReport, FitResult, FitSession, FitSummary};
pub use trf::{BoxBounds, SolverResult, TerminationReason, TrfConfig, TrustRegionReflective};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
