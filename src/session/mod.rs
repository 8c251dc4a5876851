//! Fit orchestration.
//!
//! A [`FitSession`] is configured with a [`ModelKind`] and solver settings.
//! It is the only place where the concrete circuit model is chosen; the
//! generic [`fit`] function does the actual work for a typed model.
//!
//! ```rust,no_run
//! use eisfit_rs::measurement::Measurement;
//! use eisfit_rs::models::ModelKind;
//! use eisfit_rs::session::FitSession;
//!
//! let measurement = Measurement::from_csv_path("spectrum.csv").unwrap();
//! let outcome = FitSession::new(ModelKind::Randles).run(&measurement).unwrap();
//! println!("{}", outcome.summary());
//! ```

use crate::error::Result;
use crate::measurement::Measurement;
use crate::models::{ImpedanceModel, ModelKind, ModifiedRandles, Randles, TwoRcThevenin};
use crate::parameters::ParameterVector;
use crate::residual::ResidualFunction;
use crate::trf::{DiffMethod, TerminationReason, TrfConfig, TrustRegionReflective, XScale};
use log::{debug, info};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub mod report;
pub mod setup;

pub use report::{FitReport, FitResult, FitSummary, NyquistSeries};
pub use setup::ModelSetup;

/// Fit a typed model to a measurement.
///
/// # Arguments
///
/// * `measurement` - The measured spectrum
/// * `parameters` - Initial guess and bounds
/// * `config` - Solver configuration
///
/// # Returns
///
/// * The fit report, whatever the termination reason. Configuration errors
///   are returned before any residual evaluation.
pub fn fit<M: ImpedanceModel>(
    measurement: &Measurement,
    parameters: &ParameterVector<M>,
    config: &TrfConfig,
) -> Result<FitReport<M>> {
    info!(
        "Fitting {} model to {} samples",
        M::KIND,
        measurement.len()
    );
    debug!("Initial guess: {:?}", parameters.initial());

    let problem = ResidualFunction::<M>::new(measurement);
    let bounds = parameters.box_bounds()?;
    let solver = TrustRegionReflective::with_config(config.clone());
    let solution = solver.minimize(&problem, parameters.initial_array(), &bounds)?;

    let result = FitResult::<M>::from_solver(solution)?;
    let fitted = result.parameters.evaluate(measurement.omega());

    Ok(FitReport {
        setup: *parameters,
        result,
        fitted,
        measurement: measurement.clone(),
    })
}

/// Result of a session run for whichever model was configured.
#[derive(Debug, Clone)]
pub enum FitOutcome {
    Randles(FitReport<Randles>),
    TwoRcThevenin(FitReport<TwoRcThevenin>),
    ModifiedRandles(FitReport<ModifiedRandles>),
}

impl FitOutcome {
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Randles(_) => ModelKind::Randles,
            Self::TwoRcThevenin(_) => ModelKind::TwoRcThevenin,
            Self::ModifiedRandles(_) => ModelKind::ModifiedRandles,
        }
    }

    pub fn summary(&self) -> FitSummary {
        match self {
            Self::Randles(report) => report.summary(),
            Self::TwoRcThevenin(report) => report.summary(),
            Self::ModifiedRandles(report) => report.summary(),
        }
    }

    pub fn nyquist(&self) -> NyquistSeries {
        match self {
            Self::Randles(report) => report.nyquist(),
            Self::TwoRcThevenin(report) => report.nyquist(),
            Self::ModifiedRandles(report) => report.nyquist(),
        }
    }

    pub fn termination(&self) -> TerminationReason {
        match self {
            Self::Randles(report) => report.result.termination,
            Self::TwoRcThevenin(report) => report.result.termination,
            Self::ModifiedRandles(report) => report.result.termination,
        }
    }

    /// Fitted parameter values in parameter order.
    pub fn values(&self) -> Vec<f64> {
        match self {
            Self::Randles(report) => report.result.parameters.to_values(),
            Self::TwoRcThevenin(report) => report.result.parameters.to_values(),
            Self::ModifiedRandles(report) => report.result.parameters.to_values(),
        }
    }
}

/// Configured fit of one circuit model.
#[derive(Debug, Clone)]
pub struct FitSession {
    kind: ModelKind,
    config: TrfConfig,
}

impl FitSession {
    /// Create a session for `kind` with the model's default evaluation budget.
    pub fn new(kind: ModelKind) -> Self {
        Self {
            kind,
            config: TrfConfig {
                max_nfev: Some(kind.default_max_nfev()),
                ..TrfConfig::default()
            },
        }
    }

    /// Replace the whole solver configuration.
    pub fn with_config(mut self, config: TrfConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    pub fn with_max_nfev(mut self, max_nfev: usize) -> Self {
        self.config.max_nfev = Some(max_nfev);
        self
    }

    pub fn with_diff_method(mut self, method: DiffMethod) -> Self {
        self.config.diff_method = method;
        self
    }

    pub fn with_x_scale(mut self, x_scale: XScale) -> Self {
        self.config.x_scale = x_scale;
        self
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn config(&self) -> &TrfConfig {
        &self.config
    }

    /// Fit starting from the data-driven initial guess.
    pub fn run(&self, measurement: &Measurement) -> Result<FitOutcome> {
        let setup = ModelSetup::from_measurement(self.kind, measurement)?;
        self.run_with(&setup, measurement)
    }

    /// Fit from an explicit initial guess and bounds.
    ///
    /// The setup must be for the session's model.
    pub fn run_with(&self, setup: &ModelSetup, measurement: &Measurement) -> Result<FitOutcome> {
        setup.expect_kind(self.kind)?;

        let outcome = match setup {
            ModelSetup::Randles(p) => FitOutcome::Randles(fit(measurement, p, &self.config)?),
            ModelSetup::TwoRcThevenin(p) => {
                FitOutcome::TwoRcThevenin(fit(measurement, p, &self.config)?)
            }
            ModelSetup::ModifiedRandles(p) => {
                FitOutcome::ModifiedRandles(fit(measurement, p, &self.config)?)
            }
        };

        info!("{} fit finished: {}", self.kind, outcome.termination());
        Ok(outcome)
    }
}

/// Fit independent measurements with the same session.
///
/// With the `parallel` feature each measurement is fitted on its own rayon
/// worker. Results are in input order.
pub fn fit_batch(session: &FitSession, measurements: &[Measurement]) -> Vec<Result<FitOutcome>> {
    #[cfg(feature = "parallel")]
    {
        measurements.par_iter().map(|m| session.run(m)).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        measurements.iter().map(|m| session.run(m)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConfigurationError, EisFitError};
    use ndarray::Array1;

    #[test]
    fn test_session_defaults() {
        let session = FitSession::new(ModelKind::ModifiedRandles);
        assert_eq!(session.config().max_nfev, Some(30_000));
        assert_eq!(session.config().xtol, 1e-12);

        let session = FitSession::new(ModelKind::Randles).with_max_nfev(50);
        assert_eq!(session.config().max_nfev, Some(50));
    }

    #[test]
    fn test_mismatched_setup_rejected() {
        let truth = Randles {
            rs: 10.0,
            rct: 100.0,
            cdl: 1e-5,
            aw: 50.0,
        };
        let m = Measurement::synthetic(&truth, Array1::logspace(10.0, -1.0, 5.0, 30)).unwrap();
        let setup = ModelSetup::from_measurement(ModelKind::Randles, &m).unwrap();

        let err = FitSession::new(ModelKind::TwoRcThevenin)
            .run_with(&setup, &m)
            .unwrap_err();
        assert!(matches!(
            err,
            EisFitError::Configuration(ConfigurationError::InvalidSetting(_))
        ));
    }
}
