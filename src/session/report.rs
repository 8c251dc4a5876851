//! Fit results and their reporting forms.

use crate::error::Result;
use crate::measurement::Measurement;
use crate::models::{ImpedanceModel, ModelKind};
use crate::parameters::{Parameter, ParameterVector};
use crate::trf::{SolverResult, TerminationReason};
use ndarray::Array1;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one solver run, with the parameters in their typed form.
#[derive(Debug, Clone)]
pub struct FitResult<M: ImpedanceModel> {
    /// Best parameters found; finite and within bounds
    pub parameters: M,

    /// Residual vector at `parameters`, real parts first
    pub residuals: Array1<f64>,

    /// Cost `½‖r‖²`
    pub cost: f64,

    /// Scaled first-order optimality
    pub optimality: f64,

    /// Per-parameter active bounds: -1 lower, 1 upper, 0 free
    pub active_mask: Vec<i8>,

    /// Residual evaluations at the starting point and trial points
    pub nfev: usize,

    /// Jacobian evaluations
    pub njev: usize,

    /// Outer solver iterations
    pub iterations: usize,

    /// Why the solver stopped
    pub termination: TerminationReason,
}

impl<M: ImpedanceModel> FitResult<M> {
    pub(crate) fn from_solver(result: SolverResult) -> Result<Self> {
        Ok(Self {
            parameters: M::from_values(&result.params.to_vec())?,
            residuals: result.residuals,
            cost: result.cost,
            optimality: result.optimality,
            active_mask: result.active_mask,
            nfev: result.nfev,
            njev: result.njev,
            iterations: result.iterations,
            termination: result.termination,
        })
    }

    /// Whether a convergence criterion was met.
    pub fn success(&self) -> bool {
        self.termination.is_converged()
    }

    /// Root-mean-square residual over all real and imaginary components.
    pub fn rmse(&self) -> f64 {
        if self.residuals.is_empty() {
            return 0.0;
        }
        (2.0 * self.cost / self.residuals.len() as f64).sqrt()
    }
}

/// A fit together with what produced it and the curve it yields.
#[derive(Debug, Clone)]
pub struct FitReport<M: ImpedanceModel> {
    /// Initial guess and bounds the fit started from
    pub setup: ParameterVector<M>,

    /// Solver outcome
    pub result: FitResult<M>,

    /// Model impedance at the fitted parameters, one value per sample
    pub fitted: Array1<Complex64>,

    /// The fitted measurement
    pub measurement: Measurement,
}

impl<M: ImpedanceModel> FitReport<M> {
    /// Named fitted parameters with their bounds.
    pub fn parameters(&self) -> Vec<Parameter> {
        self.setup.describe(&self.result.parameters)
    }

    /// Report-ready summary of the fit.
    pub fn summary(&self) -> FitSummary {
        FitSummary {
            model: M::KIND,
            parameters: self.parameters(),
            termination: self.result.termination,
            converged: self.result.success(),
            nfev: self.result.nfev,
            njev: self.result.njev,
            iterations: self.result.iterations,
            cost: self.result.cost,
            rmse: self.result.rmse(),
        }
    }

    /// Measured and fitted spectra for a Nyquist plot.
    pub fn nyquist(&self) -> NyquistSeries {
        NyquistSeries::new(&self.measurement, &self.fitted)
    }
}

/// Relative distance within which a fitted value counts as sitting on a bound.
const BOUND_RTOL: f64 = 1e-6;

/// Serializable, human readable summary of a fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitSummary {
    pub model: ModelKind,
    pub parameters: Vec<Parameter>,
    pub termination: TerminationReason,
    pub converged: bool,
    pub nfev: usize,
    pub njev: usize,
    pub iterations: usize,
    pub cost: f64,
    pub rmse: f64,
}

impl FitSummary {
    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a summary back from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Names of the parameters that ended on one of their bounds.
    pub fn parameters_at_bounds(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .filter(|p| p.is_at_bound(BOUND_RTOL))
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Value of the named parameter, if present.
    pub fn value(&self, name: &str) -> Option<f64> {
        self.parameters
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value)
    }
}

impl fmt::Display for FitSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit Result: {}", self.model)?;
        writeln!(f, "  Converged: {}", self.converged)?;
        writeln!(f, "  Termination: {}", self.termination)?;
        writeln!(f, "  Function evaluations: {}", self.nfev)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Cost: {:.6e}", self.cost)?;
        writeln!(f, "  RMSE: {:.6e} Ω", self.rmse)?;
        writeln!(f, "  Parameters:")?;
        for parameter in &self.parameters {
            if parameter.is_at_bound(BOUND_RTOL) {
                writeln!(f, "    {}  (at bound)", parameter)?;
            } else {
                writeln!(f, "    {}", parameter)?;
            }
        }
        Ok(())
    }
}

/// Nyquist coordinates `(Re Z, −Im Z)` of measured and fitted spectra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NyquistSeries {
    /// Sample frequencies in Hz
    pub frequency: Vec<f64>,

    /// Measured points
    pub measured: Vec<(f64, f64)>,

    /// Fitted points at the same frequencies
    pub fitted: Vec<(f64, f64)>,
}

impl NyquistSeries {
    pub fn new(measurement: &Measurement, fitted: &Array1<Complex64>) -> Self {
        let point = |z: &Complex64| (z.re, -z.im);
        Self {
            frequency: measurement.frequency().to_vec(),
            measured: measurement.impedance().iter().map(point).collect(),
            fitted: fitted.iter().map(point).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::ImpedanceRecord;

    #[test]
    fn test_nyquist_flips_imaginary_part() {
        let m = Measurement::new(&[
            ImpedanceRecord::new(10.0, 5.0, -2.0),
            ImpedanceRecord::new(1.0, 7.0, -4.0),
        ])
        .unwrap();
        let fitted = Array1::from_vec(vec![Complex64::new(5.1, -1.9), Complex64::new(6.9, -4.2)]);

        let series = NyquistSeries::new(&m, &fitted);
        assert_eq!(series.measured, vec![(5.0, 2.0), (7.0, 4.0)]);
        assert_eq!(series.fitted[1], (6.9, 4.2));
        assert_eq!(series.frequency, vec![10.0, 1.0]);
    }

    #[test]
    fn test_summary_json() {
        let summary = FitSummary {
            model: ModelKind::Randles,
            parameters: vec![Parameter {
                name: "Rs".to_string(),
                unit: "Ω".to_string(),
                value: 10.0,
                lower: 0.0,
                upper: f64::INFINITY,
            }],
            termination: TerminationReason::ConvergedFtol,
            converged: true,
            nfev: 12,
            njev: 10,
            iterations: 11,
            cost: 0.5,
            rmse: 0.25,
        };

        let json = summary.to_json().unwrap();
        assert!(json.contains("\"converged_ftol\""));
        assert!(json.contains("\"randles\""));
        assert_eq!(FitSummary::from_json(&json).unwrap(), summary);
        assert_eq!(summary.value("Rs"), Some(10.0));
        assert!(format!("{}", summary).contains("Randles"));
        assert!(summary.parameters_at_bounds().is_empty());
    }

    #[test]
    fn test_summary_marks_parameters_at_bounds() {
        let parameter = |name: &str, value: f64, lower: f64, upper: f64| Parameter {
            name: name.to_string(),
            unit: String::new(),
            value,
            lower,
            upper,
        };
        let summary = FitSummary {
            model: ModelKind::ModifiedRandles,
            parameters: vec![
                parameter("Rs", 5.0, 0.0, f64::INFINITY),
                parameter("Aw", 0.0, 0.0, f64::INFINITY),
                parameter("ndl", 1.0, 0.3, 1.0),
            ],
            termination: TerminationReason::ConvergedXtol,
            converged: true,
            nfev: 40,
            njev: 30,
            iterations: 35,
            cost: 0.5,
            rmse: 0.25,
        };

        assert_eq!(summary.parameters_at_bounds(), vec!["Aw", "ndl"]);
        let text = format!("{}", summary);
        assert_eq!(text.matches("(at bound)").count(), 2);
        let rs_line = text.lines().find(|l| l.contains("Rs =")).unwrap();
        assert!(!rs_line.contains("at bound"));
    }
}
