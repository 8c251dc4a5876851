//! Typed parameter vectors with per-component bounds.

use crate::error::{ConfigurationError, Result};
use crate::measurement::Measurement;
use crate::models::ImpedanceModel;
use crate::parameters::Parameter;
use crate::trf::BoxBounds;
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Initial guess and bounds for one circuit model.
///
/// Invariants, checked in [`ParameterVector::new`]: every lower bound is
/// strictly below its upper bound and the initial value is finite and lies
/// in `[lower, upper]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ParameterVector<M: ImpedanceModel> {
    initial: M,
    lower: M,
    upper: M,
}

impl<M: ImpedanceModel> ParameterVector<M> {
    /// Create a parameter vector, validating the bounds and the initial guess.
    pub fn new(initial: M, lower: M, upper: M) -> Result<Self> {
        let names = M::PARAMETER_NAMES;
        let values = initial.to_values();
        let lo = lower.to_values();
        let hi = upper.to_values();

        for i in 0..names.len() {
            let name = names[i].to_string();
            if !(lo[i] < hi[i]) {
                return Err(ConfigurationError::InvalidBounds {
                    name,
                    lower: lo[i],
                    upper: hi[i],
                }
                .into());
            }
            if !values[i].is_finite() {
                return Err(ConfigurationError::NonFiniteInitial { name }.into());
            }
            if values[i] < lo[i] || values[i] > hi[i] {
                return Err(ConfigurationError::InitialOutsideBounds {
                    name,
                    value: values[i],
                    lower: lo[i],
                    upper: hi[i],
                }
                .into());
            }
        }

        Ok(Self {
            initial,
            lower,
            upper,
        })
    }

    /// Use the model's physical default bounds.
    pub fn with_default_bounds(initial: M) -> Result<Self> {
        let (lower, upper) = M::default_bounds();
        Self::new(initial, lower, upper)
    }

    /// Data-driven initial guess clamped into the default bounds.
    pub fn from_measurement(measurement: &Measurement) -> Result<Self> {
        let (lower, upper) = M::default_bounds();
        let guess = M::initial_guess(measurement).to_values();
        let clamped: Vec<f64> = guess
            .iter()
            .zip(lower.to_values())
            .zip(upper.to_values())
            .map(|((&x, lo), hi)| if x.is_nan() { x } else { x.clamp(lo, hi) })
            .collect();

        Self::new(M::from_values(&clamped)?, lower, upper)
    }

    pub fn initial(&self) -> &M {
        &self.initial
    }

    pub fn lower(&self) -> &M {
        &self.lower
    }

    pub fn upper(&self) -> &M {
        &self.upper
    }

    /// The bounds in the solver's representation.
    pub fn box_bounds(&self) -> Result<BoxBounds> {
        BoxBounds::new(self.lower.to_array(), self.upper.to_array())
    }

    /// Named parameters for `values`, carrying these bounds.
    pub fn describe(&self, values: &M) -> Vec<Parameter> {
        let lower = self.lower.to_values();
        let upper = self.upper.to_values();
        values
            .to_values()
            .into_iter()
            .enumerate()
            .map(|(i, value)| Parameter {
                name: M::PARAMETER_NAMES[i].to_string(),
                unit: M::PARAMETER_UNITS[i].to_string(),
                value,
                lower: lower[i],
                upper: upper[i],
            })
            .collect()
    }

    /// The initial guess as an array, in parameter order.
    pub fn initial_array(&self) -> Array1<f64> {
        self.initial.to_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EisFitError;
    use crate::measurement::ImpedanceRecord;
    use crate::models::{ModifiedRandles, Randles, TwoRcThevenin};

    fn randles(rs: f64, rct: f64, cdl: f64, aw: f64) -> Randles {
        Randles { rs, rct, cdl, aw }
    }

    #[test]
    fn test_valid_vector() {
        let params = ParameterVector::with_default_bounds(randles(10.0, 100.0, 1e-5, 50.0)).unwrap();
        let bounds = params.box_bounds().unwrap();
        assert_eq!(bounds.len(), 4);
        assert_eq!(bounds.upper()[2], 1.0);

        let described = params.describe(params.initial());
        assert_eq!(described[1].name, "Rct");
        assert_eq!(described[2].unit, "F");
        assert_eq!(described[2].lower, 1e-12);
    }

    #[test]
    fn test_collapsed_bounds_rejected() {
        let lower = randles(0.0, 0.0, 1e-6, 0.0);
        let upper = randles(100.0, 0.0, 1.0, 100.0);
        let err = ParameterVector::new(randles(1.0, 0.0, 1e-5, 1.0), lower, upper).unwrap_err();
        assert!(matches!(
            err,
            EisFitError::Configuration(ConfigurationError::InvalidBounds { ref name, .. }) if name == "Rct"
        ));
    }

    #[test]
    fn test_initial_outside_bounds_rejected() {
        let err = ParameterVector::with_default_bounds(randles(-1.0, 10.0, 1e-5, 1.0)).unwrap_err();
        assert!(matches!(
            err,
            EisFitError::Configuration(ConfigurationError::InitialOutsideBounds { ref name, .. }) if name == "Rs"
        ));

        let err = ParameterVector::with_default_bounds(randles(1.0, f64::NAN, 1e-5, 1.0)).unwrap_err();
        assert!(matches!(
            err,
            EisFitError::Configuration(ConfigurationError::NonFiniteInitial { .. })
        ));
    }

    #[test]
    fn test_guess_from_measurement() {
        let m = Measurement::new(&[
            ImpedanceRecord::new(1000.0, 10.0, -1.0),
            ImpedanceRecord::new(1.0, 110.0, -20.0),
        ])
        .unwrap();

        let randles = ParameterVector::<Randles>::from_measurement(&m).unwrap();
        assert_eq!(randles.initial().rs, 8.0);
        assert_eq!(randles.initial().rct, 0.8 * 102.0);
        assert_eq!(randles.initial().cdl, 1e-9);

        let thevenin = ParameterVector::<TwoRcThevenin>::from_measurement(&m).unwrap();
        assert_eq!(thevenin.initial().rs, 9.0);
        assert_eq!(thevenin.initial().r2, 0.5 * 101.0);

        let modified = ParameterVector::<ModifiedRandles>::from_measurement(&m).unwrap();
        assert_eq!(modified.initial().nsei, 0.8);
        assert_eq!(modified.initial().aw, 50.0);
    }

    #[test]
    fn test_guess_is_clamped() {
        // Negative real parts would give a negative Rs guess
        let m = Measurement::new(&[
            ImpedanceRecord::new(1000.0, -2.0, -1.0),
            ImpedanceRecord::new(1.0, 5.0, -2.0),
        ])
        .unwrap();
        let params = ParameterVector::<Randles>::from_measurement(&m).unwrap();
        assert_eq!(params.initial().rs, 0.0);
    }
}
