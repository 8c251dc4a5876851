//! Equivalent-circuit impedance models.
//!
//! Each circuit is a typed parameter record implementing [`ImpedanceModel`].
//! The records are built from the primitive evaluators in [`elements`], so
//! the CPE and Warburg algebra exists in exactly one place.

use crate::error::{ConfigurationError, EisFitError, Result};
use crate::measurement::Measurement;
use ndarray::Array1;
use num_complex::Complex64;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod elements;
mod modified_randles;
mod randles;
mod thevenin;

// Re-export the models
pub use modified_randles::ModifiedRandles;
pub use randles::Randles;
pub use thevenin::TwoRcThevenin;

/// Identifies one of the supported circuit topologies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// `Rs + (Cdl ‖ (Rct + W))`
    Randles,

    /// `Rs + (R1 ‖ C1) + (R2 ‖ C2)`
    TwoRcThevenin,

    /// `Rs + (Rsei ‖ CPEsei) + (Rct ‖ CPEdl) + W`
    ModifiedRandles,
}

impl ModelKind {
    /// All supported models.
    pub const ALL: [ModelKind; 3] = [
        ModelKind::Randles,
        ModelKind::TwoRcThevenin,
        ModelKind::ModifiedRandles,
    ];

    /// Human readable model name.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::Randles => "Randles",
            ModelKind::TwoRcThevenin => "Two-RC Thevenin",
            ModelKind::ModifiedRandles => "Modified Randles (SEI + CPE + Warburg)",
        }
    }

    /// Ordered parameter names.
    pub fn parameter_names(&self) -> &'static [&'static str] {
        match self {
            ModelKind::Randles => Randles::PARAMETER_NAMES,
            ModelKind::TwoRcThevenin => TwoRcThevenin::PARAMETER_NAMES,
            ModelKind::ModifiedRandles => ModifiedRandles::PARAMETER_NAMES,
        }
    }

    /// Number of fitted parameters.
    pub fn parameter_count(&self) -> usize {
        self.parameter_names().len()
    }

    /// Default residual evaluation budget for fits of this model.
    pub fn default_max_nfev(&self) -> usize {
        match self {
            ModelKind::Randles => 20_000,
            ModelKind::TwoRcThevenin | ModelKind::ModifiedRandles => 30_000,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = EisFitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "randles" => Ok(ModelKind::Randles),
            "thevenin" | "two_rc_thevenin" | "2rc" => Ok(ModelKind::TwoRcThevenin),
            "modified_randles" | "randles_sei" => Ok(ModelKind::ModifiedRandles),
            _ => Err(ConfigurationError::InvalidSetting(format!("Unknown model '{}'", s)).into()),
        }
    }
}

/// A circuit model whose parameters are held in a typed record.
///
/// Implementors are plain `Copy` records; the flat slice form produced by
/// [`to_values`](ImpedanceModel::to_values) follows the order of
/// [`PARAMETER_NAMES`](ImpedanceModel::PARAMETER_NAMES) and is what the
/// solver sees.
pub trait ImpedanceModel:
    Copy + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Which topology this is.
    const KIND: ModelKind;

    /// Ordered parameter names.
    const PARAMETER_NAMES: &'static [&'static str];

    /// Units of the parameters, same order as the names.
    const PARAMETER_UNITS: &'static [&'static str];

    /// Build a record from a flat slice of parameter values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::LengthMismatch`] if the slice does not
    /// hold exactly one value per parameter.
    fn from_values(values: &[f64]) -> Result<Self>;

    /// Flatten the record in parameter order.
    fn to_values(&self) -> Vec<f64>;

    /// Complex impedance at a single angular frequency `omega > 0`.
    fn impedance_at(&self, omega: f64) -> Complex64;

    /// Physical default bounds `(lower, upper)`.
    fn default_bounds() -> (Self, Self);

    /// Data-driven starting point, not yet clamped into the bounds.
    fn initial_guess(measurement: &Measurement) -> Self;

    /// Evaluate the impedance over a series of angular frequencies.
    fn evaluate(&self, omega: &Array1<f64>) -> Array1<Complex64> {
        omega.mapv(|w| self.impedance_at(w))
    }

    /// The parameters as an array, for the solver.
    fn to_array(&self) -> Array1<f64> {
        Array1::from_vec(self.to_values())
    }
}

pub(crate) fn length_mismatch(expected: usize, actual: usize) -> EisFitError {
    ConfigurationError::LengthMismatch { expected, actual }.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!("randles".parse::<ModelKind>().unwrap(), ModelKind::Randles);
        assert_eq!(
            "Two-RC-Thevenin".parse::<ModelKind>().unwrap(),
            ModelKind::TwoRcThevenin
        );
        assert_eq!(
            "modified randles".parse::<ModelKind>().unwrap(),
            ModelKind::ModifiedRandles
        );
        assert!("transmission_line".parse::<ModelKind>().is_err());
    }

    #[test]
    fn test_model_kind_metadata() {
        assert_eq!(ModelKind::Randles.parameter_count(), 4);
        assert_eq!(ModelKind::TwoRcThevenin.parameter_count(), 5);
        assert_eq!(ModelKind::ModifiedRandles.parameter_count(), 8);
        assert_eq!(ModelKind::Randles.default_max_nfev(), 20_000);
        assert_eq!(ModelKind::ModifiedRandles.default_max_nfev(), 30_000);

        let json = serde_json::to_string(&ModelKind::TwoRcThevenin).unwrap();
        assert_eq!(json, "\"two_rc_thevenin\"");
    }
}
