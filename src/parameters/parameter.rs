//! Named parameter values for reporting.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A fitted or initial circuit parameter together with its bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Name of the parameter, e.g. `Rct`
    pub name: String,

    /// Unit of the parameter, empty for dimensionless exponents
    pub unit: String,

    /// Value of the parameter
    pub value: f64,

    /// Lower bound; `null` in JSON when unbounded
    #[serde(serialize_with = "finite_or_null", deserialize_with = "null_as_neg_infinity")]
    pub lower: f64,

    /// Upper bound; `null` in JSON when unbounded
    #[serde(serialize_with = "finite_or_null", deserialize_with = "null_as_infinity")]
    pub upper: f64,
}

fn finite_or_null<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() {
        serializer.serialize_some(value)
    } else {
        serializer.serialize_none()
    }
}

fn null_as_neg_infinity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NEG_INFINITY))
}

fn null_as_infinity<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}

impl Parameter {
    /// Whether the value lies within `rtol·max(1, |bound|)` of a finite bound.
    pub fn is_at_bound(&self, rtol: f64) -> bool {
        let near = |bound: f64| {
            bound.is_finite() && (self.value - bound).abs() <= rtol * bound.abs().max(1.0)
        };
        near(self.lower) || near(self.upper)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:>6} = {:.6e}", self.name, self.value)?;
        if !self.unit.is_empty() {
            write!(f, " {}", self.unit)?;
        }
        write!(f, "  [{:e}, {:e}]", self.lower, self.upper)
    }
}
