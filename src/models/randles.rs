//! Randles cell with semi-infinite Warburg diffusion.

use super::elements::{capacitor_admittance, shunt, warburg};
use super::{length_mismatch, ImpedanceModel, ModelKind};
use crate::error::Result;
use crate::measurement::Measurement;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Randles circuit: `Rs + (Cdl ‖ (Rct + W))`.
///
/// The series resistance `Rs` models the electrolyte, the double-layer
/// capacitance `Cdl` is in parallel with the charge-transfer branch, which
/// is `Rct` in series with a Warburg element of coefficient `Aw`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Randles {
    /// Series (electrolyte) resistance
    pub rs: f64,

    /// Charge-transfer resistance
    pub rct: f64,

    /// Double-layer capacitance
    pub cdl: f64,

    /// Warburg coefficient
    pub aw: f64,
}

impl ImpedanceModel for Randles {
    const KIND: ModelKind = ModelKind::Randles;
    const PARAMETER_NAMES: &'static [&'static str] = &["Rs", "Rct", "Cdl", "Aw"];
    const PARAMETER_UNITS: &'static [&'static str] = &["Ω", "Ω", "F", "Ω·s^-1/2"];

    fn from_values(values: &[f64]) -> Result<Self> {
        match *values {
            [rs, rct, cdl, aw] => Ok(Self { rs, rct, cdl, aw }),
            _ => Err(length_mismatch(4, values.len())),
        }
    }

    fn to_values(&self) -> Vec<f64> {
        vec![self.rs, self.rct, self.cdl, self.aw]
    }

    fn impedance_at(&self, omega: f64) -> Complex64 {
        let faradaic = self.rct + warburg(self.aw, omega);
        self.rs + shunt(faradaic, capacitor_admittance(self.cdl, omega))
    }

    fn default_bounds() -> (Self, Self) {
        (
            Self {
                rs: 0.0,
                rct: 0.0,
                cdl: 1e-12,
                aw: 0.0,
            },
            Self {
                rs: f64::INFINITY,
                rct: f64::INFINITY,
                cdl: 1.0,
                aw: f64::INFINITY,
            },
        )
    }

    fn initial_guess(measurement: &Measurement) -> Self {
        let rs = 0.8 * measurement.min_real();
        Self {
            rs,
            rct: 0.8 * (measurement.max_real() - rs),
            cdl: 1e-9,
            aw: 100.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_values_round_trip() {
        let model = Randles::from_values(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(model.rct, 2.0);
        assert_eq!(model.to_values(), vec![1.0, 2.0, 3.0, 4.0]);
        assert!(Randles::from_values(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_high_frequency_limit_is_rs() {
        let model = Randles {
            rs: 7.0,
            rct: 30.0,
            cdl: 1e-4,
            aw: 5.0,
        };
        let z = model.impedance_at(1e12);
        assert_relative_eq!(z.re, 7.0, max_relative = 1e-6);
        assert!(z.im.abs() < 1e-6);
    }
}
