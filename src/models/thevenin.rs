//! Second-order Thevenin equivalent circuit.

use super::elements::rc_parallel;
use super::{length_mismatch, ImpedanceModel, ModelKind};
use crate::error::Result;
use crate::measurement::Measurement;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// Two RC blocks in series with a resistance: `Rs + (R1 ‖ C1) + (R2 ‖ C2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwoRcThevenin {
    pub rs: f64,
    pub r1: f64,
    pub c1: f64,
    pub r2: f64,
    pub c2: f64,
}

impl TwoRcThevenin {
    /// Time constants `(R1·C1, R2·C2)` of the two RC blocks.
    pub fn time_constants(&self) -> (f64, f64) {
        (self.r1 * self.c1, self.r2 * self.c2)
    }
}

impl ImpedanceModel for TwoRcThevenin {
    const KIND: ModelKind = ModelKind::TwoRcThevenin;
    const PARAMETER_NAMES: &'static [&'static str] = &["Rs", "R1", "C1", "R2", "C2"];
    const PARAMETER_UNITS: &'static [&'static str] = &["Ω", "Ω", "F", "Ω", "F"];

    fn from_values(values: &[f64]) -> Result<Self> {
        match *values {
            [rs, r1, c1, r2, c2] => Ok(Self { rs, r1, c1, r2, c2 }),
            _ => Err(length_mismatch(5, values.len())),
        }
    }

    fn to_values(&self) -> Vec<f64> {
        vec![self.rs, self.r1, self.c1, self.r2, self.c2]
    }

    fn impedance_at(&self, omega: f64) -> Complex64 {
        self.rs + rc_parallel(self.r1, self.c1, omega) + rc_parallel(self.r2, self.c2, omega)
    }

    fn default_bounds() -> (Self, Self) {
        (
            Self {
                rs: 0.0,
                r1: 0.0,
                c1: 1e-9,
                r2: 0.0,
                c2: 1e-9,
            },
            Self {
                rs: f64::INFINITY,
                r1: f64::INFINITY,
                c1: f64::INFINITY,
                r2: f64::INFINITY,
                c2: f64::INFINITY,
            },
        )
    }

    fn initial_guess(measurement: &Measurement) -> Self {
        let rs = 0.9 * measurement.min_real();
        let span = measurement.max_real() - rs;
        Self {
            rs,
            r1: 0.25 * span,
            c1: 1e-4,
            r2: 0.5 * span,
            c2: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_time_constants() {
        let model = TwoRcThevenin {
            rs: 0.01,
            r1: 0.02,
            c1: 500.0,
            r2: 0.03,
            c2: 2e4,
        };
        let (tau1, tau2) = model.time_constants();
        assert_relative_eq!(tau1, 10.0);
        assert_relative_eq!(tau2, 600.0);
    }

    #[test]
    fn test_dc_limit_is_total_resistance() {
        let model = TwoRcThevenin::from_values(&[1.0, 2.0, 1e-3, 3.0, 1e-1]).unwrap();
        let z = model.impedance_at(1e-9);
        assert_relative_eq!(z.re, 6.0, max_relative = 1e-6);
        assert!(TwoRcThevenin::from_values(&[1.0; 4]).is_err());
    }
}
