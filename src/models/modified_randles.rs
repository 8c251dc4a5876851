//! Randles circuit extended with an SEI layer and constant phase elements.

use super::elements::{r_cpe_parallel, warburg};
use super::{length_mismatch, ImpedanceModel, ModelKind};
use crate::error::Result;
use crate::measurement::Measurement;
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

/// `Rs + (Rsei ‖ CPEsei) + (Rct ‖ CPEdl) + W`.
///
/// The solid-electrolyte interphase and the double layer are each a
/// resistance in parallel with a constant phase element `Q·(jω)^n`; the
/// Warburg element is in series with both.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModifiedRandles {
    /// Series (electrolyte) resistance
    pub rs: f64,

    /// SEI resistance
    pub rsei: f64,

    /// SEI CPE coefficient
    pub qsei: f64,

    /// SEI CPE exponent, in [0, 1]
    pub nsei: f64,

    /// Charge-transfer resistance
    pub rct: f64,

    /// Double-layer CPE coefficient
    pub qdl: f64,

    /// Double-layer CPE exponent, in [0, 1]
    pub ndl: f64,

    /// Warburg coefficient
    pub aw: f64,
}

impl ImpedanceModel for ModifiedRandles {
    const KIND: ModelKind = ModelKind::ModifiedRandles;
    const PARAMETER_NAMES: &'static [&'static str] =
        &["Rs", "Rsei", "Qsei", "nsei", "Rct", "Qdl", "ndl", "Aw"];
    const PARAMETER_UNITS: &'static [&'static str] = &[
        "Ω",
        "Ω",
        "F·s^(n-1)",
        "",
        "Ω",
        "F·s^(n-1)",
        "",
        "Ω·s^-1/2",
    ];

    fn from_values(values: &[f64]) -> Result<Self> {
        match *values {
            [rs, rsei, qsei, nsei, rct, qdl, ndl, aw] => Ok(Self {
                rs,
                rsei,
                qsei,
                nsei,
                rct,
                qdl,
                ndl,
                aw,
            }),
            _ => Err(length_mismatch(8, values.len())),
        }
    }

    fn to_values(&self) -> Vec<f64> {
        vec![
            self.rs, self.rsei, self.qsei, self.nsei, self.rct, self.qdl, self.ndl, self.aw,
        ]
    }

    fn impedance_at(&self, omega: f64) -> Complex64 {
        self.rs
            + r_cpe_parallel(self.rsei, self.qsei, self.nsei, omega)
            + r_cpe_parallel(self.rct, self.qdl, self.ndl, omega)
            + warburg(self.aw, omega)
    }

    fn default_bounds() -> (Self, Self) {
        (
            Self {
                rs: 0.0,
                rsei: 0.0,
                qsei: 1e-12,
                nsei: 0.3,
                rct: 0.0,
                qdl: 1e-12,
                ndl: 0.3,
                aw: 0.0,
            },
            Self {
                rs: f64::INFINITY,
                rsei: f64::INFINITY,
                qsei: 1.0,
                nsei: 1.0,
                rct: f64::INFINITY,
                qdl: 1.0,
                ndl: 1.0,
                aw: f64::INFINITY,
            },
        )
    }

    fn initial_guess(measurement: &Measurement) -> Self {
        let rs = 0.8 * measurement.min_real();
        Self {
            rs,
            rsei: 10.0,
            qsei: 1e-5,
            nsei: 0.8,
            rct: 0.8 * (measurement.max_real() - rs),
            qdl: 1e-4,
            ndl: 0.9,
            aw: 50.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Randles;
    use approx::assert_relative_eq;

    #[test]
    fn test_ideal_double_layer_matches_randles_branch() {
        // Without SEI and with n = 1 the double layer is an ideal capacitor,
        // but the Warburg element sits outside the parallel block here.
        let modified = ModifiedRandles {
            rs: 5.0,
            rsei: 0.0,
            qsei: 1e-6,
            nsei: 0.8,
            rct: 20.0,
            qdl: 1e-5,
            ndl: 1.0,
            aw: 0.0,
        };
        let randles = Randles {
            rs: 5.0,
            rct: 20.0,
            cdl: 1e-5,
            aw: 0.0,
        };

        for &w in &[1.0, 10.0, 100.0, 1e3, 1e4] {
            let a = modified.impedance_at(w);
            let b = randles.impedance_at(w);
            assert_relative_eq!(a.re, b.re, max_relative = 1e-10);
            assert_relative_eq!(a.im, b.im, max_relative = 1e-10);
        }
    }

    #[test]
    fn test_length_is_checked() {
        assert!(ModifiedRandles::from_values(&[0.0; 8]).is_ok());
        assert!(ModifiedRandles::from_values(&[0.0; 9]).is_err());
    }
}
