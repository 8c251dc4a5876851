//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use eisfit_rs::models::{ModifiedRandles, Randles, TwoRcThevenin};
use ndarray::Array1;

/// Log-spaced frequencies in Hz from `10^lo` to `10^hi`.
pub fn frequencies(lo: f64, hi: f64, n: usize) -> Array1<f64> {
    Array1::logspace(10.0, lo, hi, n)
}

pub fn randles_truth() -> Randles {
    Randles {
        rs: 10.0,
        rct: 100.0,
        cdl: 1e-5,
        aw: 50.0,
    }
}

pub fn thevenin_truth() -> TwoRcThevenin {
    // Time constants 1e-4 s and 3 s
    TwoRcThevenin {
        rs: 0.05,
        r1: 0.1,
        c1: 1e-3,
        r2: 0.3,
        c2: 10.0,
    }
}

pub fn modified_randles_truth() -> ModifiedRandles {
    ModifiedRandles {
        rs: 5.0,
        rsei: 8.0,
        qsei: 1e-5,
        nsei: 0.85,
        rct: 40.0,
        qdl: 1e-3,
        ndl: 0.9,
        aw: 5.0,
    }
}

/// Multiply each value by the matching factor.
pub fn perturb(values: &[f64], factors: &[f64]) -> Vec<f64> {
    values.iter().zip(factors).map(|(v, f)| v * f).collect()
}

pub fn assert_close(actual: &[f64], expected: &[f64], rtol: f64) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        let err = (a - e).abs() / e.abs().max(f64::MIN_POSITIVE);
        assert!(
            err < rtol,
            "parameter {}: got {}, expected {} (relative error {:e})",
            i,
            a,
            e,
            err
        );
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
