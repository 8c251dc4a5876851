//! Properties of the circuit models and their elements.

mod common;

use approx::assert_relative_eq;
use eisfit_rs::models::elements::{cpe_admittance, parallel, rc_parallel, warburg};
use eisfit_rs::models::{ImpedanceModel, ModifiedRandles, Randles, TwoRcThevenin};
use ndarray::array;
use num_complex::Complex64;

const OMEGAS: [f64; 7] = [1e-2, 1.0, 10.0, 100.0, 1e3, 1e4, 1e6];

fn assert_real(z: Complex64, expected: f64) {
    assert_relative_eq!(z.re, expected, max_relative = 1e-12);
    assert!(z.im.abs() <= 1e-12 * expected.abs(), "imaginary part {}", z.im);
}

#[test]
fn randles_without_reactive_elements_is_resistive() {
    let model = Randles {
        rs: 5.0,
        rct: 20.0,
        cdl: 0.0,
        aw: 0.0,
    };
    for &w in &OMEGAS {
        assert_real(model.impedance_at(w), 25.0);
    }
}

#[test]
fn thevenin_without_capacitors_is_resistive() {
    let model = TwoRcThevenin {
        rs: 0.5,
        r1: 1.5,
        c1: 0.0,
        r2: 3.0,
        c2: 0.0,
    };
    for &w in &OMEGAS {
        assert_real(model.impedance_at(w), 5.0);
    }
}

#[test]
fn modified_randles_without_reactive_elements_is_resistive() {
    let model = ModifiedRandles {
        rs: 5.0,
        rsei: 8.0,
        qsei: 0.0,
        nsei: 0.8,
        rct: 40.0,
        qdl: 0.0,
        ndl: 0.9,
        aw: 0.0,
    };
    for &w in &OMEGAS {
        assert_real(model.impedance_at(w), 53.0);
    }
}

#[test]
fn cpe_limits() {
    let q = 3e-4;
    for &w in &OMEGAS {
        let capacitor = 1.0 / Complex64::new(0.0, w * q);
        let z = cpe_admittance(q, 1.0, w).inv();
        assert!((z - capacitor).norm() <= 1e-12 * capacitor.norm());

        let z = cpe_admittance(q, 0.0, w).inv();
        assert_real(z, 1.0 / q);
    }
}

#[test]
fn rc_block_limits() {
    for &(r, c) in &[(1.0, 1.0), (250.0, 1e-6), (0.01, 3e3)] {
        let low = rc_parallel(r, c, 1e-12);
        assert_relative_eq!(low.re, r, max_relative = 1e-6);

        let high = rc_parallel(r, c, 1e15);
        assert!(high.norm() < 1e-6 * r);
    }
}

#[test]
fn randles_matches_closed_form() {
    let model = Randles {
        rs: 5.0,
        rct: 20.0,
        cdl: 1e-5,
        aw: 0.0,
    };
    let omega = array![1.0, 10.0, 100.0, 1000.0, 10000.0];
    let z = model.evaluate(&omega);
    assert_eq!(z.len(), omega.len());

    let w = 1000.0;
    let expected = 5.0 + 20.0 / Complex64::new(1.0, w * 20.0 * 1e-5);
    assert_relative_eq!(z[3].re, expected.re, max_relative = 1e-9);
    assert_relative_eq!(z[3].im, expected.im, max_relative = 1e-9);
}

#[test]
fn randles_is_rs_plus_parallel_combination() {
    let model = common::randles_truth();
    for &w in &OMEGAS {
        let branch = model.rct + warburg(model.aw, w);
        let capacitor = 1.0 / Complex64::new(0.0, w * model.cdl);
        let expected = model.rs + parallel(branch, capacitor);

        let z = model.impedance_at(w);
        assert!((z - expected).norm() <= 1e-10 * expected.norm());
    }
}

#[test]
fn modified_randles_has_warburg_outside_the_charge_transfer_block() {
    let model = common::modified_randles_truth();
    for &w in &OMEGAS {
        let sei = parallel(
            Complex64::new(model.rsei, 0.0),
            1.0 / cpe_admittance(model.qsei, model.nsei, w),
        );
        let double_layer = parallel(
            Complex64::new(model.rct, 0.0),
            1.0 / cpe_admittance(model.qdl, model.ndl, w),
        );
        let expected = model.rs + sei + double_layer + warburg(model.aw, w);

        let z = model.impedance_at(w);
        assert!((z - expected).norm() <= 1e-10 * expected.norm());
    }
}

#[test]
fn warburg_has_45_degree_phase() {
    for &w in &OMEGAS {
        let z = warburg(12.0, w);
        assert_relative_eq!(z.re, -z.im, max_relative = 1e-12);
        assert_relative_eq!(z.re, 12.0 / w.sqrt(), max_relative = 1e-12);
    }
}

#[test]
fn capacitive_spectra_lie_below_the_real_axis() {
    let thevenin = common::thevenin_truth();
    let modified = common::modified_randles_truth();
    for &w in &OMEGAS {
        assert!(thevenin.impedance_at(w).im < 0.0);
        assert!(modified.impedance_at(w).im < 0.0);
    }
}
