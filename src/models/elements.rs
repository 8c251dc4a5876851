//! Primitive circuit elements.
//!
//! All circuit models are built from these evaluators. Angular frequencies
//! must be strictly positive; the Warburg element is singular at ω = 0.

use num_complex::Complex64;
use std::f64::consts::FRAC_PI_2;

/// Semi-infinite Warburg diffusion impedance `Aw·(1 − j)/√ω`.
pub fn warburg(aw: f64, omega: f64) -> Complex64 {
    Complex64::new(aw, -aw) / omega.sqrt()
}

/// Constant phase element admittance `Q·(jω)^n`.
///
/// The power is taken on the principal branch: magnitude `Q·ω^n`, phase
/// `n·π/2`. With `n = 1` this is an ideal capacitor, with `n = 0` a
/// conductance `Q`.
pub fn cpe_admittance(q: f64, n: f64, omega: f64) -> Complex64 {
    Complex64::from_polar(q * omega.powf(n), n * FRAC_PI_2)
}

/// Admittance `jωC` of an ideal capacitor.
pub fn capacitor_admittance(c: f64, omega: f64) -> Complex64 {
    Complex64::new(0.0, omega * c)
}

/// Impedance `z` in parallel with admittance `y`: `1/(1/z + y)`.
///
/// Evaluated as `z/(1 + z·y)`, which stays finite when `z` is zero.
pub fn shunt(z: Complex64, y: Complex64) -> Complex64 {
    z / (1.0 + z * y)
}

/// Parallel combination of two impedances, `1/(1/z1 + 1/z2)`.
pub fn parallel(z1: Complex64, z2: Complex64) -> Complex64 {
    1.0 / (z1.inv() + z2.inv())
}

/// Resistor in parallel with a capacitor: `R/(1 + jωRC)`.
pub fn rc_parallel(r: f64, c: f64, omega: f64) -> Complex64 {
    shunt(Complex64::new(r, 0.0), capacitor_admittance(c, omega))
}

/// Resistor in parallel with a constant phase element.
pub fn r_cpe_parallel(r: f64, q: f64, n: f64, omega: f64) -> Complex64 {
    shunt(Complex64::new(r, 0.0), cpe_admittance(q, n, omega))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const OMEGAS: [f64; 6] = [1e-3, 0.1, 1.0, 42.0, 1e3, 1e6];

    #[test]
    fn test_warburg() {
        let z = warburg(50.0, 4.0);
        assert_relative_eq!(z.re, 25.0);
        assert_relative_eq!(z.im, -25.0);
        assert_eq!(warburg(0.0, 10.0), Complex64::new(0.0, 0.0));
    }

    #[test]
    fn test_cpe_ideal_capacitor_limit() {
        let q = 2.5e-5;
        for &w in &OMEGAS {
            let z = cpe_admittance(q, 1.0, w).inv();
            let expected = 1.0 / Complex64::new(0.0, w * q);
            assert!((z - expected).norm() <= 1e-12 * expected.norm());
        }
    }

    #[test]
    fn test_cpe_resistor_limit() {
        let q = 0.04;
        for &w in &OMEGAS {
            let z = cpe_admittance(q, 0.0, w).inv();
            assert_relative_eq!(z.re, 25.0, max_relative = 1e-12);
            assert_eq!(z.im, 0.0);
        }
    }

    #[test]
    fn test_rc_limits() {
        let (r, c) = (120.0, 3e-4);
        let low = rc_parallel(r, c, 1e-9);
        assert_relative_eq!(low.re, r, max_relative = 1e-9);
        assert!(low.im.abs() < 1e-6);

        let high = rc_parallel(r, c, 1e12);
        assert!(high.norm() < 1e-6);
    }

    #[test]
    fn test_shunt_matches_parallel() {
        let z = Complex64::new(12.0, -3.0);
        let y = Complex64::new(0.01, 0.2);
        let expected = parallel(z, y.inv());
        let actual = shunt(z, y);
        assert_relative_eq!(actual.re, expected.re, max_relative = 1e-12);
        assert_relative_eq!(actual.im, expected.im, max_relative = 1e-12);

        // A short circuit stays a short circuit
        assert_eq!(shunt(Complex64::new(0.0, 0.0), y), Complex64::new(0.0, 0.0));
    }
}
