//! Box constraints for the trust-region-reflective solver.
//!
//! Besides validation this module holds the small geometric helpers the
//! solver needs: Coleman-Li scaling, step lengths to the nearest bound and
//! pulling points strictly inside the box.

use crate::error::{ConfigurationError, Result};
use ndarray::{Array1, Zip};

/// Validated per-component box constraints `lower[i] < upper[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxBounds {
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl BoxBounds {
    /// Create box bounds, rejecting mismatched lengths, NaN and collapsed or
    /// inverted intervals.
    pub fn new(lower: Array1<f64>, upper: Array1<f64>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(ConfigurationError::LengthMismatch {
                expected: lower.len(),
                actual: upper.len(),
            }
            .into());
        }

        for (i, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            if !(lo < hi) {
                return Err(ConfigurationError::InvalidBounds {
                    name: format!("x[{}]", i),
                    lower: lo,
                    upper: hi,
                }
                .into());
            }
        }

        Ok(Self { lower, upper })
    }

    /// Bounds of `(-∞, ∞)` for every component.
    pub fn unbounded(n: usize) -> Self {
        Self {
            lower: Array1::from_elem(n, f64::NEG_INFINITY),
            upper: Array1::from_elem(n, f64::INFINITY),
        }
    }

    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    pub fn len(&self) -> usize {
        self.lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lower.is_empty()
    }

    /// Check that `x` is finite and lies in the closed box.
    pub fn check_feasible(&self, x: &Array1<f64>) -> Result<()> {
        if x.len() != self.len() {
            return Err(ConfigurationError::LengthMismatch {
                expected: self.len(),
                actual: x.len(),
            }
            .into());
        }

        for i in 0..x.len() {
            let name = format!("x[{}]", i);
            if !x[i].is_finite() {
                return Err(ConfigurationError::NonFiniteInitial { name }.into());
            }
            if x[i] < self.lower[i] || x[i] > self.upper[i] {
                return Err(ConfigurationError::InitialOutsideBounds {
                    name,
                    value: x[i],
                    lower: self.lower[i],
                    upper: self.upper[i],
                }
                .into());
            }
        }

        Ok(())
    }

    /// Whether `x` lies in the closed box.
    pub fn contains(&self, x: &Array1<f64>) -> bool {
        Zip::from(x)
            .and(&self.lower)
            .and(&self.upper)
            .all(|&xi, &lo, &hi| xi >= lo && xi <= hi)
    }

    /// Coleman-Li scaling vector.
    ///
    /// `v[i]` is the distance to the bound the negative gradient points at,
    /// or 1 when that bound is infinite. `dv[i]` is the derivative of `v[i]`
    /// with respect to `x[i]` (±1, or 0 for the constant case).
    pub fn scaling_vector(&self, x: &Array1<f64>, g: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        let n = x.len();
        let mut v = Array1::ones(n);
        let mut dv = Array1::zeros(n);

        for i in 0..n {
            if g[i] < 0.0 && self.upper[i].is_finite() {
                v[i] = self.upper[i] - x[i];
                dv[i] = -1.0;
            } else if g[i] > 0.0 && self.lower[i].is_finite() {
                v[i] = x[i] - self.lower[i];
                dv[i] = 1.0;
            }
        }

        (v, dv)
    }

    /// Largest multiplier `t` such that `x + t·s` stays in the box, and the
    /// components that reach a bound at exactly that multiplier (as the sign
    /// of `s`, 0 elsewhere).
    pub fn step_size_to_bound(&self, x: &Array1<f64>, s: &Array1<f64>) -> (f64, Array1<f64>) {
        let steps = Array1::from_shape_fn(x.len(), |i| {
            if s[i] == 0.0 {
                f64::INFINITY
            } else {
                ((self.lower[i] - x[i]) / s[i]).max((self.upper[i] - x[i]) / s[i])
            }
        });
        let min_step = steps.iter().copied().fold(f64::INFINITY, f64::min);
        let hits = Array1::from_shape_fn(x.len(), |i| {
            if steps[i] == min_step {
                s[i].signum()
            } else {
                0.0
            }
        });

        (min_step, hits)
    }

    /// Move `x` strictly inside the box.
    ///
    /// Components within `rstep·max(1, |bound|)` of a bound are moved that
    /// far inwards; with `rstep == 0` they are moved to the next representable
    /// value instead.
    pub fn make_strictly_feasible(&self, x: &Array1<f64>, rstep: f64) -> Array1<f64> {
        let active = self.active_constraints(x, rstep);
        let mut x_new = x.clone();

        for i in 0..x.len() {
            let (lo, hi) = (self.lower[i], self.upper[i]);
            if active[i] < 0 {
                x_new[i] = if rstep == 0.0 {
                    next_toward(lo, hi)
                } else {
                    lo + rstep * lo.abs().max(1.0)
                };
            } else if active[i] > 0 {
                x_new[i] = if rstep == 0.0 {
                    next_toward(hi, lo)
                } else {
                    hi - rstep * hi.abs().max(1.0)
                };
            }

            if x_new[i] < lo || x_new[i] > hi {
                x_new[i] = 0.5 * (lo + hi);
            }
        }

        x_new
    }

    /// Which bounds `x` is (nearly) sitting on: -1 lower, 1 upper, 0 free.
    pub fn active_constraints(&self, x: &Array1<f64>, rtol: f64) -> Vec<i8> {
        (0..x.len())
            .map(|i| {
                let (lo, hi) = (self.lower[i], self.upper[i]);
                if rtol == 0.0 {
                    return if x[i] <= lo {
                        -1
                    } else if x[i] >= hi {
                        1
                    } else {
                        0
                    };
                }

                let lower_dist = x[i] - lo;
                let upper_dist = hi - x[i];
                let lower_threshold = rtol * lo.abs().max(1.0);
                let upper_threshold = rtol * hi.abs().max(1.0);

                if lo.is_finite() && lower_dist <= upper_dist.min(lower_threshold) {
                    -1
                } else if hi.is_finite() && upper_dist <= lower_dist.min(upper_threshold) {
                    1
                } else {
                    0
                }
            })
            .collect()
    }
}

/// The next representable `f64` after `from` in the direction of `to`.
fn next_toward(from: f64, to: f64) -> f64 {
    if from == to || from.is_nan() || to.is_nan() {
        return from;
    }
    if from == 0.0 {
        let tiny = f64::from_bits(1);
        return if to > 0.0 { tiny } else { -tiny };
    }

    let bits = from.to_bits();
    let away_from_zero = (to > from) == (from > 0.0);
    let next = if away_from_zero { bits + 1 } else { bits - 1 };
    f64::from_bits(next)
}
