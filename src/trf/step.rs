//! Step selection for the trust-region-reflective solver.
//!
//! The unconstrained trust-region step may leave the feasible box. In that
//! case three candidates are compared on the local quadratic model: the step
//! cut short before the first bound it hits, the reflection of the step off
//! that bound, and the constrained Cauchy step along the anti-gradient.

use super::bounds::BoxBounds;
use ndarray::{Array1, Array2};

/// Local quadratic model `½‖J s‖² + ½ sᵀ diag(C) s + gᵀ s` in scaled variables.
pub struct QuadraticModel<'a> {
    /// Scaled Jacobian `J·diag(d)`
    pub jacobian: &'a Array2<f64>,

    /// Scaled gradient `d·g`
    pub gradient: &'a Array1<f64>,

    /// Diagonal term from the Coleman-Li scaling, `g·dv` (optional)
    pub diag: Option<&'a Array1<f64>>,
}

impl QuadraticModel<'_> {
    /// Value of the model at step `s`.
    pub fn evaluate(&self, s: &Array1<f64>) -> f64 {
        let js = self.jacobian.dot(s);
        let mut q = js.dot(&js);
        if let Some(diag) = self.diag {
            q += (s * diag).dot(s);
        }
        0.5 * q + s.dot(self.gradient)
    }

    /// Coefficients of the 1-D restriction `f(t) = a t² + b t + c` along `s0 + t·s`.
    pub fn along(&self, s: &Array1<f64>, s0: Option<&Array1<f64>>) -> (f64, f64, f64) {
        let v = self.jacobian.dot(s);
        let mut a = v.dot(&v);
        if let Some(diag) = self.diag {
            a += (s * diag).dot(s);
        }
        a *= 0.5;

        let mut b = self.gradient.dot(s);
        let mut c = 0.0;
        if let Some(s0) = s0 {
            let u = self.jacobian.dot(s0);
            b += u.dot(&v);
            c = 0.5 * u.dot(&u) + self.gradient.dot(s0);
            if let Some(diag) = self.diag {
                b += (s0 * diag).dot(s);
                c += 0.5 * (s0 * diag).dot(s0);
            }
        }

        (a, b, c)
    }
}

/// Minimise `a t² + b t + c` over `[lower, upper]`; returns the argmin and value.
pub fn minimize_quadratic_1d(a: f64, b: f64, lower: f64, upper: f64, c: f64) -> (f64, f64) {
    let value = |t: f64| t * (a * t + b) + c;

    let mut best = (lower, value(lower));
    let mut consider = |t: f64| {
        let y = value(t);
        if y < best.1 {
            best = (t, y);
        }
    };

    consider(upper);
    if a != 0.0 {
        let extremum = -0.5 * b / a;
        if lower < extremum && extremum < upper {
            consider(extremum);
        }
    }

    best
}

/// Parameters `t1 ≤ t2` where `x + t·s` crosses the sphere of radius `delta`.
///
/// `x` must lie inside the sphere and `s` must be non-zero.
pub fn intersect_trust_region(x: &Array1<f64>, s: &Array1<f64>, delta: f64) -> (f64, f64) {
    let a = s.dot(s);
    let b = x.dot(s);
    let c = x.dot(x) - delta * delta;
    // Root of one fourth of the discriminant; c ≤ 0 keeps it real
    let d = (b * b - a * c).max(0.0).sqrt();

    // Numerically stable root pair
    let q = -(b + d.copysign(b));
    let t1 = q / a;
    let t2 = if q != 0.0 { c / q } else { 0.0 };
    if t1 < t2 {
        (t1, t2)
    } else {
        (t2, t1)
    }
}

/// A selected step in both variable spaces.
#[derive(Debug, Clone)]
pub struct SelectedStep {
    /// Step in the original variables
    pub step: Array1<f64>,

    /// Step in the scaled variables
    pub step_h: Array1<f64>,

    /// Reduction of the quadratic model predicted for this step
    pub predicted_reduction: f64,
}

/// Inputs shared by all step candidates at one iterate.
pub struct StepContext<'a> {
    pub x: &'a Array1<f64>,
    pub bounds: &'a BoxBounds,
    pub model: QuadraticModel<'a>,
    /// Scaling `d` mapping scaled steps to original ones
    pub d: &'a Array1<f64>,
    pub delta: f64,
    /// Fraction of the distance to a bound a step may cover
    pub theta: f64,
}

impl StepContext<'_> {
    /// Select the best feasible step given the trust-region solution `p_h`.
    pub fn select(&self, p_h: Array1<f64>) -> SelectedStep {
        let mut p = self.d * &p_h;
        let mut p_h = p_h;

        if self.bounds.contains(&(self.x + &p)) {
            let value = self.model.evaluate(&p_h);
            return SelectedStep {
                step: p,
                step_h: p_h,
                predicted_reduction: -value,
            };
        }

        let (p_stride, hits) = self.bounds.step_size_to_bound(self.x, &p);

        // Reflected direction
        let mut r_h = p_h.clone();
        for (ri, &hit) in r_h.iter_mut().zip(hits.iter()) {
            if hit != 0.0 {
                *ri = -*ri;
            }
        }
        let r = self.d * &r_h;

        // Restrict the trust-region step so that it stops at the bound
        p *= p_stride;
        p_h *= p_stride;
        let x_on_bound = self.x + &p;

        // The reflection leaves either the box or the trust region first
        let (_, to_tr) = intersect_trust_region(&p_h, &r_h, self.delta);
        let (to_bound, _) = self.bounds.step_size_to_bound(&x_on_bound, &r);

        let r_stride = to_bound.min(to_tr);
        let (r_stride_l, r_stride_u) = if r_stride > 0.0 {
            let upper = if r_stride == to_bound {
                self.theta * to_bound
            } else {
                to_tr
            };
            ((1.0 - self.theta) * p_stride / r_stride, upper)
        } else {
            (0.0, -1.0)
        };

        let (reflected, reflected_h, r_value) = if r_stride_l <= r_stride_u {
            let (a, b, c) = self.model.along(&r_h, Some(&p_h));
            let (t, value) = minimize_quadratic_1d(a, b, r_stride_l, r_stride_u, c);
            let step_h = &p_h + &(&r_h * t);
            let step = self.d * &step_h;
            (step, step_h, value)
        } else {
            (r, r_h, f64::INFINITY)
        };

        // Pull the truncated step strictly inside
        p *= self.theta;
        p_h *= self.theta;
        let p_value = self.model.evaluate(&p_h);

        // Constrained Cauchy step
        let mut ag_h = self.model.gradient.mapv(|g| -g);
        let mut ag = self.d * &ag_h;
        let ag_norm = ag_h.dot(&ag_h).sqrt();
        let to_tr = if ag_norm > 0.0 {
            self.delta / ag_norm
        } else {
            0.0
        };
        let (to_bound, _) = self.bounds.step_size_to_bound(self.x, &ag);
        let ag_limit = if to_bound < to_tr {
            self.theta * to_bound
        } else {
            to_tr
        };
        let (a, b, _) = self.model.along(&ag_h, None);
        let (ag_stride, ag_value) = minimize_quadratic_1d(a, b, 0.0, ag_limit, 0.0);
        ag_h *= ag_stride;
        ag *= ag_stride;

        if p_value < r_value && p_value < ag_value {
            SelectedStep {
                step: p,
                step_h: p_h,
                predicted_reduction: -p_value,
            }
        } else if r_value < p_value && r_value < ag_value {
            SelectedStep {
                step: reflected,
                step_h: reflected_h,
                predicted_reduction: -r_value,
            }
        } else {
            SelectedStep {
                step: ag,
                step_h: ag_h,
                predicted_reduction: -ag_value,
            }
        }
    }
}
