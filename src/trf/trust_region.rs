//! Trust region management and the scaled trust-region subproblem.
//!
//! The subproblem `min ‖J p + f‖²  s.t. ‖p‖ ≤ Δ` is solved exactly through an
//! SVD of `J`: the Gauss-Newton step is used when it fits, otherwise the
//! Levenberg-Marquardt parameter `α` with `‖p(α)‖ = Δ` is found by Newton
//! iterations on `φ(α) = ‖p(α)‖ − Δ`.

use crate::error::{EisFitError, Result};
use crate::utils::matrix_convert::{nalgebra_to_ndarray, ndarray_to_nalgebra};
use ndarray::{Array1, Array2};

/// Trust radius controller.
#[derive(Debug, Clone)]
pub struct TrustRegion {
    /// Current trust radius Δ (in scaled variables)
    pub radius: f64,

    /// Levenberg-Marquardt parameter of the last subproblem solution
    pub alpha: f64,

    /// Ratio below which the radius shrinks
    pub shrink_ratio: f64,

    /// Ratio above which a step on the boundary expands the radius
    pub expand_ratio: f64,
}

impl TrustRegion {
    /// Creates a trust region with the given initial radius.
    ///
    /// A non-positive or non-finite radius falls back to 1.
    pub fn new(radius: f64) -> Self {
        let radius = if radius > 0.0 && radius.is_finite() {
            radius
        } else {
            1.0
        };
        Self {
            radius,
            alpha: 0.0,
            shrink_ratio: 0.25,
            expand_ratio: 0.75,
        }
    }

    /// Calculates the gain ratio between actual and predicted reduction.
    pub fn gain_ratio(actual_reduction: f64, predicted_reduction: f64) -> f64 {
        if predicted_reduction > 0.0 {
            actual_reduction / predicted_reduction
        } else if predicted_reduction == 0.0 && actual_reduction == 0.0 {
            1.0
        } else {
            0.0
        }
    }

    /// Proposes the next radius from the quality of a step.
    ///
    /// Returns the new radius and the gain ratio. The radius itself is not
    /// modified so the caller can rescale `alpha` first.
    pub fn propose(
        &self,
        actual_reduction: f64,
        predicted_reduction: f64,
        step_norm: f64,
        bound_hit: bool,
    ) -> (f64, f64) {
        let ratio = Self::gain_ratio(actual_reduction, predicted_reduction);
        let radius = if ratio < self.shrink_ratio {
            0.25 * step_norm
        } else if ratio > self.expand_ratio && bound_hit {
            2.0 * self.radius
        } else {
            self.radius
        };
        (radius, ratio)
    }

    /// Adopts a new radius, rescaling `alpha` accordingly.
    pub fn resize(&mut self, radius: f64) {
        if radius > 0.0 {
            self.alpha *= self.radius / radius;
        }
        self.radius = radius;
    }

    /// Whether the radius has become too small to make progress.
    pub fn has_collapsed(&self) -> bool {
        !(self.radius >= f64::EPSILON)
    }
}

/// SVD factorisation of the (augmented, scaled) Jacobian, reusable across
/// several trust radii at the same iterate.
#[derive(Debug, Clone)]
pub struct Subproblem {
    /// Projection `Uᵀ f` of the residuals onto the left singular vectors
    uf: Array1<f64>,

    /// Singular values
    s: Array1<f64>,

    /// Right singular vectors as columns
    v: Array2<f64>,

    /// Number of rows of the factorised matrix
    rows: usize,
}

impl Subproblem {
    /// Factorise `jacobian` (rows ≥ columns) and project `residuals`.
    pub fn new(jacobian: &Array2<f64>, residuals: &Array1<f64>) -> Result<Self> {
        let (rows, cols) = jacobian.dim();
        if residuals.len() != rows {
            return Err(EisFitError::DimensionMismatch(format!(
                "Jacobian has {} rows but {} residuals were given",
                rows,
                residuals.len()
            )));
        }
        if rows < cols {
            return Err(EisFitError::DimensionMismatch(format!(
                "Subproblem needs at least as many rows as columns, got {}x{}",
                rows, cols
            )));
        }

        let svd = ndarray_to_nalgebra(jacobian)?.svd(true, true);
        let u = svd.u.ok_or_else(|| {
            EisFitError::LinearAlgebraError("SVD did not produce left singular vectors".into())
        })?;
        let v_t = svd.v_t.ok_or_else(|| {
            EisFitError::LinearAlgebraError("SVD did not produce right singular vectors".into())
        })?;

        let u = nalgebra_to_ndarray(&u);
        let v = nalgebra_to_ndarray(&v_t.transpose());
        let s = Array1::from_iter(svd.singular_values.iter().copied());

        if s.iter().any(|x| !x.is_finite()) {
            return Err(EisFitError::LinearAlgebraError(
                "Non-finite singular values".to_string(),
            ));
        }

        Ok(Self {
            uf: u.t().dot(residuals),
            s,
            v,
            rows,
        })
    }

    fn is_full_rank(&self) -> bool {
        let s_max = self.s.iter().copied().fold(0.0, f64::max);
        let s_min = self.s.iter().copied().fold(f64::INFINITY, f64::min);
        s_min > f64::EPSILON * self.rows as f64 * s_max
    }

    /// φ(α) = ‖p(α)‖ − Δ and its derivative.
    fn phi_and_derivative(&self, alpha: f64, suf: &Array1<f64>, delta: f64) -> (f64, f64) {
        let mut p_norm_sq = 0.0;
        let mut derivative_sum = 0.0;
        for (&si, &sufi) in self.s.iter().zip(suf.iter()) {
            let denom = si * si + alpha;
            p_norm_sq += (sufi / denom).powi(2);
            derivative_sum += sufi * sufi / denom.powi(3);
        }
        let p_norm = p_norm_sq.sqrt();
        (p_norm - delta, -derivative_sum / p_norm)
    }

    /// Solve the subproblem for radius `delta`.
    ///
    /// `initial_alpha` warm-starts the Newton iteration. Returns the step and
    /// the Levenberg-Marquardt parameter used (0 for a Gauss-Newton step).
    pub fn solve(&self, delta: f64, initial_alpha: f64) -> (Array1<f64>, f64) {
        const RTOL: f64 = 0.01;
        const MAX_ITER: usize = 10;

        let n = self.s.len();
        let suf = &self.s * &self.uf;
        let suf_norm = suf.dot(&suf).sqrt();
        if suf_norm == 0.0 {
            return (Array1::zeros(n), 0.0);
        }

        let full_rank = self.is_full_rank();
        if full_rank {
            let p = -self.v.dot(&(&self.uf / &self.s));
            if p.dot(&p).sqrt() <= delta {
                return (p, 0.0);
            }
        }

        let mut alpha_upper = suf_norm / delta;
        let mut alpha_lower = if full_rank {
            let (phi, phi_prime) = self.phi_and_derivative(0.0, &suf, delta);
            -phi / phi_prime
        } else {
            0.0
        };

        let safeguard =
            |lower: f64, upper: f64| (0.001 * upper).max((lower * upper).sqrt());

        let mut alpha = if !full_rank && initial_alpha == 0.0 {
            safeguard(alpha_lower, alpha_upper)
        } else {
            initial_alpha
        };

        for _ in 0..MAX_ITER {
            if alpha < alpha_lower || alpha > alpha_upper {
                alpha = safeguard(alpha_lower, alpha_upper);
            }

            let (phi, phi_prime) = self.phi_and_derivative(alpha, &suf, delta);
            if phi < 0.0 {
                alpha_upper = alpha;
            }

            let ratio = phi / phi_prime;
            alpha_lower = alpha_lower.max(alpha - ratio);
            alpha -= (phi + delta) * ratio / delta;

            if phi.abs() < RTOL * delta {
                break;
            }
        }

        let denom = self.s.mapv(|si| si * si + alpha);
        let mut p = -self.v.dot(&(&suf / &denom));
        // Snap onto the boundary; the norm only changes slightly here
        let p_norm = p.dot(&p).sqrt();
        if p_norm > 0.0 {
            p *= delta / p_norm;
        }

        (p, alpha)
    }
}
