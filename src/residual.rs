//! Residuals between a circuit model and a measured spectrum.

use std::marker::PhantomData;

use crate::error::{EisFitError, Result};
use crate::measurement::Measurement;
use crate::models::ImpedanceModel;
use crate::problem::Problem;
use ndarray::Array1;
use num_complex::Complex64;

/// Stacked residuals `[Re(Z_fit − Z_meas); Im(Z_fit − Z_meas)]`.
///
/// The output has length `2N` for `N` samples, real parts first.
pub fn residuals<M: ImpedanceModel>(
    model: &M,
    omega: &Array1<f64>,
    measured: &Array1<Complex64>,
) -> Result<Array1<f64>> {
    if omega.len() != measured.len() {
        return Err(EisFitError::DimensionMismatch(format!(
            "{} angular frequencies but {} impedances",
            omega.len(),
            measured.len()
        )));
    }

    let n = omega.len();
    let mut out = Array1::zeros(2 * n);
    for (i, (&w, z_meas)) in omega.iter().zip(measured.iter()).enumerate() {
        let diff = model.impedance_at(w) - z_meas;
        out[i] = diff.re;
        out[n + i] = diff.im;
    }
    Ok(out)
}

/// Least-squares problem fitting model `M` to a borrowed measurement.
///
/// Stateless: every evaluation rebuilds the model record from the parameter
/// array and recomputes the impedance at each measured frequency.
pub struct ResidualFunction<'a, M: ImpedanceModel> {
    measurement: &'a Measurement,
    _model: PhantomData<M>,
}

impl<'a, M: ImpedanceModel> ResidualFunction<'a, M> {
    pub fn new(measurement: &'a Measurement) -> Self {
        Self {
            measurement,
            _model: PhantomData,
        }
    }

    /// The measurement being fitted.
    pub fn measurement(&self) -> &'a Measurement {
        self.measurement
    }
}

impl<M: ImpedanceModel> Problem for ResidualFunction<'_, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let values = params.as_slice().ok_or_else(|| {
            EisFitError::FunctionEvaluation("Parameter array is not contiguous".to_string())
        })?;
        let model = M::from_values(values)?;
        residuals(&model, self.measurement.omega(), self.measurement.impedance())
    }

    fn parameter_count(&self) -> usize {
        M::PARAMETER_NAMES.len()
    }

    fn residual_count(&self) -> usize {
        2 * self.measurement.len()
    }
}
