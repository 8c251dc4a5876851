//! Model selection by configuration.

use crate::error::{ConfigurationError, Result};
use crate::measurement::Measurement;
use crate::models::{ImpedanceModel, ModelKind, ModifiedRandles, Randles, TwoRcThevenin};
use crate::parameters::ParameterVector;
use serde::{Deserialize, Serialize};

/// A typed parameter vector for one of the supported models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelSetup {
    Randles(ParameterVector<Randles>),
    TwoRcThevenin(ParameterVector<TwoRcThevenin>),
    ModifiedRandles(ParameterVector<ModifiedRandles>),
}

impl ModelSetup {
    /// Data-driven initial guess within the model's default bounds.
    pub fn from_measurement(kind: ModelKind, measurement: &Measurement) -> Result<Self> {
        Ok(match kind {
            ModelKind::Randles => Self::Randles(ParameterVector::from_measurement(measurement)?),
            ModelKind::TwoRcThevenin => {
                Self::TwoRcThevenin(ParameterVector::from_measurement(measurement)?)
            }
            ModelKind::ModifiedRandles => {
                Self::ModifiedRandles(ParameterVector::from_measurement(measurement)?)
            }
        })
    }

    /// Build a setup from flat slices in parameter order.
    ///
    /// Missing bounds fall back to the model's defaults.
    pub fn from_values(
        kind: ModelKind,
        initial: &[f64],
        bounds: Option<(&[f64], &[f64])>,
    ) -> Result<Self> {
        fn typed<M: ImpedanceModel>(
            initial: &[f64],
            bounds: Option<(&[f64], &[f64])>,
        ) -> Result<ParameterVector<M>> {
            let initial = M::from_values(initial)?;
            match bounds {
                Some((lower, upper)) => {
                    ParameterVector::new(initial, M::from_values(lower)?, M::from_values(upper)?)
                }
                None => ParameterVector::with_default_bounds(initial),
            }
        }

        Ok(match kind {
            ModelKind::Randles => Self::Randles(typed(initial, bounds)?),
            ModelKind::TwoRcThevenin => Self::TwoRcThevenin(typed(initial, bounds)?),
            ModelKind::ModifiedRandles => Self::ModifiedRandles(typed(initial, bounds)?),
        })
    }

    /// Which model this setup is for.
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Randles(_) => ModelKind::Randles,
            Self::TwoRcThevenin(_) => ModelKind::TwoRcThevenin,
            Self::ModifiedRandles(_) => ModelKind::ModifiedRandles,
        }
    }

    /// The initial guess in parameter order.
    pub fn initial_values(&self) -> Vec<f64> {
        match self {
            Self::Randles(p) => p.initial().to_values(),
            Self::TwoRcThevenin(p) => p.initial().to_values(),
            Self::ModifiedRandles(p) => p.initial().to_values(),
        }
    }

    pub(crate) fn expect_kind(&self, kind: ModelKind) -> Result<()> {
        if self.kind() != kind {
            return Err(ConfigurationError::InvalidSetting(format!(
                "Session is configured for {} but the setup is for {}",
                kind,
                self.kind()
            ))
            .into());
        }
        Ok(())
    }
}

impl From<ParameterVector<Randles>> for ModelSetup {
    fn from(params: ParameterVector<Randles>) -> Self {
        Self::Randles(params)
    }
}

impl From<ParameterVector<TwoRcThevenin>> for ModelSetup {
    fn from(params: ParameterVector<TwoRcThevenin>) -> Self {
        Self::TwoRcThevenin(params)
    }
}

impl From<ParameterVector<ModifiedRandles>> for ModelSetup {
    fn from(params: ParameterVector<ModifiedRandles>) -> Self {
        Self::ModifiedRandles(params)
    }
}
