//! Zero-mean / unit-variance scaling
//!
//! Fitted once over the full feature set and persisted; serving and
//! re-encoding only ever apply the stored parameters.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Learned parameters for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnScale {
    pub name: String,
    pub mean: f64,
    /// Population standard deviation, 1.0 for constant columns.
    pub scale: f64,
}

impl ColumnScale {
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

/// Fitted scaler for the numeric columns of a feature schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScalerState {
    pub columns: Vec<ColumnScale>,
}

impl ScalerState {
    /// Fit over column-major samples: `samples[c]` holds every value of
    /// column `names[c]`.
    pub fn fit(names: &[&str], samples: &[Vec<f64>]) -> Result<Self> {
        if names.len() != samples.len() {
            return Err(Error::InvalidInput(format!(
                "scaler got {} column names for {} sample columns",
                names.len(),
                samples.len()
            )));
        }

        let columns = names
            .iter()
            .zip(samples)
            .map(|(name, values)| {
                let n = values.len() as f64;
                let (mean, var) = if values.is_empty() {
                    (0.0, 0.0)
                } else {
                    let mean = values.iter().sum::<f64>() / n;
                    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
                    (mean, var)
                };
                let std = var.sqrt();
                if !mean.is_finite() || !std.is_finite() {
                    return Err(Error::InvalidInput(format!(
                        "column '{}' has non-finite statistics (mean {}, std {})",
                        name, mean, std
                    )));
                }
                Ok(ColumnScale {
                    name: name.to_string(),
                    mean,
                    scale: if std > f64::EPSILON { std } else { 1.0 },
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { columns })
    }

    pub fn column(&self, name: &str) -> Option<&ColumnScale> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Scale one value of a named column.
    pub fn apply(&self, name: &str, value: f64) -> Result<f64> {
        self.column(name)
            .map(|c| c.apply(value))
            .ok_or_else(|| Error::SchemaMismatch(format!("scaler has no column '{}'", name)))
    }
}
