//! Logarithmic amplitude compression to decibels.

use ndarray::ArrayD;
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};

/// Interpretation of the input values for dB conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AmplitudeScale {
    /// Squared magnitudes; converted with `10·log10`.
    Power,
    /// Linear magnitudes; converted with `20·log10`.
    Magnitude,
}

/// Floor applied to inputs and the reference before taking the logarithm.
const AMIN: f64 = 1e-10;

/// Converts a power or magnitude tensor to decibels relative to `ref_value`.
///
/// When `top_db` is set, every value below `max(output) − top_db` is clamped
/// up to that floor. The maximum is taken over the entire tensor, not per
/// frame or per channel.
pub fn amplitude_to_db(
    s: &ArrayD<f32>,
    scale: AmplitudeScale,
    ref_value: f64,
    top_db: Option<f64>,
) -> Result<ArrayD<f32>> {
    if ref_value <= 0.0 {
        return Err(FeatureError::value(format!(
            "ref_value must be positive, got {ref_value}"
        )));
    }
    if let Some(td) = top_db {
        if td < 0.0 {
            return Err(FeatureError::value(format!(
                "top_db must be non-negative, got {td}"
            )));
        }
    }

    let mult = match scale {
        AmplitudeScale::Power => 10.0,
        AmplitudeScale::Magnitude => 20.0,
    };
    let ref_db = mult * ref_value.max(AMIN).log10();
    let mut out = s.mapv(|v| (mult * (v as f64).max(AMIN).log10() - ref_db) as f32);

    if let Some(td) = top_db {
        let max = out.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if max.is_finite() {
            let floor = max - td as f32;
            out.mapv_inplace(|v| v.max(floor));
        }
    }
    Ok(out)
}
