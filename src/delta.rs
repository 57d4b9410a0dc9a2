//! Time derivatives of feature matrices via a regression kernel.

use ndarray::ArrayD;

use crate::error::{FeatureError, Result};
use crate::pad::{pad_lane, PadMode};
use crate::shape::{self, map_lanes};

/// Computes delta coefficients along the time axis.
///
/// A centered least-squares slope of half-width `win_length / 2` is applied
/// to every frequency/channel lane independently; boundary frames read
/// through the `pad_mode` policy, so the output shape equals the input
/// shape. Applying the operation twice yields acceleration coefficients.
pub fn compute_deltas(
    specgram: &ArrayD<f32>,
    win_length: usize,
    pad_mode: PadMode,
) -> Result<ArrayD<f32>> {
    if win_length < 3 {
        return Err(FeatureError::config(format!(
            "win_length must be at least 3, got {win_length}"
        )));
    }
    let n = win_length / 2;
    // sum of squared offsets over the centered window
    let denom = (n * (n + 1) * (2 * n + 1)) as f32 / 3.0;

    map_lanes(specgram, 2, 4, shape::FEATURE_RANKS, |lane| {
        let padded = pad_lane(lane, n, n, pad_mode);
        (0..lane.len())
            .map(|t| {
                let mut acc = 0.0f32;
                for j in 0..=2 * n {
                    acc += (j as f32 - n as f32) * padded[t + j];
                }
                acc / denom
            })
            .collect()
    })
}
