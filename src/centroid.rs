//! Spectral centroid: the frequency-weighted mean of the magnitude spectrum.

use ndarray::{ArrayD, IxDyn};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::shape::into_planes;
use crate::stft::{spectrogram, StftConfig};

/// Parameters for [`spectral_centroid`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralCentroidConfig {
    /// Sampling rate of the input waveforms in Hz.
    pub sample_rate: u32,
    pub stft: StftConfig,
}

impl Default for SpectralCentroidConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            stft: StftConfig::default(),
        }
    }
}

/// Computes the spectral centroid per frame, in Hz.
///
/// Output shape is `(..., num_frames)`: the frequency axis is reduced to
/// `Σ f_k·|S[k,t]| / Σ |S[k,t]|` with bin frequencies
/// `f_k = k·sample_rate / n_fft`.
pub fn spectral_centroid(
    waveforms: &ArrayD<f32>,
    cfg: &SpectralCentroidConfig,
) -> Result<ArrayD<f32>> {
    let magnitude = spectrogram(waveforms, &cfg.stft, 1.0)?;
    let (planes, leading) = into_planes(&magnitude)?;
    let (_, n_freqs, num_frames) = planes.dim();

    let bin_hz = cfg.sample_rate as f32 / cfg.stft.n_fft as f32;
    let freqs: Vec<f32> = (0..n_freqs).map(|k| k as f32 * bin_hz).collect();

    let mut data = Vec::with_capacity(planes.shape()[0] * num_frames);
    for plane in planes.outer_iter() {
        for t in 0..num_frames {
            let mut weighted = 0.0f32;
            let mut total = 0.0f32;
            for k in 0..n_freqs {
                weighted += freqs[k] * plane[[k, t]];
                total += plane[[k, t]];
            }
            data.push(weighted / total.max(1e-10));
        }
    }

    let mut dims = leading;
    dims.push(num_frames);
    Ok(ArrayD::from_shape_vec(IxDyn(&dims), data).expect("centroid reduces the frequency axis"))
}
