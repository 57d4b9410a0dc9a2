//! Mel-scale conversion, filter bank construction, and mel spectrograms.

use std::sync::Arc;

use ndarray::{Array2, ArrayD};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::Memo;
use crate::error::{FeatureError, Result};
use crate::shape::{self, map_planes};
use crate::stft::{spectrogram, StftConfig};

/// Converts frequency in Hz to the mel scale.
pub fn hz_to_mel(hz: f64) -> f64 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

/// Converts a mel-scale value back to Hz.
pub fn mel_to_hz(mel: f64) -> f64 {
    700.0 * (10.0_f64.powf(mel / 2595.0) - 1.0)
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct MelKey {
    n_mels: usize,
    n_fft: usize,
    sample_rate: u32,
    f_min_bits: u64,
    f_max_bits: u64,
}

static MEL_BANKS: Lazy<Memo<MelKey, Array2<f32>>> = Lazy::new(Memo::new);

/// Returns the shared `(n_mels, n_fft / 2 + 1)` triangular filter matrix.
///
/// Filter edges are spaced linearly on the mel scale between `f_min` and
/// `f_max` (defaults to the Nyquist frequency). The matrix is built once per
/// configuration and shared across calls.
pub fn mel_filter_bank(
    n_mels: usize,
    n_fft: usize,
    sample_rate: u32,
    f_min: f64,
    f_max: Option<f64>,
) -> Result<Arc<Array2<f32>>> {
    if n_mels == 0 {
        return Err(FeatureError::config("n_mels must be positive"));
    }
    if n_fft < 2 {
        return Err(FeatureError::config("n_fft must be at least 2"));
    }
    let f_max = f_max.unwrap_or(sample_rate as f64 / 2.0);
    if f_min < 0.0 || f_max <= f_min {
        return Err(FeatureError::config(format!(
            "invalid frequency range [{f_min}, {f_max}]"
        )));
    }
    let key = MelKey {
        n_mels,
        n_fft,
        sample_rate,
        f_min_bits: f_min.to_bits(),
        f_max_bits: f_max.to_bits(),
    };
    Ok(MEL_BANKS.get_or_build(key, || {
        debug!(n_mels, n_fft, sample_rate, "mel: building filter bank");
        build_filter_bank(n_mels, n_fft, sample_rate, f_min, f_max)
    }))
}

fn build_filter_bank(
    n_mels: usize,
    n_fft: usize,
    sample_rate: u32,
    f_min: f64,
    f_max: f64,
) -> Array2<f32> {
    let n_freqs = n_fft / 2 + 1;
    let low = hz_to_mel(f_min);
    let high = hz_to_mel(f_max);
    let step = (high - low) / (n_mels + 1) as f64;
    let hz_points: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(low + i as f64 * step))
        .collect();

    let mut bank = Array2::zeros((n_mels, n_freqs));
    for m in 0..n_mels {
        let f_left = hz_points[m];
        let f_center = hz_points[m + 1];
        let f_right = hz_points[m + 2];
        for k in 0..n_freqs {
            let freq = k as f64 * sample_rate as f64 / n_fft as f64;
            let rising = (freq - f_left) / (f_center - f_left);
            let falling = (f_right - freq) / (f_right - f_center);
            bank[[m, k]] = rising.min(falling).max(0.0) as f32;
        }
    }
    bank
}

/// Projects a power spectrum `(..., n_fft / 2 + 1, time)` onto the mel scale.
///
/// Supports ranks 2 (freq, time), 3 (batch, freq, time) and
/// 4 (batch, channel, freq, time).
pub fn mel_scale(
    spec: &ArrayD<f32>,
    n_mels: usize,
    sample_rate: u32,
    f_min: f64,
    f_max: Option<f64>,
) -> Result<ArrayD<f32>> {
    let rank = spec.ndim();
    if !(2..=4).contains(&rank) {
        return Err(FeatureError::ShapeMismatch {
            rank,
            expected: shape::FEATURE_RANKS,
        });
    }
    let n_freqs = spec.shape()[rank - 2];
    if n_freqs < 2 {
        return Err(FeatureError::value(format!(
            "frequency axis of length {n_freqs} is too short"
        )));
    }
    let n_fft = (n_freqs - 1) * 2;
    let bank = mel_filter_bank(n_mels, n_fft, sample_rate, f_min, f_max)?;
    map_planes(spec, |plane| bank.dot(&plane))
}

/// Parameters for [`mel_spectrogram`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MelSpectrogramConfig {
    /// Sampling rate of the input waveforms in Hz.
    pub sample_rate: u32,
    /// Number of mel filter channels.
    pub n_mels: usize,
    /// Lower edge of the mel filters in Hz.
    pub f_min: f64,
    /// Upper edge of the mel filters in Hz (defaults to Nyquist).
    pub f_max: Option<f64>,
    /// Spectrum exponent: 2.0 for power, 1.0 for magnitude.
    pub power: f64,
    pub stft: StftConfig,
}

impl Default for MelSpectrogramConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            n_mels: 80,
            f_min: 0.0,
            f_max: None,
            power: 2.0,
            stft: StftConfig::default(),
        }
    }
}

/// Computes a mel spectrogram `(..., n_mels, num_frames)`.
pub fn mel_spectrogram(waveforms: &ArrayD<f32>, cfg: &MelSpectrogramConfig) -> Result<ArrayD<f32>> {
    // Build the filter bank first so configuration errors surface before
    // the transform runs.
    let bank = mel_filter_bank(
        cfg.n_mels,
        cfg.stft.n_fft,
        cfg.sample_rate,
        cfg.f_min,
        cfg.f_max,
    )?;
    let spec = spectrogram(waveforms, &cfg.stft, cfg.power)?;
    map_planes(&spec, |plane| bank.dot(&plane))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::IxDyn;
    use std::f32::consts::PI;
    use std::sync::Arc;

    #[test]
    fn hz_mel_roundtrip() {
        for &hz in &[0.0, 100.0, 440.0, 1000.0, 8000.0] {
            let back = mel_to_hz(hz_to_mel(hz));
            assert_abs_diff_eq!(hz, back, epsilon = 1e-6);
        }
    }

    #[test]
    fn filter_bank_shape_and_support() {
        let bank = mel_filter_bank(40, 400, 16000, 0.0, None).unwrap();
        assert_eq!(bank.dim(), (40, 201));
        assert!(bank.iter().all(|&v| v >= 0.0));
        // every filter covers at least one bin
        for row in bank.outer_iter() {
            assert!(row.sum() > 0.0, "each triangular filter must be non-empty");
        }
    }

    #[test]
    fn filter_bank_is_cached_per_configuration() {
        let a = mel_filter_bank(40, 400, 16000, 0.0, None).unwrap();
        let b = mel_filter_bank(40, 400, 16000, 0.0, None).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let c = mel_filter_bank(41, 400, 16000, 0.0, None).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn invalid_frequency_range_is_a_config_error() {
        assert!(matches!(
            mel_filter_bank(40, 400, 16000, 4000.0, Some(300.0)),
            Err(FeatureError::Config { .. })
        ));
    }

    #[test]
    fn sine_energy_concentrates_near_its_mel_bin() {
        let sr = 16000.0f32;
        let samples: Vec<f32> = (0..16000)
            .map(|i| (2.0 * PI * 440.0 * i as f32 / sr).sin())
            .collect();
        let x = ArrayD::from_shape_vec(IxDyn(&[16000]), samples).unwrap();
        let cfg = MelSpectrogramConfig {
            n_mels: 40,
            stft: StftConfig {
                hop_length: Some(160),
                ..StftConfig::default()
            },
            ..MelSpectrogramConfig::default()
        };
        let mel = mel_spectrogram(&x, &cfg).unwrap();
        assert_eq!(mel.shape(), &[40, 101]);

        // total energy per mel bin
        let sums: Vec<f32> = (0..40)
            .map(|m| (0..101).map(|t| mel[[m, t]]).sum())
            .collect();
        let peak = sums
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(m, _)| m)
            .unwrap();

        // mel bin whose center is nearest 440 Hz
        let low = hz_to_mel(0.0);
        let step = (hz_to_mel(8000.0) - low) / 41.0;
        let expected = (0..40)
            .min_by(|&a, &b| {
                let ca = mel_to_hz(low + (a + 1) as f64 * step) - 440.0;
                let cb = mel_to_hz(low + (b + 1) as f64 * step) - 440.0;
                ca.abs().total_cmp(&cb.abs())
            })
            .unwrap();
        assert!(
            (peak as isize - expected as isize).abs() <= 1,
            "energy peak at mel bin {peak}, expected near {expected}"
        );
    }

    #[test]
    fn mel_scale_rejects_rank_five() {
        let spec = ArrayD::zeros(IxDyn(&[1, 1, 1, 201, 10]));
        match mel_scale(&spec, 40, 16000, 0.0, None) {
            Err(FeatureError::ShapeMismatch { rank, .. }) => assert_eq!(rank, 5),
            other => panic!("expected ShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn mel_spectrogram_keeps_batch_and_channel_axes() {
        let x = ArrayD::zeros(IxDyn(&[2, 3, 2000]));
        let cfg = MelSpectrogramConfig {
            n_mels: 24,
            ..MelSpectrogramConfig::default()
        };
        let mel = mel_spectrogram(&x, &cfg).unwrap();
        assert_eq!(&mel.shape()[..3], &[2, 3, 24]);
    }
}
