//! Named feature recipes: filter bank (fbank) and MFCC extraction.
//!
//! Both recipes share the same front end (mel spectrogram at a 10 ms shift)
//! and the same optional tail: first/second derivatives concatenated along
//! the feature axis, then context stacking.

use ndarray::{ArrayD, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::context_window;
use crate::db::{amplitude_to_db, AmplitudeScale};
use crate::dct::{apply_dct, create_dct, DctNorm};
use crate::delta::compute_deltas;
use crate::error::Result;
use crate::mel::{mel_spectrogram, MelSpectrogramConfig};
use crate::pad::PadMode;
use crate::stft::StftConfig;
use crate::window::Window;

/// Dynamic range of the dB conversion inside the recipes.
const TOP_DB: f64 = 80.0;

/// Additive floor for the log-mel variant of [`mfcc`].
const LOG_MEL_FLOOR: f32 = 1e-6;

/// Filter bank recipe parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FbankConfig {
    /// Sampling rate of the input waveforms in Hz.
    pub sample_rate: u32,
    /// FFT size per frame.
    pub n_fft: usize,
    /// Analysis window length in samples (25 ms at 16 kHz).
    pub win_length: usize,
    /// Frame shift in samples (10 ms at 16 kHz).
    pub hop_length: usize,
    pub window: Window,
    /// Number of mel filter channels.
    pub n_mels: usize,
    /// Lower edge of the mel filters in Hz.
    pub f_min: f64,
    /// Upper edge of the mel filters in Hz (defaults to Nyquist).
    pub f_max: Option<f64>,
    /// Append first and second derivatives along the feature axis.
    pub deltas: bool,
    /// Regression window for the derivative estimate.
    pub delta_win_length: usize,
    pub delta_pad_mode: PadMode,
    /// Gather surrounding frames into each feature vector.
    pub context: bool,
    /// Past frames collected per step.
    pub left_frames: usize,
    /// Future frames collected per step.
    pub right_frames: usize,
}

impl Default for FbankConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            n_fft: 400,
            win_length: 400,
            hop_length: 160,
            window: Window::Hann,
            n_mels: 40,
            f_min: 0.0,
            f_max: None,
            deltas: false,
            delta_win_length: 5,
            delta_pad_mode: PadMode::Edge,
            context: false,
            left_frames: 5,
            right_frames: 5,
        }
    }
}

/// MFCC recipe parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MfccConfig {
    pub sample_rate: u32,
    pub n_fft: usize,
    pub win_length: usize,
    pub hop_length: usize,
    pub window: Window,
    pub n_mels: usize,
    /// Number of cepstral coefficients; must not exceed `n_mels`.
    pub n_mfcc: usize,
    pub f_min: f64,
    pub f_max: Option<f64>,
    /// DCT basis normalization.
    pub norm: DctNorm,
    /// Use `ln(mel + 1e-6)` instead of the dB conversion.
    pub log_mels: bool,
    pub deltas: bool,
    pub delta_win_length: usize,
    pub delta_pad_mode: PadMode,
    pub context: bool,
    pub left_frames: usize,
    pub right_frames: usize,
}

impl Default for MfccConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            n_fft: 400,
            win_length: 400,
            hop_length: 160,
            window: Window::Hann,
            n_mels: 23,
            n_mfcc: 20,
            f_min: 0.0,
            f_max: None,
            norm: DctNorm::Ortho,
            log_mels: false,
            deltas: true,
            delta_win_length: 5,
            delta_pad_mode: PadMode::Edge,
            context: true,
            left_frames: 5,
            right_frames: 5,
        }
    }
}

impl FbankConfig {
    fn mel_config(&self) -> MelSpectrogramConfig {
        front_end(
            self.sample_rate,
            self.n_fft,
            self.win_length,
            self.hop_length,
            self.window,
            self.n_mels,
            self.f_min,
            self.f_max,
        )
    }
}

impl MfccConfig {
    fn mel_config(&self) -> MelSpectrogramConfig {
        front_end(
            self.sample_rate,
            self.n_fft,
            self.win_length,
            self.hop_length,
            self.window,
            self.n_mels,
            self.f_min,
            self.f_max,
        )
    }
}

#[allow(clippy::too_many_arguments)]
fn front_end(
    sample_rate: u32,
    n_fft: usize,
    win_length: usize,
    hop_length: usize,
    window: Window,
    n_mels: usize,
    f_min: f64,
    f_max: Option<f64>,
) -> MelSpectrogramConfig {
    MelSpectrogramConfig {
        sample_rate,
        n_mels,
        f_min,
        f_max,
        power: 2.0,
        stft: StftConfig {
            n_fft,
            win_length: Some(win_length),
            hop_length: Some(hop_length),
            pad: 0,
            window,
            center: true,
            pad_mode: PadMode::Reflect,
        },
    }
}

/// Appends Δ and ΔΔ along the feature axis (second-to-last).
fn append_deltas(feats: &ArrayD<f32>, win_length: usize, pad_mode: PadMode) -> Result<ArrayD<f32>> {
    let d1 = compute_deltas(feats, win_length, pad_mode)?;
    let d2 = compute_deltas(&d1, win_length, pad_mode)?;
    let feature_axis = Axis(feats.ndim() - 2);
    Ok(
        ndarray::concatenate(feature_axis, &[feats.view(), d1.view(), d2.view()])
            .expect("derivatives preserve the input shape"),
    )
}

/// Extracts log mel filter bank features.
///
/// Output shape is `(..., n_mels·d·c, num_frames)` where `d` is 3 when
/// `deltas` is set and `c` is `left_frames + right_frames + 1` when
/// `context` is set; the leading batch/channel axes match the input.
pub fn fbank(waveforms: &ArrayD<f32>, cfg: &FbankConfig) -> Result<ArrayD<f32>> {
    debug!(
        rank = waveforms.ndim(),
        n_mels = cfg.n_mels,
        deltas = cfg.deltas,
        context = cfg.context,
        "fbank: extracting features"
    );
    let mel = mel_spectrogram(waveforms, &cfg.mel_config())?;
    let mut feats = amplitude_to_db(&mel, AmplitudeScale::Power, 1.0, Some(TOP_DB))?;
    if cfg.deltas {
        feats = append_deltas(&feats, cfg.delta_win_length, cfg.delta_pad_mode)?;
    }
    if cfg.context {
        feats = context_window(&feats, cfg.left_frames, cfg.right_frames)?;
    }
    Ok(feats)
}

/// Extracts mel-frequency cepstral coefficients.
///
/// Output shape follows the same arithmetic as [`fbank`] with `n_mfcc` in
/// place of `n_mels`.
pub fn mfcc(waveforms: &ArrayD<f32>, cfg: &MfccConfig) -> Result<ArrayD<f32>> {
    debug!(
        rank = waveforms.ndim(),
        n_mels = cfg.n_mels,
        n_mfcc = cfg.n_mfcc,
        deltas = cfg.deltas,
        context = cfg.context,
        "mfcc: extracting features"
    );
    // resolve the basis first so n_mfcc > n_mels fails before any transform
    let basis = create_dct(cfg.n_mfcc, cfg.n_mels, cfg.norm)?;
    let mel = mel_spectrogram(waveforms, &cfg.mel_config())?;
    let log_mel = if cfg.log_mels {
        mel.mapv(|v| (v + LOG_MEL_FLOOR).ln())
    } else {
        amplitude_to_db(&mel, AmplitudeScale::Power, 1.0, Some(TOP_DB))?
    };
    let mut feats = apply_dct(&log_mel, &basis)?;
    if cfg.deltas {
        feats = append_deltas(&feats, cfg.delta_win_length, cfg.delta_pad_mode)?;
    }
    if cfg.context {
        feats = context_window(&feats, cfg.left_frames, cfg.right_frames)?;
    }
    Ok(feats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeatureError;
    use ndarray::IxDyn;
    use std::f32::consts::PI;

    fn sine(shape: &[usize], freq_hz: f32) -> ArrayD<f32> {
        let len: usize = shape.iter().product();
        let time = shape[shape.len() - 1];
        let data: Vec<f32> = (0..len)
            .map(|i| (2.0 * PI * freq_hz * (i % time) as f32 / 16000.0).sin())
            .collect();
        ArrayD::from_shape_vec(IxDyn(shape), data).unwrap()
    }

    #[test]
    fn fbank_of_one_second_sine() {
        let x = sine(&[16000], 440.0);
        let out = fbank(&x, &FbankConfig::default()).unwrap();
        assert_eq!(out.shape(), &[40, 101]);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn fbank_deltas_triple_the_feature_axis() {
        let x = sine(&[2, 16000], 440.0);
        let cfg = FbankConfig {
            deltas: true,
            ..FbankConfig::default()
        };
        let out = fbank(&x, &cfg).unwrap();
        assert_eq!(out.shape(), &[2, 120, 101]);
    }

    #[test]
    fn mfcc_end_to_end_shape() {
        // 20 coefficients × 3 (deltas) × 11 (context) = 660 feature rows.
        let x = sine(&[10, 16000], 440.0);
        let out = mfcc(&x, &MfccConfig::default()).unwrap();
        assert_eq!(out.shape(), &[10, 660, 101]);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn mfcc_rejects_more_coefficients_than_mels() {
        let x = sine(&[16000], 440.0);
        let cfg = MfccConfig {
            n_mels: 20,
            n_mfcc: 23,
            ..MfccConfig::default()
        };
        assert!(matches!(
            mfcc(&x, &cfg),
            Err(FeatureError::Config { .. })
        ));
    }

    #[test]
    fn channel_rank_flows_through_fbank() {
        let x = sine(&[2, 2, 8000], 440.0);
        let out = fbank(&x, &FbankConfig::default()).unwrap();
        assert_eq!(&out.shape()[..3], &[2, 2, 40]);
    }

    #[test]
    fn log_mels_variant_stays_finite() {
        let x = sine(&[16000], 440.0);
        let cfg = MfccConfig {
            log_mels: true,
            deltas: false,
            context: false,
            ..MfccConfig::default()
        };
        let out = mfcc(&x, &cfg).unwrap();
        assert_eq!(out.shape(), &[20, 101]);
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn configs_round_trip_through_serde() {
        let json = serde_json::to_string(&FbankConfig::default()).unwrap();
        assert!(json.contains("\"hann\""));
        let parsed: FbankConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.hop_length, 160);
        assert_eq!(parsed.n_mels, 40);

        let parsed: MfccConfig =
            serde_json::from_str("{\"norm\":\"none\",\"delta_pad_mode\":\"reflect\"}").unwrap();
        assert_eq!(parsed.norm, DctNorm::None);
        assert_eq!(parsed.delta_pad_mode, PadMode::Reflect);
    }
}
