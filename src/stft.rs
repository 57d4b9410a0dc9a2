//! Windowed framing and the short-time Fourier transform.
//!
//! The spectrum is returned as trailing (real, imag) pairs so downstream
//! consumers can pick magnitude, power, or phase without recomputing the
//! transform.

use ndarray::{Array3, ArrayD, Axis, IxDyn};
use rayon::prelude::*;
use rustfft::num_complex::Complex32;
use rustfft::FftPlanner;
use serde::{Deserialize, Serialize};

use crate::error::{FeatureError, Result};
use crate::pad::{pad_lane, PadMode};
use crate::shape::{self, into_lanes};
use crate::window::Window;

/// Short-time Fourier transform parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StftConfig {
    /// FFT size; the spectrum gets `n_fft / 2 + 1` frequency bins.
    pub n_fft: usize,
    /// Analysis window length in samples (defaults to `n_fft`).
    pub win_length: Option<usize>,
    /// Hop between adjacent frames (defaults to `win_length / 2`).
    pub hop_length: Option<usize>,
    /// Extra zero padding applied symmetrically before framing.
    pub pad: usize,
    /// Analysis window multiplied into each frame.
    pub window: Window,
    /// Pad `n_fft / 2` samples on both sides so frames are centered on
    /// their timestamps.
    pub center: bool,
    /// Edge policy for the centering pad.
    pub pad_mode: PadMode,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            n_fft: 400,
            win_length: None,
            hop_length: None,
            pad: 0,
            window: Window::Hann,
            center: true,
            pad_mode: PadMode::Reflect,
        }
    }
}

impl StftConfig {
    /// Resolves `(n_fft, win_length, hop_length)`, validating the combination.
    pub(crate) fn resolve(&self) -> Result<(usize, usize, usize)> {
        let n_fft = self.n_fft;
        if n_fft == 0 {
            return Err(FeatureError::config("n_fft must be positive"));
        }
        let win = self.win_length.unwrap_or(n_fft);
        if win == 0 {
            return Err(FeatureError::config("win_length must be positive"));
        }
        if win > n_fft {
            return Err(FeatureError::config(format!(
                "win_length ({win}) must not exceed n_fft ({n_fft})"
            )));
        }
        let hop = self.hop_length.unwrap_or(win / 2);
        if hop == 0 {
            return Err(FeatureError::config("hop_length must be positive"));
        }
        if hop > win {
            return Err(FeatureError::config(format!(
                "hop_length ({hop}) must not exceed win_length ({win})"
            )));
        }
        Ok((n_fft, win, hop))
    }
}

/// Computes the complex STFT of 1-D to 3-D waveforms.
///
/// Output shape is `(..., n_fft / 2 + 1, num_frames, 2)` with the trailing
/// axis holding (real, imag) pairs.
pub fn stft(waveforms: &ArrayD<f32>, cfg: &StftConfig) -> Result<ArrayD<f32>> {
    let (n_fft, win, hop) = cfg.resolve()?;
    let (lanes, leading) = into_lanes(waveforms, 1, 3, shape::WAVEFORM_RANKS)?;

    let time = lanes.shape()[1];
    let padded_len = time + 2 * cfg.pad + if cfg.center { 2 * (n_fft / 2) } else { 0 };
    if padded_len < win {
        return Err(FeatureError::value(format!(
            "waveform of {time} samples is too short for win_length {win}"
        )));
    }
    let num_frames = 1 + (padded_len - win) / hop;
    let n_freqs = n_fft / 2 + 1;
    // window sits centered inside the FFT frame when win < n_fft
    let offset = (n_fft - win) / 2;

    let window: Vec<f32> = cfg.window.sample(win).into_iter().map(|w| w as f32).collect();
    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n_fft);

    let rows: Vec<_> = lanes.outer_iter().collect();
    let spectra: Vec<Array3<f32>> = rows
        .into_par_iter()
        .map(|lane| {
            let lane = lane
                .to_slice()
                .expect("standard layout rows are contiguous");
            let base = if cfg.pad > 0 {
                pad_lane(lane, cfg.pad, cfg.pad, PadMode::Constant)
            } else {
                lane.to_vec()
            };
            let padded = if cfg.center {
                pad_lane(&base, n_fft / 2, n_fft / 2, cfg.pad_mode)
            } else {
                base
            };

            let mut out = Array3::zeros((n_freqs, num_frames, 2));
            let mut buf = vec![Complex32::ZERO; n_fft];
            let mut scratch = vec![Complex32::ZERO; fft.get_inplace_scratch_len()];
            for t in 0..num_frames {
                let start = t * hop;
                buf.fill(Complex32::ZERO);
                for i in 0..win {
                    buf[offset + i] = Complex32::new(padded[start + i] * window[i], 0.0);
                }
                fft.process_with_scratch(&mut buf, &mut scratch);
                for k in 0..n_freqs {
                    out[[k, t, 0]] = buf[k].re;
                    out[[k, t, 1]] = buf[k].im;
                }
            }
            out
        })
        .collect();

    let views: Vec<_> = spectra.iter().map(Array3::view).collect();
    let stacked = ndarray::stack(Axis(0), &views).expect("lanes share a common spectrum shape");
    let mut dims = leading;
    dims.extend([n_freqs, num_frames, 2]);
    Ok(stacked
        .into_shape_with_order(IxDyn(&dims))
        .expect("restoring leading axes preserves the element count"))
}

/// Element-wise norm of a (real, imag) pair tensor: `sqrt(re² + im²)^power`.
///
/// Drops the trailing pair axis. `power` must be non-negative.
pub fn complex_norm(x: &ArrayD<f32>, power: f64) -> Result<ArrayD<f32>> {
    if power < 0.0 {
        return Err(FeatureError::value(format!(
            "power must be non-negative, got {power}"
        )));
    }
    map_pairs(x, |re, im| {
        (re * re + im * im).sqrt().powf(power as f32)
    })
}

/// Element-wise phase of a (real, imag) pair tensor: `atan2(im, re)`.
pub fn angle(x: &ArrayD<f32>) -> Result<ArrayD<f32>> {
    map_pairs(x, |re, im| im.atan2(re))
}

/// Magnitude (`power = 1`) or power (`power = 2`) spectrogram.
pub fn spectrogram(waveforms: &ArrayD<f32>, cfg: &StftConfig, power: f64) -> Result<ArrayD<f32>> {
    complex_norm(&stft(waveforms, cfg)?, power)
}

fn map_pairs(x: &ArrayD<f32>, f: impl Fn(f32, f32) -> f32) -> Result<ArrayD<f32>> {
    let rank = x.ndim();
    if rank < 1 || x.shape()[rank - 1] != 2 {
        return Err(FeatureError::value(
            "expected a trailing (real, imag) axis of size 2",
        ));
    }
    let dims = x.shape()[..rank - 1].to_vec();
    let flat = x.as_standard_layout();
    let vals: Vec<f32> = flat
        .as_slice()
        .expect("standard layout is contiguous")
        .chunks_exact(2)
        .map(|p| f(p[0], p[1]))
        .collect();
    Ok(ArrayD::from_shape_vec(IxDyn(&dims), vals).expect("pair reduction halves the element count"))
}
