//! Spectral feature extraction for speech and speaker models.
//!
//! Converts raw waveform tensors into fixed-rate feature matrices:
//! spectrograms, mel filter banks, and MFCCs, with optional derivative and
//! context-window stacking. The crate is a pure computational library: no
//! I/O, no global configuration, no background work.
//!
//! # Pipeline
//!
//! ```text
//! waveform -> frames -> spectrum -> mel spectrogram -> dB/log
//!          -> [DCT] -> [deltas] -> [context stacking] -> features
//! ```
//!
//! Inputs are `ndarray` tensors whose innermost axis is time, at rank 1
//! `[time]`, rank 2 `[batch, time]`, or rank 3 `[batch, channel, time]`;
//! feature tensors keep the leading axes and append `[feature, frame]`.
//! Unsupported ranks fail with [`FeatureError::ShapeMismatch`] before any
//! computation runs.
//!
//! # Kernels
//!
//! The mel filter matrix, DCT basis, and context kernel are pure functions
//! of their configuration. They are built once per distinct configuration,
//! published behind an `Arc`, and shared read-only across calls and
//! threads; batch lanes are processed in parallel with rayon.
//!
//! # Entry points
//!
//! - [`fbank`]: log mel filter bank features ([`FbankConfig`])
//! - [`mfcc`]: mel-frequency cepstral coefficients ([`MfccConfig`])
//! - [`stft`], [`spectrogram`], [`mel_spectrogram`]: the individual stages
//! - [`compute_deltas`], [`context_window`]: feature-matrix post-processing

mod cache;
mod centroid;
mod context;
mod db;
mod dct;
mod delta;
mod error;
mod mel;
mod pad;
mod pipeline;
mod shape;
mod stft;
mod window;

pub use centroid::{spectral_centroid, SpectralCentroidConfig};
pub use context::context_window;
pub use db::{amplitude_to_db, AmplitudeScale};
pub use dct::{apply_dct, create_dct, DctNorm};
pub use delta::compute_deltas;
pub use error::{FeatureError, Result};
pub use mel::{hz_to_mel, mel_filter_bank, mel_scale, mel_spectrogram, mel_to_hz, MelSpectrogramConfig};
pub use pad::PadMode;
pub use pipeline::{fbank, mfcc, FbankConfig, MfccConfig};
pub use stft::{angle, complex_norm, spectrogram, stft, StftConfig};
pub use window::{Window, KAISER_BETA};
