//! Discrete cosine transform basis for cepstral coefficients.

use std::f64::consts::PI;
use std::sync::Arc;

use ndarray::{Array2, ArrayD};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::Memo;
use crate::error::{FeatureError, Result};
use crate::shape::{self, map_planes};

/// Normalization applied to the DCT basis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DctNorm {
    /// Unnormalized DCT-II (all basis values doubled).
    None,
    /// Orthonormal basis: column 0 scaled by `1/√n_mels`, the rest by
    /// `√(2/n_mels)`.
    Ortho,
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct DctKey {
    n_mfcc: usize,
    n_mels: usize,
    norm: DctNorm,
}

static DCT_BASES: Lazy<Memo<DctKey, Array2<f32>>> = Lazy::new(Memo::new);

/// Returns the shared `(n_mels, n_mfcc)` DCT-II basis matrix.
///
/// Requires `n_mfcc ≤ n_mels`; the basis is built once per configuration.
pub fn create_dct(n_mfcc: usize, n_mels: usize, norm: DctNorm) -> Result<Arc<Array2<f32>>> {
    if n_mfcc == 0 {
        return Err(FeatureError::config("n_mfcc must be positive"));
    }
    if n_mfcc > n_mels {
        return Err(FeatureError::config(format!(
            "n_mfcc ({n_mfcc}) must not exceed n_mels ({n_mels})"
        )));
    }
    let key = DctKey {
        n_mfcc,
        n_mels,
        norm,
    };
    Ok(DCT_BASES.get_or_build(key, || {
        debug!(n_mfcc, n_mels, "dct: building basis");
        build_dct(n_mfcc, n_mels, norm)
    }))
}

fn build_dct(n_mfcc: usize, n_mels: usize, norm: DctNorm) -> Array2<f32> {
    let mut basis = Array2::zeros((n_mels, n_mfcc));
    for n in 0..n_mels {
        for k in 0..n_mfcc {
            let mut v = (PI / n_mels as f64 * (n as f64 + 0.5) * k as f64).cos();
            v *= match norm {
                DctNorm::None => 2.0,
                DctNorm::Ortho if k == 0 => (1.0 / n_mels as f64).sqrt(),
                DctNorm::Ortho => (2.0 / n_mels as f64).sqrt(),
            };
            basis[[n, k]] = v as f32;
        }
    }
    basis
}

/// Projects log-mel planes `(..., n_mels, time)` to `(..., n_mfcc, time)`.
pub fn apply_dct(log_mels: &ArrayD<f32>, basis: &Array2<f32>) -> Result<ArrayD<f32>> {
    let rank = log_mels.ndim();
    if !(2..=4).contains(&rank) {
        return Err(FeatureError::ShapeMismatch {
            rank,
            expected: shape::FEATURE_RANKS,
        });
    }
    let rows = log_mels.shape()[rank - 2];
    if rows != basis.nrows() {
        return Err(FeatureError::config(format!(
            "mel axis of length {rows} does not match DCT basis for {} mels",
            basis.nrows()
        )));
    }
    let transposed = basis.t().to_owned();
    map_planes(log_mels, |plane| transposed.dot(&plane))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::IxDyn;

    #[test]
    fn ortho_columns_have_unit_energy() {
        let basis = create_dct(20, 23, DctNorm::Ortho).unwrap();
        for k in 0..20 {
            let energy: f32 = (0..23).map(|n| basis[[n, k]] * basis[[n, k]]).sum();
            assert_abs_diff_eq!(energy, 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn unnormalized_basis_doubles_the_cosines() {
        let basis = create_dct(4, 8, DctNorm::None).unwrap();
        // column 0 is cos(0) everywhere, scaled by 2
        for n in 0..8 {
            assert_abs_diff_eq!(basis[[n, 0]], 2.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn too_many_coefficients_is_a_config_error() {
        assert!(matches!(
            create_dct(23, 20, DctNorm::Ortho),
            Err(FeatureError::Config { .. })
        ));
    }

    #[test]
    fn basis_is_cached_per_configuration() {
        let a = create_dct(13, 40, DctNorm::Ortho).unwrap();
        let b = create_dct(13, 40, DctNorm::Ortho).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        let c = create_dct(13, 40, DctNorm::None).unwrap();
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn projection_reduces_the_mel_axis() {
        let basis = create_dct(5, 12, DctNorm::Ortho).unwrap();
        let x = ArrayD::zeros(IxDyn(&[3, 12, 7]));
        let out = apply_dct(&x, &basis).unwrap();
        assert_eq!(out.shape(), &[3, 5, 7]);
    }

    #[test]
    fn mismatched_mel_axis_is_a_config_error() {
        let basis = create_dct(5, 12, DctNorm::Ortho).unwrap();
        let x = ArrayD::zeros(IxDyn(&[10, 7]));
        assert!(matches!(
            apply_dct(&x, &basis),
            Err(FeatureError::Config { .. })
        ));
    }

    #[test]
    fn constant_input_projects_onto_the_dc_column_only() {
        let basis = create_dct(4, 16, DctNorm::Ortho).unwrap();
        let x = ArrayD::from_elem(IxDyn(&[16, 3]), 1.0f32);
        let out = apply_dct(&x, &basis).unwrap();
        // cosine columns for k >= 1 sum to zero over a constant signal
        for t in 0..3 {
            assert!(out[[0, t]].abs() > 1.0);
            for k in 1..4 {
                assert_abs_diff_eq!(out[[k, t]], 0.0, epsilon = 1e-4);
            }
        }
    }
}
