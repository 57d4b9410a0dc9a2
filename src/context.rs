//! Context windows: gathering surrounding frames into each feature vector.

use std::sync::Arc;

use ndarray::{Array2, ArrayD};
use once_cell::sync::Lazy;

use crate::cache::Memo;
use crate::error::Result;
use crate::pad::{pad_lane, PadMode};
use crate::shape::map_planes;

#[derive(Clone, PartialEq, Eq, Hash)]
struct ContextKey {
    left: usize,
    right: usize,
}

static CONTEXT_KERNELS: Lazy<Memo<ContextKey, Array2<f32>>> = Lazy::new(Memo::new);

/// Identity-shift kernel `(context_size, kernel_size)`: row `j` selects the
/// frame at offset `j - left` once the shift correction is applied.
fn context_kernel(left: usize, right: usize) -> Arc<Array2<f32>> {
    CONTEXT_KERNELS.get_or_build(ContextKey { left, right }, || {
        let context_size = left + right + 1;
        let kernel_size = 2 * left.max(right) + 1;
        let shift = right as isize - left as isize;
        let mut kernel = Array2::zeros((context_size, kernel_size));
        for j in 0..context_size {
            let mut col = j as isize;
            if shift > 0 {
                col = (col + shift).rem_euclid(kernel_size as isize);
            }
            kernel[[j, col as usize]] = 1.0;
        }
        kernel
    })
}

/// Concatenates `left_frames` past and `right_frames` future frames into
/// each time step.
///
/// Every input channel expands into `left_frames + right_frames + 1`
/// adjacent output channels; channels are never mixed. Frames beyond the
/// edges read as zero. Supports ranks 2 (freq, time), 3 (batch, freq, time)
/// and 4 (batch, channel, freq, time).
pub fn context_window(
    features: &ArrayD<f32>,
    left_frames: usize,
    right_frames: usize,
) -> Result<ArrayD<f32>> {
    let kernel = context_kernel(left_frames, right_frames);
    let context_size = left_frames + right_frames + 1;
    let kernel_size = kernel.ncols();
    let max_frame = left_frames.max(right_frames);

    map_planes(features, |plane| {
        let (freq, time) = plane.dim();
        let mut out = Array2::zeros((freq * context_size, time));
        for c in 0..freq {
            let lane = plane
                .row(c)
                .to_slice()
                .expect("standard layout rows are contiguous")
                .to_vec();
            let padded = pad_lane(&lane, max_frame, max_frame, PadMode::Constant);
            for j in 0..context_size {
                for t in 0..time {
                    let mut acc = 0.0f32;
                    for k in 0..kernel_size {
                        acc += kernel[[j, k]] * padded[t + k];
                    }
                    out[[c * context_size + j, t]] = acc;
                }
            }
        }
        out
    })
}
