//! Rank-polymorphic dispatch for tensors whose innermost axis is time.
//!
//! Every operation in this crate works on either 1-D lanes (a single time
//! series) or 2-D planes (a feature-by-time matrix). The helpers here
//! collapse all leading axes into one, run the per-lane/per-plane kernel in
//! parallel, and restore the original leading axes on the way out. This is
//! the only place input ranks are checked.

use ndarray::{Array2, Array3, ArrayD, ArrayView2, Axis, IxDyn};
use rayon::prelude::*;

use crate::error::{FeatureError, Result};

pub(crate) const WAVEFORM_RANKS: &str = "1, 2 or 3";
pub(crate) const FEATURE_RANKS: &str = "2, 3 or 4";

/// Collapses every axis except the innermost into a single lane axis.
pub(crate) fn into_lanes(
    x: &ArrayD<f32>,
    min_rank: usize,
    max_rank: usize,
    expected: &'static str,
) -> Result<(Array2<f32>, Vec<usize>)> {
    let rank = x.ndim();
    if rank < min_rank || rank > max_rank {
        return Err(FeatureError::ShapeMismatch { rank, expected });
    }
    if x.is_empty() {
        return Err(FeatureError::value("input tensor is empty"));
    }
    let time = x.shape()[rank - 1];
    let leading = x.shape()[..rank - 1].to_vec();
    let lanes: usize = leading.iter().product();
    let flat = x
        .as_standard_layout()
        .to_owned()
        .into_shape_with_order((lanes, time))
        .expect("collapsing leading axes preserves the element count");
    Ok((flat, leading))
}

/// Views the input as a stack of (rows, time) planes, ranks 2 through 4.
pub(crate) fn into_planes(x: &ArrayD<f32>) -> Result<(Array3<f32>, Vec<usize>)> {
    let rank = x.ndim();
    if !(2..=4).contains(&rank) {
        return Err(FeatureError::ShapeMismatch {
            rank,
            expected: FEATURE_RANKS,
        });
    }
    if x.is_empty() {
        return Err(FeatureError::value("input tensor is empty"));
    }
    let rows = x.shape()[rank - 2];
    let time = x.shape()[rank - 1];
    let leading = x.shape()[..rank - 2].to_vec();
    let planes: usize = leading.iter().product();
    let flat = x
        .as_standard_layout()
        .to_owned()
        .into_shape_with_order((planes, rows, time))
        .expect("collapsing leading axes preserves the element count");
    Ok((flat, leading))
}

/// Applies `f` to every lane in parallel and restores the leading axes.
///
/// `f` receives one contiguous time series and returns the transformed one;
/// all lanes must come back with equal lengths.
pub(crate) fn map_lanes<F>(
    x: &ArrayD<f32>,
    min_rank: usize,
    max_rank: usize,
    expected: &'static str,
    f: F,
) -> Result<ArrayD<f32>>
where
    F: Fn(&[f32]) -> Vec<f32> + Sync + Send,
{
    let (flat, leading) = into_lanes(x, min_rank, max_rank, expected)?;
    let lanes: Vec<&[f32]> = flat
        .outer_iter()
        .map(|row| row.to_slice().expect("standard layout rows are contiguous"))
        .collect();

    let rows: Vec<Vec<f32>> = lanes.into_par_iter().map(f).collect();

    let time = rows[0].len();
    let mut data = Vec::with_capacity(rows.len() * time);
    for row in &rows {
        data.extend_from_slice(row);
    }
    let mut dims = leading;
    dims.push(time);
    Ok(ArrayD::from_shape_vec(IxDyn(&dims), data).expect("lane rows match the output shape"))
}

/// Applies `f` to every (rows, time) plane in parallel, ranks 2 through 4.
pub(crate) fn map_planes<F>(x: &ArrayD<f32>, f: F) -> Result<ArrayD<f32>>
where
    F: Fn(ArrayView2<f32>) -> Array2<f32> + Sync + Send,
{
    let (flat, leading) = into_planes(x)?;
    let planes: Vec<ArrayView2<f32>> = flat.outer_iter().collect();
    let outs: Vec<Array2<f32>> = planes.into_par_iter().map(f).collect();

    let views: Vec<ArrayView2<f32>> = outs.iter().map(Array2::view).collect();
    let stacked = ndarray::stack(Axis(0), &views).expect("planes share a common output shape");
    let (out_rows, out_time) = (stacked.shape()[1], stacked.shape()[2]);
    let mut dims = leading;
    dims.push(out_rows);
    dims.push(out_time);
    Ok(stacked
        .into_shape_with_order(IxDyn(&dims))
        .expect("restoring leading axes preserves the element count"))
}
