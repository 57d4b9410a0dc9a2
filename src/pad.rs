use serde::{Deserialize, Serialize};

/// Edge handling policy for padding along the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadMode {
    /// Fill the border with zeros.
    Constant,
    /// Repeat the last value on the edge.
    Edge,
    /// Mirror around the edge, omitting the edge value itself.
    Reflect,
    /// Mirror around the edge, repeating the edge value.
    Symmetric,
}

/// Pads a non-empty lane with `left`/`right` extra samples on each side.
pub(crate) fn pad_lane(lane: &[f32], left: usize, right: usize, mode: PadMode) -> Vec<f32> {
    let n = lane.len();
    let mut out = Vec::with_capacity(n + left + right);
    for i in 0..(n + left + right) {
        out.push(sample_at(lane, i as isize - left as isize, mode));
    }
    out
}

/// Reads the lane at a possibly out-of-range index under the given policy.
///
/// The mirror arithmetic is modular, so pad widths larger than the lane
/// itself stay well defined.
fn sample_at(lane: &[f32], j: isize, mode: PadMode) -> f32 {
    let n = lane.len() as isize;
    if (0..n).contains(&j) {
        return lane[j as usize];
    }
    match mode {
        PadMode::Constant => 0.0,
        PadMode::Edge => lane[j.clamp(0, n - 1) as usize],
        PadMode::Reflect => {
            if n == 1 {
                return lane[0];
            }
            let period = 2 * (n - 1);
            let m = j.rem_euclid(period);
            let idx = if m < n { m } else { period - m };
            lane[idx as usize]
        }
        PadMode::Symmetric => {
            let period = 2 * n;
            let m = j.rem_euclid(period);
            let idx = if m < n { m } else { period - 1 - m };
            lane[idx as usize]
        }
    }
}
