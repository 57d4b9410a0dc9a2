//! Analysis windows applied to each frame before the Fourier transform.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Shape parameter for the Kaiser window.
pub const KAISER_BETA: f64 = 12.0;

/// Window function multiplied into each analysis frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Window {
    Bartlett,
    Blackman,
    Hamming,
    Hann,
    Kaiser,
}

impl Default for Window {
    fn default() -> Self {
        Window::Hann
    }
}

impl Window {
    /// Samples the window at `n` points in the periodic (DFT-even) form.
    pub(crate) fn sample(self, n: usize) -> Vec<f64> {
        if n <= 1 {
            return vec![1.0; n];
        }
        let m = n as f64;
        (0..n)
            .map(|i| {
                let x = i as f64;
                match self {
                    Window::Bartlett => 1.0 - (2.0 * x / m - 1.0).abs(),
                    Window::Blackman => {
                        0.42 - 0.5 * (2.0 * PI * x / m).cos() + 0.08 * (4.0 * PI * x / m).cos()
                    }
                    Window::Hamming => 0.54 - 0.46 * (2.0 * PI * x / m).cos(),
                    Window::Hann => 0.5 - 0.5 * (2.0 * PI * x / m).cos(),
                    Window::Kaiser => {
                        let r = (2.0 * x - m) / m;
                        bessel_i0(KAISER_BETA * (1.0 - r * r).sqrt()) / bessel_i0(KAISER_BETA)
                    }
                }
            })
            .collect()
    }
}

/// Zeroth-order modified Bessel function of the first kind, series form.
fn bessel_i0(x: f64) -> f64 {
    let half = x / 2.0;
    let mut term = 1.0;
    let mut sum = 1.0;
    let mut k = 1.0;
    loop {
        term *= (half / k) * (half / k);
        sum += term;
        if term < sum * 1e-12 {
            return sum;
        }
        k += 1.0;
    }
}
