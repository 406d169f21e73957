//! Truncated Gaussian smoothing of the resolved position series

use crate::types::GazeSample;
use std::ops::Range;

/// Gaussian kernel sampled at integer offsets `-radius..=radius`
#[derive(Debug, Clone, PartialEq)]
pub struct GaussianKernel {
    sigma: f64,
    radius: usize,
    weights: Vec<f64>,
}

impl GaussianKernel {
    pub fn new(sigma: f64) -> Self {
        if !sigma.is_finite() || sigma <= 0.0 {
            return Self {
                sigma: 0.0,
                radius: 0,
                weights: vec![1.0],
            };
        }

        let radius = (3.0 * sigma).ceil() as usize;
        let norm = 1.0 / (sigma * (2.0 * std::f64::consts::PI).sqrt());
        let weights = (0..=2 * radius)
            .map(|j| {
                let d = j as f64 - radius as f64;
                norm * (-(d * d) / (2.0 * sigma * sigma)).exp()
            })
            .collect();

        Self { sigma, radius, weights }
    }

    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    pub fn radius(&self) -> usize {
        self.radius
    }

    pub fn width(&self) -> usize {
        self.weights.len()
    }

    /// Density at `offset` samples from the centre (0 outside the support)
    pub fn weight(&self, offset: isize) -> f64 {
        let idx = offset + self.radius as isize;
        if idx < 0 {
            return 0.0;
        }
        self.weights.get(idx as usize).copied().unwrap_or(0.0)
    }
}

/// Normalized weights applied when smoothing sample `i`.
///
/// Only in-range neighbours with a resolved position take part; the returned
/// weights sum to 1, or the list is empty when no neighbour qualifies.
pub fn weights_at(samples: &[GazeSample], kernel: &GaussianKernel, i: usize) -> Vec<(usize, f64)> {
    let r = kernel.radius();
    let lo = i.saturating_sub(r);
    let hi = (i + r).min(samples.len().saturating_sub(1));

    let mut weights: Vec<(usize, f64)> = (lo..=hi)
        .filter(|&j| samples[j].fill.is_some())
        .map(|j| (j, kernel.weight(j as isize - i as isize)))
        .collect();

    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    for (_, w) in weights.iter_mut() {
        *w /= total;
    }
    weights
}

/// Compute `gx`/`gy` for every sample in `range`.
pub fn smooth_range(samples: &mut [GazeSample], kernel: &GaussianKernel, range: Range<usize>) {
    for i in range {
        let weights = weights_at(samples, kernel, i);

        let (gx, gy) = if weights.is_empty() {
            fallback(samples, i)
        } else {
            weights.iter().fold((0.0, 0.0), |(ax, ay), &(j, w)| match samples[j].fill {
                Some(p) => (ax + w * p.x, ay + w * p.y),
                None => (ax, ay),
            })
        };

        samples[i].gx = gx;
        samples[i].gy = gy;
    }
}

/// Smooth the whole series.
pub fn smooth(samples: &mut [GazeSample], kernel: &GaussianKernel) {
    let len = samples.len();
    smooth_range(samples, kernel, 0..len);
}

// No resolved neighbour: raw position, else the previous smoothed value.
fn fallback(samples: &[GazeSample], i: usize) -> (f64, f64) {
    let s = &samples[i];
    match (s.x, s.y) {
        (Some(x), Some(y)) if x.is_finite() && y.is_finite() => (x, y),
        _ if i > 0 => (samples[i - 1].gx, samples[i - 1].gy),
        _ => (0.0, 0.0),
    }
}
