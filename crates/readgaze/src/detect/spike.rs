//! Robust spike interval detection
//!
//! Flags samples whose magnitude exceeds `median + k * scale`, where `scale`
//! is the MAD rescaled to a normal-consistent sigma. MAD keeps the outliers
//! from inflating their own threshold; when it collapses (constant or mostly
//! zero signal) the sample standard deviation takes over, then `1.0`.
//!
//! Flagged runs closer than `gap_ms` are merged into one interval. There is
//! no domain knowledge here; the line detector layers reading policy on top.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Converts a MAD into a normal-consistent standard deviation estimate
pub const MAD_TO_SIGMA: f64 = 1.4826;

/// Scales below this are treated as degenerate
pub const SCALE_FLOOR: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeSample {
    pub ts_ms: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpikeOptions {
    /// Threshold multiplier on the robust scale
    pub k: f64,
    /// Runs separated by at most this many ms are merged
    pub gap_ms: f64,
    /// Grow each run by one sample on both sides
    pub expand_one_sample: bool,
}

impl Default for SpikeOptions {
    fn default() -> Self {
        Self {
            k: 6.0,
            gap_ms: 120.0,
            expand_one_sample: false,
        }
    }
}

/// Merged run of flagged samples; indices are inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeInterval {
    pub start_index: usize,
    pub end_index: usize,
    pub start_ms: f64,
    pub end_ms: f64,
    pub duration_ms: f64,
    /// Largest |value| inside the interval
    pub peak_abs_value: f64,
}

impl SpikeInterval {
    pub fn contains(&self, index: usize) -> bool {
        (self.start_index..=self.end_index).contains(&index)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpikeReport {
    pub median: f64,
    pub scale: f64,
    pub threshold: f64,
    pub intervals: Vec<SpikeInterval>,
}

impl SpikeReport {
    fn empty() -> Self {
        Self {
            median: 0.0,
            scale: 1.0,
            threshold: f64::INFINITY,
            intervals: Vec::new(),
        }
    }
}

pub fn detect(samples: &[SpikeSample], opts: &SpikeOptions) -> SpikeReport {
    let magnitudes: Vec<f64> = samples
        .iter()
        .map(|s| s.value.abs())
        .filter(|v| v.is_finite())
        .collect();
    if magnitudes.is_empty() {
        return SpikeReport::empty();
    }

    let med = median(&magnitudes);
    let deviations: Vec<f64> = magnitudes.iter().map(|v| (v - med).abs()).collect();
    let mut scale = MAD_TO_SIGMA * median(&deviations);
    if !scale.is_finite() || scale < SCALE_FLOOR {
        scale = match sample_std(&magnitudes) {
            Some(sd) if sd.is_finite() && sd >= SCALE_FLOOR => sd,
            _ => 1.0,
        };
        log::debug!("MAD degenerate, falling back to scale {:.6}", scale);
    }
    let threshold = med + opts.k * scale;

    let mut runs = flagged_runs(samples, threshold);
    if opts.expand_one_sample {
        let last = samples.len() - 1;
        for run in runs.iter_mut() {
            run.0 = run.0.saturating_sub(1);
            run.1 = (run.1 + 1).min(last);
        }
    }

    let intervals = merge_runs(samples, runs, opts.gap_ms)
        .into_iter()
        .map(|(start, end)| interval(samples, start, end))
        .collect();

    SpikeReport {
        median: med,
        scale,
        threshold,
        intervals,
    }
}

fn flagged_runs(samples: &[SpikeSample], threshold: f64) -> Vec<(usize, usize)> {
    let mut runs = Vec::new();
    let mut open: Option<usize> = None;

    for (i, s) in samples.iter().enumerate() {
        let flagged = s.value.is_finite() && s.value.abs() > threshold;
        match (flagged, open) {
            (true, None) => open = Some(i),
            (false, Some(start)) => {
                runs.push((start, i - 1));
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        runs.push((start, samples.len() - 1));
    }
    runs
}

fn merge_runs(samples: &[SpikeSample], runs: Vec<(usize, usize)>, gap_ms: f64) -> Vec<(usize, usize)> {
    let mut merged: Vec<(usize, usize)> = Vec::with_capacity(runs.len());
    for run in runs {
        match merged.last_mut() {
            Some(last) if run.0 <= last.1 || samples[run.0].ts_ms - samples[last.1].ts_ms <= gap_ms => {
                last.1 = last.1.max(run.1);
            }
            _ => merged.push(run),
        }
    }
    merged
}

fn interval(samples: &[SpikeSample], start: usize, end: usize) -> SpikeInterval {
    let peak_abs_value = samples[start..=end]
        .iter()
        .map(|s| s.value.abs())
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);
    let start_ms = samples[start].ts_ms;
    let end_ms = samples[end].ts_ms;

    SpikeInterval {
        start_index: start,
        end_index: end,
        start_ms,
        end_ms,
        duration_ms: end_ms - start_ms,
        peak_abs_value,
    }
}

/// Median of a non-empty slice (mean of the middle pair for even lengths)
pub fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / (n - 1.0);
    Some(var.sqrt())
}
