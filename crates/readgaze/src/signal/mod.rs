//! Preprocessing: gap interpolation, Gaussian smoothing, velocity
//!
//! Every stage works on an index range of a buffered series and reads its
//! neighbours from the whole slice. A batch run covers the full range; a
//! streaming push recomputes only the tail a new sample can influence, so
//! both paths produce the same values for the same input.

pub mod interpolate;
pub mod smoothing;
pub mod velocity;

pub use smoothing::GaussianKernel;

use crate::config::PipelineConfig;
use crate::types::GazeSample;

/// The shared preprocessing chain
#[derive(Debug, Clone)]
pub struct Preprocessor {
    kernel: GaussianKernel,
    fixation_velocity: f64,
}

impl Preprocessor {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            kernel: GaussianKernel::new(config.smoothing.sigma),
            fixation_velocity: config.classify.fixation_velocity,
        }
    }

    pub fn kernel(&self) -> &GaussianKernel {
        &self.kernel
    }

    /// Process a complete series.
    pub fn run(&self, samples: &mut [GazeSample]) {
        self.run_from(samples, 0);
    }

    /// Refresh after one sample was appended to `samples`.
    pub fn refresh_tail(&self, samples: &mut [GazeSample]) {
        if samples.is_empty() {
            return;
        }
        let dirty = trailing_dirty_index(samples);
        self.run_from(samples, dirty);
    }

    fn run_from(&self, samples: &mut [GazeSample], dirty: usize) {
        let len = samples.len();
        interpolate::interpolate_range(samples, dirty..len);

        // smoothed values depend on fills up to `radius` samples away
        let from = dirty.saturating_sub(self.kernel.radius());
        smoothing::smooth_range(samples, &self.kernel, from..len);
        velocity::derive_velocity_range(samples, from..len);
        velocity::classify_range(samples, from..len, self.fixation_velocity);
    }
}

/// First index whose resolved position can change when the last sample of
/// `samples` is new: the start of the missing run just before it, if any.
fn trailing_dirty_index(samples: &[GazeSample]) -> usize {
    let last = samples.len() - 1;
    if samples[last].is_missing() {
        return last;
    }
    let mut start = last;
    while start > 0 && samples[start - 1].is_missing() {
        start -= 1;
    }
    start
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, x: Option<f64>) -> GazeSample {
        GazeSample::new(t, x, x.map(|_| 100.0))
    }

    #[test]
    fn test_dirty_index() {
        let s = vec![sample(0.0, Some(1.0)), sample(1.0, None), sample(2.0, None), sample(3.0, Some(4.0))];
        assert_eq!(trailing_dirty_index(&s), 1);
        assert_eq!(trailing_dirty_index(&s[..3]), 2);
        assert_eq!(trailing_dirty_index(&s[..1]), 0);
    }

    #[test]
    fn test_incremental_matches_full_pass() {
        let xs = [
            None,
            Some(100.0),
            Some(112.0),
            None,
            None,
            Some(150.0),
            Some(161.0),
            Some(0.0),
            Some(180.0),
            None,
        ];
        let pre = Preprocessor::new(&PipelineConfig::default());

        let mut streamed: Vec<GazeSample> = Vec::new();
        for (i, x) in xs.iter().enumerate() {
            let mut s = sample(i as f64 * 33.0, *x);
            if *x == Some(0.0) {
                s.y = Some(0.0);
            }
            streamed.push(s);
            pre.refresh_tail(&mut streamed);

            let mut batch = streamed.clone();
            pre.run(&mut batch);
            assert_eq!(streamed, batch, "diverged after sample {i}");
        }
    }
}
