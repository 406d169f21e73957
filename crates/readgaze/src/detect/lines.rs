//! Return-sweep detection and line segmentation
//!
//! Return sweeps are fast leftward jumps, so only the negative part of the
//! horizontal velocity feeds the spike detector; forward reading motion would
//! otherwise inflate the baseline. Candidates must travel far enough to the
//! left, then pass two gates in order:
//!
//! - temporal: a line takes time to read, so a sweep starting less than
//!   `min_line_gap_ms` after the previous accepted sweep is dropped;
//! - context: a sweep may not open a line the renderer has not revealed yet.
//!   Without context this gate always passes.
//!
//! Accepted sweeps split the series into line segments.

use super::spike::{self, SpikeInterval, SpikeOptions, SpikeSample};
use crate::types::{Extremum, GazeSample};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Threshold multiplier for the one-sided velocity series
    pub k: f64,
    pub gap_ms: f64,
    pub expand_one_sample: bool,
    /// Minimum leftward travel of a sweep, in pixels
    pub min_displacement_px: f64,
    /// Minimum time between the end of one sweep and the start of the next
    pub min_line_gap_ms: f64,
    /// Interior segments shorter than this are not emitted
    pub min_segment_samples: usize,
    /// Below this many samples nothing is detected
    pub min_samples: usize,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            k: 2.0,
            gap_ms: 120.0,
            expand_one_sample: true,
            min_displacement_px: 100.0,
            min_line_gap_ms: 300.0,
            min_segment_samples: 5,
            min_samples: 10,
        }
    }
}

impl LineConfig {
    pub fn spike_options(&self) -> SpikeOptions {
        SpikeOptions {
            k: self.k,
            gap_ms: self.gap_ms,
            expand_one_sample: self.expand_one_sample,
        }
    }
}

/// Spike interval that travelled far enough to the left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepCandidate {
    pub interval: SpikeInterval,
    /// `gx` at the start sample minus `gx` at the end sample
    pub displacement_px: f64,
}

/// Accepted return sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidatedSweep {
    pub interval: SpikeInterval,
    pub displacement_px: f64,
    /// Line the sweep lands on (0-based)
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RejectReason {
    ShortDisplacement { displacement_px: f64 },
    TooSoon { gap_ms: f64 },
    /// Would open line `line_number` (1-based) with only `visible_lines` revealed
    BeyondVisibleLines { line_number: u32, visible_lines: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RejectedCandidate {
    pub interval: SpikeInterval,
    pub reason: RejectReason,
}

/// Contiguous run of samples assigned to one line; indices are inclusive
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub line: u32,
    pub start_index: usize,
    pub end_index: usize,
    pub start_ms: f64,
    pub end_ms: f64,
}

impl LineSegment {
    pub fn sample_count(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineDetection {
    /// Threshold the spike detector used; `None` when there was too little data
    pub threshold: Option<f64>,
    pub sweeps: Vec<ValidatedSweep>,
    pub segments: Vec<LineSegment>,
    pub rejected: Vec<RejectedCandidate>,
}

impl LineDetection {
    /// True when nothing was detected
    pub fn is_empty(&self) -> bool {
        self.sweeps.is_empty() && self.segments.is_empty()
    }

    /// Line the reader is on at the end of the series
    pub fn current_line(&self) -> Option<u32> {
        self.segments.last().map(|s| s.line)
    }
}

pub struct LineDetector {
    config: LineConfig,
}

impl LineDetector {
    pub fn new(config: LineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LineConfig {
        &self.config
    }

    /// Detect sweeps over the whole series and annotate `samples` in place.
    pub fn detect(&self, samples: &mut [GazeSample]) -> LineDetection {
        for s in samples.iter_mut() {
            s.clear_detection();
        }
        if samples.len() < self.config.min_samples {
            log::debug!(
                "Line detection skipped: {} samples (need {})",
                samples.len(),
                self.config.min_samples
            );
            return LineDetection::default();
        }

        let series: Vec<SpikeSample> = samples
            .iter()
            .map(|s| SpikeSample {
                ts_ms: s.t,
                value: if s.vx < 0.0 { s.vx } else { 0.0 },
            })
            .collect();
        let report = spike::detect(&series, &self.config.spike_options());

        let (candidates, mut rejected) = self.candidates(samples, &report.intervals);
        let (sweeps, gated) = self.validate(samples, candidates);
        rejected.extend(gated);
        rejected.sort_by(|a, b| a.interval.start_ms.total_cmp(&b.interval.start_ms));

        let segments = self.partition(samples, &sweeps);
        annotate(samples, &sweeps, &segments);

        log::debug!(
            "Line detection: threshold={:.4} sweeps={} segments={} rejected={}",
            report.threshold,
            sweeps.len(),
            segments.len(),
            rejected.len()
        );

        LineDetection {
            threshold: Some(report.threshold),
            sweeps,
            segments,
            rejected,
        }
    }

    /// Keep intervals with enough leftward travel, in chronological order.
    pub fn candidates(
        &self,
        samples: &[GazeSample],
        intervals: &[SpikeInterval],
    ) -> (Vec<SweepCandidate>, Vec<RejectedCandidate>) {
        let mut kept = Vec::new();
        let mut rejected = Vec::new();

        for &interval in intervals {
            let displacement_px = samples[interval.start_index].gx - samples[interval.end_index].gx;
            if displacement_px > self.config.min_displacement_px {
                kept.push(SweepCandidate {
                    interval,
                    displacement_px,
                });
            } else {
                rejected.push(RejectedCandidate {
                    interval,
                    reason: RejectReason::ShortDisplacement { displacement_px },
                });
            }
        }

        kept.sort_by(|a, b| a.interval.start_ms.total_cmp(&b.interval.start_ms));
        (kept, rejected)
    }

    /// Run the temporal and context gates over chronologically sorted
    /// candidates. Context is the sticky line index at each candidate's end
    /// sample.
    pub fn validate(
        &self,
        samples: &[GazeSample],
        candidates: Vec<SweepCandidate>,
    ) -> (Vec<ValidatedSweep>, Vec<RejectedCandidate>) {
        let mut sweeps = Vec::new();
        let mut rejected = Vec::new();
        let mut line_number: u32 = 1;
        let mut last_end_ms = f64::NEG_INFINITY;

        for candidate in candidates {
            let interval = candidate.interval;

            let gap_ms = interval.start_ms - last_end_ms;
            if gap_ms < self.config.min_line_gap_ms {
                rejected.push(RejectedCandidate {
                    interval,
                    reason: RejectReason::TooSoon { gap_ms },
                });
                continue;
            }

            let visible = samples.get(interval.end_index).and_then(|s| s.line_index);
            if let Some(visible) = visible {
                if line_number + 1 > visible + 1 {
                    rejected.push(RejectedCandidate {
                        interval,
                        reason: RejectReason::BeyondVisibleLines {
                            line_number: line_number + 1,
                            visible_lines: visible + 1,
                        },
                    });
                    continue;
                }
            }

            line_number += 1;
            last_end_ms = interval.end_ms;
            sweeps.push(ValidatedSweep {
                interval,
                displacement_px: candidate.displacement_px,
                line: line_number - 1,
            });
        }

        (sweeps, rejected)
    }

    /// Split the series at accepted sweeps. Sweep samples belong to no line.
    pub fn partition(&self, samples: &[GazeSample], sweeps: &[ValidatedSweep]) -> Vec<LineSegment> {
        let mut segments = Vec::with_capacity(sweeps.len() + 1);
        let mut cursor = 0usize;

        for (line, sweep) in sweeps.iter().enumerate() {
            let start = sweep.interval.start_index;
            if start > cursor && start - cursor >= self.config.min_segment_samples {
                segments.push(segment(samples, line as u32, cursor, start - 1));
            }
            cursor = cursor.max(sweep.interval.end_index + 1);
        }

        // the line being read right now is always reported
        if cursor < samples.len() {
            segments.push(segment(samples, sweeps.len() as u32, cursor, samples.len() - 1));
        }
        segments
    }
}

fn segment(samples: &[GazeSample], line: u32, start: usize, end: usize) -> LineSegment {
    LineSegment {
        line,
        start_index: start,
        end_index: end,
        start_ms: samples[start].t,
        end_ms: samples[end].t,
    }
}

fn annotate(samples: &mut [GazeSample], sweeps: &[ValidatedSweep], segments: &[LineSegment]) {
    for sweep in sweeps {
        let iv = sweep.interval;
        for s in &mut samples[iv.start_index..=iv.end_index] {
            s.is_return_sweep = true;
        }
        samples[iv.start_index].extremum = Some(Extremum::Max);
        samples[iv.end_index].extremum = Some(Extremum::Min);
    }
    for seg in segments {
        for s in &mut samples[seg.start_index..=seg.end_index] {
            s.detected_line = Some(seg.line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(n: usize, line_index: Option<u32>) -> Vec<GazeSample> {
        (0..n)
            .map(|i| {
                let mut s = GazeSample::new(i as f64 * 10.0, Some(500.0), Some(300.0));
                s.line_index = line_index;
                s
            })
            .collect()
    }

    fn candidate(start: usize, end: usize) -> SweepCandidate {
        SweepCandidate {
            interval: SpikeInterval {
                start_index: start,
                end_index: end,
                start_ms: start as f64 * 10.0,
                end_ms: end as f64 * 10.0,
                duration_ms: (end - start) as f64 * 10.0,
                peak_abs_value: 12.0,
            },
            displacement_px: 700.0,
        }
    }

    #[test]
    fn test_too_few_samples() {
        let mut s = flat(9, None);
        s[3].detected_line = Some(7);
        let detection = LineDetector::new(LineConfig::default()).detect(&mut s);
        assert!(detection.is_empty());
        assert_eq!(detection.threshold, None);
        assert!(s.iter().all(|x| x.detected_line.is_none()));
    }

    #[test]
    fn test_stationary_gaze_is_one_line() {
        let mut s = flat(40, Some(0));
        let detection = LineDetector::new(LineConfig::default()).detect(&mut s);
        assert!(detection.sweeps.is_empty());
        assert_eq!(detection.segments.len(), 1);
        assert!(s.iter().all(|x| x.detected_line == Some(0)));
    }

    #[test]
    fn test_temporal_gate() {
        let s = flat(200, None);
        let detector = LineDetector::new(LineConfig::default());
        // second sweep starts 200 ms after the first one ends
        let (sweeps, rejected) = detector.validate(&s, vec![candidate(50, 55), candidate(75, 80)]);

        assert_eq!(sweeps.len(), 1);
        assert_eq!(sweeps[0].interval.start_index, 50);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].reason, RejectReason::TooSoon { gap_ms: 200.0 });
    }

    #[test]
    fn test_temporal_gate_measures_from_accepted_sweeps_only() {
        let s = flat(300, None);
        let detector = LineDetector::new(LineConfig::default());
        let (sweeps, _) = detector.validate(
            &s,
            vec![candidate(50, 55), candidate(75, 80), candidate(90, 95)],
        );
        // 90 starts 350 ms after the accepted sweep at 55
        assert_eq!(sweeps.len(), 2);
        assert_eq!(sweeps[1].interval.start_index, 90);
        assert_eq!(sweeps[1].line, 2);
    }

    #[test]
    fn test_context_gate() {
        let s = flat(200, Some(0));
        let detector = LineDetector::new(LineConfig::default());
        let (sweeps, rejected) = detector.validate(&s, vec![candidate(50, 55)]);

        assert!(sweeps.is_empty());
        assert_eq!(
            rejected[0].reason,
            RejectReason::BeyondVisibleLines {
                line_number: 2,
                visible_lines: 1
            }
        );
    }

    #[test]
    fn test_context_gate_reads_end_sample() {
        let mut s = flat(200, Some(0));
        for x in &mut s[55..] {
            x.line_index = Some(1);
        }
        let detector = LineDetector::new(LineConfig::default());
        let (sweeps, _) = detector.validate(&s, vec![candidate(50, 55), candidate(120, 125)]);
        // the second would open line 3 with two lines revealed
        assert_eq!(sweeps.len(), 1);
        assert_eq!(sweeps[0].line, 1);
    }

    #[test]
    fn test_partition_skips_sweeps_and_short_segments() {
        let s = flat(100, None);
        let detector = LineDetector::new(LineConfig::default());
        let sweeps = vec![
            ValidatedSweep {
                interval: candidate(2, 6).interval,
                displacement_px: 700.0,
                line: 1,
            },
            ValidatedSweep {
                interval: candidate(40, 45).interval,
                displacement_px: 700.0,
                line: 2,
            },
        ];
        let segments = detector.partition(&s, &sweeps);

        // samples 0..=1 are too short to be line 0
        assert_eq!(segments.len(), 2);
        assert_eq!((segments[0].line, segments[0].start_index, segments[0].end_index), (1, 7, 39));
        assert_eq!((segments[1].line, segments[1].start_index, segments[1].end_index), (2, 46, 99));
    }

    #[test]
    fn test_trailing_segment_always_emitted() {
        let s = flat(50, None);
        let detector = LineDetector::new(LineConfig::default());
        let sweeps = vec![ValidatedSweep {
            interval: candidate(30, 47).interval,
            displacement_px: 700.0,
            line: 1,
        }];
        let segments = detector.partition(&s, &sweeps);
        let last = segments.last().expect("segment");
        assert_eq!((last.line, last.start_index, last.end_index), (1, 48, 49));
    }

    #[test]
    fn test_short_displacement_rejected() {
        let mut s = flat(40, None);
        for (i, x) in s.iter_mut().enumerate() {
            x.gx = 500.0 - i as f64;
        }
        let detector = LineDetector::new(LineConfig::default());
        let (kept, rejected) = detector.candidates(&s, &[candidate(10, 20).interval]);
        assert!(kept.is_empty());
        assert_eq!(
            rejected[0].reason,
            RejectReason::ShortDisplacement { displacement_px: 10.0 }
        );
    }
}
