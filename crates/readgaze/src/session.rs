//! One reading session: ingestion, preprocessing and line detection
//!
//! A session owns its sample log. `push` appends one frame and refreshes the
//! tail of the log; `process_batch` runs the same stages over a whole
//! recording. Both produce identical samples for identical frames.

use crate::config::PipelineConfig;
use crate::detect::lines::{LineDetection, LineDetector};
use crate::detect::spike::SpikeInterval;
use crate::ingest::Ingestor;
use crate::signal::Preprocessor;
use crate::types::{GazeSample, RawFrame, ReadingContext};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

/// Published once per newly accepted return sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepEvent {
    /// Line the reader moved onto (0-based)
    pub line: u32,
    pub start_ms: f64,
    pub end_ms: f64,
    /// Largest leftward speed inside the sweep, px/ms
    pub peak_velocity: f64,
}

pub struct GazeSession {
    config: PipelineConfig,
    ingestor: Ingestor,
    preprocessor: Preprocessor,
    detector: LineDetector,
    samples: Vec<GazeSample>,
    context: Option<ReadingContext>,
    last_published_line: u32,
    events_tx: Option<Sender<SweepEvent>>,
}

impl GazeSession {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            ingestor: Ingestor::new(),
            preprocessor: Preprocessor::new(&config),
            detector: LineDetector::new(config.lines),
            samples: Vec::new(),
            context: None,
            last_published_line: 0,
            events_tx: None,
            config,
        }
    }

    /// Forward newly accepted sweeps to another component
    pub fn connect_events(&mut self, tx: Sender<SweepEvent>) {
        self.events_tx = Some(tx);
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Append one frame and return the sample as it stands now. Earlier
    /// samples in the trailing window may also have been updated.
    pub fn push(&mut self, frame: &RawFrame) -> &GazeSample {
        let sample = self.ingestor.ingest(frame);
        self.samples.push(sample);
        self.preprocessor.refresh_tail(&mut self.samples);
        &self.samples[self.samples.len() - 1]
    }

    /// Renderer revealed a new line; applies to the following frames.
    pub fn update_context(&mut self, context: ReadingContext) {
        log::debug!("Reading context: line {} target_y {:?}", context.line_index, context.target_y);
        self.ingestor.apply_context(&context);
        self.context = Some(context);
    }

    pub fn context(&self) -> Option<&ReadingContext> {
        self.context.as_ref()
    }

    /// Run line detection over everything received so far.
    ///
    /// Only settled sweeps are published: ones followed by more than a
    /// kernel radius of samples lying at least `gap_ms` past their end. A
    /// sweep still growing at the tail of the buffer waits for a later run.
    pub fn detect_lines(&mut self) -> LineDetection {
        let detection = self.detector.detect(&mut self.samples);
        self.publish(&detection, false);
        detection
    }

    /// Final detection pass; publishes every accepted sweep not yet sent.
    pub fn flush_lines(&mut self) -> LineDetection {
        let detection = self.detector.detect(&mut self.samples);
        self.publish(&detection, true);
        detection
    }

    fn is_settled(&self, iv: &SpikeInterval) -> bool {
        let gap_ms = self.config.lines.gap_ms;
        let after_gap = self.samples[iv.end_index + 1..]
            .iter()
            .filter(|s| s.t - iv.end_ms >= gap_ms)
            .count();
        after_gap > self.preprocessor.kernel().radius()
    }

    fn publish(&mut self, detection: &LineDetection, flush: bool) {
        for sweep in &detection.sweeps {
            // line numbers are assigned in order, so each goes out once
            if sweep.line <= self.last_published_line {
                continue;
            }
            let iv = sweep.interval;
            if !flush && !self.is_settled(&iv) {
                break;
            }
            self.last_published_line = sweep.line;

            let event = SweepEvent {
                line: sweep.line,
                start_ms: iv.start_ms,
                end_ms: iv.end_ms,
                peak_velocity: iv.peak_abs_value,
            };
            log::info!(
                "Return sweep to line {} at {:.0}ms ({:.0}px)",
                event.line,
                event.end_ms,
                sweep.displacement_px
            );
            if let Some(tx) = &self.events_tx {
                if let Err(e) = tx.send(event) {
                    log::warn!("Failed to publish sweep event: {}", e);
                }
            }
        }
    }

    pub fn samples(&self) -> &[GazeSample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Start over: buffer, clock, context and published sweeps.
    pub fn reset(&mut self) {
        log::info!("Resetting gaze session ({} samples dropped)", self.samples.len());
        self.samples.clear();
        self.ingestor.reset();
        self.context = None;
        self.last_published_line = 0;
    }

    pub fn into_samples(self) -> Vec<GazeSample> {
        self.samples
    }
}

/// Ingest and preprocess a whole recording without running detection.
pub fn preprocess_batch(frames: &[RawFrame], config: &PipelineConfig) -> Vec<GazeSample> {
    let mut ingestor = Ingestor::new();
    let mut samples: Vec<GazeSample> = frames.iter().map(|f| ingestor.ingest(f)).collect();
    Preprocessor::new(config).run(&mut samples);
    samples
}

/// Full offline pipeline: preprocessing followed by line detection.
pub fn process_batch(frames: &[RawFrame], config: &PipelineConfig) -> (Vec<GazeSample>, LineDetection) {
    let mut samples = preprocess_batch(frames, config);
    let detection = LineDetector::new(config.lines).detect(&mut samples);
    (samples, detection)
}
