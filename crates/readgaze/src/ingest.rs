//! Sample ingestion: relative session clock and sticky reading context

use crate::types::{GazeSample, RawFrame, ReadingContext};

/// Last known value of a field that callers only report when it changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastKnown<T>(Option<T>);

impl<T: Copy> LastKnown<T> {
    pub fn new() -> Self {
        Self(None)
    }

    /// Record `value` if present and return the value now in effect.
    pub fn observe(&mut self, value: Option<T>) -> Option<T> {
        if value.is_some() {
            self.0 = value;
        }
        self.0
    }

    pub fn set(&mut self, value: T) {
        self.0 = Some(value);
    }

    pub fn get(&self) -> Option<T> {
        self.0
    }

    pub fn clear(&mut self) {
        self.0 = None;
    }
}

impl<T: Copy> Default for LastKnown<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns raw frames into canonical samples for one session
#[derive(Debug, Default)]
pub struct Ingestor {
    first_timestamp: Option<f64>,
    last_t: Option<f64>,
    line_index: LastKnown<u32>,
}

impl Ingestor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ingest(&mut self, frame: &RawFrame) -> GazeSample {
        let first = *self.first_timestamp.get_or_insert(frame.timestamp);
        let t = frame.timestamp - first;

        if let Some(prev) = self.last_t {
            if t <= prev {
                log::debug!("Non-monotonic gaze timestamp: {:.3}ms after {:.3}ms", t, prev);
            }
        }
        self.last_t = Some(t);

        let mut sample = GazeSample::new(t, finite(frame.x), finite(frame.y));
        sample.line_index = self.line_index.observe(frame.line_index);
        sample.char_index = frame.char_index;
        sample.reported_kind = frame.kind;
        sample
    }

    /// Apply a renderer context update to every following sample.
    pub fn apply_context(&mut self, context: &ReadingContext) {
        self.line_index.set(context.line_index);
    }

    pub fn current_line_index(&self) -> Option<u32> {
        self.line_index.get()
    }

    pub fn first_timestamp(&self) -> Option<f64> {
        self.first_timestamp
    }

    pub fn reset(&mut self) {
        self.first_timestamp = None;
        self.last_t = None;
        self.line_index.clear();
    }
}

fn finite(v: f64) -> Option<f64> {
    v.is_finite().then_some(v)
}
