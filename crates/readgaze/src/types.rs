//! Core data types for the gaze pipeline

use serde::{Deserialize, Serialize};

/// Eye-movement state of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SampleKind {
    /// Stable gaze pause
    Fixation,
    /// Fast ballistic movement between fixations
    Saccade,
    /// Position could not be resolved
    #[default]
    Unknown,
}

impl SampleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleKind::Fixation => "Fixation",
            SampleKind::Saccade => "Saccade",
            SampleKind::Unknown => "Unknown",
        }
    }

    /// Parse a tracker-reported state name (case-insensitive)
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "fixation" | "fix" => Some(SampleKind::Fixation),
            "saccade" | "sac" => Some(SampleKind::Saccade),
            "unknown" => Some(SampleKind::Unknown),
            _ => None,
        }
    }
}

/// Turning point of the horizontal reading trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Extremum {
    /// Rightmost point of a line, where a return sweep starts
    Max,
    /// Leftmost point of the next line, where a return sweep lands
    Min,
}

impl Extremum {
    pub fn as_str(&self) -> &'static str {
        match self {
            Extremum::Max => "MAX",
            Extremum::Min => "MIN",
        }
    }
}

/// A tracker frame after boundary normalization.
///
/// `x`/`y` are NaN when the tracker lost the eyes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    /// Absolute timestamp in milliseconds
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
    /// Content line the renderer expects to be read, if reported with the frame
    pub line_index: Option<u32>,
    /// Character under the gaze, as resolved by the renderer's hit test
    pub char_index: Option<u32>,
    /// Eye-movement state reported by the tracker
    pub kind: Option<SampleKind>,
}

impl RawFrame {
    pub fn new(timestamp: f64, x: f64, y: f64) -> Self {
        Self {
            timestamp,
            x,
            y,
            line_index: None,
            char_index: None,
            kind: None,
        }
    }

    /// A frame with no usable position
    pub fn lost(timestamp: f64) -> Self {
        Self::new(timestamp, f64::NAN, f64::NAN)
    }

    pub fn with_line_index(mut self, line_index: u32) -> Self {
        self.line_index = Some(line_index);
        self
    }

    pub fn with_char_index(mut self, char_index: u32) -> Self {
        self.char_index = Some(char_index);
        self
    }

    pub fn with_kind(mut self, kind: SampleKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Reading-context update pushed by the text renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReadingContext {
    /// Highest content line currently revealed (0-based)
    pub line_index: u32,
    /// Screen Y of that line, in pixels
    pub target_y: Option<f64>,
}

/// Screen position in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// One instant of eye-tracking data, enriched in place by each pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    /// Milliseconds since the first frame of the session
    pub t: f64,
    /// Raw coordinates; `None` on tracking loss
    pub x: Option<f64>,
    pub y: Option<f64>,
    /// Position after gap interpolation; `None` while unresolved
    pub fill: Option<Point>,
    /// Smoothed coordinates
    pub gx: f64,
    pub gy: f64,
    /// Smoothed velocity in px/ms
    pub vx: f64,
    pub vy: f64,
    /// Renderer context, carried forward from the last known value
    pub line_index: Option<u32>,
    pub char_index: Option<u32>,
    pub reported_kind: Option<SampleKind>,
    pub kind: SampleKind,
    /// Line assigned by return-sweep segmentation (0-based)
    pub detected_line: Option<u32>,
    pub is_return_sweep: bool,
    pub extremum: Option<Extremum>,
}

impl GazeSample {
    pub fn new(t: f64, x: Option<f64>, y: Option<f64>) -> Self {
        Self {
            t,
            x,
            y,
            fill: None,
            gx: 0.0,
            gy: 0.0,
            vx: 0.0,
            vy: 0.0,
            line_index: None,
            char_index: None,
            reported_kind: None,
            kind: SampleKind::Unknown,
            detected_line: None,
            is_return_sweep: false,
            extremum: None,
        }
    }

    /// True when the raw position is absent, non-finite, or the tracker's
    /// `(0, 0)` sentinel.
    pub fn is_missing(&self) -> bool {
        match (self.x, self.y) {
            (Some(x), Some(y)) => !x.is_finite() || !y.is_finite() || (x == 0.0 && y == 0.0),
            _ => true,
        }
    }

    /// Raw position, if valid
    pub fn raw_point(&self) -> Option<Point> {
        if self.is_missing() {
            return None;
        }
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point { x, y }),
            _ => None,
        }
    }

    /// Clear everything the line detector writes
    pub fn clear_detection(&mut self) {
        self.detected_line = None;
        self.is_return_sweep = false;
        self.extremum = None;
    }
}
