//! Event detection on the preprocessed series

pub mod lines;
pub mod spike;

pub use lines::{
    LineConfig, LineDetection, LineDetector, LineSegment, RejectReason, RejectedCandidate,
    SweepCandidate, ValidatedSweep,
};
pub use spike::{SpikeInterval, SpikeOptions, SpikeReport, SpikeSample};
