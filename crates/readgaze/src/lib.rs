//! # readgaze
//!
//! Gaze signal processing and return-sweep line detection for reading.
//!
//! Raw tracker frames go through ingestion, gap interpolation, Gaussian
//! smoothing and velocity derivation, then a MAD-based spike detector finds
//! leftward return sweeps that split the trace into text lines. The same
//! stages serve a live session fed one frame at a time and an offline batch
//! run over a recorded CSV.

pub mod adapter;
pub mod config;
pub mod detect;
pub mod error;
pub mod export;
pub mod ingest;
pub mod live;
pub mod session;
pub mod signal;
pub mod types;

pub use config::PipelineConfig;
pub use detect::{LineConfig, LineDetection, LineDetector, SpikeOptions};
pub use error::{GazeError, Result};
pub use session::{preprocess_batch, process_batch, GazeSession, SweepEvent};
pub use types::*;
