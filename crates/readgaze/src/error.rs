//! Error types
//!
//! Noisy data never produces an error; these cover the I/O edges only.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum GazeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid pipeline config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("no usable gaze rows in {}", .0.display())]
    EmptyInput(PathBuf),
}

pub type Result<T> = std::result::Result<T, GazeError>;
