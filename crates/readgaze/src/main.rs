//! readgaze-reprocess
//!
//! Re-runs the gaze pipeline over a recorded session:
//! - reads a CSV/TSV export (header and delimiter are detected)
//! - preprocesses and detects return sweeps in one batch
//! - writes the annotated samples as CSV
//! - optionally writes a JSON summary of the detection

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use readgaze::detect::RejectReason;
use readgaze::{export, process_batch, LineDetection, PipelineConfig};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "readgaze-reprocess")]
#[command(about = "Reprocess a recorded gaze session and export annotated samples", long_about = None)]
struct Cli {
    /// Recorded session (CSV or TSV)
    input: PathBuf,

    /// Where to write the processed CSV
    output: PathBuf,

    /// Pipeline config (TOML); falls back to READGAZE_CONFIG
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also write a JSON detection summary
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,
}

#[derive(Serialize)]
struct Summary<'a> {
    input: &'a PathBuf,
    samples: usize,
    config: &'a PipelineConfig,
    #[serde(flatten)]
    detection: &'a LineDetection,
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let config = PipelineConfig::resolve(cli.config.as_deref()).context("Failed to load pipeline config")?;
    let frames = export::read_csv(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;

    let (samples, detection) = process_batch(&frames, &config);

    for rejected in &detection.rejected {
        let iv = rejected.interval;
        match rejected.reason {
            RejectReason::ShortDisplacement { displacement_px } => log::debug!(
                "Spike at {:.0}-{:.0}ms ignored: {:.0}px leftward",
                iv.start_ms,
                iv.end_ms,
                displacement_px
            ),
            RejectReason::TooSoon { gap_ms } => log::info!(
                "Sweep at {:.0}ms rejected: {:.0}ms after the previous one",
                iv.start_ms,
                gap_ms
            ),
            RejectReason::BeyondVisibleLines {
                line_number,
                visible_lines,
            } => log::info!(
                "Sweep at {:.0}ms rejected: line {} of {} visible",
                iv.start_ms,
                line_number,
                visible_lines
            ),
        }
    }
    log::info!(
        "{} samples, {} return sweeps, {} lines",
        samples.len(),
        detection.sweeps.len(),
        detection.segments.len()
    );

    export::export_csv(&cli.output, &samples)
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    if let Some(path) = &cli.summary {
        let summary = Summary {
            input: &cli.input,
            samples: samples.len(),
            config: &config,
            detection: &detection,
        };
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &summary)?;
        log::info!("Summary written to {}", path.display());
    }

    Ok(())
}
