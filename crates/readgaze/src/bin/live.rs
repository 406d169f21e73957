//! readgaze-live
//!
//! Listens for gaze frames and reading-context updates over UDP, detects
//! return sweeps as they happen and logs every line change. Ctrl+C stops
//! the listener and optionally exports the session as CSV.

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use readgaze::live::{self, LiveFeed};
use readgaze::{export, GazeSession, PipelineConfig, SweepEvent};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_BIND: &str = "127.0.0.1:5005";

#[derive(Parser)]
#[command(name = "readgaze-live")]
#[command(about = "Live return-sweep detection from a UDP gaze feed", long_about = None)]
struct Cli {
    /// Address to listen on (default: READGAZE_UDP_ADDR, then 127.0.0.1:5005)
    #[arg(short, long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Pipeline config (TOML); falls back to READGAZE_CONFIG
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the session as CSV on shutdown
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Run line detection every N frames
    #[arg(long, default_value = "30")]
    detect_every: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let config = PipelineConfig::resolve(cli.config.as_deref()).context("Failed to load pipeline config")?;
    let bind = match cli.bind.or_else(live::udp_addr_from_env) {
        Some(addr) => addr,
        None => DEFAULT_BIND.parse()?,
    };

    // Sweep events are consumed off the listener task
    let (events_tx, events_rx) = crossbeam_channel::unbounded::<SweepEvent>();
    let consumer = std::thread::spawn(move || {
        for event in events_rx {
            log::info!(
                "Line {} (sweep {:.0}-{:.0}ms, peak {:.2}px/ms)",
                event.line,
                event.start_ms,
                event.end_ms,
                event.peak_velocity
            );
        }
    });

    let mut session = GazeSession::new(config);
    session.connect_events(events_tx);
    let feed = LiveFeed::new(session, cli.detect_every);

    log::info!("Press Ctrl+C to stop");
    let (tx, rx) = tokio::sync::mpsc::channel::<()>(1);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal...");
        let _ = tx.blocking_send(());
    })?;

    let feed = live::run_udp(bind, feed, rx)
        .await
        .with_context(|| format!("UDP listener on {bind} failed"))?;
    let session = feed.into_session();

    if let Some(path) = &cli.export {
        export::export_csv(path, session.samples())
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    // dropping the session closes the event channel
    drop(session);
    if consumer.join().is_err() {
        log::warn!("Sweep event consumer panicked");
    }

    log::info!("Shutdown complete");
    Ok(())
}
