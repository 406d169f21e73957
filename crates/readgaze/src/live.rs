//! Live gaze feed over UDP
//!
//! One datagram carries one message in any form the adapter accepts. The
//! listener owns a single session and runs line detection every
//! `detect_every` frames.

use crate::adapter::{parse_message, InboundMessage};
use crate::detect::lines::LineDetection;
use crate::error::Result;
use crate::session::GazeSession;
use std::net::SocketAddr;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

/// Environment variable overriding the listener address
pub const UDP_ADDR_ENV: &str = "READGAZE_UDP_ADDR";

pub fn udp_addr_from_env() -> Option<SocketAddr> {
    let raw = std::env::var(UDP_ADDR_ENV).ok()?;
    raw.parse::<SocketAddr>().ok()
}

pub struct LiveFeed {
    session: GazeSession,
    detect_every: usize,
    frames: usize,
}

impl LiveFeed {
    pub fn new(session: GazeSession, detect_every: usize) -> Self {
        Self {
            session,
            detect_every: detect_every.max(1),
            frames: 0,
        }
    }

    pub fn session(&self) -> &GazeSession {
        &self.session
    }

    pub fn into_session(self) -> GazeSession {
        self.session
    }

    pub fn handle(&mut self, msg: InboundMessage) {
        match msg {
            InboundMessage::Frame(frame) => {
                self.session.push(&frame);
                self.frames += 1;
                if self.frames % self.detect_every == 0 {
                    self.session.detect_lines();
                }
            }
            InboundMessage::Context(context) => self.session.update_context(context),
            InboundMessage::Reset => {
                self.session.reset();
                self.frames = 0;
            }
        }
    }

    /// Final detection pass; sweeps still waiting to settle go out now.
    pub fn finish(&mut self) -> LineDetection {
        self.session.flush_lines()
    }

    /// Returns false when the datagram was not a recognised message.
    pub fn handle_datagram(&mut self, data: &[u8]) -> bool {
        let parsed = std::str::from_utf8(data).ok().and_then(parse_message);
        match parsed {
            Some(msg) => {
                self.handle(msg);
                true
            }
            None => {
                log::debug!("Dropping unrecognised datagram ({} bytes)", data.len());
                false
            }
        }
    }
}

/// Receive datagrams until `shutdown` fires, then hand the feed back.
pub async fn run_udp(
    bind_addr: SocketAddr,
    mut feed: LiveFeed,
    mut shutdown: mpsc::Receiver<()>,
) -> Result<LiveFeed> {
    let sock = UdpSocket::bind(bind_addr).await?;
    log::info!("UDP gaze listener bound on {bind_addr}");

    let mut buf = [0u8; 2048];
    loop {
        tokio::select! {
            _ = shutdown.recv() => break,
            received = sock.recv_from(&mut buf) => match received {
                Ok((len, _src)) => {
                    feed.handle_datagram(&buf[..len]);
                }
                Err(e) => log::warn!("UDP gaze recv error: {e}"),
            },
        }
    }

    feed.finish();
    log::info!("UDP gaze listener stopped after {} samples", feed.session.len());
    Ok(feed)
}
