//! Boundary adapter for inbound tracker and renderer messages
//!
//! Accepts JSON objects or whitespace separated `key=value` text and turns
//! them into the pipeline's own types. Nothing past this module sees any
//! other message shape.

use crate::types::{RawFrame, ReadingContext, SampleKind};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InboundMessage {
    Frame(RawFrame),
    Context(ReadingContext),
    /// Start a new session
    Reset,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonMessage {
    #[serde(default)]
    event: Option<String>,
    #[serde(default, alias = "ts", alias = "t")]
    timestamp: Option<f64>,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default, alias = "line", alias = "lineIndex")]
    line_index: Option<u32>,
    #[serde(default, alias = "char", alias = "charIndex")]
    char_index: Option<u32>,
    #[serde(default, alias = "targetY")]
    target_y: Option<f64>,
    #[serde(default, alias = "state", alias = "type")]
    kind: Option<String>,
}

impl JsonMessage {
    fn into_message(self) -> Option<InboundMessage> {
        match self.event.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("reset") => return Some(InboundMessage::Reset),
            Some("context") => {
                return Some(InboundMessage::Context(ReadingContext {
                    line_index: self.line_index?,
                    target_y: self.target_y,
                }))
            }
            _ => {}
        }

        // a renderer update carries no gaze position
        let positionless = self.x.is_none() && self.y.is_none();
        match (self.line_index, self.target_y) {
            (Some(line_index), Some(target_y)) if positionless => {
                return Some(InboundMessage::Context(ReadingContext {
                    line_index,
                    target_y: Some(target_y),
                }));
            }
            _ => {}
        }

        if self.timestamp.is_none() && self.x.is_none() && self.y.is_none() {
            return None;
        }
        // null x/y is tracking loss
        let mut frame = RawFrame::new(
            self.timestamp.unwrap_or_else(now_ms),
            self.x.unwrap_or(f64::NAN),
            self.y.unwrap_or(f64::NAN),
        );
        frame.line_index = self.line_index;
        frame.char_index = self.char_index;
        frame.kind = self.kind.as_deref().and_then(SampleKind::parse);
        Some(InboundMessage::Frame(frame))
    }
}

/// Parse one message. Returns `None` for anything unrecognised.
pub fn parse_message(msg: &str) -> Option<InboundMessage> {
    let msg = msg.trim();
    if msg.is_empty() {
        return None;
    }

    // JSON: {"ts":123.4,"x":512,"y":300,"line":2}
    if msg.starts_with('{') {
        return match serde_json::from_str::<JsonMessage>(msg) {
            Ok(j) => j.into_message(),
            Err(e) => {
                log::debug!("Invalid JSON gaze message: {}", e);
                None
            }
        };
    }

    let mut tokens = msg.split_whitespace().peekable();
    match tokens.peek().map(|t| t.to_ascii_lowercase()) {
        Some(t) if t == "reset" => return Some(InboundMessage::Reset),
        Some(t) if t == "ctx" || t == "context" => {
            tokens.next();
            return parse_context(tokens);
        }
        _ => {}
    }
    parse_frame(tokens)
}

// ctx line=3 y=120
fn parse_context<'a>(tokens: impl Iterator<Item = &'a str>) -> Option<InboundMessage> {
    let mut line_index: Option<u32> = None;
    let mut target_y: Option<f64> = None;

    for tok in tokens {
        let (k, v) = tok.split_once('=')?;
        match k {
            "line" | "line_index" => line_index = v.parse().ok(),
            "y" | "target_y" => target_y = v.parse().ok(),
            _ => {}
        }
    }

    Some(InboundMessage::Context(ReadingContext {
        line_index: line_index?,
        target_y,
    }))
}

// ts=123 x=512 y=300 line=2 char=14 state=fixation
fn parse_frame<'a>(tokens: impl Iterator<Item = &'a str>) -> Option<InboundMessage> {
    let mut timestamp: Option<f64> = None;
    let mut x: Option<f64> = None;
    let mut y: Option<f64> = None;
    let mut line_index: Option<u32> = None;
    let mut char_index: Option<u32> = None;
    let mut kind: Option<SampleKind> = None;

    for tok in tokens {
        let (k, v) = tok.split_once('=')?;
        match k {
            "ts" | "timestamp" | "t" => timestamp = v.parse().ok(),
            "x" => x = Some(v.parse().unwrap_or(f64::NAN)),
            "y" => y = Some(v.parse().unwrap_or(f64::NAN)),
            "line" | "line_index" => line_index = v.parse().ok(),
            "char" | "char_index" => char_index = v.parse().ok(),
            "state" | "kind" => kind = SampleKind::parse(v),
            _ => {}
        }
    }

    let mut frame = RawFrame::new(timestamp.unwrap_or_else(now_ms), x?, y?);
    frame.line_index = line_index;
    frame.char_index = char_index;
    frame.kind = kind;
    Some(InboundMessage::Frame(frame))
}

fn now_ms() -> f64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}
