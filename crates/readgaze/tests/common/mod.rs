//! Synthetic reading traces shared by the integration tests.
//!
//! Samples every 10 ms. A line is read left to right from x=100 to x=900 at
//! 1 px/ms; a return sweep crosses back in four samples and lands at x=100.

#![allow(dead_code)]

use readgaze::RawFrame;

pub const DT_MS: f64 = 10.0;
const SWEEP_XS: [f64; 4] = [740.0, 580.0, 420.0, 260.0];

/// Which renderer context the frames carry
#[derive(Clone, Copy)]
pub enum Context {
    /// Each line's index, revealed as the sweep onto it begins
    Revealed,
    /// A fixed index on every frame
    Fixed(u32),
    Absent,
}

pub struct TraceBuilder {
    frames: Vec<RawFrame>,
    t: f64,
    context: Context,
    line: u32,
}

impl TraceBuilder {
    pub fn new(start_ms: f64, context: Context) -> Self {
        Self {
            frames: Vec::new(),
            t: start_ms,
            context,
            line: 0,
        }
    }

    fn emit(&mut self, x: f64) {
        let y = 200.0 + 40.0 * self.line as f64;
        let mut frame = RawFrame::new(self.t, x, y);
        frame.line_index = match self.context {
            Context::Revealed => Some(self.line),
            Context::Fixed(line) => Some(line),
            Context::Absent => None,
        };
        self.frames.push(frame);
        self.t += DT_MS;
    }

    /// Read from x=100 to x=900 over `duration_ms`.
    pub fn read(mut self, duration_ms: f64) -> Self {
        let steps = (duration_ms / DT_MS).round() as usize;
        for i in 0..=steps {
            self.emit(100.0 + 800.0 * i as f64 / steps as f64);
        }
        self
    }

    pub fn sweep(mut self) -> Self {
        self.line += 1;
        for x in SWEEP_XS {
            self.emit(x);
        }
        self
    }

    /// Return sweep spread over `duration_ms`, as when the reader drifts back.
    pub fn slow_sweep(mut self, duration_ms: f64) -> Self {
        self.line += 1;
        let steps = (duration_ms / DT_MS).round() as usize;
        for i in 1..steps {
            self.emit(900.0 - 800.0 * i as f64 / steps as f64);
        }
        self
    }

    pub fn build(self) -> Vec<RawFrame> {
        self.frames
    }
}

/// Three lines read at normal pace: 251 frames.
pub fn three_lines(context: Context) -> Vec<RawFrame> {
    TraceBuilder::new(1_000.0, context)
        .read(800.0)
        .sweep()
        .read(800.0)
        .sweep()
        .read(800.0)
        .build()
}
