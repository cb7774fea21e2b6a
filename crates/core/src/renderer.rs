//! Frame output seam.
//!
//! Video engines never own a display. When a frame is complete they hand it to
//! a `FrameSink`, synchronously, from inside their clock step:
//!
//! ```text
//! Driver -> engine.tick() -> (frame done) -> FrameSink::present(&Frame)
//! ```
//!
//! The sink runs on the emulation clock. Expensive work in `present` stalls
//! emulation, which is acceptable at one call per frame.
//!
//! Any `FnMut(&Frame)` closure is a sink:
//!
//! ```rust
//! use emu_core::renderer::FrameSink;
//! use emu_core::types::Frame;
//!
//! let mut presented = 0;
//! {
//!     let mut sink = |_: &Frame| presented += 1;
//!     sink.present(&Frame::new(160, 144));
//! }
//! assert_eq!(presented, 1);
//! ```

use crate::types::Frame;

/// Receiver for finished frames.
pub trait FrameSink {
    /// Called exactly once per produced frame.
    fn present(&mut self, frame: &Frame);

    /// Name for debugging output.
    fn name(&self) -> &str {
        "frame sink"
    }
}

impl<F> FrameSink for F
where
    F: FnMut(&Frame),
{
    fn present(&mut self, frame: &Frame) {
        self(frame)
    }

    fn name(&self) -> &str {
        "closure sink"
    }
}

/// Keeps a copy of the most recent frame.
///
/// This is what headless drivers and tests use in place of a window.
#[derive(Debug, Clone)]
pub struct FrameCapture {
    last: Option<Frame>,
    presented: u64,
}

impl FrameCapture {
    pub fn new() -> Self {
        Self {
            last: None,
            presented: 0,
        }
    }

    /// The last presented frame, if any.
    pub fn last_frame(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    /// Number of frames presented so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Take ownership of the last frame, leaving the capture empty.
    pub fn take(&mut self) -> Option<Frame> {
        self.last.take()
    }
}

impl Default for FrameCapture {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSink for FrameCapture {
    fn present(&mut self, frame: &Frame) {
        match self.last.as_mut() {
            // Same geometry every frame; reuse the allocation.
            Some(last) if last.pixels.len() == frame.pixels.len() => {
                last.pixels.copy_from_slice(&frame.pixels);
                last.width = frame.width;
                last.height = frame.height;
            }
            _ => self.last = Some(frame.clone()),
        }
        self.presented += 1;
    }

    fn name(&self) -> &str {
        "frame capture"
    }
}

/// Discards every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FrameSink for NullSink {
    fn present(&mut self, _frame: &Frame) {}

    fn name(&self) -> &str {
        "null sink"
    }
}
