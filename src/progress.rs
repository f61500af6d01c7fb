//! Progress reporting side channel.
//!
//! Core pipeline functions return structured results and stay silent; anything a frontend
//! wants to show the user flows through an injected [`ProgressObserver`]. This keeps the
//! library usable from CLIs, services, and tests without dragging presentation state
//! through the pipeline.

/// Receiver for pipeline progress events.
///
/// All methods have empty default bodies so observers only implement what they render.
pub trait ProgressObserver {
    /// A named pipeline stage has started (e.g. "transcribing", "merging").
    fn on_stage(&mut self, _stage: &str) {}

    /// Decode/detection work for one chunk window is starting.
    fn on_chunk_started(&mut self, _index: usize, _total: usize) {}

    /// A detection pass finished with `count` accepted detections.
    fn on_detections(&mut self, _count: usize) {}
}

/// An observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl ProgressObserver for NullObserver {}
