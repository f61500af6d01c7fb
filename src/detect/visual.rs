//! Visual nudity detection over sampled video frames.
//!
//! The frame pass itself is an external collaborator: a [`FrameAnalyzer`] walks the
//! video at a fixed frame interval and reports per-frame detections. This module owns
//! the wire types, a sidecar-process implementation, and the pure acceptance filter
//! that turns raw reports into canonical intervals.

use std::collections::BTreeSet;
use std::path::Path;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::interval::Interval;
use crate::{Error, Result};

/// One raw detection within a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDetection {
    /// Detector class name (e.g. `FEMALE_BREAST`).
    #[serde(rename = "class")]
    pub class_name: String,
    /// Detector confidence in `[0, 1]`.
    pub score: f32,
    /// Bounding box `[x, y, w, h]` in pixels, when the detector provides one.
    #[serde(rename = "box", default)]
    pub bounding_box: Option<[f32; 4]>,
}

/// All detections reported for a single analyzed frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameReport {
    /// Index of the frame within the source video.
    pub frame_index: u64,
    /// Source frame rate; `frame_index / fps` is the frame's timestamp.
    pub fps: f64,
    /// Raw detections for this frame (possibly empty).
    #[serde(default)]
    pub detections: Vec<RawDetection>,
}

impl FrameReport {
    /// The frame's timestamp on the global timeline, in seconds.
    pub fn timestamp_seconds(&self) -> f64 {
        self.frame_index as f64 / self.fps
    }
}

/// Black-box per-frame object detector.
///
/// Implementations sample the video at `frame_interval_seconds` and return one
/// report per analyzed frame, in frame order.
pub trait FrameAnalyzer {
    fn analyze(&mut self, media_path: &Path, frame_interval_seconds: f64) -> Result<Vec<FrameReport>>;
}

/// A frame analyzer that shells out to a sidecar process.
///
/// The sidecar is invoked as `<program> <args...> <media_path> <interval>` and must
/// print one JSON [`FrameReport`] per line to stdout, exiting 0. Unparseable lines are
/// skipped with a warning; a non-zero exit is a detector failure and aborts the run.
pub struct SidecarAnalyzer {
    program: String,
    args: Vec<String>,
}

impl SidecarAnalyzer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a full command line on whitespace into program + args.
    pub fn from_command_line(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_owned);
        let program = parts
            .next()
            .ok_or_else(|| Error::msg("frame analyzer command is empty"))?;
        Ok(Self::new(program, parts.collect()))
    }
}

impl FrameAnalyzer for SidecarAnalyzer {
    fn analyze(&mut self, media_path: &Path, frame_interval_seconds: f64) -> Result<Vec<FrameReport>> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(media_path)
            .arg(frame_interval_seconds.to_string())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| Error::Detector(format!("failed to spawn '{}': {e}", self.program)))?;

        if !output.status.success() {
            return Err(Error::Detector(format!(
                "frame analyzer exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_report_lines(&stdout))
    }
}

fn parse_report_lines(stdout: &str) -> Vec<FrameReport> {
    let mut reports = Vec::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<FrameReport>(line) {
            Ok(report) => reports.push(report),
            Err(err) => tracing::warn!(%err, line, "skipping malformed frame report"),
        }
    }
    reports
}

/// Filter raw frame reports down to accepted visual intervals.
///
/// A detection is accepted when its score clears `score_threshold` and its class is in
/// the accepted set; each accepted detection becomes a point interval at
/// `frame_index / fps`. Reports with a non-positive fps are malformed and skipped.
pub fn accept_detections(
    reports: &[FrameReport],
    score_threshold: f32,
    accepted_classes: &BTreeSet<String>,
) -> Vec<Interval> {
    let mut intervals = Vec::new();

    for report in reports {
        if report.fps <= 0.0 {
            tracing::debug!(frame = report.frame_index, "skipping report with non-positive fps");
            continue;
        }

        let timestamp = report.timestamp_seconds();
        for detection in &report.detections {
            if detection.class_name.is_empty() {
                continue;
            }
            if detection.score < score_threshold {
                continue;
            }
            if !accepted_classes.contains(&detection.class_name) {
                continue;
            }

            intervals.push(Interval::visual(
                timestamp,
                detection.class_name.clone(),
                detection.score,
            ));
        }
    }

    intervals
}
