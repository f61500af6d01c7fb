//! The canonical detection data model.
//!
//! Every detector (word, topic, visual) normalizes its raw output into [`Interval`]
//! records on the *global* media timeline; the merge step turns those into
//! [`RedactionRange`]s ready for command synthesis.
//!
//! Invariant: an `Interval` is only constructed after chunk rebasing — its timestamps are
//! global, never window-local.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Which detector produced an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionKind {
    /// A banned-word match from the transcript.
    Word,
    /// A topic classification over a transcript segment.
    Topic,
    /// A per-frame visual detection.
    Visual,
}

/// A single normalized detection with a time span, kind, and label.
///
/// Intervals are created once by a normalizer and never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interval {
    /// Start of the detection on the global timeline, in seconds.
    pub start_seconds: f64,
    /// End of the detection on the global timeline, in seconds.
    pub end_seconds: f64,
    /// Which detector produced this interval.
    pub kind: DetectionKind,
    /// The matched token: the original word text, topic name, or detector class.
    pub label: String,
    /// Model confidence in `[0, 1]`; absent for pure lexical word matches.
    pub confidence: Option<f32>,
    /// Bounded text window around the match (word/topic kinds only).
    pub context: Option<String>,
}

impl Interval {
    /// A banned-word match. Lexical matches carry no confidence.
    pub fn word(
        start_seconds: f64,
        end_seconds: f64,
        label: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            start_seconds,
            end_seconds,
            kind: DetectionKind::Word,
            label: label.into(),
            confidence: None,
            context: Some(context.into()),
        }
    }

    /// An accepted topic classification; `context` is the classified text segment.
    pub fn topic(
        start_seconds: f64,
        end_seconds: f64,
        label: impl Into<String>,
        confidence: f32,
        context: impl Into<String>,
    ) -> Self {
        Self {
            start_seconds,
            end_seconds,
            kind: DetectionKind::Topic,
            label: label.into(),
            confidence: Some(confidence),
            context: Some(context.into()),
        }
    }

    /// An accepted visual detection at a single frame timestamp.
    pub fn visual(timestamp_seconds: f64, label: impl Into<String>, confidence: f32) -> Self {
        Self {
            start_seconds: timestamp_seconds,
            end_seconds: timestamp_seconds,
            kind: DetectionKind::Visual,
            label: label.into(),
            confidence: Some(confidence),
            context: None,
        }
    }
}

/// A merged, buffered time span designated for editing.
///
/// Ranges within one output are disjoint and sorted ascending by start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactionRange {
    /// Range start in seconds, post-buffer, clipped to `[0, media_duration]`.
    pub start_seconds: f64,
    /// Range end in seconds, post-buffer, clipped to `[0, media_duration]`.
    pub end_seconds: f64,
    /// Distinct labels contributing to this range.
    pub labels: BTreeSet<String>,
}

impl RedactionRange {
    /// The range's `(start, end)` pair as consumed by command synthesis.
    pub fn span(&self) -> (f64, f64) {
        (self.start_seconds, self.end_seconds)
    }

    /// Labels joined with `|` in sorted order, as persisted in range artifacts.
    pub fn joined_labels(&self) -> String {
        self.labels.iter().cloned().collect::<Vec<_>>().join("|")
    }
}
