//! Interval clustering and buffering.
//!
//! Visual detections arrive as dense per-frame points; this module clusters temporally
//! adjacent ones into contiguous redaction ranges, pads every range with a safety
//! buffer, and guarantees the output is sorted and disjoint.
//!
//! Word and topic detections are deliberately *not* clustered — each one maps 1:1 to
//! its own review row so a human can accept or reject matches individually.

use crate::interval::{Interval, RedactionRange};

/// Cluster intervals into contiguous ranges using an adjacency gap.
///
/// Intervals are sorted ascending by start (stable, so equal starts keep input
/// order), then folded left to right: an interval within `gap_seconds` of the current
/// range's end extends it (`end = max(end, interval.end)`) and contributes its label;
/// anything further away closes the range and starts a new one.
pub fn cluster(intervals: &[Interval], gap_seconds: f64) -> Vec<RedactionRange> {
    if intervals.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&Interval> = intervals.iter().collect();
    sorted.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));

    let mut ranges: Vec<RedactionRange> = Vec::new();
    let mut current = range_from(sorted[0]);

    for &interval in &sorted[1..] {
        if interval.start_seconds - current.end_seconds <= gap_seconds {
            current.end_seconds = current.end_seconds.max(interval.end_seconds);
            current.labels.insert(interval.label.clone());
        } else {
            ranges.push(current);
            current = range_from(interval);
        }
    }
    ranges.push(current);

    ranges
}

fn range_from(interval: &Interval) -> RedactionRange {
    RedactionRange {
        start_seconds: interval.start_seconds,
        end_seconds: interval.end_seconds,
        labels: [interval.label.clone()].into_iter().collect(),
    }
}

/// Pad every range symmetrically by `buffer_seconds`, clipping to
/// `[0, media_duration_seconds]`, then coalesce any ranges the padding made overlap
/// or touch so the output stays disjoint.
pub fn apply_safety_buffer(
    ranges: Vec<RedactionRange>,
    buffer_seconds: f64,
    media_duration_seconds: f64,
) -> Vec<RedactionRange> {
    let mut buffered: Vec<RedactionRange> = ranges
        .into_iter()
        .map(|mut range| {
            range.start_seconds = (range.start_seconds - buffer_seconds).max(0.0);
            range.end_seconds = (range.end_seconds + buffer_seconds).min(media_duration_seconds);
            range
        })
        .collect();

    let mut coalesced: Vec<RedactionRange> = Vec::with_capacity(buffered.len());
    for range in buffered.drain(..) {
        match coalesced.last_mut() {
            Some(previous) if range.start_seconds <= previous.end_seconds => {
                previous.end_seconds = previous.end_seconds.max(range.end_seconds);
                previous.labels.extend(range.labels);
            }
            _ => coalesced.push(range),
        }
    }

    coalesced
}

/// Cluster a visual interval stream and apply the safety buffer in one pass.
///
/// `gap_seconds` should be the detector's sampling interval scaled by the adjacency
/// gap factor (see [`crate::opts::PipelineConfig::visual_adjacency_gap`]).
pub fn merge_visual(
    intervals: &[Interval],
    gap_seconds: f64,
    buffer_seconds: f64,
    media_duration_seconds: f64,
) -> Vec<RedactionRange> {
    let ranges = cluster(intervals, gap_seconds);
    let merged = apply_safety_buffer(ranges, buffer_seconds, media_duration_seconds);
    tracing::debug!(
        detections = intervals.len(),
        ranges = merged.len(),
        "visual merge complete"
    );
    merged
}
