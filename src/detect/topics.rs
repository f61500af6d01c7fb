//! Topic detection over transcript segments.
//!
//! The transcript is sliced into fixed-duration text segments, each segment is handed
//! to a black-box zero-shot classifier, and the top label is accepted when its
//! confidence clears the threshold.

use std::io::Write;
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use crate::interval::Interval;
use crate::transcript::Word;
use crate::{Error, Result};

/// A fixed-duration slice of transcript text, with global timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSegment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
}

/// Slice a word sequence into segments of roughly `segment_seconds` each.
///
/// Words accumulate into the current segment until one ends more than
/// `segment_seconds` past the segment start; that word closes the segment (its end
/// becomes the segment end) and the next segment starts where it ended. A trailing
/// partial segment is flushed at end of input.
pub fn segment_words(words: &[Word], segment_seconds: f64) -> Vec<TextSegment> {
    let Some(first) = words.first() else {
        return Vec::new();
    };

    let mut segments = Vec::new();
    let mut segment_start = first.start_seconds;
    let mut segment_text = String::new();

    for word in words {
        segment_text.push_str(word.text.trim());
        segment_text.push(' ');

        if word.end_seconds - segment_start > segment_seconds {
            segments.push(TextSegment {
                start_seconds: segment_start,
                end_seconds: word.end_seconds,
                text: segment_text.trim().to_owned(),
            });
            segment_text.clear();
            segment_start = word.end_seconds;
        }
    }

    if !segment_text.trim().is_empty() {
        segments.push(TextSegment {
            start_seconds: segment_start,
            end_seconds: words.last().expect("words is non-empty").end_seconds,
            text: segment_text.trim().to_owned(),
        });
    }

    segments
}

/// Ranked output of a zero-shot classification: labels and scores sorted by
/// descending score, index-aligned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRanking {
    pub labels: Vec<String>,
    pub scores: Vec<f32>,
}

impl TopicRanking {
    /// The top-ranked `(label, score)` pair, if the ranking is non-empty.
    pub fn top(&self) -> Option<(&str, f32)> {
        match (self.labels.first(), self.scores.first()) {
            (Some(label), Some(score)) => Some((label.as_str(), *score)),
            _ => None,
        }
    }
}

/// Black-box zero-shot text classifier.
///
/// Given a text span and candidate labels, returns a ranked labels/scores list.
/// Implementations are external collaborators (a model process, a service); the
/// pipeline only depends on this trait.
pub trait TopicClassifier {
    fn classify(&mut self, text: &str, candidate_labels: &[String]) -> Result<TopicRanking>;
}

#[derive(Debug, Serialize)]
struct SidecarRequest<'a> {
    text: &'a str,
    candidate_labels: &'a [String],
}

/// A classifier that shells out to a sidecar process per segment.
///
/// The request is written to the child's stdin as one JSON object; the child must
/// print a `{"labels": [...], "scores": [...]}` JSON object to stdout and exit 0.
/// A non-zero exit is a detector failure and aborts the run.
pub struct SidecarClassifier {
    program: String,
    args: Vec<String>,
}

impl SidecarClassifier {
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
            .ok_or_else(|| Error::msg("classifier command is empty"))?;
        Ok(Self::new(program, parts.collect()))
    }
}

impl TopicClassifier for SidecarClassifier {
    fn classify(&mut self, text: &str, candidate_labels: &[String]) -> Result<TopicRanking> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Detector(format!("failed to spawn '{}': {e}", self.program)))?;

        let request = serde_json::to_vec(&SidecarRequest {
            text,
            candidate_labels,
        })?;
        child
            .stdin
            .take()
            .ok_or_else(|| Error::Detector("failed to open classifier stdin".into()))?
            .write_all(&request)?;

        let output = child
            .wait_with_output()
            .map_err(|e| Error::Detector(format!("classifier process error: {e}")))?;

        if !output.status.success() {
            return Err(Error::Detector(format!(
                "classifier exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

/// Classify each segment and keep the accepted matches as topic intervals.
///
/// The top label is accepted iff its score is at least `confidence_threshold`.
/// Segments whose ranking comes back empty are skipped, not fatal.
pub fn scan_topics(
    segments: &[TextSegment],
    candidate_labels: &[String],
    classifier: &mut dyn TopicClassifier,
    confidence_threshold: f32,
) -> Result<Vec<Interval>> {
    let mut matches = Vec::new();

    for segment in segments {
        let ranking = classifier.classify(&segment.text, candidate_labels)?;
        let Some((label, score)) = ranking.top() else {
            tracing::debug!(
                start = segment.start_seconds,
                "classifier returned an empty ranking; skipping segment"
            );
            continue;
        };

        if score < confidence_threshold {
            continue;
        }

        matches.push(Interval::topic(
            segment.start_seconds,
            segment.end_seconds,
            label,
            score,
            segment.text.clone(),
        ));
    }

    tracing::debug!(
        matches = matches.len(),
        segments = segments.len(),
        "topic scan complete"
    );
    Ok(matches)
}
