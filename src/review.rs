//! Review Artifact I/O.
//!
//! The review artifact is the persisted contract between the detection and redaction
//! stages: a fixed-column CSV a human can inspect and prune before any edit happens.
//! Two schemas are recognized, distinguished purely by their column names:
//!
//! - **word schema**: `start,hms_timestamp,end,word,context` — one row per banned-word
//!   match (topic artifacts extend the range schema with topic/confidence/text columns)
//! - **range schema**: `start_seconds,end_seconds,labels` — one row per merged
//!   redaction range
//!
//! Reading an artifact whose columns match neither schema is a hard error. Reading an
//! artifact with zero data rows is a valid, distinct state ("no redactions") — not a
//! failure.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::interval::{DetectionKind, Interval, RedactionRange};
use crate::timeline::format_hms;
use crate::{Error, Result};

/// Which recognized schema an artifact's columns matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewSchema {
    /// `start,end` columns: word-level review rows.
    Word,
    /// `start_seconds,end_seconds` columns: merged range rows (topic or visual).
    Range,
}

/// One row of a word-schema artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordRow {
    pub start: f64,
    pub hms_timestamp: String,
    pub end: f64,
    pub word: String,
    pub context: String,
}

/// One row of a topic artifact (range schema plus review columns).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRow {
    pub start_seconds: f64,
    pub hms_timestamp: String,
    pub end_seconds: f64,
    pub topic: String,
    /// Rendered as a percentage with two decimals (e.g. `"92.41%"`).
    pub confidence: String,
    pub text_segment: String,
}

/// One row of a visual range artifact. Times keep the two-decimal rendering the
/// redaction stage round-trips on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RangeRow {
    pub start_seconds: String,
    pub end_seconds: String,
    /// `|`-joined sorted class names.
    pub labels: String,
}

/// The spans extracted from a review artifact for redaction, plus the schema they
/// came from. `spans` may be empty — that is the "no redactions" state.
#[derive(Debug, Clone)]
pub struct ReviewSpans {
    pub schema: ReviewSchema,
    pub spans: Vec<(f64, f64)>,
}

/// Write word intervals as a word-schema artifact.
///
/// The header row is always written, so an artifact with zero matches stays readable
/// as the explicit "no redactions" state. Non-word intervals are a caller bug and are
/// skipped with a warning rather than corrupting the artifact.
pub fn write_word_artifact<W: Write>(writer: W, intervals: &[Interval]) -> Result<()> {
    let mut csv_writer = headerless_writer(writer);
    csv_writer.write_record(["start", "hms_timestamp", "end", "word", "context"])?;

    for interval in intervals {
        if interval.kind != DetectionKind::Word {
            tracing::warn!(?interval.kind, "skipping non-word interval in word artifact");
            continue;
        }

        csv_writer.serialize(WordRow {
            start: interval.start_seconds,
            hms_timestamp: format_hms(interval.start_seconds),
            end: interval.end_seconds,
            word: interval.label.clone(),
            context: interval.context.clone().unwrap_or_default(),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Read a word-schema artifact back into rows, preserving order.
pub fn read_word_artifact<R: Read>(reader: R) -> Result<Vec<WordRow>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for row in csv_reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Write topic intervals as a topic artifact.
pub fn write_topic_artifact<W: Write>(writer: W, intervals: &[Interval]) -> Result<()> {
    let mut csv_writer = headerless_writer(writer);
    csv_writer.write_record([
        "start_seconds",
        "hms_timestamp",
        "end_seconds",
        "topic",
        "confidence",
        "text_segment",
    ])?;

    for interval in intervals {
        if interval.kind != DetectionKind::Topic {
            tracing::warn!(?interval.kind, "skipping non-topic interval in topic artifact");
            continue;
        }

        let confidence = interval.confidence.unwrap_or(0.0);
        csv_writer.serialize(TopicRow {
            start_seconds: interval.start_seconds,
            hms_timestamp: format_hms(interval.start_seconds),
            end_seconds: interval.end_seconds,
            topic: interval.label.clone(),
            confidence: format!("{:.2}%", f64::from(confidence) * 100.0),
            text_segment: interval.context.clone().unwrap_or_default(),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Write merged redaction ranges as a range-schema artifact.
pub fn write_range_artifact<W: Write>(writer: W, ranges: &[RedactionRange]) -> Result<()> {
    let mut csv_writer = headerless_writer(writer);
    csv_writer.write_record(["start_seconds", "end_seconds", "labels"])?;

    for range in ranges {
        csv_writer.serialize(RangeRow {
            start_seconds: format!("{:.2}", range.start_seconds),
            end_seconds: format!("{:.2}", range.end_seconds),
            labels: range.joined_labels(),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Classify an artifact's header row, or `None` when it matches neither schema.
///
/// The word schema is checked first; `start`/`end` and `start_seconds`/`end_seconds`
/// never collide in practice.
pub fn detect_schema(headers: &csv::StringRecord) -> Option<ReviewSchema> {
    let has = |name: &str| headers.iter().any(|h| h == name);

    if has("start") && has("end") {
        Some(ReviewSchema::Word)
    } else if has("start_seconds") && has("end_seconds") {
        Some(ReviewSchema::Range)
    } else {
        None
    }
}

/// Extract `(start, end)` spans from a review artifact of either schema.
///
/// Rows whose time fields fail to parse are skipped (a reviewer may have annotated or
/// mangled a row; one bad row should not kill the edit). Unknown columns are a hard
/// [`Error::SchemaMismatch`].
pub fn read_redaction_spans<R: Read>(reader: R) -> Result<ReviewSpans> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let schema = detect_schema(&headers).ok_or_else(|| Error::SchemaMismatch {
        found: headers.iter().map(str::to_owned).collect(),
    })?;

    let (start_column, end_column) = match schema {
        ReviewSchema::Word => ("start", "end"),
        ReviewSchema::Range => ("start_seconds", "end_seconds"),
    };
    let start_index = column_index(&headers, start_column);
    let end_index = column_index(&headers, end_column);

    let mut spans = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        let parsed = record
            .get(start_index)
            .and_then(|v| v.trim().parse::<f64>().ok())
            .zip(record.get(end_index).and_then(|v| v.trim().parse::<f64>().ok()));

        match parsed {
            Some(span) => spans.push(span),
            None => tracing::warn!(row = ?record, "skipping review row with unparseable times"),
        }
    }

    Ok(ReviewSpans { schema, spans })
}

/// A writer with automatic headers disabled: each artifact writes its header row
/// explicitly so it is present even when there are zero data rows.
fn headerless_writer<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new().has_headers(false).from_writer(writer)
}

fn column_index(headers: &csv::StringRecord, name: &str) -> usize {
    headers
        .iter()
        .position(|h| h == name)
        .expect("column presence was checked by detect_schema")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interval::Interval;

    #[test]
    fn word_artifact_round_trips() -> Result<()> {
        let intervals = vec![
            Interval::word(1.0, 2.0, "badword", "hello badword there"),
            Interval::word(3665.0, 3665.5, "worse", "much worse now"),
        ];

        let mut buf = Vec::new();
        write_word_artifact(&mut buf, &intervals)?;
        let rows = read_word_artifact(buf.as_slice())?;

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].start, 1.0);
        assert_eq!(rows[0].end, 2.0);
        assert_eq!(rows[0].word, "badword");
        assert_eq!(rows[1].hms_timestamp, "01:01:05");
        Ok(())
    }

    #[test]
    fn context_with_commas_survives_the_round_trip() -> Result<()> {
        let intervals = vec![Interval::word(0.0, 1.0, "bad", "well, bad, yes")];
        let mut buf = Vec::new();
        write_word_artifact(&mut buf, &intervals)?;
        let rows = read_word_artifact(buf.as_slice())?;
        assert_eq!(rows[0].context, "well, bad, yes");
        Ok(())
    }

    #[test]
    fn word_schema_is_detected_from_columns() -> Result<()> {
        let artifact = "start,hms_timestamp,end,word,context\n1.0,00:00:01,2.0,bad,ctx\n";
        let spans = read_redaction_spans(artifact.as_bytes())?;
        assert_eq!(spans.schema, ReviewSchema::Word);
        assert_eq!(spans.spans, vec![(1.0, 2.0)]);
        Ok(())
    }

    #[test]
    fn range_schema_is_detected_from_columns() -> Result<()> {
        let artifact = "start_seconds,end_seconds,labels\n0.50,2.40,ANUS|BUTTS\n";
        let spans = read_redaction_spans(artifact.as_bytes())?;
        assert_eq!(spans.schema, ReviewSchema::Range);
        assert_eq!(spans.spans, vec![(0.5, 2.4)]);
        Ok(())
    }

    #[test]
    fn topic_artifacts_read_as_range_schema() -> Result<()> {
        let intervals = vec![Interval::topic(0.0, 91.0, "gambling", 0.9241, "some text")];
        let mut buf = Vec::new();
        write_topic_artifact(&mut buf, &intervals)?;

        let text = String::from_utf8(buf.clone()).expect("artifact is utf-8");
        assert!(text.contains("92.41%"));

        let spans = read_redaction_spans(buf.as_slice())?;
        assert_eq!(spans.schema, ReviewSchema::Range);
        assert_eq!(spans.spans, vec![(0.0, 91.0)]);
        Ok(())
    }

    #[test]
    fn unknown_columns_are_a_hard_error() {
        let artifact = "from,to\n0,1\n";
        let result = read_redaction_spans(artifact.as_bytes());
        assert!(matches!(result, Err(Error::SchemaMismatch { .. })));
    }

    #[test]
    fn empty_artifacts_still_carry_their_header() -> Result<()> {
        let mut buf = Vec::new();
        write_word_artifact(&mut buf, &[])?;
        let text = String::from_utf8(buf.clone()).expect("artifact is utf-8");
        assert!(text.starts_with("start,hms_timestamp,end,word,context"));

        // And the empty artifact reads back as the distinct "no redactions" state.
        let spans = read_redaction_spans(buf.as_slice())?;
        assert_eq!(spans.schema, ReviewSchema::Word);
        assert!(spans.spans.is_empty());
        Ok(())
    }

    #[test]
    fn zero_rows_is_a_valid_empty_state() -> Result<()> {
        let artifact = "start_seconds,end_seconds,labels\n";
        let spans = read_redaction_spans(artifact.as_bytes())?;
        assert!(spans.spans.is_empty());
        Ok(())
    }

    #[test]
    fn unparseable_rows_are_skipped() -> Result<()> {
        let artifact = "start,end,word,context\n1.0,2.0,bad,ctx\noops,nope,bad,ctx\n3.0,4.0,bad,ctx\n";
        let spans = read_redaction_spans(artifact.as_bytes())?;
        assert_eq!(spans.spans, vec![(1.0, 2.0), (3.0, 4.0)]);
        Ok(())
    }

    #[test]
    fn range_artifact_renders_two_decimals_and_sorted_labels() -> Result<()> {
        let ranges = vec![RedactionRange {
            start_seconds: 0.5,
            end_seconds: 2.4,
            labels: ["BUTTS", "ANUS"].iter().map(|s| s.to_string()).collect(),
        }];

        let mut buf = Vec::new();
        write_range_artifact(&mut buf, &ranges)?;
        let text = String::from_utf8(buf).expect("artifact is utf-8");
        assert!(text.contains("0.50,2.40,ANUS|BUTTS"));
        Ok(())
    }
}
