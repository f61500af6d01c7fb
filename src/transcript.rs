//! Word-level transcript handling.
//!
//! A transcript is an ordered sequence of [`Word`]s with global timestamps. This module
//! owns:
//! - the debug dump format (`[HH:MM:SS] (Start: S.SS, End: E.SE) <token>`), both writing
//!   and parsing, so a long transcription can be saved once and re-scanned offline
//! - the bounded context windows attached to word/topic matches for human review

use std::io::{BufRead, Write};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::timeline::format_hms;
use crate::{Error, Result};

/// Number of words taken on each side of a match when building review context.
const CONTEXT_RADIUS: usize = 5;

/// A single word produced by an ASR backend, with timestamps in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Word {
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
    /// Word text as emitted by the backend (surrounding whitespace preserved).
    pub text: String,
}

impl Word {
    pub fn new(start_seconds: f64, end_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            start_seconds,
            end_seconds,
            text: text.into(),
        }
    }
}

/// Build the review context around `index`: the space-joined text of the words in
/// `[index - 5, index + 6)`, clipped at the sequence boundaries.
///
/// Deterministic; the match itself is included in its own context.
pub fn context_window(words: &[Word], index: usize) -> String {
    let start = index.saturating_sub(CONTEXT_RADIUS);
    let end = (index + CONTEXT_RADIUS + 1).min(words.len());

    words[start..end]
        .iter()
        .map(|w| w.text.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Write the full timestamped transcript in the debug dump format.
///
/// The dump opens with a two-line header naming the source, then one line per word:
/// `[HH:MM:SS] (Start: S.SS, End: E.SE) <token>`.
pub fn write_dump<W: Write>(mut w: W, source_name: &str, words: &[Word]) -> Result<()> {
    writeln!(w, "Full Transcription for: {source_name}")?;
    writeln!(w, "{}", "=".repeat(40))?;
    writeln!(w)?;

    if words.is_empty() {
        write!(w, "No words were transcribed from this media file.")?;
        return Ok(());
    }

    for word in words {
        writeln!(
            w,
            "[{}] (Start: {:.2}, End: {:.2}) {}",
            format_hms(word.start_seconds),
            word.start_seconds,
            word.end_seconds,
            word.text.trim()
        )?;
    }

    Ok(())
}

fn dump_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Hours are unbounded, so the leading field is 2+ digits.
        Regex::new(r"^\[\d{2,}:\d{2}:\d{2}\] \(Start: ([\d.]+), End: ([\d.]+)\) (.*)$")
            .expect("dump line pattern is valid")
    })
}

/// Parse a transcript dump back into words.
///
/// Lines that don't match the dump format (headers, blanks) are skipped. A dump with no
/// parseable word entries at all is an input error, not an empty transcript.
pub fn parse_dump<R: BufRead>(reader: R) -> Result<Vec<Word>> {
    let pattern = dump_line_pattern();
    let mut words = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let Some(captures) = pattern.captures(&line) else {
            continue;
        };

        let (Ok(start_seconds), Ok(end_seconds)) =
            (captures[1].parse::<f64>(), captures[2].parse::<f64>())
        else {
            tracing::debug!(line, "skipping dump line with unparseable timestamps");
            continue;
        };

        words.push(Word::new(
            start_seconds,
            end_seconds,
            captures[3].trim().to_owned(),
        ));
    }

    if words.is_empty() {
        return Err(Error::EmptyDump);
    }

    Ok(words)
}
