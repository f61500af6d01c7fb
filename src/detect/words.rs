//! Banned-word scanning over a word-level transcript.

use std::collections::HashSet;

use crate::interval::Interval;
use crate::transcript::{context_window, Word};

/// Scans a transcript for members of a banned-word set.
///
/// Match policy: the word is lowercased and stripped of leading/trailing punctuation,
/// then checked for exact membership — `"Badword!"` matches `badword`, `"embedded"`
/// never matches `bed`. The emitted interval keeps the word as transcribed so the
/// review artifact shows what was actually said.
pub struct WordScanner {
    banned: HashSet<String>,
}

impl WordScanner {
    /// Build a scanner from an already-lowercased banned-word set
    /// (see [`crate::wordlist::load_word_set`]).
    pub fn new(banned: HashSet<String>) -> Self {
        Self { banned }
    }

    /// Number of words in the banned set.
    pub fn len(&self) -> usize {
        self.banned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.banned.is_empty()
    }

    /// Scan an ordered word sequence, emitting one interval per match with its review
    /// context attached. An empty transcript yields an empty result.
    pub fn scan(&self, words: &[Word]) -> Vec<Interval> {
        let mut matches = Vec::new();

        for (index, word) in words.iter().enumerate() {
            let candidate = normalize_token(&word.text);
            if candidate.is_empty() || !self.banned.contains(&candidate) {
                continue;
            }

            matches.push(Interval::word(
                word.start_seconds,
                word.end_seconds,
                word.text.trim(),
                context_window(words, index),
            ));
        }

        tracing::debug!(matches = matches.len(), scanned = words.len(), "word scan complete");
        matches
    }
}

/// Lowercase a token and strip surrounding punctuation, leaving inner punctuation
/// (contractions like `don't`) intact.
fn normalize_token(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase()
}
