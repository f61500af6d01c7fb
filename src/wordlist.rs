//! Word and topic list files.
//!
//! Both lists are plain text, one entry per line, blank lines ignored. The banned-word
//! set is case-insensitive (entries are lowercased on load); topic labels keep their
//! original casing since they are handed verbatim to the classifier.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::{Error, Result};

/// Load a banned-word set from a plain text file.
///
/// Entries are trimmed and lowercased. A missing file is a [`Error::SourceNotFound`];
/// a file with no usable entries is a [`Error::EmptyWordList`] — both abort the run
/// before any transcription work is spent.
pub fn load_word_set(path: &Path) -> Result<HashSet<String>> {
    let words: HashSet<String> = read_lines(path)?
        .map(|line| line.to_lowercase())
        .collect();

    if words.is_empty() {
        return Err(Error::EmptyWordList(path.to_path_buf()));
    }

    tracing::debug!(count = words.len(), path = %path.display(), "loaded banned words");
    Ok(words)
}

/// Load candidate topic labels from a plain text file, preserving order and casing.
pub fn load_topics(path: &Path) -> Result<Vec<String>> {
    let topics: Vec<String> = read_lines(path)?.collect();

    if topics.is_empty() {
        return Err(Error::EmptyTopicList(path.to_path_buf()));
    }

    tracing::debug!(count = topics.len(), path = %path.display(), "loaded topics");
    Ok(topics)
}

fn read_lines(path: &Path) -> Result<impl Iterator<Item = String>> {
    if !path.exists() {
        return Err(Error::SourceNotFound(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(|line| line.trim().to_owned())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .into_iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write temp file");
        file
    }

    #[test]
    fn word_set_is_lowercased_and_skips_blanks() -> Result<()> {
        let file = write_temp("BadWord\n\n  other \n");
        let words = load_word_set(file.path())?;
        assert_eq!(words.len(), 2);
        assert!(words.contains("badword"));
        assert!(words.contains("other"));
        Ok(())
    }

    #[test]
    fn empty_word_file_is_an_input_error() {
        let file = write_temp("\n  \n");
        let result = load_word_set(file.path());
        assert!(matches!(result, Err(Error::EmptyWordList(_))));
    }

    #[test]
    fn missing_file_is_reported_as_such() {
        let result = load_word_set(Path::new("/nonexistent/words.txt"));
        assert!(matches!(result, Err(Error::SourceNotFound(_))));
    }

    #[test]
    fn topics_preserve_order_and_casing() -> Result<()> {
        let file = write_temp("Gambling\nviolent crime\n");
        let topics = load_topics(file.path())?;
        assert_eq!(topics, vec!["Gambling", "violent crime"]);
        Ok(())
    }
}
