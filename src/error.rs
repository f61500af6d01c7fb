use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// Bleep's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Bleep's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
///
/// Variants map onto the pipeline's failure classes:
/// - input errors (`SourceNotFound`, `EmptyWordList`, `EmptyTopicList`, `SchemaMismatch`,
///   `EmptyDump`) abort the run before any model or engine work
/// - detector errors (`Detector`) abort the run mid-pipeline
/// - engine errors (`Engine`) carry the external engine's diagnostic output
///
/// Empty results (no detections, an empty review artifact) are *not* errors and never
/// appear here; they surface as empty collections or a no-op outcome.
#[derive(Debug, Error)]
pub enum Error {
    #[error("input file not found: '{}'", .0.display())]
    SourceNotFound(PathBuf),

    #[error("banned-word list '{}' is empty", .0.display())]
    EmptyWordList(PathBuf),

    #[error("topic list '{}' is empty", .0.display())]
    EmptyTopicList(PathBuf),

    #[error(
        "review artifact columns {found:?} match neither the word schema \
         (start, end, word, context) nor the range schema (start_seconds, end_seconds, labels)"
    )]
    SchemaMismatch { found: Vec<String> },

    #[error("no valid word entries found in transcript dump")]
    EmptyDump,

    #[error("detector failure: {0}")]
    Detector(String),

    #[error("{command} exited with {status}: {diagnostics}")]
    Engine {
        command: String,
        status: String,
        diagnostics: String,
    },

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Self {
        Self::Other(Box::new(err))
    }
}
