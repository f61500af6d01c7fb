//! Built-in speech-to-text backends.
//!
//! The pipeline only depends on [`crate::backend::Transcriber`]; backends live here so
//! heavy native dependencies stay behind cargo features.

/// Built-in whisper.cpp backend (feature `backend-whisper`).
#[cfg(feature = "backend-whisper")]
pub mod whisper;
