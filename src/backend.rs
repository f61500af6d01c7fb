use crate::opts::TranscribeOpts;
use crate::transcript::Word;
use crate::Result;

/// Pluggable speech-to-text backend used by [`crate::analyze::Analyzer`].
///
/// The pipeline treats transcription as a black box: a backend turns mono `f32`
/// samples at [`crate::media::TARGET_SAMPLE_RATE`] into [`Word`]s with per-word
/// start/end timestamps.
///
/// Timestamps are *chunk-local* — relative to the start of the sample buffer the
/// backend was handed. The caller owns rebasing onto the global timeline.
pub trait Transcriber {
    /// Transcribe a contiguous sample buffer into timestamped words.
    ///
    /// An empty buffer or silent audio yields an empty word list, not an error.
    fn transcribe(&mut self, samples: &[f32], opts: &TranscribeOpts) -> Result<Vec<Word>>;
}
