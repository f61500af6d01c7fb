//! High-level API for running detection passes with Bleep.
//!
//! We expose a single entry point (`Analyzer`) that wires up the lower-level pieces:
//! chunk planning -> external decode -> black-box transcription -> normalization.
//!
//! The intent is:
//! - The transcription backend is constructed once (expensive) and reused across
//!   chunk windows and across inputs.
//! - Every word leaves this module already rebased onto the global timeline; nothing
//!   downstream ever sees window-local timestamps.
//! - Callers pick what to do with the transcript (banned-word scan, topic scan, debug
//!   dump) without re-decoding.
//!
//! Chunk windows are decoded and transcribed strictly in order. Detections that
//! straddle a window edge are not stitched back together; a hard cut at chunk
//! boundaries is accepted behavior.

use std::collections::HashSet;
use std::io::Write;

use crate::backend::Transcriber;
use crate::detect::topics::{scan_topics, segment_words, TopicClassifier};
use crate::detect::words::WordScanner;
use crate::interval::Interval;
use crate::media::MediaSource;
use crate::opts::{PipelineConfig, TranscribeOpts};
use crate::progress::ProgressObserver;
use crate::timeline::chunk_windows;
use crate::transcript::{write_dump, Word};
use crate::Result;

/// The main high-level detection entry point.
///
/// `Analyzer` owns the long-lived transcription backend plus the pipeline and
/// transcription options. Typical usage:
/// - Construct once (backend loading happens before this).
/// - Call `scan_words` / `scan_topics` / `dump_transcript` with different sources.
pub struct Analyzer<T: Transcriber> {
    transcriber: T,
    config: PipelineConfig,
    opts: TranscribeOpts,
}

impl<T: Transcriber> Analyzer<T> {
    /// Create an analyzer with default pipeline and transcription options.
    pub fn new(transcriber: T) -> Self {
        Self {
            transcriber,
            config: PipelineConfig::default(),
            opts: TranscribeOpts::default(),
        }
    }

    /// Replace the pipeline configuration.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the transcription options.
    pub fn with_opts(mut self, opts: TranscribeOpts) -> Self {
        self.opts = opts;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Transcribe the whole source, window by window, returning words on the global
    /// timeline.
    ///
    /// Each window is decoded and transcribed independently; the only cross-window
    /// state is the accumulating word list.
    pub fn transcribe_all(
        &mut self,
        source: &mut dyn MediaSource,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<Word>> {
        let duration = source.descriptor().duration_seconds;
        let windows = chunk_windows(duration, self.config.chunk_seconds);
        let total = windows.len();

        observer.on_stage("transcribing");
        let mut words = Vec::new();

        for window in &windows {
            observer.on_chunk_started(window.index, total);

            let samples = source.decode_chunk(window)?;
            if samples.is_empty() {
                continue;
            }

            let local_words = self.transcriber.transcribe(&samples, &self.opts)?;
            tracing::debug!(
                chunk = window.index,
                words = local_words.len(),
                "transcribed chunk window"
            );

            words.extend(local_words.into_iter().map(|word| Word {
                start_seconds: window.rebase(word.start_seconds),
                end_seconds: window.rebase(word.end_seconds),
                text: word.text,
            }));
        }

        Ok(words)
    }

    /// Transcribe the source and scan it for banned words.
    ///
    /// Returns one word interval per match, with review context built from the full
    /// global transcript (so context can cross window edges even though detections
    /// cannot). No matches is an empty result, not an error.
    pub fn scan_words(
        &mut self,
        source: &mut dyn MediaSource,
        banned: &HashSet<String>,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<Interval>> {
        let words = self.transcribe_all(source, observer)?;

        observer.on_stage("scanning for banned words");
        let scanner = WordScanner::new(banned.clone());
        let matches = scanner.scan(&words);

        observer.on_detections(matches.len());
        Ok(matches)
    }

    /// Transcribe the source, segment the transcript, and classify each segment
    /// against the candidate topics.
    pub fn scan_topics(
        &mut self,
        source: &mut dyn MediaSource,
        candidate_labels: &[String],
        classifier: &mut dyn TopicClassifier,
        observer: &mut dyn ProgressObserver,
    ) -> Result<Vec<Interval>> {
        let words = self.transcribe_all(source, observer)?;

        observer.on_stage("segmenting transcript");
        let segments = segment_words(&words, self.config.topic_segment_seconds);
        tracing::debug!(segments = segments.len(), "built text segments");

        observer.on_stage("classifying segments");
        let matches = scan_topics(
            &segments,
            candidate_labels,
            classifier,
            self.config.topic_confidence_threshold,
        )?;

        observer.on_detections(matches.len());
        Ok(matches)
    }

    /// Transcribe the source and write the full timestamped transcript in the debug
    /// dump format. Returns the number of words written.
    pub fn dump_transcript<W: Write>(
        &mut self,
        source: &mut dyn MediaSource,
        writer: W,
        observer: &mut dyn ProgressObserver,
    ) -> Result<usize> {
        let words = self.transcribe_all(source, observer)?;

        observer.on_stage("writing transcript dump");
        let source_name = source
            .descriptor()
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.descriptor().path.display().to_string());
        write_dump(writer, &source_name, &words)?;

        Ok(words.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaDescriptor;
    use crate::progress::NullObserver;
    use crate::timeline::ChunkWindow;
    use std::path::PathBuf;

    /// A media source that hands out one second of silence per planned window.
    struct FakeSource {
        descriptor: MediaDescriptor,
        decoded_windows: Vec<usize>,
    }

    impl FakeSource {
        fn with_duration(duration_seconds: f64) -> Self {
            Self {
                descriptor: MediaDescriptor {
                    path: PathBuf::from("/media/test.mp3"),
                    duration_seconds,
                    extension: ".mp3".into(),
                    has_video: false,
                },
                decoded_windows: Vec::new(),
            }
        }
    }

    impl MediaSource for FakeSource {
        fn descriptor(&self) -> &MediaDescriptor {
            &self.descriptor
        }

        fn decode_chunk(&mut self, window: &ChunkWindow) -> Result<Vec<f32>> {
            self.decoded_windows.push(window.index);
            Ok(vec![0.0; 16_000])
        }
    }

    /// A backend that returns the same chunk-local words for every window.
    struct RepeatingTranscriber {
        per_chunk: Vec<Word>,
    }

    impl Transcriber for RepeatingTranscriber {
        fn transcribe(&mut self, _samples: &[f32], _opts: &TranscribeOpts) -> Result<Vec<Word>> {
            Ok(self.per_chunk.clone())
        }
    }

    #[test]
    fn words_are_rebased_per_window() -> Result<()> {
        let mut source = FakeSource::with_duration(4000.0);
        let backend = RepeatingTranscriber {
            per_chunk: vec![Word::new(1.0, 2.0, "hello")],
        };

        let mut analyzer = Analyzer::new(backend);
        let words = analyzer.transcribe_all(&mut source, &mut NullObserver)?;

        // Three windows planned (1800 + 1800 + 400), all decoded in order.
        assert_eq!(source.decoded_windows, vec![0, 1, 2]);
        assert_eq!(words.len(), 3);
        assert_eq!(words[0].start_seconds, 1.0);
        assert_eq!(words[1].start_seconds, 1801.0);
        assert_eq!(words[2].start_seconds, 3601.0);
        Ok(())
    }

    #[test]
    fn scan_words_matches_on_the_global_timeline() -> Result<()> {
        let mut source = FakeSource::with_duration(2000.0);
        let backend = RepeatingTranscriber {
            per_chunk: vec![
                Word::new(0.0, 1.0, "hello"),
                Word::new(1.0, 2.0, "badword"),
            ],
        };

        let banned: HashSet<String> = ["badword".to_string()].into_iter().collect();
        let mut analyzer = Analyzer::new(backend);
        let matches = analyzer.scan_words(&mut source, &banned, &mut NullObserver)?;

        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].start_seconds, 1.0);
        assert_eq!(matches[1].start_seconds, 1801.0);
        Ok(())
    }

    #[test]
    fn empty_backend_output_is_not_an_error() -> Result<()> {
        let mut source = FakeSource::with_duration(100.0);
        let backend = RepeatingTranscriber { per_chunk: vec![] };

        let banned: HashSet<String> = ["badword".to_string()].into_iter().collect();
        let mut analyzer = Analyzer::new(backend);
        let matches = analyzer.scan_words(&mut source, &banned, &mut NullObserver)?;
        assert!(matches.is_empty());
        Ok(())
    }
}
