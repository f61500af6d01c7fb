//! End-to-end pipeline tests over scripted collaborators.
//!
//! These exercise the real pipeline wiring — chunk planning, rebasing, scanning,
//! artifact round-trips, and redaction synthesis — with the external engines (ASR
//! model, classifier, ffmpeg) replaced by scripted stand-ins.

use std::collections::HashSet;
use std::fs::File;
use std::path::PathBuf;

use bleep::analyze::Analyzer;
use bleep::backend::Transcriber;
use bleep::detect::visual::{accept_detections, FrameReport, RawDetection};
use bleep::interval::Interval;
use bleep::media::{MediaDescriptor, MediaSource};
use bleep::merge::merge_visual;
use bleep::opts::{PipelineConfig, TranscribeOpts};
use bleep::progress::NullObserver;
use bleep::redact::{redact, RedactionMode, RedactionOutcome};
use bleep::review;
use bleep::timeline::ChunkWindow;
use bleep::transcript::Word;

/// A media source backed by nothing: every planned window decodes to one second of
/// silence, so the scripted transcriber gets called once per window.
struct SilentSource {
    descriptor: MediaDescriptor,
}

impl SilentSource {
    fn with_duration(duration_seconds: f64) -> Self {
        Self {
            descriptor: MediaDescriptor {
                path: PathBuf::from("/media/fixture.m4b"),
                duration_seconds,
                extension: ".m4b".into(),
                has_video: false,
            },
        }
    }
}

impl MediaSource for SilentSource {
    fn descriptor(&self) -> &MediaDescriptor {
        &self.descriptor
    }

    fn decode_chunk(&mut self, _window: &ChunkWindow) -> bleep::Result<Vec<f32>> {
        Ok(vec![0.0; 16_000])
    }
}

/// Returns a pre-scripted word list for each successive chunk window.
struct ScriptedTranscriber {
    per_chunk: Vec<Vec<Word>>,
    next: usize,
}

impl ScriptedTranscriber {
    fn new(per_chunk: Vec<Vec<Word>>) -> Self {
        Self {
            per_chunk,
            next: 0,
        }
    }
}

impl Transcriber for ScriptedTranscriber {
    fn transcribe(&mut self, _samples: &[f32], _opts: &TranscribeOpts) -> bleep::Result<Vec<Word>> {
        let words = self.per_chunk.get(self.next).cloned().unwrap_or_default();
        self.next += 1;
        Ok(words)
    }
}

#[test]
fn word_scan_rebases_across_chunks_and_round_trips() -> anyhow::Result<()> {
    // Two 1800s windows plus a 400s tail. The banned word appears in the first and
    // third windows with chunk-local timestamps.
    let mut source = SilentSource::with_duration(4000.0);
    let transcriber = ScriptedTranscriber::new(vec![
        vec![
            Word::new(0.0, 1.0, "hello"),
            Word::new(1.0, 2.0, "badword"),
        ],
        vec![Word::new(5.0, 6.0, "harmless")],
        vec![Word::new(10.0, 11.0, "badword!")],
    ]);

    let banned: HashSet<String> = ["badword".to_string()].into_iter().collect();
    let mut analyzer = Analyzer::new(transcriber);
    let matches = analyzer.scan_words(&mut source, &banned, &mut NullObserver)?;

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].start_seconds, 1.0);
    // Context is built over the global transcript, so it can cross window edges.
    assert_eq!(
        matches[0].context.as_deref(),
        Some("hello badword harmless badword!")
    );
    // 10.0 local in window 2 -> 10.0 + 2 * 1800.0 global.
    assert_eq!(matches[1].start_seconds, 3610.0);
    assert_eq!(matches[1].label, "badword!");

    // Persist and re-read the review artifact; the (start, end, word) triples and
    // row order must survive.
    let dir = tempfile::tempdir()?;
    let artifact_path = dir.path().join("review.csv");
    review::write_word_artifact(File::create(&artifact_path)?, &matches)?;
    let rows = review::read_word_artifact(File::open(&artifact_path)?)?;

    assert_eq!(rows.len(), matches.len());
    for (row, interval) in rows.iter().zip(&matches) {
        assert_eq!(row.start, interval.start_seconds);
        assert_eq!(row.end, interval.end_seconds);
        assert_eq!(row.word, interval.label);
    }
    assert_eq!(rows[1].hms_timestamp, "01:00:10");
    Ok(())
}

#[test]
fn dump_and_parse_dump_agree() -> anyhow::Result<()> {
    let mut source = SilentSource::with_duration(100.0);
    let transcriber = ScriptedTranscriber::new(vec![vec![
        Word::new(0.5, 1.0, "first"),
        Word::new(1.0, 1.5, "second"),
    ]]);

    let mut analyzer = Analyzer::new(transcriber);
    let mut dump = Vec::new();
    let count = analyzer.dump_transcript(&mut source, &mut dump, &mut NullObserver)?;
    assert_eq!(count, 2);

    let words = bleep::transcript::parse_dump(dump.as_slice())?;
    assert_eq!(words.len(), 2);
    assert_eq!(words[0].text, "first");
    assert_eq!(words[0].start_seconds, 0.5);
    Ok(())
}

#[test]
fn visual_detections_merge_into_a_reviewable_artifact() -> anyhow::Result<()> {
    let config = PipelineConfig::default();
    let detection = |class: &str, score: f32| RawDetection {
        class_name: class.into(),
        score,
        bounding_box: None,
    };
    let report = |frame_index: u64, detections: Vec<RawDetection>| FrameReport {
        frame_index,
        fps: 1.0,
        detections,
    };

    // Frames at t=1s..3s form one cluster; t=30s stands alone; low scores and
    // unlisted classes never make it in.
    let reports = vec![
        report(1, vec![detection("BUTTS", 0.9)]),
        report(2, vec![detection("FEMALE_BREAST", 0.8), detection("FACE", 0.99)]),
        report(3, vec![detection("BUTTS", 0.3)]),
        report(30, vec![detection("ANUS", 0.7)]),
    ];

    let intervals = accept_detections(
        &reports,
        config.visual_score_threshold,
        &config.accepted_classes,
    );
    assert_eq!(intervals.len(), 3);

    let ranges = merge_visual(
        &intervals,
        config.visual_adjacency_gap(),
        config.safety_buffer_seconds,
        60.0,
    );
    assert_eq!(ranges.len(), 2);
    assert_eq!(ranges[0].start_seconds, 0.5);
    assert_eq!(ranges[0].end_seconds, 2.5);
    assert_eq!(ranges[1].start_seconds, 29.5);
    assert_eq!(ranges[1].end_seconds, 30.5);

    let mut artifact = Vec::new();
    review::write_range_artifact(&mut artifact, &ranges)?;
    let spans = review::read_redaction_spans(artifact.as_slice())?;
    assert_eq!(spans.schema, review::ReviewSchema::Range);
    assert_eq!(spans.spans, vec![(0.5, 2.5), (29.5, 30.5)]);

    let text = String::from_utf8(artifact)?;
    assert!(text.contains("BUTTS|FEMALE_BREAST"));
    Ok(())
}

#[test]
fn empty_review_artifact_redacts_to_a_noop() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let artifact_path = dir.path().join("review.csv");
    review::write_word_artifact(File::create(&artifact_path)?, &[])?;

    let spans = review::read_redaction_spans(File::open(&artifact_path)?)?;
    assert!(spans.spans.is_empty());

    let descriptor = MediaDescriptor {
        path: PathBuf::from("/media/fixture.m4b"),
        duration_seconds: 100.0,
        extension: ".m4b".into(),
        has_video: false,
    };
    let output = dir.path().join("fixture_edited.m4b");

    let outcome = redact(&descriptor, &spans.spans, &RedactionMode::MuteAudio, &output)?;
    assert_eq!(outcome, RedactionOutcome::NoOp);
    assert!(!output.exists());
    Ok(())
}

#[test]
fn topic_scan_feeds_the_range_schema() -> anyhow::Result<()> {
    use bleep::detect::topics::{TopicClassifier, TopicRanking};

    struct KeywordClassifier;

    impl TopicClassifier for KeywordClassifier {
        fn classify(
            &mut self,
            text: &str,
            _labels: &[String],
        ) -> bleep::Result<TopicRanking> {
            let score = if text.contains("casino") { 0.93 } else { 0.10 };
            Ok(TopicRanking {
                labels: vec!["gambling".into()],
                scores: vec![score],
            })
        }
    }

    // ~95s of one-word-per-second audio: the word at 91s closes the first segment,
    // so two segments reach the classifier; only the first mentions the keyword.
    let mut words: Vec<Word> = (0..95)
        .map(|i| Word::new(i as f64, i as f64 + 1.0, format!("w{i}")))
        .collect();
    words[40] = Word::new(40.0, 41.0, "casino");

    let mut source = SilentSource::with_duration(95.0);
    let transcriber = ScriptedTranscriber::new(vec![words]);

    let mut analyzer = Analyzer::new(transcriber);
    let matches = analyzer.scan_topics(
        &mut source,
        &["gambling".to_string()],
        &mut KeywordClassifier,
        &mut NullObserver,
    )?;

    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].label, "gambling");
    assert_eq!(matches[0].start_seconds, 0.0);
    assert_eq!(matches[0].end_seconds, 91.0);

    let mut artifact = Vec::new();
    review::write_topic_artifact(&mut artifact, &matches)?;
    let spans = review::read_redaction_spans(artifact.as_slice())?;
    assert_eq!(spans.schema, review::ReviewSchema::Range);
    assert_eq!(spans.spans, vec![(0.0, 91.0)]);
    Ok(())
}

#[test]
fn scan_produces_nothing_for_clean_media() -> anyhow::Result<()> {
    let mut source = SilentSource::with_duration(50.0);
    let transcriber = ScriptedTranscriber::new(vec![vec![
        Word::new(0.0, 1.0, "perfectly"),
        Word::new(1.0, 2.0, "clean"),
    ]]);

    let banned: HashSet<String> = ["badword".to_string()].into_iter().collect();
    let mut analyzer = Analyzer::new(transcriber);
    let matches = analyzer.scan_words(&mut source, &banned, &mut NullObserver)?;

    // No detections is an empty result, not an error -- and nothing gets written.
    assert!(matches.is_empty());
    Ok(())
}

#[test]
fn interval_kinds_keep_their_streams_separate() {
    // Word intervals are never clustered; visual ones are. Mixing them in one merge
    // call is a caller bug, but the merge itself must stay deterministic: the word
    // interval simply clusters by time like any other.
    let intervals = vec![
        Interval::word(1.0, 2.0, "bad", "ctx"),
        Interval::visual(1.5, "BUTTS", 0.9),
    ];
    let ranges = merge_visual(&intervals, 1.5, 0.0, 100.0);
    assert_eq!(ranges.len(), 1);
    assert_eq!(ranges[0].labels.len(), 2);
}
