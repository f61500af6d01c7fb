use std::collections::BTreeSet;

/// Options that control how a transcription is performed.
///
/// This struct represents *library-level configuration*, not CLI flags directly.
/// The CLI is responsible for mapping user input into this type so that:
/// - the library remains reusable outside of a CLI context
/// - other frontends (APIs, tests, batch jobs) can construct options programmatically
#[derive(Debug, Clone)]
pub struct TranscribeOpts {
    /// Sampling temperature passed to the ASR backend.
    pub temperature: f32,

    /// Probability threshold above which a chunk is treated as non-speech.
    ///
    /// Lower values are more aggressive about discarding quiet sections.
    pub no_speech_threshold: f32,

    /// Average log-probability threshold below which a decode is rejected.
    pub logprob_threshold: f32,

    /// Optional language hint (e.g. `"en"`, `"es"`).
    ///
    /// When `None`, we allow the backend to auto-detect the spoken language.
    pub language: Option<String>,
}

impl Default for TranscribeOpts {
    fn default() -> Self {
        Self {
            temperature: 0.1,
            no_speech_threshold: 0.6,
            logprob_threshold: -1.0,
            language: None,
        }
    }
}

/// Tuning knobs for the detection-to-redaction pipeline.
///
/// Defaults match the behavior the pipeline was calibrated with; every field can be
/// overridden per run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Length of each decode window over the source media, in seconds.
    ///
    /// Long media is processed one window at a time; detections are rebased from
    /// window-local time onto the global timeline afterwards.
    pub chunk_seconds: f64,

    /// Duration of the text segments handed to the topic classifier, in seconds.
    pub topic_segment_seconds: f64,

    /// Minimum classifier confidence for a topic match to be accepted.
    pub topic_confidence_threshold: f32,

    /// Seconds between analyzed video frames.
    pub frame_interval_seconds: f64,

    /// Minimum detector score for a visual detection to be accepted.
    pub visual_score_threshold: f32,

    /// Detector class names that count as objectionable.
    pub accepted_classes: BTreeSet<String>,

    /// Two visual detections closer than `frame_interval_seconds * adjacency_gap_factor`
    /// are merged into one redaction range.
    pub adjacency_gap_factor: f64,

    /// Symmetric padding added to every redaction range, in seconds.
    pub safety_buffer_seconds: f64,
}

/// Default detector classes treated as nudity.
pub const DEFAULT_ACCEPTED_CLASSES: [&str; 5] = [
    "ANUS",
    "BUTTS",
    "FEMALE_BREAST",
    "FEMALE_GENITALIA",
    "MALE_GENITALIA",
];

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_seconds: 1800.0,
            topic_segment_seconds: 90.0,
            topic_confidence_threshold: 0.70,
            frame_interval_seconds: 1.0,
            visual_score_threshold: 0.5,
            accepted_classes: DEFAULT_ACCEPTED_CLASSES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            adjacency_gap_factor: 1.5,
            safety_buffer_seconds: 0.5,
        }
    }
}

impl PipelineConfig {
    /// The merge gap for the visual stream, in seconds.
    pub fn visual_adjacency_gap(&self) -> f64 {
        self.frame_interval_seconds * self.adjacency_gap_factor
    }
}
