use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::ProgressBar;

use bleep::detect::topics::SidecarClassifier;
use bleep::detect::visual::{accept_detections, FrameAnalyzer, SidecarAnalyzer};
use bleep::media::FfmpegSource;
use bleep::merge::merge_visual;
use bleep::opts::{PipelineConfig, TranscribeOpts};
use bleep::paths::{suffixed_sibling, unique_path};
use bleep::progress::ProgressObserver;
use bleep::redact::{redact, RedactionMode, RedactionOutcome, DEFAULT_BLUR_STRENGTH};
use bleep::review;
use bleep::transcript::parse_dump;
use bleep::wordlist;

fn main() -> Result<()> {
    bleep::logging::init();
    let cli = Cli::parse();
    cli.command.run()
}

#[derive(Parser, Debug)]
#[command(name = "bleep")]
#[command(about = "Detect and redact objectionable content in long-form media")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Transcribe media and scan it for banned words, writing a review CSV.
    Analyze {
        /// Media file to analyze (e.g. input.mp3 or input.m4b).
        media: PathBuf,

        /// Text file with words to censor, one per line.
        #[arg(long = "words", default_value = "banned_words.txt")]
        words_file: PathBuf,

        /// Where to save the review CSV.
        #[arg(long = "output", default_value = "review.csv")]
        output_csv: PathBuf,

        /// Path to the whisper model file.
        #[arg(short = 'm', long = "model")]
        model_path: String,

        /// Optional language hint (e.g. "en"); auto-detect when omitted.
        #[arg(long)]
        language: Option<String>,
    },

    /// Transcribe media and classify transcript segments against candidate topics.
    Topics {
        /// Media file to analyze.
        media: PathBuf,

        /// Text file with topics to search for, one per line.
        #[arg(long = "topics", default_value = "topics.txt")]
        topics_file: PathBuf,

        /// Where to save the topic review CSV.
        #[arg(long = "output", default_value = "review_topics.csv")]
        output_csv: PathBuf,

        /// Path to the whisper model file.
        #[arg(short = 'm', long = "model")]
        model_path: String,

        /// Command line of the zero-shot classifier sidecar.
        #[arg(long = "classifier-cmd")]
        classifier_cmd: String,

        /// Optional language hint (e.g. "en"); auto-detect when omitted.
        #[arg(long)]
        language: Option<String>,
    },

    /// Scan a video for nudity and write merged redaction ranges as a review CSV.
    ScanVideo {
        /// Video file to scan.
        media: PathBuf,

        /// Where to save the review CSV.
        #[arg(long = "output", default_value = "review_video.csv")]
        output_csv: PathBuf,

        /// Command line of the frame detector sidecar.
        #[arg(long = "analyzer-cmd")]
        analyzer_cmd: String,

        /// Frame analysis interval in seconds.
        #[arg(long, default_value_t = 1.0)]
        interval: f64,

        /// Detector confidence threshold.
        #[arg(long, default_value_t = 0.5)]
        threshold: f32,
    },

    /// Transcribe media and dump the full timestamped transcript to a text file.
    Dump {
        /// Media file to transcribe.
        media: PathBuf,

        /// Where to save the transcript dump.
        #[arg(long = "output", default_value = "transcription_dump.txt")]
        output_txt: PathBuf,

        /// Path to the whisper model file.
        #[arg(short = 'm', long = "model")]
        model_path: String,

        /// Sampling temperature.
        #[arg(long, default_value_t = 0.1)]
        temperature: f32,

        /// Threshold above which a chunk is treated as non-speech.
        #[arg(long, default_value_t = 0.6)]
        no_speech_threshold: f32,

        /// Average log-probability threshold for accepting a decode.
        #[arg(long, default_value_t = -1.0)]
        logprob_threshold: f32,
    },

    /// Scan an existing transcript dump for banned words (no re-transcription).
    ParseDump {
        /// Transcript dump produced by `bleep dump`.
        dump_file: PathBuf,

        /// Text file with words to censor, one per line.
        #[arg(long = "words", default_value = "banned_words.txt")]
        words_file: PathBuf,

        /// Where to save the review CSV.
        #[arg(long = "output", default_value = "review.csv")]
        output_csv: PathBuf,
    },

    /// Apply a reviewed CSV to the media: mute matched spans, or blur with --blur.
    Edit {
        /// Media file to edit.
        media: PathBuf,

        /// Review CSV from any of the scan commands.
        review_csv: PathBuf,

        /// Where to save the edited file; defaults to a suffixed sibling.
        #[arg(long = "output")]
        output_file: Option<PathBuf>,

        /// Blur the picture instead of muting the audio.
        #[arg(long)]
        blur: bool,

        /// Blur strength (only with --blur).
        #[arg(long, default_value_t = DEFAULT_BLUR_STRENGTH)]
        blur_strength: u32,
    },
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Command::Analyze {
                media,
                words_file,
                output_csv,
                model_path,
                language,
            } => run_analyze(&media, &words_file, &output_csv, &model_path, language),
            Command::Topics {
                media,
                topics_file,
                output_csv,
                model_path,
                classifier_cmd,
                language,
            } => run_topics(
                &media,
                &topics_file,
                &output_csv,
                &model_path,
                &classifier_cmd,
                language,
            ),
            Command::ScanVideo {
                media,
                output_csv,
                analyzer_cmd,
                interval,
                threshold,
            } => run_scan_video(&media, &output_csv, &analyzer_cmd, interval, threshold),
            Command::Dump {
                media,
                output_txt,
                model_path,
                temperature,
                no_speech_threshold,
                logprob_threshold,
            } => run_dump(
                &media,
                &output_txt,
                &model_path,
                TranscribeOpts {
                    temperature,
                    no_speech_threshold,
                    logprob_threshold,
                    language: None,
                },
            ),
            Command::ParseDump {
                dump_file,
                words_file,
                output_csv,
            } => run_parse_dump(&dump_file, &words_file, &output_csv),
            Command::Edit {
                media,
                review_csv,
                output_file,
                blur,
                blur_strength,
            } => run_edit(&media, &review_csv, output_file, blur, blur_strength),
        }
    }
}

/// Spinner-backed progress rendering for interactive runs.
struct ConsoleObserver {
    bar: ProgressBar,
}

impl ConsoleObserver {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    fn finish(self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressObserver for ConsoleObserver {
    fn on_stage(&mut self, stage: &str) {
        self.bar.set_message(stage.to_owned());
    }

    fn on_chunk_started(&mut self, index: usize, total: usize) {
        self.bar.set_message(format!("chunk {}/{total}", index + 1));
    }

    fn on_detections(&mut self, count: usize) {
        self.bar.println(format!("{count} detection(s) found"));
    }
}

fn run_analyze(
    media: &Path,
    words_file: &Path,
    output_csv: &Path,
    model_path: &str,
    language: Option<String>,
) -> Result<()> {
    let banned = wordlist::load_word_set(words_file)?;
    println!("Found {} words to search for.", banned.len());

    let mut source = FfmpegSource::open(media)?;
    let mut observer = ConsoleObserver::new();

    let mut analyzer = open_analyzer(model_path)?.with_opts(TranscribeOpts {
        language,
        ..TranscribeOpts::default()
    });
    let matches = analyzer.scan_words(&mut source, &banned, &mut observer)?;
    observer.finish();

    if matches.is_empty() {
        println!("No banned words were found in the media file.");
        return Ok(());
    }

    let output = unique_path(output_csv);
    let writer = BufWriter::new(File::create(&output)?);
    review::write_word_artifact(writer, &matches)?;
    println!(
        "Found {} instance(s). Please review the file: {}",
        matches.len(),
        output.display()
    );
    Ok(())
}

fn run_topics(
    media: &Path,
    topics_file: &Path,
    output_csv: &Path,
    model_path: &str,
    classifier_cmd: &str,
    language: Option<String>,
) -> Result<()> {
    let topics = wordlist::load_topics(topics_file)?;
    println!("Found {} topics to search for.", topics.len());

    let mut classifier = SidecarClassifier::from_command_line(classifier_cmd)?;
    let mut source = FfmpegSource::open(media)?;
    let mut observer = ConsoleObserver::new();

    let mut analyzer = open_analyzer(model_path)?.with_opts(TranscribeOpts {
        language,
        ..TranscribeOpts::default()
    });
    let matches = analyzer.scan_topics(&mut source, &topics, &mut classifier, &mut observer)?;
    observer.finish();

    if matches.is_empty() {
        println!("No sections matching the topics were found with high confidence.");
        return Ok(());
    }

    let output = unique_path(output_csv);
    let writer = BufWriter::new(File::create(&output)?);
    review::write_topic_artifact(writer, &matches)?;
    println!(
        "Found {} matching section(s). Please review the file: {}",
        matches.len(),
        output.display()
    );
    Ok(())
}

fn run_scan_video(
    media: &Path,
    output_csv: &Path,
    analyzer_cmd: &str,
    interval: f64,
    threshold: f32,
) -> Result<()> {
    let descriptor = bleep::media::probe(media)?;
    if !descriptor.has_video {
        bail!("'{}' has no video stream to scan", media.display());
    }

    let config = PipelineConfig {
        frame_interval_seconds: interval,
        visual_score_threshold: threshold,
        ..PipelineConfig::default()
    };

    println!("Analyzing video for nudity...");
    let mut frame_analyzer = SidecarAnalyzer::from_command_line(analyzer_cmd)?;
    let reports = frame_analyzer.analyze(media, config.frame_interval_seconds)?;

    let accepted: BTreeSet<String> = config.accepted_classes.clone();
    let intervals = accept_detections(&reports, config.visual_score_threshold, &accepted);

    if intervals.is_empty() {
        println!("No nudity detected.");
        return Ok(());
    }

    let ranges = merge_visual(
        &intervals,
        config.visual_adjacency_gap(),
        config.safety_buffer_seconds,
        descriptor.duration_seconds,
    );

    let output = unique_path(output_csv);
    let writer = BufWriter::new(File::create(&output)?);
    review::write_range_artifact(writer, &ranges)?;
    println!(
        "Found {} potential nudity frame(s) in {} range(s). Review file saved to: {}",
        intervals.len(),
        ranges.len(),
        output.display()
    );
    Ok(())
}

fn run_dump(media: &Path, output_txt: &Path, model_path: &str, opts: TranscribeOpts) -> Result<()> {
    let mut source = FfmpegSource::open(media)?;
    let mut observer = ConsoleObserver::new();

    let output = unique_path(output_txt);
    let writer = BufWriter::new(File::create(&output)?);

    let mut analyzer = open_analyzer(model_path)?.with_opts(opts);
    let count = analyzer.dump_transcript(&mut source, writer, &mut observer)?;
    observer.finish();

    println!(
        "Full transcription ({count} words) saved. You can now open and search the file: {}",
        output.display()
    );
    Ok(())
}

fn run_parse_dump(dump_file: &Path, words_file: &Path, output_csv: &Path) -> Result<()> {
    let banned = wordlist::load_word_set(words_file)?;
    println!("Found {} words to search for.", banned.len());

    let dump = File::open(dump_file)
        .with_context(|| format!("failed to open dump file '{}'", dump_file.display()))?;
    let words = parse_dump(std::io::BufReader::new(dump))?;
    println!("Parsed {} words from the dump file.", words.len());

    let scanner = bleep::detect::words::WordScanner::new(banned);
    let matches = scanner.scan(&words);

    if matches.is_empty() {
        println!("No banned words were found in the dump file.");
        return Ok(());
    }

    let output = unique_path(output_csv);
    let writer = BufWriter::new(File::create(&output)?);
    review::write_word_artifact(writer, &matches)?;
    println!(
        "Found {} instance(s). You can now use this file with `bleep edit`: {}",
        matches.len(),
        output.display()
    );
    Ok(())
}

fn run_edit(
    media: &Path,
    review_csv: &Path,
    output_file: Option<PathBuf>,
    blur: bool,
    blur_strength: u32,
) -> Result<()> {
    let descriptor = bleep::media::probe(media)?;

    let review = File::open(review_csv)
        .with_context(|| format!("failed to open review file '{}'", review_csv.display()))?;
    let spans = review::read_redaction_spans(review)?;

    let mode = if blur {
        RedactionMode::BlurVideo {
            strength: blur_strength,
        }
    } else {
        RedactionMode::MuteAudio
    };

    let default_suffix = if blur { "_blurred" } else { "_edited" };
    let output = unique_path(
        &output_file.unwrap_or_else(|| suffixed_sibling(media, default_suffix)),
    );

    if !spans.spans.is_empty() {
        println!(
            "Applying {} span(s); this may take a long time for large files...",
            spans.spans.len()
        );
    }
    match redact(&descriptor, &spans.spans, &mode, &output)? {
        RedactionOutcome::NoOp => {
            println!("Review file is empty. No edits will be applied.");
            println!("No output file will be created.");
        }
        RedactionOutcome::Written(path) => {
            println!("Editing complete. Output file saved to: {}", path.display());
        }
    }
    Ok(())
}

#[cfg(feature = "backend-whisper")]
fn open_analyzer(
    model_path: &str,
) -> Result<bleep::analyze::Analyzer<bleep::backends::whisper::WhisperTranscriber>> {
    println!("Loading whisper model... (This may take a moment)");
    let transcriber = bleep::backends::whisper::WhisperTranscriber::new(model_path)?;
    Ok(bleep::analyze::Analyzer::new(transcriber))
}

#[cfg(not(feature = "backend-whisper"))]
fn open_analyzer(
    _model_path: &str,
) -> Result<bleep::analyze::Analyzer<NoTranscriber>> {
    bail!(
        "this build has no transcription backend; rebuild with `--features backend-whisper`"
    )
}

/// Placeholder backend so the no-backend build still type-checks.
#[cfg(not(feature = "backend-whisper"))]
struct NoTranscriber;

#[cfg(not(feature = "backend-whisper"))]
impl bleep::backend::Transcriber for NoTranscriber {
    fn transcribe(
        &mut self,
        _samples: &[f32],
        _opts: &bleep::opts::TranscribeOpts,
    ) -> bleep::Result<Vec<bleep::transcript::Word>> {
        unreachable!("NoTranscriber is never constructed")
    }
}
