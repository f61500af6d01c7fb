//! Redaction command synthesis and engine invocation.
//!
//! Turns a reviewed span list plus a [`MediaDescriptor`] into a single ffmpeg
//! invocation: a time-predicate-gated filter (mute or blur), a stream-mapping plan,
//! and a codec choice keyed by the output extension. The synthesized plan is a plain
//! argument vector so it can be inspected and tested without running anything.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::media::MediaDescriptor;
use crate::{Error, Result};

/// Default boxblur strength for visual redaction.
pub const DEFAULT_BLUR_STRENGTH: u32 = 20;

/// Bitrate used when the audio stream must be re-encoded for muting.
const MUTE_AUDIO_BITRATE: &str = "128k";

/// How the redaction windows are applied to the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedactionMode {
    /// Zero the audio volume inside every span.
    MuteAudio,
    /// Blur the picture inside every span; audio is stream-copied.
    BlurVideo { strength: u32 },
}

/// What the redaction stage did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedactionOutcome {
    /// The span list was empty: no engine invocation, no output file. This is a
    /// reported, expected result — not an error.
    NoOp,
    /// The engine ran successfully and wrote the output file.
    Written(PathBuf),
}

/// A fully synthesized engine invocation, ready to run or inspect.
#[derive(Debug, Clone)]
pub struct RedactionPlan {
    /// Arguments passed to `ffmpeg` (the program name itself excluded).
    pub args: Vec<String>,
    pub output: PathBuf,
}

/// The boolean-OR time predicate over all spans:
/// `between(t,S1,E1)+between(t,S2,E2)+...`.
pub fn enable_expression(spans: &[(f64, f64)]) -> String {
    spans
        .iter()
        .map(|(start, end)| format!("between(t,{start:?},{end:?})"))
        .collect::<Vec<_>>()
        .join("+")
}

/// The mute filter chain: one gated volume filter per span, comma-joined.
pub fn mute_filter(spans: &[(f64, f64)]) -> String {
    spans
        .iter()
        .map(|(start, end)| format!("volume=enable='between(t,{start:?},{end:?})':volume=0"))
        .collect::<Vec<_>>()
        .join(",")
}

/// The blur filter: a single boxblur gated by the combined time predicate.
pub fn blur_filter(spans: &[(f64, f64)], strength: u32) -> String {
    format!("boxblur={strength}:1:enable='{}'", enable_expression(spans))
}

/// Pick the audio codec for an output extension (lowercased, leading dot).
///
/// Unrecognized extensions fall back to the default codec with a warning — a local
/// recovery, never fatal.
pub fn audio_codec_for(extension: &str) -> &'static str {
    match extension {
        ".mp3" => "libmp3lame",
        ".m4a" | ".m4b" | ".mp4" => "aac",
        other => {
            tracing::warn!(
                extension = other,
                "unknown output format; defaulting to 'aac' codec"
            );
            "aac"
        }
    }
}

/// Synthesize the engine invocation for the given spans, or `None` when there is
/// nothing to do.
///
/// Stream-mapping policy:
/// - audio-only source: map the sole audio stream and carry the input metadata over
/// - source with video, muting: copy the video stream untouched and map at most one
///   audio and one video stream — the video stream is never silently dropped
/// - blurring: re-encode video through the filter, stream-copy the audio
pub fn synthesize(
    media: &MediaDescriptor,
    spans: &[(f64, f64)],
    mode: &RedactionMode,
    output: &Path,
) -> Result<Option<RedactionPlan>> {
    if spans.is_empty() {
        return Ok(None);
    }

    let input = media.path.to_string_lossy().into_owned();
    let output_string = output.to_string_lossy().into_owned();
    let mut args: Vec<String> = vec!["-y".into(), "-i".into(), input];

    match mode {
        RedactionMode::MuteAudio => {
            let codec = audio_codec_for(&extension_of(output));

            if media.has_video {
                args.extend(string_args(&["-map", "0:v:0", "-map", "0:a:0"]));
                args.extend(string_args(&["-c:v", "copy"]));
            } else {
                args.extend(string_args(&["-map", "0:a", "-map_metadata", "0"]));
            }

            args.push("-af".into());
            args.push(mute_filter(spans));
            args.extend(string_args(&["-c:a", codec, "-b:a", MUTE_AUDIO_BITRATE]));
        }
        RedactionMode::BlurVideo { strength } => {
            if !media.has_video {
                return Err(Error::msg(format!(
                    "'{}' has no video stream to blur",
                    media.path.display()
                )));
            }

            args.extend(string_args(&["-map", "0:v:0", "-map", "0:a:0"]));
            args.push("-vf".into());
            args.push(blur_filter(spans, *strength));
            args.extend(string_args(&["-c:a", "copy"]));
        }
    }

    args.push(output_string);
    Ok(Some(RedactionPlan {
        args,
        output: output.to_path_buf(),
    }))
}

/// Synthesize and run the redaction in one step.
///
/// An empty span list short-circuits to [`RedactionOutcome::NoOp`] without touching
/// the engine or the filesystem. Engine failure is fatal and carries the engine's
/// diagnostic output.
pub fn redact(
    media: &MediaDescriptor,
    spans: &[(f64, f64)],
    mode: &RedactionMode,
    output: &Path,
) -> Result<RedactionOutcome> {
    let Some(plan) = synthesize(media, spans, mode, output)? else {
        tracing::info!("review contains no spans; skipping edit");
        return Ok(RedactionOutcome::NoOp);
    };

    if let Err(err) = run_engine(&plan) {
        // A failed run must not leave a partially written output behind.
        let _ = std::fs::remove_file(&plan.output);
        return Err(err);
    }
    Ok(RedactionOutcome::Written(plan.output))
}

/// Run a synthesized plan, surfacing the engine's stderr on failure.
pub fn run_engine(plan: &RedactionPlan) -> Result<()> {
    tracing::debug!(args = ?plan.args, "running ffmpeg");

    let output = Command::new("ffmpeg")
        .args(&plan.args)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| Error::Engine {
            command: "ffmpeg".into(),
            status: "spawn failure".into(),
            diagnostics: format!("{e} (is ffmpeg installed and on PATH?)"),
        })?;

    if !output.status.success() {
        return Err(Error::Engine {
            command: "ffmpeg".into(),
            status: output.status.to_string(),
            diagnostics: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

fn string_args(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
