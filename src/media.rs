//! Source media probing and chunked audio decode.
//!
//! Both operations delegate to the external engine (`ffprobe` / `ffmpeg`); this module
//! owns the invocation contract and converts the results into pipeline types:
//! - [`probe`] reads duration, extension, and stream layout into a [`MediaDescriptor`]
//! - [`FfmpegSource::decode_chunk`] pulls one decode window as mono 16 kHz samples,
//!   normalized to `[-1.0, 1.0]`
//!
//! [`MediaSource`] is the seam tests and alternative decoders implement; the pipeline
//! never talks to ffmpeg directly.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::timeline::ChunkWindow;
use crate::{Error, Result};

/// Sample rate the pipeline hands to ASR backends (Hz), mono.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Read-only facts about the source media. Never mutated after probing.
#[derive(Debug, Clone)]
pub struct MediaDescriptor {
    /// Path the descriptor was probed from.
    pub path: PathBuf,
    /// Total duration in seconds.
    pub duration_seconds: f64,
    /// Lowercased extension including the leading dot (e.g. `".m4b"`), empty when the
    /// path has none.
    pub extension: String,
    /// Whether the source carries a real video stream (attached cover art doesn't
    /// count).
    pub has_video: bool,
}

/// Provider of decoded audio for the pipeline.
///
/// The production implementation shells out to ffmpeg per chunk window; tests inject
/// synthetic sources.
pub trait MediaSource {
    fn descriptor(&self) -> &MediaDescriptor;

    /// Decode one window into mono samples at [`TARGET_SAMPLE_RATE`].
    ///
    /// Windows reaching past the end of the media are clamped, never an error; a
    /// fully out-of-range window yields an empty buffer.
    fn decode_chunk(&mut self, window: &ChunkWindow) -> Result<Vec<f32>>;
}

/// Probe the source with ffprobe and build its descriptor.
pub fn probe(path: &Path) -> Result<MediaDescriptor> {
    if !path.exists() {
        return Err(Error::SourceNotFound(path.to_path_buf()));
    }

    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|e| engine_spawn_error("ffprobe", e))?;

    if !output.status.success() {
        return Err(Error::Engine {
            command: "ffprobe".into(),
            status: output.status.to_string(),
            diagnostics: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;

    let duration_seconds = json["format"]["duration"]
        .as_str()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| Error::msg(format!("ffprobe reported no duration for '{}'", path.display())))?;

    let has_video = json["streams"]
        .as_array()
        .map(|streams| streams.iter().any(is_real_video_stream))
        .unwrap_or(false);

    let descriptor = MediaDescriptor {
        path: path.to_path_buf(),
        duration_seconds,
        extension: extension_of(path),
        has_video,
    };

    tracing::debug!(
        duration = descriptor.duration_seconds,
        has_video = descriptor.has_video,
        path = %path.display(),
        "probed source media"
    );
    Ok(descriptor)
}

/// Audiobook/music containers ship cover art as an attached-picture "video" stream;
/// those must not trigger the video mapping policy.
fn is_real_video_stream(stream: &serde_json::Value) -> bool {
    stream["codec_type"].as_str() == Some("video")
        && stream["disposition"]["attached_pic"].as_i64().unwrap_or(0) == 0
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

/// A [`MediaSource`] that decodes windows by running ffmpeg.
pub struct FfmpegSource {
    descriptor: MediaDescriptor,
}

impl FfmpegSource {
    /// Probe `path` and wrap it as a decodable source.
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            descriptor: probe(path)?,
        })
    }

    pub fn from_descriptor(descriptor: MediaDescriptor) -> Self {
        Self { descriptor }
    }
}

impl MediaSource for FfmpegSource {
    fn descriptor(&self) -> &MediaDescriptor {
        &self.descriptor
    }

    fn decode_chunk(&mut self, window: &ChunkWindow) -> Result<Vec<f32>> {
        // Clamp against the probed duration so a window planned past the end decodes
        // whatever remains instead of failing.
        let remaining = (self.descriptor.duration_seconds - window.start_seconds)
            .min(window.duration_seconds);
        if remaining <= 0.0 {
            return Ok(Vec::new());
        }

        let output = Command::new("ffmpeg")
            .arg("-ss")
            .arg(format!("{:.3}", window.start_seconds))
            .arg("-i")
            .arg(&self.descriptor.path)
            .arg("-t")
            .arg(format!("{remaining:.3}"))
            .args(["-vn", "-ac", "1", "-ar"])
            .arg(TARGET_SAMPLE_RATE.to_string())
            .args(["-f", "wav", "pipe:1"])
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| engine_spawn_error("ffmpeg", e))?;

        if !output.status.success() {
            return Err(Error::Engine {
                command: "ffmpeg".into(),
                status: output.status.to_string(),
                diagnostics: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }

        let samples = samples_from_wav(Cursor::new(output.stdout))?;
        tracing::debug!(
            chunk = window.index,
            samples = samples.len(),
            seconds = samples.len() as f64 / f64::from(TARGET_SAMPLE_RATE),
            "decoded chunk window"
        );
        Ok(samples)
    }
}

/// Parse WAV data and return normalized mono samples.
///
/// Format requirements (enforced, since we control the ffmpeg invocation):
/// - mono (1 channel)
/// - [`TARGET_SAMPLE_RATE`]
///
/// Samples are normalized from i16 PCM to `f32` in `[-1.0, 1.0]`, the format ASR
/// backends expect.
fn samples_from_wav<R: std::io::Read>(reader: R) -> Result<Vec<f32>> {
    let mut wav_reader = hound::WavReader::new(reader)?;
    let spec = wav_reader.spec();

    if spec.channels != 1 {
        return Err(Error::msg(format!(
            "expected mono WAV (1 channel), got {} channels",
            spec.channels
        )));
    }

    if spec.sample_rate != TARGET_SAMPLE_RATE {
        return Err(Error::msg(format!(
            "expected {} Hz sample rate, got {} Hz",
            TARGET_SAMPLE_RATE, spec.sample_rate
        )));
    }

    let mut samples = Vec::with_capacity(wav_reader.len() as usize);
    for sample in wav_reader.samples::<i16>() {
        let pcm = sample?;
        samples.push(f32::from(pcm) / f32::from(i16::MAX));
    }

    Ok(samples)
}

fn engine_spawn_error(command: &str, err: std::io::Error) -> Error {
    Error::Engine {
        command: command.into(),
        status: "spawn failure".into(),
        diagnostics: format!("{err} (is {command} installed and on PATH?)"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(samples: &[i16], channels: u16, sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).expect("create WAV writer");
            for sample in samples {
                writer.write_sample(*sample).expect("write sample");
            }
            writer.finalize().expect("finalize WAV");
        }
        cursor.into_inner()
    }

    #[test]
    fn wav_samples_are_normalized() -> Result<()> {
        let bytes = wav_bytes(&[i16::MAX, 0, i16::MIN + 1], 1, TARGET_SAMPLE_RATE);
        let samples = samples_from_wav(Cursor::new(bytes))?;
        assert_eq!(samples.len(), 3);
        assert!((samples[0] - 1.0).abs() < 1e-6);
        assert_eq!(samples[1], 0.0);
        assert!((samples[2] + 1.0).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn stereo_wav_is_rejected() {
        let bytes = wav_bytes(&[0, 0], 2, TARGET_SAMPLE_RATE);
        assert!(samples_from_wav(Cursor::new(bytes)).is_err());
    }

    #[test]
    fn wrong_sample_rate_is_rejected() {
        let bytes = wav_bytes(&[0], 1, 44_100);
        assert!(samples_from_wav(Cursor::new(bytes)).is_err());
    }

    #[test]
    fn probe_rejects_missing_file() {
        let result = probe(Path::new("/nonexistent/file.m4b"));
        assert!(matches!(result, Err(Error::SourceNotFound(_))));
    }

    #[test]
    fn attached_pictures_are_not_video_streams() {
        let cover: serde_json::Value = serde_json::json!({
            "codec_type": "video",
            "disposition": { "attached_pic": 1 }
        });
        let movie: serde_json::Value = serde_json::json!({
            "codec_type": "video",
            "disposition": { "attached_pic": 0 }
        });
        assert!(!is_real_video_stream(&cover));
        assert!(is_real_video_stream(&movie));
    }

    #[test]
    fn extensions_are_lowercased_with_dot() {
        assert_eq!(extension_of(Path::new("/a/b/Book.M4B")), ".m4b");
        assert_eq!(extension_of(Path::new("/a/b/noext")), "");
    }

    #[test]
    fn out_of_range_window_decodes_to_nothing() -> Result<()> {
        let mut source = FfmpegSource::from_descriptor(MediaDescriptor {
            path: PathBuf::from("/irrelevant.mp3"),
            duration_seconds: 10.0,
            extension: ".mp3".into(),
            has_video: false,
        });
        let window = ChunkWindow {
            index: 1,
            start_seconds: 1800.0,
            duration_seconds: 1800.0,
        };
        assert!(source.decode_chunk(&window)?.is_empty());
        Ok(())
    }
}
