//! Built-in backend powered by `whisper-rs` / `whisper.cpp`.
//!
//! Produces word-level timestamps by enabling token timestamps and splitting decoding
//! on word boundaries, then flattening each segment's tokens into [`Word`]s.

use std::os::raw::{c_char, c_void};
use std::sync::Once;

use anyhow::Context;
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, WhisperSegment,
};

use crate::backend::Transcriber;
use crate::opts::TranscribeOpts;
use crate::transcript::Word;
use crate::Result;

/// A `Transcriber` backed by a loaded whisper.cpp model.
pub struct WhisperTranscriber {
    ctx: WhisperContext,
}

impl WhisperTranscriber {
    /// Load a whisper.cpp model from disk and initialize a backend.
    pub fn new(model_path: &str) -> Result<Self> {
        init_whisper_logging();

        let ctx_params = WhisperContextParameters::default();
        let ctx = WhisperContext::new_with_params(model_path, ctx_params)
            .with_context(|| format!("failed to load model from path: {model_path}"))?;

        Ok(Self { ctx })
    }

    /// Access the underlying Whisper context.
    ///
    /// This is primarily intended for advanced or experimental use-cases.
    pub fn context(&self) -> &WhisperContext {
        &self.ctx
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(&mut self, samples: &[f32], opts: &TranscribeOpts) -> Result<Vec<Word>> {
        if samples.is_empty() {
            return Ok(Vec::new());
        }

        let params = build_full_params(opts);

        let mut state = self
            .ctx
            .create_state()
            .context("failed to create whisper state")?;
        state
            .full(params, samples)
            .context("failed to run whisper full()")?;

        let mut words = Vec::new();
        for segment in state.as_iter() {
            collect_words(&segment, &mut words)?;
        }

        Ok(words)
    }
}

fn build_full_params(opts: &TranscribeOpts) -> FullParams<'_, '_> {
    let mut params = FullParams::new(SamplingStrategy::BeamSearch {
        beam_size: 5,
        patience: 1.0,
    });

    params.set_n_threads(num_cpus::get() as i32);
    params.set_translate(false);
    params.set_language(opts.language.as_deref());
    params.set_no_context(true);
    params.set_single_segment(false);

    params.set_temperature(opts.temperature);
    params.set_no_speech_thold(opts.no_speech_threshold);
    params.set_logprob_thold(opts.logprob_threshold);

    params.set_print_progress(false);
    params.set_print_special(false);
    params.set_print_realtime(false);
    params.set_print_timestamps(false);

    // Word-level timing: token timestamps plus word-boundary splitting give us one
    // token per (roughly) one spoken word.
    params.set_token_timestamps(true);
    params.set_split_on_word(true);

    params
}

fn collect_words(segment: &WhisperSegment, words: &mut Vec<Word>) -> Result<()> {
    let token_count = segment.n_tokens();
    let token_count = usize::try_from(token_count)
        .with_context(|| format!("segment reported negative token count: {token_count}"))?;

    for token_idx in 0..token_count {
        let token = segment
            .get_token(token_idx as i32)
            .context("failed to get token from segment")?;

        let text = token
            .to_str()
            .with_context(|| format!("failed to get token text at index {token_idx}"))?
            .to_owned();

        // Filter out whisper special/control tokens (commonly formatted like
        // `[_BEG_]`, `[_TT_50]`).
        if text.starts_with("[_") && text.ends_with("_]") {
            continue;
        }

        let data = token.token_data();
        words.push(Word::new(
            centiseconds_to_seconds(data.t0),
            centiseconds_to_seconds(data.t1),
            text,
        ));
    }

    Ok(())
}

/// Convert whisper's centisecond timestamps to seconds.
///
/// whisper uses -1 for unknown; clamp to 0 so consumers don't see -0.01s.
fn centiseconds_to_seconds(value: i64) -> f64 {
    if value < 0 {
        0.0
    } else {
        value as f64 / 100.0
    }
}

/// A no-op log callback used to silence logs emitted by whisper.cpp.
unsafe extern "C" fn whisper_log_callback(
    _level: u32,
    _c_msg: *const c_char,
    _user_data: *mut c_void,
) {
    // Intentionally left empty.
}

/// Ensure whisper logging is configured exactly once for the lifetime of the process.
fn init_whisper_logging() {
    static INIT: Once = Once::new();

    INIT.call_once(|| unsafe {
        whisper_rs::set_log_callback(Some(whisper_log_callback), std::ptr::null_mut());
    });
}
