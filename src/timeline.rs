//! Global timeline bookkeeping.
//!
//! Long media is processed in fixed-size decode windows. Everything downstream of the
//! decoder works with *window-local* timestamps, so this module owns the two pieces of
//! math that keep the pipeline honest about time:
//! - planning the windows (`chunk_windows`)
//! - rebasing window-local seconds onto the global timeline (`ChunkWindow::rebase`)
//!
//! It also renders the `HH:MM:SS` timestamps used by review artifacts and transcript
//! dumps.

/// One fixed-size decode window over the source media.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkWindow {
    /// Zero-based window index.
    pub index: usize,
    /// Global start of this window, in seconds.
    pub start_seconds: f64,
    /// Window length in seconds; the final window is clamped to the remaining media.
    pub duration_seconds: f64,
}

impl ChunkWindow {
    /// Rebase a window-local timestamp onto the global timeline.
    pub fn rebase(&self, local_seconds: f64) -> f64 {
        self.start_seconds + local_seconds
    }
}

/// Plan `floor(duration / chunk) + 1` decode windows covering `[0, duration)`.
///
/// The final window is clamped to the remaining duration; when the media length is an
/// exact multiple of the chunk length the trailing zero-length window is dropped rather
/// than decoded. A non-positive duration yields no windows.
pub fn chunk_windows(duration_seconds: f64, chunk_seconds: f64) -> Vec<ChunkWindow> {
    if duration_seconds <= 0.0 || chunk_seconds <= 0.0 {
        return Vec::new();
    }

    let count = (duration_seconds / chunk_seconds).floor() as usize + 1;
    let mut windows = Vec::with_capacity(count);

    for index in 0..count {
        let start_seconds = index as f64 * chunk_seconds;
        let remaining = duration_seconds - start_seconds;
        if remaining <= 0.0 {
            continue;
        }

        windows.push(ChunkWindow {
            index,
            start_seconds,
            duration_seconds: remaining.min(chunk_seconds),
        });
    }

    windows
}

/// Render seconds as a zero-padded `HH:MM:SS` timestamp.
///
/// Fractional seconds are truncated. Hours are unbounded — `25:00:00` is a valid
/// rendering for media longer than a day.
pub fn format_hms(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}
