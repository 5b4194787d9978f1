use crate::common::{errors::Result, types::Transcript};

pub mod json;
pub mod srt;
pub mod text;
pub mod webvtt;

pub use json::JsonFormatter;
pub use srt::SrtFormatter;
pub use text::TextFormatter;
pub use webvtt::WebVttFormatter;

/// Renders a batch of transcripts into one output document.
pub trait TranscriptFormatter: Send + Sync {
    fn format(&self, transcripts: &[Transcript]) -> Result<String>;
}

/// `HH:MM:SS<sep>mmm`, rounded to the nearest millisecond.
pub(crate) fn cue_timestamp(seconds: f64, separator: char) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02}{separator}{millis:03}")
}
