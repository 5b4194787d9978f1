pub mod blocking;
pub mod common;
pub mod configs;
pub mod formatters;
pub mod youtube;

pub use common::{
    errors::{Result, TranscriptError},
    types::{CaptionTrack, Transcript, TranscriptLine},
};
pub use formatters::{
    JsonFormatter, SrtFormatter, TextFormatter, TranscriptFormatter, WebVttFormatter,
};
pub use youtube::{TranscriptApi, sanitize_video_id};
