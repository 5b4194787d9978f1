use super::TranscriptFormatter;
use crate::common::{errors::Result, types::Transcript};

/// Serializes the transcripts as a JSON array.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl TranscriptFormatter for JsonFormatter {
    fn format(&self, transcripts: &[Transcript]) -> Result<String> {
        let out = if self.pretty {
            serde_json::to_string_pretty(transcripts)?
        } else {
            serde_json::to_string(transcripts)?
        };
        Ok(out)
    }
}
