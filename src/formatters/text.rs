use super::TranscriptFormatter;
use crate::common::{errors::Result, types::Transcript};

/// Plain line text. Transcripts are separated by a blank line.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter;

impl TranscriptFormatter for TextFormatter {
    fn format(&self, transcripts: &[Transcript]) -> Result<String> {
        Ok(transcripts
            .iter()
            .map(Transcript::text)
            .collect::<Vec<_>>()
            .join("\n\n"))
    }
}
