use std::fmt::Write;

use super::{TranscriptFormatter, cue_timestamp};
use crate::common::{errors::Result, types::Transcript};

/// SubRip output. Cue numbering restarts for every transcript.
#[derive(Debug, Clone, Copy, Default)]
pub struct SrtFormatter;

impl SrtFormatter {
    fn format_one(transcript: &Transcript, out: &mut String) {
        for (i, line) in transcript.lines.iter().enumerate() {
            let _ = writeln!(
                out,
                "{}\n{} --> {}\n{}\n",
                i + 1,
                cue_timestamp(line.start, ','),
                cue_timestamp(line.end(), ','),
                line.text
            );
        }
    }
}

impl TranscriptFormatter for SrtFormatter {
    fn format(&self, transcripts: &[Transcript]) -> Result<String> {
        let mut out = String::new();
        for transcript in transcripts {
            Self::format_one(transcript, &mut out);
        }
        Ok(out)
    }
}
