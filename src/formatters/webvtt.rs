use std::fmt::Write;

use super::{TranscriptFormatter, cue_timestamp};
use crate::common::{errors::Result, types::Transcript};

/// WebVTT output. Each transcript becomes its own `WEBVTT` document.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebVttFormatter;

impl TranscriptFormatter for WebVttFormatter {
    fn format(&self, transcripts: &[Transcript]) -> Result<String> {
        let mut docs = Vec::with_capacity(transcripts.len());
        for transcript in transcripts {
            let mut doc = String::from("WEBVTT\n");
            let _ = writeln!(doc, "Language: {}\n", transcript.language_code);
            for line in &transcript.lines {
                let _ = writeln!(
                    doc,
                    "{} --> {}\n{}\n",
                    cue_timestamp(line.start, '.'),
                    cue_timestamp(line.end(), '.'),
                    line.text
                );
            }
            docs.push(doc);
        }
        Ok(docs.join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::tests::sample;

    #[test]
    fn test_vtt_document() {
        let out = WebVttFormatter
            .format(&[sample("en", &[("hello", 61.0, 1.0)])])
            .unwrap();
        assert_eq!(
            out,
            "WEBVTT\nLanguage: en\n\n00:01:01.000 --> 00:01:02.000\nhello\n\n"
        );
    }

    #[test]
    fn test_one_document_per_transcript() {
        let out = WebVttFormatter
            .format(&[sample("en", &[]), sample("es", &[])])
            .unwrap();
        assert_eq!(out.matches("WEBVTT").count(), 2);
    }
}
