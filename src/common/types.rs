use serde::{Deserialize, Serialize};

/// One caption track advertised by the player endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub base_url: String,
    pub language_code: String,
    pub display_name: String,
    /// Speech-recognition track (`kind == "asr"`).
    pub is_generated: bool,
    pub is_translatable: bool,
}

/// A single timed fragment of a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptLine {
    pub text: String,
    /// Seconds from the start of the video.
    pub start: f64,
    /// Seconds the fragment stays on screen.
    pub duration: f64,
}

impl TranscriptLine {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// The transcript of one caption track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcript {
    pub video_id: String,
    pub video_title: String,
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub is_translatable: bool,
    pub lines: Vec<TranscriptLine>,
}

impl Transcript {
    pub fn from_track(
        video_id: &str,
        video_title: &str,
        track: &CaptionTrack,
        lines: Vec<TranscriptLine>,
    ) -> Self {
        Self {
            video_id: video_id.to_string(),
            video_title: video_title.to_string(),
            language: track.display_name.clone(),
            language_code: track.language_code.clone(),
            is_generated: track.is_generated,
            is_translatable: track.is_translatable,
            lines,
        }
    }

    /// All line texts joined by newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Everything one retrieval learns about a video before fetching tracks.
#[derive(Debug, Clone, Default)]
pub struct VideoTranscriptData {
    pub catalog: Vec<CaptionTrack>,
    pub title: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_serializes_camel_case() {
        let track = CaptionTrack {
            base_url: "https://example.com/tt".into(),
            language_code: "en".into(),
            display_name: "English".into(),
            is_generated: true,
            is_translatable: false,
        };
        let transcript = Transcript::from_track(
            "abc",
            "Title",
            &track,
            vec![TranscriptLine {
                text: "hi".into(),
                start: 1.5,
                duration: 2.0,
            }],
        );

        let value = serde_json::to_value(&transcript).unwrap();
        assert_eq!(value["videoId"], "abc");
        assert_eq!(value["languageCode"], "en");
        assert_eq!(value["isGenerated"], true);
        assert_eq!(value["lines"][0]["start"], 1.5);
        assert_eq!(transcript.lines[0].end(), 3.5);
    }
}
