use std::time::Duration;

use thiserror::Error;

/// Every way a transcript retrieval can fail.
///
/// Retries happen below this type; a value of it is always terminal for the
/// whole call.
#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("request to {url} failed after {attempts} attempts: {reason}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("consent gate at {url} did not yield a consent token")]
    ConsentRequired { url: String },

    #[error("no captions found for video {video_id}")]
    CaptionsNotFound { video_id: String },

    #[error("transcripts are disabled for video {video_id}")]
    TranscriptsDisabled { video_id: String },

    #[error("video {video_id} is not playable ({status}): {reason}")]
    VideoUnplayable {
        video_id: String,
        status: String,
        reason: String,
    },

    #[error("caption catalog for video {video_id} is unreadable: {reason}")]
    InvalidCatalog { video_id: String, reason: String },

    #[error(
        "no transcript for video {video_id} matches languages [{}] (available: [{}])",
        .requested.join(", "),
        .available.join(", ")
    )]
    NoMatchingLanguage {
        video_id: String,
        requested: Vec<String>,
        available: Vec<String>,
    },

    #[error("failed to parse timed text for language {language_code}: {reason}")]
    Parse {
        language_code: String,
        reason: String,
    },

    #[error("{received} of {expected} track tasks reported before the work group closed")]
    TaskAborted { expected: usize, received: usize },

    #[error("transcript retrieval timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl TranscriptError {
    /// True when the video simply has no captions, as opposed to a transient
    /// or network failure.
    pub fn is_no_captions(&self) -> bool {
        matches!(
            self,
            Self::CaptionsNotFound { .. } | Self::TranscriptsDisabled { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TranscriptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_captions_class() {
        let missing = TranscriptError::CaptionsNotFound {
            video_id: "abc".into(),
        };
        let disabled = TranscriptError::TranscriptsDisabled {
            video_id: "abc".into(),
        };
        let no_match = TranscriptError::NoMatchingLanguage {
            video_id: "abc".into(),
            requested: vec!["fr".into()],
            available: vec!["en".into()],
        };

        assert!(missing.is_no_captions());
        assert!(disabled.is_no_captions());
        assert!(!no_match.is_no_captions());
        assert_ne!(missing.to_string(), no_match.to_string());
    }

    #[test]
    fn test_no_matching_language_lists_codes() {
        let err = TranscriptError::NoMatchingLanguage {
            video_id: "abc".into(),
            requested: vec!["fr".into(), "de".into()],
            available: vec!["en".into(), "es".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("[fr, de]"));
        assert!(msg.contains("[en, es]"));
    }
}
