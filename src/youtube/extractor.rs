use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::common::{
    errors::{Result, TranscriptError},
    types::{CaptionTrack, VideoTranscriptData},
};

/// Pulls the player API key and page title out of a watch page.
pub struct PageExtractor {
    api_key_regex: Regex,
    title_selector: Option<Selector>,
}

impl Default for PageExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PageExtractor {
    pub fn new() -> Self {
        Self {
            api_key_regex: Regex::new(r#""INNERTUBE_API_KEY":\s*"([a-zA-Z0-9_-]+)""#)
                .expect("api key regex is valid"),
            title_selector: Selector::parse("title").ok(),
        }
    }

    /// Empty when the page carries no key.
    pub fn extract_api_key(&self, html: &str) -> String {
        self.api_key_regex
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default()
    }

    /// Text of the first `<title>` element, or empty.
    pub fn extract_title(&self, html: &str) -> String {
        let Some(selector) = &self.title_selector else {
            return String::new();
        };
        let document = Html::parse_document(html);
        document
            .select(selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
            .unwrap_or_default()
    }
}

fn get_text(value: &Value) -> Option<String> {
    if let Some(text) = value.get("simpleText").and_then(|t| t.as_str()) {
        return Some(text.to_string());
    }
    value
        .get("runs")
        .and_then(|r| r.as_array())
        .and_then(|runs| runs.first())
        .and_then(|run| run.get("text"))
        .and_then(|t| t.as_str())
        .map(|s| s.to_string())
}

fn extract_track(caption: &Value) -> Option<CaptionTrack> {
    let base_url = caption.get("baseUrl")?.as_str()?.to_string();
    let language_code = caption.get("languageCode")?.as_str()?.to_string();

    let display_name = caption
        .get("name")
        .and_then(get_text)
        .unwrap_or_else(|| language_code.clone());

    let is_generated = caption
        .get("kind")
        .and_then(|k| k.as_str())
        .map(|k| k == "asr")
        .unwrap_or(false);

    let is_translatable = caption
        .get("isTranslatable")
        .and_then(|t| t.as_bool())
        .unwrap_or(false);

    Some(CaptionTrack {
        base_url,
        language_code,
        display_name,
        is_generated,
        is_translatable,
    })
}

/// Turns a non-OK playability status into an error, if there is one.
fn playability_error(video_id: &str, player: &Value) -> Option<TranscriptError> {
    let status_obj = player.get("playabilityStatus")?;
    let status = status_obj.get("status").and_then(|s| s.as_str())?;
    if status == "OK" {
        return None;
    }

    let reason = status_obj
        .get("reason")
        .and_then(|r| r.as_str())
        .unwrap_or("")
        .to_string();

    Some(TranscriptError::VideoUnplayable {
        video_id: video_id.to_string(),
        status: status.to_string(),
        reason,
    })
}

/// Parses the player JSON into the caption catalog.
///
/// A missing `captions.playerCaptionsTracklistRenderer.captionTracks` path is
/// `CaptionsNotFound`; an empty track list is `TranscriptsDisabled`.
pub fn extract_catalog(video_id: &str, raw_json: &str, title: String) -> Result<VideoTranscriptData> {
    let player: Value =
        serde_json::from_str(raw_json).map_err(|e| TranscriptError::InvalidCatalog {
            video_id: video_id.to_string(),
            reason: e.to_string(),
        })?;

    let Some(caption_tracks) = player
        .get("captions")
        .and_then(|c| c.get("playerCaptionsTracklistRenderer"))
        .and_then(|r| r.get("captionTracks"))
        .and_then(|t| t.as_array())
    else {
        if let Some(err) = playability_error(video_id, &player) {
            return Err(err);
        }
        return Err(TranscriptError::CaptionsNotFound {
            video_id: video_id.to_string(),
        });
    };

    let catalog: Vec<CaptionTrack> = caption_tracks.iter().filter_map(extract_track).collect();

    if catalog.is_empty() {
        return Err(TranscriptError::TranscriptsDisabled {
            video_id: video_id.to_string(),
        });
    }

    tracing::debug!(
        "Catalog for {} has {} tracks: {}",
        video_id,
        catalog.len(),
        catalog
            .iter()
            .map(|t| t.language_code.as_str())
            .collect::<Vec<_>>()
            .join(",")
    );

    Ok(VideoTranscriptData { catalog, title })
}
