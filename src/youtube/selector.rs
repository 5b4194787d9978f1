use crate::common::{
    errors::{Result, TranscriptError},
    types::CaptionTrack,
};

/// Narrows `catalog` to the requested language codes.
///
/// No codes means every track. Otherwise each code, in request order, picks
/// every track whose language code is exactly equal (`en` does not match
/// `en-US`). A code requested twice is only considered once.
pub fn select_tracks<S: AsRef<str>>(
    video_id: &str,
    catalog: Vec<CaptionTrack>,
    language_codes: &[S],
) -> Result<Vec<CaptionTrack>> {
    if language_codes.is_empty() {
        return Ok(catalog);
    }

    let mut requested: Vec<&str> = Vec::with_capacity(language_codes.len());
    for code in language_codes.iter().map(|c| c.as_ref()) {
        if !requested.contains(&code) {
            requested.push(code);
        }
    }

    let selected: Vec<CaptionTrack> = requested
        .iter()
        .flat_map(|code| catalog.iter().filter(move |t| t.language_code == *code))
        .cloned()
        .collect();

    if selected.is_empty() {
        return Err(TranscriptError::NoMatchingLanguage {
            video_id: video_id.to_string(),
            requested: requested.iter().map(|c| c.to_string()).collect(),
            available: catalog.iter().map(|t| t.language_code.clone()).collect(),
        });
    }

    Ok(selected)
}
