use url::Url;

fn is_youtube_host(host: &str) -> bool {
    let h = host.to_ascii_lowercase();
    h == "youtube.com" || h.ends_with(".youtube.com")
}

/// Reduces a video identifier to the bare video ID.
///
/// Accepts a bare ID, `https://www.youtube.com/watch?v=<id>` and
/// `https://youtu.be/<id>`. Anything else that parses as a URL is returned
/// unchanged with a warning; strings that are not URLs are treated as IDs.
pub fn sanitize_video_id(input: &str) -> String {
    let trimmed = input.trim();

    let Ok(url) = Url::parse(trimmed) else {
        return trimmed.to_string();
    };

    let host = url.host_str().unwrap_or("");

    if host.eq_ignore_ascii_case("youtu.be") {
        if let Some(id) = url
            .path_segments()
            .and_then(|mut segs| segs.next())
            .filter(|s| !s.is_empty())
        {
            return id.to_string();
        }
    }

    if is_youtube_host(host) && url.path() == "/watch" {
        if let Some((_, id)) = url.query_pairs().find(|(k, v)| k == "v" && !v.is_empty()) {
            return id.into_owned();
        }
    }

    tracing::warn!(
        "Unrecognized video identifier '{}', passing it through unchanged",
        trimmed
    );
    trimmed.to_string()
}

/// Removes the `srv3` format selector so the timed-text endpoint answers with
/// the plain `<transcript>` document.
pub fn strip_srv3(url: &str) -> String {
    url.replace("&fmt=srv3", "")
}
