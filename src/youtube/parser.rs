use std::{borrow::Cow, collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use quick_xml::{
    Reader,
    events::{BytesStart, Event},
};
use regex::Regex;
use thiserror::Error;

use crate::common::types::TranscriptLine;

/// Inline tags kept when formatting is preserved.
pub const FORMATTING_TAGS: &[&str] = &[
    "strong", "em", "b", "i", "mark", "small", "del", "ins", "sub", "sup",
];

// Private-use code points; they stand in for `<` and `>` of a kept tag while
// every other tag is stripped.
const SHIELD_OPEN: char = '\u{E000}';
const SHIELD_CLOSE: char = '\u{E001}';

#[derive(Debug, Error)]
#[error("{0}")]
pub struct TimedTextError(String);

/// Compiled tag patterns, keyed by formatting-tag set.
///
/// Owned by a [`TranscriptParser`]; every parse through that parser reuses
/// the same compiled regexes.
pub struct RegexCache {
    strip_all: Regex,
    shields: Mutex<HashMap<String, Arc<Regex>>>,
}

impl Default for RegexCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexCache {
    pub fn new() -> Self {
        Self {
            strip_all: Regex::new(r"<[^>]*>").expect("tag strip regex is valid"),
            shields: Mutex::new(HashMap::new()),
        }
    }

    pub fn strip_all(&self) -> &Regex {
        &self.strip_all
    }

    fn key(tags: &[String]) -> String {
        let mut normalized: Vec<String> = tags.iter().map(|t| t.to_ascii_lowercase()).collect();
        normalized.sort();
        normalized.dedup();
        normalized.join("|")
    }

    /// Regex matching the opening and closing forms of `tags`, capturing the
    /// inside of the angle brackets.
    pub fn shield_for(&self, tags: &[String]) -> Result<Arc<Regex>, TimedTextError> {
        let key = Self::key(tags);
        let mut shields = self.shields.lock();
        if let Some(re) = shields.get(&key) {
            return Ok(re.clone());
        }

        let alternatives = key
            .split('|')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("|");
        let re = Regex::new(&format!(r"(?i)<(/?(?:{})\b[^>]*)>", alternatives))
            .map_err(|e| TimedTextError(format!("invalid formatting tag set: {}", e)))?;
        let re = Arc::new(re);
        shields.insert(key, re.clone());
        Ok(re)
    }

    pub fn len(&self) -> usize {
        self.shields.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct PendingLine {
    start: f64,
    duration: f64,
    raw: String,
}

impl PendingLine {
    fn from_element(e: &BytesStart<'_>) -> Self {
        let mut start = 0.0;
        let mut duration = 0.0;
        for attr in e.attributes().flatten() {
            let value = std::str::from_utf8(&attr.value)
                .ok()
                .and_then(|s| s.trim().parse::<f64>().ok());
            match attr.key.as_ref() {
                b"start" => start = value.unwrap_or(0.0),
                b"dur" => duration = value.unwrap_or(0.0),
                _ => {}
            }
        }
        Self {
            start,
            duration,
            raw: String::new(),
        }
    }
}

/// Decodes timed-text XML into transcript lines.
pub struct TranscriptParser {
    formatting_tags: Vec<String>,
    cache: RegexCache,
}

impl Default for TranscriptParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscriptParser {
    pub fn new() -> Self {
        Self::with_formatting_tags(FORMATTING_TAGS.iter().map(|t| t.to_string()).collect())
    }

    pub fn with_formatting_tags(formatting_tags: Vec<String>) -> Self {
        let parser = Self {
            formatting_tags,
            cache: RegexCache::new(),
        };
        // Compile the shield for the configured set up front.
        if !parser.formatting_tags.is_empty() {
            if let Err(e) = parser.cache.shield_for(&parser.formatting_tags) {
                tracing::warn!("Formatting tags will not be preserved: {}", e);
            }
        }
        parser
    }

    pub fn formatting_tags(&self) -> &[String] {
        &self.formatting_tags
    }

    pub fn cache(&self) -> &RegexCache {
        &self.cache
    }

    /// One line per `<text>` child of the root element, in document order.
    pub fn parse(
        &self,
        xml: &str,
        preserve_formatting: bool,
    ) -> Result<Vec<TranscriptLine>, TimedTextError> {
        let shield = if preserve_formatting && !self.formatting_tags.is_empty() {
            Some(self.cache.shield_for(&self.formatting_tags)?)
        } else {
            None
        };

        let mut reader = Reader::from_str(xml);
        let mut lines = Vec::new();
        let mut pending: Option<PendingLine> = None;
        let mut depth = 0usize;
        let mut saw_root = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    if depth == 0 {
                        if saw_root {
                            return Err(TimedTextError("multiple root elements".to_string()));
                        }
                        saw_root = true;
                    }
                    depth += 1;
                    if depth == 2 && e.name().as_ref() == b"text" {
                        pending = Some(PendingLine::from_element(&e));
                    }
                }
                Ok(Event::Empty(e)) => {
                    if depth == 0 {
                        if saw_root {
                            return Err(TimedTextError("multiple root elements".to_string()));
                        }
                        saw_root = true;
                    }
                    if depth == 1 && e.name().as_ref() == b"text" {
                        let line = PendingLine::from_element(&e);
                        lines.push(self.finish(line, shield.as_deref()));
                    }
                }
                Ok(Event::End(_)) => {
                    if depth == 2 {
                        if let Some(line) = pending.take() {
                            lines.push(self.finish(line, shield.as_deref()));
                        }
                    }
                    depth = depth.checked_sub(1).ok_or_else(|| {
                        TimedTextError(format!(
                            "unmatched closing tag at byte {}",
                            reader.buffer_position()
                        ))
                    })?;
                }
                Ok(Event::Text(t)) => {
                    if let Some(line) = pending.as_mut() {
                        let text = t
                            .unescape()
                            .unwrap_or_else(|_| Cow::Owned(String::from_utf8_lossy(&t).into_owned()));
                        line.raw.push_str(&text);
                    }
                }
                Ok(Event::CData(c)) => {
                    if let Some(line) = pending.as_mut() {
                        line.raw.push_str(&String::from_utf8_lossy(&c));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(TimedTextError(format!(
                        "malformed XML at byte {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
        }

        if depth != 0 {
            return Err(TimedTextError(format!(
                "document ended with {} unclosed element(s)",
                depth
            )));
        }
        if !saw_root {
            return Err(TimedTextError("document has no root element".to_string()));
        }

        Ok(lines)
    }

    fn finish(&self, line: PendingLine, shield: Option<&Regex>) -> TranscriptLine {
        TranscriptLine {
            text: self.clean_text(&line.raw, shield),
            start: line.start,
            duration: line.duration,
        }
    }

    /// Strips markup, keeping shielded tags, then decodes HTML entities.
    fn clean_text(&self, raw: &str, shield: Option<&Regex>) -> String {
        let shielded = match shield {
            Some(re) => re.replace_all(raw, format!("{}$1{}", SHIELD_OPEN, SHIELD_CLOSE)),
            None => Cow::Borrowed(raw),
        };

        let stripped = self.cache.strip_all().replace_all(&shielded, "");

        let restored: Cow<'_, str> = if shield.is_some() {
            Cow::Owned(
                stripped
                    .replace(SHIELD_OPEN, "<")
                    .replace(SHIELD_CLOSE, ">"),
            )
        } else {
            stripped
        };

        html_escape::decode_html_entities(&restored).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="utf-8" ?>
<transcript>
    <text start="0.21" dur="2.34">Hello world</text>
    <text start="2.55" dur="1.5">it&amp;#39;s a &amp;quot;test&amp;quot;</text>
    <text start="4.05" dur="bogus">third</text>
    <text dur="1.0"/>
</transcript>"#;

    #[test]
    fn test_parse_lines_in_order() {
        let lines = TranscriptParser::new().parse(SAMPLE, false).unwrap();
        assert_eq!(lines.len(), 4);

        assert_eq!(lines[0].text, "Hello world");
        assert!((lines[0].start - 0.21).abs() < f64::EPSILON);
        assert!((lines[0].duration - 2.34).abs() < f64::EPSILON);

        assert_eq!(lines[1].text, "it's a \"test\"");
        assert_eq!(lines[2].text, "third");
        assert_eq!(lines[3].text, "");
    }

    #[test]
    fn test_bad_numbers_default_to_zero() {
        let lines = TranscriptParser::new().parse(SAMPLE, false).unwrap();
        assert!((lines[2].start - 4.05).abs() < f64::EPSILON);
        assert_eq!(lines[2].duration, 0.0);
        assert_eq!(lines[3].start, 0.0);
        assert_eq!(lines[3].duration, 1.0);
    }

    #[test]
    fn test_line_count_matches_text_elements() {
        let mut xml = String::from("<transcript>");
        for i in 0..50 {
            xml.push_str(&format!(r#"<text start="{i}" dur="1">line {i}</text>"#));
        }
        xml.push_str("</transcript>");

        let lines = TranscriptParser::new().parse(&xml, false).unwrap();
        assert_eq!(lines.len(), 50);
        for (i, line) in lines.iter().enumerate() {
            assert_eq!(line.text, format!("line {i}"));
            assert_eq!(line.start, i as f64);
        }
    }

    #[test]
    fn test_strip_all_tags_without_formatting() {
        let xml = r#"<transcript><text start="0" dur="1">&lt;b&gt;bold&lt;/b&gt; &lt;font color="red"&gt;red&lt;/font&gt; &lt;i&gt;it&lt;/i&gt;</text></transcript>"#;
        let lines = TranscriptParser::new().parse(xml, false).unwrap();
        assert_eq!(lines[0].text, "bold red it");
    }

    #[test]
    fn test_preserve_whitelisted_tags_only() {
        let xml = r#"<transcript><text start="0" dur="1">&lt;b&gt;bold&lt;/b&gt; &lt;font color="red"&gt;red&lt;/font&gt; &lt;em&gt;em&lt;/em&gt; &lt;br/&gt;&lt;sup&gt;2&lt;/sup&gt;</text></transcript>"#;
        let lines = TranscriptParser::new().parse(xml, true).unwrap();
        assert_eq!(lines[0].text, "<b>bold</b> red <em>em</em> <sup>2</sup>");
    }

    #[test]
    fn test_preserve_is_case_insensitive_and_word_bounded() {
        let xml = r#"<transcript><text start="0" dur="1">&lt;B&gt;x&lt;/B&gt;&lt;body&gt;y&lt;/body&gt;&lt;small&gt;z&lt;/small&gt;</text></transcript>"#;
        let lines = TranscriptParser::new().parse(xml, true).unwrap();
        assert_eq!(lines[0].text, "<B>x</B>y<small>z</small>");
    }

    #[test]
    fn test_entities_decoded_after_stripping() {
        let xml = r#"<transcript><text start="0" dur="1">Tom &amp;amp; Jerry&amp;nbsp;&amp;#8212; fin</text></transcript>"#;
        let lines = TranscriptParser::new().parse(xml, false).unwrap();
        assert_eq!(lines[0].text, "Tom & Jerry\u{a0}\u{2014} fin");
    }

    #[test]
    fn test_custom_formatting_tags() {
        let parser = TranscriptParser::with_formatting_tags(vec!["font".to_string()]);
        let xml = r#"<transcript><text start="0" dur="1">&lt;font color="red"&gt;r&lt;/font&gt; &lt;b&gt;b&lt;/b&gt;</text></transcript>"#;
        let lines = parser.parse(xml, true).unwrap();
        assert_eq!(lines[0].text, r#"<font color="red">r</font> b"#);
    }

    #[test]
    fn test_regex_cache_reused_per_tag_set() {
        let parser = TranscriptParser::new();
        assert_eq!(parser.cache().len(), 1);

        parser.parse(SAMPLE, true).unwrap();
        parser.parse(SAMPLE, true).unwrap();
        assert_eq!(parser.cache().len(), 1);

        let reordered: Vec<String> = FORMATTING_TAGS.iter().rev().map(|t| t.to_string()).collect();
        let first = parser.cache().shield_for(parser.formatting_tags()).unwrap();
        let second = parser.cache().shield_for(&reordered).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        parser.cache().shield_for(&["u".to_string()]).unwrap();
        assert_eq!(parser.cache().len(), 2);
    }

    #[test]
    fn test_empty_transcript() {
        let lines = TranscriptParser::new().parse("<transcript></transcript>", false).unwrap();
        assert!(lines.is_empty());
        let lines = TranscriptParser::new().parse("<transcript/>", false).unwrap();
        assert!(lines.is_empty());
    }

    #[test]
    fn test_malformed_xml_is_error() {
        let parser = TranscriptParser::new();
        assert!(parser
            .parse(r#"<transcript><text start="0">a</transcript>"#, false)
            .is_err());
        assert!(parser
            .parse(r#"<transcript><text start="0">a</text>"#, false)
            .is_err());
        assert!(parser.parse("just some words", false).is_err());
        assert!(parser.parse(r#"<transcript><text start="0"#, false).is_err());
    }
}
