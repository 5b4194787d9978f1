use std::{sync::Arc, time::Duration};

use regex::Regex;
use reqwest::{StatusCode, header::COOKIE};
use serde_json::Value;
use url::Url;

use crate::{
    common::errors::{Result, TranscriptError},
    configs::TranscriptConfig,
};

/// Marker of the regional consent interstitial.
pub const CONSENT_MARKER: &str = "action=\"https://consent.youtube.com/s\"";

/// `CONSENT=YES+<token>`, valid only for hosts inside `domain`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsentCookie {
    pub value: String,
    pub domain: String,
}

impl ConsentCookie {
    pub fn new(token: &str, domain: &str) -> Self {
        Self {
            value: format!("YES+{}", token),
            domain: domain.to_string(),
        }
    }

    pub fn header_value(&self) -> String {
        format!("CONSENT={}", self.value)
    }

    /// Cookie domain matching: `.youtube.com` covers `youtube.com` and every
    /// subdomain of it.
    pub fn applies_to(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        else {
            return false;
        };
        let domain = self.domain.trim_start_matches('.').to_ascii_lowercase();
        host == domain || host.ends_with(&format!(".{}", domain))
    }
}

/// A response body plus the consent cookie that was needed to get it.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub body: String,
    pub cookie: Option<ConsentCookie>,
}

/// What to send. The consent re-fetch re-issues exactly this request.
#[derive(Debug, Clone, Copy)]
pub enum FetchRequest<'a> {
    Get(&'a str),
    PostJson(&'a str, &'a Value),
}

impl FetchRequest<'_> {
    pub fn url(&self) -> &str {
        match self {
            Self::Get(url) | Self::PostJson(url, _) => url,
        }
    }
}

/// Consent negotiation runs through these states once and only forward.
enum ConsentPhase {
    Unauthenticated(Option<ConsentCookie>),
    ConsentNegotiated(ConsentCookie),
    Retried(Fetched),
}

pub fn requires_consent(body: &str) -> bool {
    body.contains(CONSENT_MARKER)
}

/// HTTP fetching with bounded retries and the consent-cookie handshake.
pub struct PageFetcher {
    http: Arc<reqwest::Client>,
    attempts: u32,
    retry_delay: Duration,
    consent_domain: String,
    token_regex: Regex,
}

impl PageFetcher {
    pub fn new(http: Arc<reqwest::Client>, config: &TranscriptConfig) -> Self {
        Self {
            http,
            attempts: config.attempts(),
            retry_delay: config.retry_delay(),
            consent_domain: config.consent_domain.clone(),
            token_regex: Regex::new(r#"name="v" value="(.*?)""#)
                .expect("consent token regex is valid"),
        }
    }

    /// GET `url`, negotiating consent if the provider asks for it.
    pub async fn fetch(&self, url: &str, cookie: Option<ConsentCookie>) -> Result<Fetched> {
        self.negotiate(FetchRequest::Get(url), cookie).await
    }

    pub async fn post_json(
        &self,
        url: &str,
        body: &Value,
        cookie: Option<ConsentCookie>,
    ) -> Result<Fetched> {
        self.negotiate(FetchRequest::PostJson(url, body), cookie).await
    }

    pub async fn negotiate(
        &self,
        request: FetchRequest<'_>,
        cookie: Option<ConsentCookie>,
    ) -> Result<Fetched> {
        let mut phase = ConsentPhase::Unauthenticated(cookie);

        loop {
            phase = match phase {
                ConsentPhase::Unauthenticated(cookie) => {
                    let body = self.send_with_retry(request, cookie.as_ref()).await?;
                    if !requires_consent(&body) {
                        return Ok(Fetched { body, cookie });
                    }

                    tracing::debug!("Consent gate hit at {}, negotiating", request.url());
                    // The token is scraped from a fresh copy of the gate.
                    let gate = self.send_with_retry(request, cookie.as_ref()).await?;
                    let token = self.scrape_consent_token(&gate).ok_or_else(|| {
                        TranscriptError::ConsentRequired {
                            url: request.url().to_string(),
                        }
                    })?;
                    ConsentPhase::ConsentNegotiated(ConsentCookie::new(
                        &token,
                        &self.consent_domain,
                    ))
                }
                ConsentPhase::ConsentNegotiated(cookie) => {
                    let body = self.send_with_retry(request, Some(&cookie)).await?;
                    ConsentPhase::Retried(Fetched {
                        body,
                        cookie: Some(cookie),
                    })
                }
                ConsentPhase::Retried(fetched) => {
                    if requires_consent(&fetched.body) {
                        tracing::warn!(
                            "Consent gate persisted at {} after negotiation, using body as-is",
                            request.url()
                        );
                    }
                    return Ok(fetched);
                }
            };
        }
    }

    pub fn scrape_consent_token(&self, html: &str) -> Option<String> {
        self.token_regex
            .captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .filter(|t| !t.is_empty())
    }

    /// Sends `request`, retrying transport errors, non-200 statuses and empty
    /// bodies with a fixed delay.
    async fn send_with_retry(
        &self,
        request: FetchRequest<'_>,
        cookie: Option<&ConsentCookie>,
    ) -> Result<String> {
        let url = request.url();
        let mut last_error = String::new();

        for attempt in 1..=self.attempts {
            if attempt > 1 {
                tokio::time::sleep(self.retry_delay).await;
            }

            match self.send_once(request, cookie).await {
                Ok(body) => return Ok(body),
                Err(reason) => {
                    tracing::warn!(
                        "Request to {} failed (attempt {}/{}): {}",
                        url,
                        attempt,
                        self.attempts,
                        reason
                    );
                    last_error = reason;
                }
            }
        }

        Err(TranscriptError::FetchExhausted {
            url: url.to_string(),
            attempts: self.attempts,
            reason: last_error,
        })
    }

    async fn send_once(
        &self,
        request: FetchRequest<'_>,
        cookie: Option<&ConsentCookie>,
    ) -> std::result::Result<String, String> {
        let mut builder = match request {
            FetchRequest::Get(url) => self.http.get(url),
            FetchRequest::PostJson(url, body) => self.http.post(url).json(body),
        };

        if let Some(cookie) = cookie.filter(|c| c.applies_to(request.url())) {
            builder = builder.header(COOKIE, cookie.header_value());
        }

        let res = builder.send().await.map_err(|e| e.to_string())?;
        let status = res.status();
        if status != StatusCode::OK {
            return Err(format!("unexpected status {}", status));
        }

        let body = res.text().await.map_err(|e| e.to_string())?;
        if body.is_empty() {
            return Err("empty response body".to_string());
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> PageFetcher {
        PageFetcher::new(
            Arc::new(reqwest::Client::new()),
            &TranscriptConfig::default(),
        )
    }

    #[test]
    fn test_consent_cookie_value() {
        let cookie = ConsentCookie::new("cb.20210328-17-p0.en+FX+123", ".youtube.com");
        assert_eq!(cookie.header_value(), "CONSENT=YES+cb.20210328-17-p0.en+FX+123");
    }

    #[test]
    fn test_consent_cookie_scope() {
        let cookie = ConsentCookie::new("x", ".youtube.com");
        assert!(cookie.applies_to("https://www.youtube.com/watch?v=abc"));
        assert!(cookie.applies_to("https://youtube.com/api/timedtext"));
        assert!(!cookie.applies_to("https://notyoutube.com/"));
        assert!(!cookie.applies_to("https://example.com/?h=youtube.com"));
        assert!(!cookie.applies_to("not a url"));
    }

    #[test]
    fn test_scrape_consent_token() {
        let html = r#"<form action="https://consent.youtube.com/s" method="POST">
            <input type="hidden" name="gl" value="DE">
            <input type="hidden" name="v" value="cb.20210328-17-p0.de+FX+417">
        </form>"#;
        assert!(requires_consent(html));
        assert_eq!(
            fetcher().scrape_consent_token(html).as_deref(),
            Some("cb.20210328-17-p0.de+FX+417")
        );
        assert_eq!(fetcher().scrape_consent_token("<html></html>"), None);
        assert_eq!(fetcher().scrape_consent_token(r#"name="v" value="""#), None);
    }

    #[test]
    fn test_request_url() {
        let body = serde_json::json!({});
        assert_eq!(FetchRequest::Get("http://a/").url(), "http://a/");
        assert_eq!(FetchRequest::PostJson("http://b/", &body).url(), "http://b/");
    }
}
