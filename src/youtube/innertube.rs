use std::sync::Arc;

use serde_json::{Value, json};

use super::fetcher::{ConsentCookie, Fetched, PageFetcher};
use crate::{common::errors::Result, configs::TranscriptConfig};

/// Client identity sent in the player request context.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_name: String,
    pub client_version: String,
}

impl ClientConfig {
    pub fn build_context(&self) -> Value {
        json!({
            "client": {
                "clientName": self.client_name,
                "clientVersion": self.client_version,
            }
        })
    }
}

/// Talks to the undocumented player endpoint that carries the caption catalog.
pub struct InnertubeClient {
    fetcher: Arc<PageFetcher>,
    client: ClientConfig,
    config: TranscriptConfig,
}

impl InnertubeClient {
    pub fn new(fetcher: Arc<PageFetcher>, config: &TranscriptConfig) -> Self {
        Self {
            fetcher,
            client: ClientConfig {
                client_name: config.client_name.clone(),
                client_version: config.client_version.clone(),
            },
            config: config.clone(),
        }
    }

    pub fn player_body(&self, video_id: &str) -> Value {
        json!({
            "context": self.client.build_context(),
            "videoId": video_id,
        })
    }

    /// Fetches the raw player JSON for `video_id`.
    ///
    /// An empty `api_key` is still sent; the endpoint rejects it and the
    /// rejection surfaces as a fetch error.
    pub async fn fetch_catalog(
        &self,
        video_id: &str,
        api_key: &str,
        cookie: Option<ConsentCookie>,
    ) -> Result<Fetched> {
        let url = self.config.player_url(api_key);
        let body = self.player_body(video_id);

        tracing::debug!(
            "Player request for {} as {} {}",
            video_id,
            self.client.client_name,
            self.client.client_version
        );

        self.fetcher.post_json(&url, &body, cookie).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_body_shape() {
        let config = TranscriptConfig::default();
        let fetcher = Arc::new(PageFetcher::new(
            Arc::new(reqwest::Client::new()),
            &config,
        ));
        let client = InnertubeClient::new(fetcher, &config);

        let body = client.player_body("dQw4w9WgXcQ");
        assert_eq!(body["videoId"], "dQw4w9WgXcQ");
        assert_eq!(body["context"]["client"]["clientName"], "ANDROID");
        assert_eq!(body["context"]["client"]["clientVersion"], "20.10.38");
    }
}
