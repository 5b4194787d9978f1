use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Network and client-identity settings for transcript retrieval.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TranscriptConfig {
    /// Origin serving `/watch` and `/youtubei/v1/player`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Cookie domain the consent cookie is scoped to.
    #[serde(default = "default_consent_domain")]
    pub consent_domain: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Client identity sent to the player endpoint.
    #[serde(default = "default_client_name")]
    pub client_name: String,
    #[serde(default = "default_client_version")]
    pub client_version: String,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Deadline for a whole retrieval call.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Deadline for a single HTTP request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,
    #[serde(default = "default_pool_idle_timeout_secs")]
    pub pool_idle_timeout_secs: u64,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            consent_domain: default_consent_domain(),
            accept_language: default_accept_language(),
            user_agent: default_user_agent(),
            client_name: default_client_name(),
            client_version: default_client_version(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            timeout_secs: default_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            pool_idle_timeout_secs: default_pool_idle_timeout_secs(),
        }
    }
}

impl TranscriptConfig {
    pub fn watch_url(&self, video_id: &str) -> String {
        format!(
            "{}/watch?v={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(video_id)
        )
    }

    pub fn player_url(&self, api_key: &str) -> String {
        format!(
            "{}/youtubei/v1/player?key={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(api_key)
        )
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// At least one attempt is always made.
    pub fn attempts(&self) -> u32 {
        self.retry_attempts.max(1)
    }
}

fn default_base_url() -> String {
    "https://www.youtube.com".to_string()
}

fn default_consent_domain() -> String {
    ".youtube.com".to_string()
}

fn default_accept_language() -> String {
    "en-US".to_string()
}

fn default_user_agent() -> String {
    crate::common::HttpClient::default_user_agent()
}

fn default_client_name() -> String {
    "ANDROID".to_string()
}

fn default_client_version() -> String {
    "20.10.38".to_string()
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_pool_max_idle_per_host() -> usize {
    16
}

fn default_pool_idle_timeout_secs() -> u64 {
    90
}
