use std::time::Duration;

use reqwest::{
  Client,
  header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue},
};

use crate::{
  common::errors::{Result, TranscriptError},
  configs::TranscriptConfig,
};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36";

pub struct HttpClient;

impl HttpClient {
  pub fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
  }

  /// Builds the single pooled client shared by every request of a
  /// `TranscriptApi`.
  ///
  /// The idle pool is bounded per host so a wide track fan-out reuses
  /// sockets instead of opening one per task. No cookie store is enabled;
  /// the consent cookie is attached per request.
  pub fn new(config: &TranscriptConfig) -> Result<Client> {
    let accept_language = HeaderValue::from_str(&config.accept_language).map_err(|e| {
      TranscriptError::Config(format!(
        "accept_language {:?} is not a valid header value: {}",
        config.accept_language, e
      ))
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_LANGUAGE, accept_language);

    let client = Client::builder()
      .user_agent(config.user_agent.clone())
      .default_headers(headers)
      .timeout(Duration::from_secs(config.request_timeout_secs))
      .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
      .tcp_nodelay(true)
      .pool_max_idle_per_host(config.pool_max_idle_per_host)
      .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
      .build()?;

    Ok(client)
  }
}
