use std::sync::Arc;

use tokio::time::Instant;

pub mod extractor;
pub mod fetcher;
pub mod innertube;
pub mod parser;
pub mod processor;
pub mod selector;
pub mod utils;

use extractor::{PageExtractor, extract_catalog};
use fetcher::PageFetcher;
use innertube::InnertubeClient;
use parser::TranscriptParser;
use processor::TrackProcessor;
use selector::select_tracks;
pub use utils::sanitize_video_id;

use crate::{
    common::{
        HttpClient,
        errors::{Result, TranscriptError},
        types::Transcript,
    },
    configs::TranscriptConfig,
    formatters::{JsonFormatter, TranscriptFormatter},
};

/// Entry point for transcript retrieval.
///
/// Cheap to share: one pooled HTTP client and one parser serve every call.
pub struct TranscriptApi {
    config: TranscriptConfig,
    fetcher: Arc<PageFetcher>,
    extractor: PageExtractor,
    innertube: InnertubeClient,
    processor: TrackProcessor,
}

impl TranscriptApi {
    pub fn new(config: TranscriptConfig) -> Result<Self> {
        Self::with_parser(config, TranscriptParser::new())
    }

    pub fn with_parser(config: TranscriptConfig, parser: TranscriptParser) -> Result<Self> {
        let http = Arc::new(HttpClient::new(&config)?);
        let fetcher = Arc::new(PageFetcher::new(http, &config));
        let innertube = InnertubeClient::new(fetcher.clone(), &config);
        let processor = TrackProcessor::new(fetcher.clone(), Arc::new(parser));

        Ok(Self {
            config,
            fetcher,
            extractor: PageExtractor::new(),
            innertube,
            processor,
        })
    }

    /// Retrieves one transcript per selected caption track under the
    /// configured deadline.
    ///
    /// Empty `language_codes` selects every track. Transcript order is not
    /// tied to track order.
    pub async fn get_transcripts<S: AsRef<str>>(
        &self,
        video: &str,
        language_codes: &[S],
        preserve_formatting: bool,
    ) -> Result<Vec<Transcript>> {
        let deadline = Instant::now() + self.config.timeout();
        self.get_transcripts_with_deadline(video, language_codes, preserve_formatting, deadline)
            .await
    }

    /// Like [`get_transcripts`](Self::get_transcripts) with a caller-chosen
    /// deadline. Expiry aborts every in-flight request of the call.
    pub async fn get_transcripts_with_deadline<S: AsRef<str>>(
        &self,
        video: &str,
        language_codes: &[S],
        preserve_formatting: bool,
        deadline: Instant,
    ) -> Result<Vec<Transcript>> {
        let started = Instant::now();
        match tokio::time::timeout_at(
            deadline,
            self.retrieve(video, language_codes, preserve_formatting),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => {
                let after = started.elapsed();
                tracing::warn!("Transcript retrieval for {} timed out after {:?}", video, after);
                Err(TranscriptError::Timeout { after })
            }
        }
    }

    /// Retrieves transcripts and renders them as a JSON array.
    pub async fn get_formatted_transcripts<S: AsRef<str>>(
        &self,
        video: &str,
        language_codes: &[S],
        preserve_formatting: bool,
    ) -> Result<String> {
        self.get_formatted_transcripts_with(
            video,
            language_codes,
            preserve_formatting,
            &JsonFormatter::default(),
        )
        .await
    }

    /// Retrieves transcripts and renders them with `formatter`.
    pub async fn get_formatted_transcripts_with<S: AsRef<str>>(
        &self,
        video: &str,
        language_codes: &[S],
        preserve_formatting: bool,
        formatter: &dyn TranscriptFormatter,
    ) -> Result<String> {
        let transcripts = self
            .get_transcripts(video, language_codes, preserve_formatting)
            .await?;
        formatter.format(&transcripts)
    }

    async fn retrieve<S: AsRef<str>>(
        &self,
        video: &str,
        language_codes: &[S],
        preserve_formatting: bool,
    ) -> Result<Vec<Transcript>> {
        let video_id = sanitize_video_id(video);
        tracing::debug!("Retrieving transcripts for {}", video_id);

        let page = self
            .fetcher
            .fetch(&self.config.watch_url(&video_id), None)
            .await?;

        let api_key = self.extractor.extract_api_key(&page.body);
        if api_key.is_empty() {
            tracing::warn!("No player API key found on the watch page of {}", video_id);
        }
        let title = self.extractor.extract_title(&page.body);

        let player = self
            .innertube
            .fetch_catalog(&video_id, &api_key, page.cookie.clone())
            .await?;
        let cookie = player.cookie.or(page.cookie);

        let data = extract_catalog(&video_id, &player.body, title)?;
        let tracks = select_tracks(&video_id, data.catalog, language_codes)?;

        tracing::debug!("Selected {} track(s) for {}", tracks.len(), video_id);

        self.processor
            .process(&video_id, tracks, &data.title, preserve_formatting, cookie)
            .await
    }
}
