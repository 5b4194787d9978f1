//! Synchronous wrappers around [`TranscriptApi`].
//!
//! Each call builds and tears down its own multi-thread runtime, so these
//! must not be called from inside an async context.

use tokio::runtime::{Builder, Runtime};

use crate::{
    common::{errors::Result, types::Transcript},
    configs::TranscriptConfig,
    formatters::{JsonFormatter, TranscriptFormatter},
    youtube::TranscriptApi,
};

fn runtime() -> Result<Runtime> {
    Ok(Builder::new_multi_thread().enable_all().build()?)
}

pub fn get_transcripts<S: AsRef<str>>(
    video: &str,
    language_codes: &[S],
    preserve_formatting: bool,
) -> Result<Vec<Transcript>> {
    get_transcripts_with_config(
        TranscriptConfig::default(),
        video,
        language_codes,
        preserve_formatting,
    )
}

pub fn get_transcripts_with_config<S: AsRef<str>>(
    config: TranscriptConfig,
    video: &str,
    language_codes: &[S],
    preserve_formatting: bool,
) -> Result<Vec<Transcript>> {
    let rt = runtime()?;
    rt.block_on(async {
        let api = TranscriptApi::new(config)?;
        api.get_transcripts(video, language_codes, preserve_formatting)
            .await
    })
}

/// Renders the transcripts as a JSON array.
pub fn get_formatted_transcripts<S: AsRef<str>>(
    video: &str,
    language_codes: &[S],
    preserve_formatting: bool,
) -> Result<String> {
    get_formatted_transcripts_with(
        video,
        language_codes,
        preserve_formatting,
        &JsonFormatter::default(),
    )
}

pub fn get_formatted_transcripts_with<S: AsRef<str>>(
    video: &str,
    language_codes: &[S],
    preserve_formatting: bool,
    formatter: &dyn TranscriptFormatter,
) -> Result<String> {
    let transcripts = get_transcripts(video, language_codes, preserve_formatting)?;
    formatter.format(&transcripts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::TranscriptError;

    #[test]
    fn test_unreachable_host_is_terminal() {
        let config = TranscriptConfig {
            base_url: "http://127.0.0.1:1".into(),
            retry_attempts: 1,
            retry_delay_ms: 1,
            ..Default::default()
        };
        let err = get_transcripts_with_config(config, "abc", &["en"], false).unwrap_err();
        assert!(matches!(err, TranscriptError::FetchExhausted { attempts: 1, .. }));
    }
}
