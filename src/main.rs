use std::process::ExitCode;

use captionlink::{
    TranscriptApi,
    common::logger,
    configs::Config,
    formatters::{JsonFormatter, SrtFormatter, TextFormatter, TranscriptFormatter, WebVttFormatter},
};
use clap::{Parser, ValueEnum};
use tracing::error;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_COMMIT"),
    "@",
    env!("GIT_BRANCH"),
    ")"
);

#[derive(Parser, Debug)]
#[command(
    name = "captionlink",
    version = VERSION,
    about = "Fetch YouTube transcripts through the internal player API"
)]
struct Args {
    /// Video ID, watch URL or youtu.be link
    video: String,

    /// Language codes, comma separated; all tracks when omitted
    #[arg(value_delimiter = ',')]
    languages: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    /// Keep inline formatting tags such as <b> and <i>
    #[arg(long)]
    preserve_formatting: bool,
}

impl Args {
    fn language_codes(&self) -> Vec<String> {
        self.languages
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    #[value(alias = "txt")]
    Text,
    Srt,
    #[value(alias = "webvtt")]
    Vtt,
}

impl OutputFormat {
    fn formatter(self) -> Box<dyn TranscriptFormatter> {
        match self {
            Self::Json => Box::new(JsonFormatter::default()),
            Self::Text => Box::new(TextFormatter),
            Self::Srt => Box::new(SrtFormatter),
            Self::Vtt => Box::new(WebVttFormatter),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };
    logger::init(config.logging.as_ref());

    let api = match TranscriptApi::new(config.transcript) {
        Ok(api) => api,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let formatter = args.format.formatter();
    match api
        .get_formatted_transcripts_with(
            &args.video,
            args.language_codes().as_slice(),
            args.preserve_formatting,
            formatter.as_ref(),
        )
        .await
    {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Transcript retrieval failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
