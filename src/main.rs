mod enrich;
mod eutils;
mod gemini;
mod markdown;
mod pipeline;
mod retry;

pub const USER_AGENT: &str = concat!("pubmed-digest/", env!("CARGO_PKG_VERSION"));

use std::time::Duration;

use clap::Parser;
use reqwest::Client;
use tracing::{debug, error, info};

use enrich::{Enricher, Lang};
use eutils::EutilsClient;
use gemini::GeminiClient;
use pipeline::format::format_records;
use pipeline::{DEFAULT_RECORD_DELAY, DEFAULT_RETMAX, Pipeline, PipelineOptions, Query};

/// TCP connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Global HTTP client timeout covering DNS + connect + response body.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 5;

/// Search PubMed and enrich each abstract with a Gemini translation and summary.
///
/// Configuration via environment variables (a `.env` file is honored):
/// - `GEMINI_API_KEY` or `GOOGLE_API_KEY`: required
/// - `GEMINI_MODEL`: model override (default: gemini-2.5-flash)
/// - `NCBI_API_KEY`: optional, raises the E-utilities rate limit
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Search keywords; each word is a separate term, combined with OR
    keywords: Vec<String>,

    /// Offset into the relevance-ranked result list
    #[arg(long, default_value_t = 0)]
    retstart: u32,

    /// Maximum number of articles to process
    #[arg(long, default_value_t = DEFAULT_RETMAX)]
    retmax: u32,

    /// Target language for translations and summaries
    #[arg(long, value_enum, default_value_t = Lang::default())]
    lang: Lang,

    /// Pause between articles, in milliseconds
    #[arg(long, default_value_t = DEFAULT_RECORD_DELAY.as_millis() as u64)]
    delay_ms: u64,

    /// Print records as JSON instead of Markdown
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pubmed_digest=info".parse()?),
        )
        .init();

    if let Ok(path) = dotenv {
        debug!(path = %path.display(), "loaded environment file");
    }

    let cli = Cli::parse();

    let http = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(HTTP_TIMEOUT)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()?;

    let gemini = GeminiClient::from_env(http.clone())
        .inspect_err(|e| error!("cannot start without Gemini credentials: {e}"))?;
    info!(model = gemini.model(), lang = ?cli.lang, "starting pubmed-digest");

    let options = PipelineOptions {
        retstart: cli.retstart,
        retmax: cli.retmax,
        record_delay: Duration::from_millis(cli.delay_ms),
    };
    let pipeline = Pipeline::new(
        EutilsClient::from_env(http),
        Enricher::new(gemini, cli.lang),
        options,
    );

    let query = Query::from_text(&cli.keywords.join(" "));
    let records = pipeline
        .run(query.keywords())
        .await
        .inspect_err(|e| error!("pipeline failed: {e}"))?;

    let output = if cli.json {
        serde_json::to_string_pretty(&records)?
    } else {
        format_records(&records, &query)
    };
    println!("{output}");

    Ok(())
}
