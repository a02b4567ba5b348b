//! NCBI E-utilities client: `esearch`, `esummary` and `efetch` against PubMed.

pub mod articles;
pub mod types;

pub use articles::{ArticleSet, DocumentError, NO_ABSTRACT};
pub use types::Summaries;

use std::env;

use reqwest::Client;
use tracing::{debug, warn};

use crate::retry::with_retry;
use types::ESearchResponse;

const API_BASE: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";
const DATABASE: &str = "pubmed";

/// PubMed identifier as issued by `esearch`.
pub type Pmid = String;

/// Errors returned by E-utilities calls.
#[derive(Debug, thiserror::Error)]
pub enum EutilsError {
    #[error("E-utilities rate limit exceeded. Set NCBI_API_KEY for higher limits.")]
    RateLimited,

    #[error("{endpoint} failed: status {code}")]
    Status { endpoint: &'static str, code: u16 },

    #[error("{endpoint} returned malformed JSON: {source}")]
    Json {
        endpoint: &'static str,
        source: serde_json::Error,
    },

    #[error("search rejected: {0}")]
    Search(String),

    #[error("efetch returned a malformed document: {0}")]
    Document(#[from] DocumentError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// HTTP client for the three PubMed E-utilities endpoints.
///
/// `NCBI_API_KEY` is optional; without it NCBI allows 3 requests per second.
#[derive(Clone)]
pub struct EutilsClient {
    http: Client,
    api_key: Option<String>,
    base_url: String,
}

impl EutilsClient {
    pub fn from_env(http: Client) -> Self {
        let api_key = env::var("NCBI_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        if api_key.is_some() {
            debug!("NCBI API key configured");
        }
        Self {
            http,
            api_key,
            base_url: API_BASE.to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            api_key: None,
            base_url: base_url.to_string(),
        }
    }

    async fn get_text(
        &self,
        endpoint: &'static str,
        params: &[(&str, String)],
    ) -> Result<String, EutilsError> {
        let url = format!("{}/{endpoint}", self.base_url);
        let mut query: Vec<(&str, &str)> = vec![("db", DATABASE)];
        query.extend(params.iter().map(|(k, v)| (*k, v.as_str())));
        if let Some(ref key) = self.api_key {
            query.push(("api_key", key.as_str()));
        }

        let response = self
            .http
            .get(&url)
            .header("User-Agent", crate::USER_AGENT)
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        match status.as_u16() {
            200..=299 => Ok(response.text().await?),
            429 => {
                warn!(endpoint, "E-utilities rate limited");
                Err(EutilsError::RateLimited)
            }
            code => {
                warn!(endpoint, status = %status, "E-utilities error");
                Err(EutilsError::Status { endpoint, code })
            }
        }
    }

    async fn get(
        &self,
        endpoint: &'static str,
        params: &[(&str, String)],
    ) -> Result<String, EutilsError> {
        with_retry(endpoint, is_retriable, || self.get_text(endpoint, params)).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &[(&str, String)],
    ) -> Result<T, EutilsError> {
        let text = self.get(endpoint, params).await?;
        serde_json::from_str(&text).map_err(|source| EutilsError::Json { endpoint, source })
    }

    /// Relevance-ranked PMIDs for `term`, starting at `retstart`, at most `retmax`.
    pub async fn search(
        &self,
        term: &str,
        retstart: u32,
        retmax: u32,
    ) -> Result<Vec<Pmid>, EutilsError> {
        let params = [
            ("retmode", "json".to_string()),
            ("retstart", retstart.to_string()),
            ("retmax", retmax.to_string()),
            ("term", term.to_string()),
            ("sort", "relevance".to_string()),
        ];
        let body: ESearchResponse = self.get_json("esearch.fcgi", &params).await?;
        let result = body.esearchresult;

        if let Some(message) = result.error {
            warn!(%term, %message, "esearch rejected query");
            return Err(EutilsError::Search(message));
        }

        debug!(
            count = result.count.as_deref().unwrap_or("?"),
            returned = result.idlist.len(),
            "esearch complete"
        );
        Ok(result.idlist)
    }

    /// Title and first author for each PMID, in one batched `esummary` call.
    pub async fn summaries(&self, pmids: &[Pmid]) -> Result<Summaries, EutilsError> {
        let params = [("retmode", "json".to_string()), ("id", pmids.join(","))];
        let body: serde_json::Value = self.get_json("esummary.fcgi", &params).await?;
        let summaries = Summaries::from_json(&body, pmids);
        debug!(
            requested = pmids.len(),
            found = summaries.len(),
            "esummary complete"
        );
        Ok(summaries)
    }

    /// Full PubMed XML for each PMID, in one batched `efetch` call.
    pub async fn documents(&self, pmids: &[Pmid]) -> Result<ArticleSet, EutilsError> {
        let params = [("retmode", "xml".to_string()), ("id", pmids.join(","))];
        let xml = self.get("efetch.fcgi", &params).await?;
        let articles = ArticleSet::parse(&xml)?;
        debug!(
            requested = pmids.len(),
            found = articles.len(),
            bytes = xml.len(),
            "efetch complete"
        );
        Ok(articles)
    }
}

fn is_retriable(e: &EutilsError) -> bool {
    matches!(
        e,
        EutilsError::RateLimited
            | EutilsError::Status {
                code: 500..=599,
                ..
            }
    )
}
