//! Search → summary/fetch → per-record enrichment.
//!
//! One run walks Searching → Fetching-Batch-Metadata → Per-Identifier-Enriching
//! → Done. Nothing survives a run; every call to [`Pipeline::run`] starts fresh.

pub mod format;
mod query;

pub use query::Query;

use std::time::Duration;

use futures::future::try_join;
use serde::Serialize;
use tracing::{debug, info};

use crate::enrich::Enricher;
use crate::eutils::{ArticleSet, EutilsClient, EutilsError, Summaries};
use crate::gemini::TextGenerator;

const PUBMED_WEB: &str = "https://pubmed.ncbi.nlm.nih.gov";
pub const DEFAULT_RETMAX: u32 = 4;
/// Pause between records so the enrichment service is not hammered.
pub const DEFAULT_RECORD_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("search failed: {0}")]
    Search(#[source] EutilsError),

    #[error("summary fetch failed: {0}")]
    Summary(#[source] EutilsError),

    #[error("document fetch failed: {0}")]
    Document(#[source] EutilsError),
}

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub retstart: u32,
    pub retmax: u32,
    pub record_delay: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            retstart: 0,
            retmax: DEFAULT_RETMAX,
            record_delay: DEFAULT_RECORD_DELAY,
        }
    }
}

/// One enriched article. `authors` holds the first author as reported by esummary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub pmid: String,
    pub title: String,
    pub authors: String,
    pub url: String,
    pub translated_abstract: String,
    pub ai_summary: String,
}

pub struct Pipeline<G> {
    eutils: EutilsClient,
    enricher: Enricher<G>,
    options: PipelineOptions,
}

impl<G: TextGenerator> Pipeline<G> {
    pub fn new(eutils: EutilsClient, enricher: Enricher<G>, options: PipelineOptions) -> Self {
        Self {
            eutils,
            enricher,
            options,
        }
    }

    /// Runs the pipeline for `keywords`. Blank or missing keywords return an
    /// empty list without touching the network.
    pub async fn run<S: AsRef<str>>(&self, keywords: &[S]) -> Result<Vec<Record>, PipelineError> {
        self.run_query(&Query::new(keywords)).await
    }

    pub async fn run_query(&self, query: &Query) -> Result<Vec<Record>, PipelineError> {
        if query.is_empty() {
            debug!("empty query, skipping search");
            return Ok(Vec::new());
        }

        let term = query.to_term();
        info!(%term, retstart = self.options.retstart, retmax = self.options.retmax, "searching PubMed");

        let pmids = self
            .eutils
            .search(&term, self.options.retstart, self.options.retmax)
            .await
            .map_err(PipelineError::Search)?;

        if pmids.is_empty() {
            info!("no matching articles");
            return Ok(Vec::new());
        }
        info!(pmids = pmids.len(), "search complete, fetching summaries and abstracts");

        let (summaries, articles) = try_join(
            async {
                self.eutils
                    .summaries(&pmids)
                    .await
                    .map_err(PipelineError::Summary)
            },
            async {
                self.eutils
                    .documents(&pmids)
                    .await
                    .map_err(PipelineError::Document)
            },
        )
        .await?;

        let mut records = Vec::with_capacity(pmids.len());
        for (i, pmid) in pmids.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.options.record_delay).await;
            }
            records.push(self.assemble(pmid, &summaries, &articles).await);
        }

        info!(records = records.len(), "pipeline complete");
        Ok(records)
    }

    async fn assemble(&self, pmid: &str, summaries: &Summaries, articles: &ArticleSet) -> Record {
        let summary = summaries.lookup(pmid);
        let abstract_text = articles.abstract_for(pmid);

        let ai_summary = self.enricher.summarize(&abstract_text).await;
        let translated = self.enricher.translate(&abstract_text).await;

        debug!(
            pmid,
            in_document = articles.contains(pmid),
            summary_degraded = ai_summary.is_degraded(),
            translation_degraded = translated.is_degraded(),
            "record assembled"
        );

        Record {
            pmid: pmid.to_string(),
            title: summary.title,
            authors: summary.first_author,
            url: record_url(pmid),
            translated_abstract: translated.into_text(),
            ai_summary: ai_summary.into_text(),
        }
    }
}

fn record_url(pmid: &str) -> String {
    format!("{PUBMED_WEB}/{pmid}/")
}
