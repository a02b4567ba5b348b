use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::Pmid;

pub const NO_TITLE: &str = "(No title)";
pub const UNKNOWN_AUTHOR: &str = "(Unknown)";

/// Response from `esearch.fcgi?retmode=json`.
#[derive(Deserialize, Debug)]
pub struct ESearchResponse {
    pub esearchresult: ESearchResult,
}

#[derive(Deserialize, Debug)]
pub struct ESearchResult {
    #[serde(default)]
    pub idlist: Vec<Pmid>,
    pub count: Option<String>,
    /// Set by NCBI when the query itself was rejected.
    #[serde(rename = "ERROR")]
    pub error: Option<String>,
}

/// Title and first author for one PMID from `esummary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleSummary {
    pub title: String,
    pub first_author: String,
}

impl Default for ArticleSummary {
    fn default() -> Self {
        Self {
            title: NO_TITLE.to_string(),
            first_author: UNKNOWN_AUTHOR.to_string(),
        }
    }
}

/// PMID → summary mapping. Lookups never fail; absent entries read as defaults.
#[derive(Debug, Default)]
pub struct Summaries {
    entries: HashMap<Pmid, ArticleSummary>,
}

impl Summaries {
    /// Builds summaries for `pmids` out of an `esummary` JSON body.
    /// Entries that are missing or not shaped like a document summary are skipped.
    pub fn from_json(body: &Value, pmids: &[Pmid]) -> Self {
        let Some(result) = body.get("result").and_then(Value::as_object) else {
            warn!("esummary response has no result object, using defaults");
            return Self::default();
        };

        let entries = pmids
            .iter()
            .filter_map(|pmid| {
                let doc = result.get(pmid)?.as_object()?;
                let field = |name: &str, default: &str| {
                    doc.get(name)
                        .and_then(Value::as_str)
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .unwrap_or(default)
                        .to_string()
                };
                let summary = ArticleSummary {
                    title: field("title", NO_TITLE),
                    first_author: field("sortfirstauthor", UNKNOWN_AUTHOR),
                };
                Some((pmid.clone(), summary))
            })
            .collect();

        Self { entries }
    }

    pub fn lookup(&self, pmid: &str) -> ArticleSummary {
        self.entries.get(pmid).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
