//! Abstract extraction from `efetch` PubMed XML.
//!
//! The whole `PubmedArticleSet` is read once into an [`ArticleSet`] keyed by
//! each article's own PMID, so per-record lookups never re-scan the document.

use std::collections::HashMap;

use quick_xml::Reader;
use quick_xml::events::Event;
use tracing::debug;

use super::Pmid;

pub const NO_ABSTRACT: &str = "(No abstract)";

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("malformed XML at byte {position}: {message}")]
    Malformed { position: u64, message: String },

    #[error("document has no root element")]
    Empty,

    #[error("document ended with {0} unclosed element(s)")]
    Truncated(usize),
}

/// Abstract fragments for every article in one `efetch` response.
#[derive(Debug, Default)]
pub struct ArticleSet {
    abstracts: HashMap<Pmid, Vec<String>>,
}

struct ArticleEntry {
    depth: usize,
    pmid: Option<String>,
    fragments: Vec<String>,
}

impl ArticleSet {
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut set = Self::default();
        let mut depth = 0usize;
        let mut saw_root = false;
        let mut current: Option<ArticleEntry> = None;
        // Depth of the open <PMID>/<Abstract> element inside the current article.
        let mut pmid_depth: Option<usize> = None;
        let mut pmid_text = String::new();
        let mut abstract_depth: Option<usize> = None;

        loop {
            let event = reader.read_event().map_err(|e| DocumentError::Malformed {
                position: reader.buffer_position(),
                message: e.to_string(),
            })?;

            let text = match event {
                Event::Start(e) => {
                    depth += 1;
                    saw_root = true;
                    let name = e.local_name();
                    match (name.as_ref(), current.as_ref()) {
                        (b"PubmedArticle" | b"PubmedBookArticle", None) => {
                            current = Some(ArticleEntry {
                                depth,
                                pmid: None,
                                fragments: Vec::new(),
                            });
                        }
                        // The first PMID is the article's own; later ones are citations.
                        (b"PMID", Some(entry)) if entry.pmid.is_none() && pmid_depth.is_none() => {
                            pmid_depth = Some(depth);
                            pmid_text.clear();
                        }
                        (b"Abstract", Some(_)) if abstract_depth.is_none() => {
                            abstract_depth = Some(depth);
                        }
                        _ => {}
                    }
                    continue;
                }
                Event::End(_) => {
                    if pmid_depth == Some(depth) {
                        pmid_depth = None;
                        if let Some(entry) = current.as_mut() {
                            entry.pmid = Some(pmid_text.trim().to_string());
                        }
                    }
                    if abstract_depth == Some(depth) {
                        abstract_depth = None;
                    }
                    if current.as_ref().is_some_and(|entry| entry.depth == depth)
                        && let Some(entry) = current.take()
                    {
                        set.insert(entry);
                    }
                    depth = depth.saturating_sub(1);
                    continue;
                }
                Event::Empty(_) => {
                    saw_root = true;
                    continue;
                }
                Event::Text(t) => t
                    .unescape()
                    .map_err(|e| DocumentError::Malformed {
                        position: reader.buffer_position(),
                        message: e.to_string(),
                    })?
                    .into_owned(),
                Event::CData(c) => String::from_utf8_lossy(&c.into_inner()).into_owned(),
                Event::Eof => break,
                _ => continue,
            };

            if pmid_depth.is_some() {
                pmid_text.push_str(&text);
            } else if abstract_depth.is_some()
                && let Some(entry) = current.as_mut()
            {
                let fragment = text.trim();
                if !fragment.is_empty() {
                    entry.fragments.push(fragment.to_string());
                }
            }
        }

        if depth > 0 {
            return Err(DocumentError::Truncated(depth));
        }
        if !saw_root {
            return Err(DocumentError::Empty);
        }

        debug!(articles = set.abstracts.len(), "parsed efetch document");
        Ok(set)
    }

    fn insert(&mut self, entry: ArticleEntry) {
        match entry.pmid {
            Some(pmid) if !pmid.is_empty() => {
                self.abstracts.entry(pmid).or_insert(entry.fragments);
            }
            _ => debug!("skipping article without PMID"),
        }
    }

    pub fn len(&self) -> usize {
        self.abstracts.len()
    }

    pub fn contains(&self, pmid: &str) -> bool {
        self.abstracts.contains_key(pmid)
    }

    /// The article's abstract fragments joined by single spaces, or
    /// [`NO_ABSTRACT`] when the article or its abstract is missing.
    pub fn abstract_for(&self, pmid: &str) -> String {
        match self.abstracts.get(pmid) {
            Some(fragments) if !fragments.is_empty() => fragments.join(" "),
            _ => NO_ABSTRACT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(pmid: &str, body: &str) -> String {
        format!(
            "<PubmedArticle><MedlineCitation Status=\"MEDLINE\">\
             <PMID Version=\"1\">{pmid}</PMID><Article>{body}</Article>\
             </MedlineCitation></PubmedArticle>"
        )
    }

    fn document(articles: &[String]) -> String {
        format!(
            "<?xml version=\"1.0\" ?>\n\
             <!DOCTYPE PubmedArticleSet PUBLIC \"-//NLM//DTD PubMedArticle, 1st January 2024//EN\" \
             \"https://dtd.nlm.nih.gov/ncbi/pubmed/out/pubmed_240101.dtd\">\n\
             <PubmedArticleSet>\n{}\n</PubmedArticleSet>",
            articles.join("\n")
        )
    }

    #[test]
    fn joins_structured_abstract_fragments() {
        let xml = document(&[
            article("100", "<ArticleTitle>No abstract here</ArticleTitle>"),
            article(
                "200",
                "<Abstract>\n  <AbstractText Label=\"BACKGROUND\">A.</AbstractText>\n  \
                 <AbstractText Label=\"METHODS\">B.</AbstractText>\n  \
                 <AbstractText Label=\"RESULTS\">C.</AbstractText>\n</Abstract>",
            ),
            article("300", "<ArticleTitle>Also none</ArticleTitle>"),
        ]);

        let set = ArticleSet::parse(&xml).unwrap();

        assert_eq!(set.len(), 3);
        assert_eq!(set.abstract_for("200"), "A. B. C.");
        assert_eq!(set.abstract_for("100"), NO_ABSTRACT);
        assert_eq!(set.abstract_for("300"), NO_ABSTRACT);
    }

    #[test]
    fn missing_pmid_yields_placeholder() {
        let xml = document(&[article(
            "100",
            "<Abstract><AbstractText>Text.</AbstractText></Abstract>",
        )]);

        let set = ArticleSet::parse(&xml).unwrap();

        assert!(!set.contains("999"));
        assert_eq!(set.abstract_for("999"), NO_ABSTRACT);
    }

    #[test]
    fn includes_inline_markup_and_unescapes_entities() {
        let xml = document(&[article(
            "100",
            "<Abstract><AbstractText>Levels of <i>TNF-&#945;</i> were &lt; 5 &amp; stable.\
             </AbstractText><CopyrightInformation>© 2024 Authors.</CopyrightInformation>\
             </Abstract>",
        )]);

        let set = ArticleSet::parse(&xml).unwrap();

        assert_eq!(
            set.abstract_for("100"),
            "Levels of TNF-α were < 5 & stable. © 2024 Authors."
        );
    }

    #[test]
    fn citation_pmids_do_not_claim_the_article() {
        let xml = document(&[article(
            "100",
            "<Abstract><AbstractText>Own abstract.</AbstractText></Abstract>\
             <CommentsCorrectionsList><CommentsCorrections RefType=\"CommentOn\">\
             <PMID Version=\"1\">555</PMID></CommentsCorrections></CommentsCorrectionsList>",
        )]);

        let set = ArticleSet::parse(&xml).unwrap();

        assert_eq!(set.abstract_for("100"), "Own abstract.");
        assert!(!set.contains("555"));
    }

    #[test]
    fn other_abstract_is_excluded() {
        let xml = document(&[article(
            "100",
            "<Abstract><AbstractText>English.</AbstractText></Abstract>\
             <OtherAbstract Type=\"Publisher\" Language=\"spa\">\
             <AbstractText>Español.</AbstractText></OtherAbstract>",
        )]);

        let set = ArticleSet::parse(&xml).unwrap();

        assert_eq!(set.abstract_for("100"), "English.");
    }

    #[test]
    fn reads_book_articles() {
        let xml = document(&[
            "<PubmedBookArticle><BookDocument><PMID Version=\"1\">700</PMID>\
             <Abstract><AbstractText>Chapter summary.</AbstractText></Abstract>\
             </BookDocument></PubmedBookArticle>"
                .to_string(),
        ]);

        let set = ArticleSet::parse(&xml).unwrap();

        assert_eq!(set.abstract_for("700"), "Chapter summary.");
    }

    #[test]
    fn empty_article_set_is_valid() {
        let set = ArticleSet::parse("<PubmedArticleSet></PubmedArticleSet>").unwrap();
        assert_eq!(set.len(), 0);

        let set = ArticleSet::parse("<PubmedArticleSet/>").unwrap();
        assert_eq!(set.len(), 0);
    }

    #[test]
    fn mismatched_tags_are_malformed() {
        let result =
            ArticleSet::parse("<PubmedArticleSet><PubmedArticle></Wrong></PubmedArticleSet>");
        assert!(matches!(result, Err(DocumentError::Malformed { .. })));
    }

    #[test]
    fn truncated_document_is_rejected() {
        let result = ArticleSet::parse("<PubmedArticleSet><PubmedArticle><MedlineCitation>");
        assert!(matches!(
            result,
            Err(DocumentError::Truncated(_) | DocumentError::Malformed { .. })
        ));
    }

    #[test]
    fn empty_body_is_rejected() {
        assert!(matches!(ArticleSet::parse(""), Err(DocumentError::Empty)));
        assert!(matches!(
            ArticleSet::parse("<?xml version=\"1.0\" ?>\n"),
            Err(DocumentError::Empty)
        ));
    }
}
