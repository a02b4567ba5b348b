/// Ordered, non-blank keyword list combined with OR into one PubMed term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    keywords: Vec<String>,
}

impl Query {
    /// Trims each keyword and drops blank ones, keeping input order.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords }
    }

    /// Splits free-form input on whitespace, one keyword per word.
    pub fn from_text(text: &str) -> Self {
        Self::new(text.split_whitespace())
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// `(k1) OR (k2) OR ...`
    pub fn to_term(&self) -> String {
        self.keywords
            .iter()
            .map(|k| format!("({k})"))
            .collect::<Vec<_>>()
            .join(" OR ")
    }
}
