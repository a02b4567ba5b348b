//! Per-record translation and summarization with fail-soft placeholders.
//!
//! Every enrichment call resolves to an [`Enriched`] value: a generator error
//! is logged and replaced by a [`Placeholder`], never returned to the caller,
//! so one bad record cannot abort a batch.

mod lang;

pub use lang::Lang;

use std::fmt;

use tracing::{debug, warn};

use crate::eutils::NO_ABSTRACT;
use crate::gemini::TextGenerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    NoTranslation,
    TranslationFailed,
    NoSummary,
    SummaryFailed,
}

impl Placeholder {
    pub fn as_str(self) -> &'static str {
        match self {
            Placeholder::NoTranslation => "(no translation)",
            Placeholder::TranslationFailed => "(translation failed)",
            Placeholder::NoSummary => "(no summary)",
            Placeholder::SummaryFailed => "(summary failed)",
        }
    }
}

/// Outcome of one enrichment call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Enriched {
    Generated(String),
    Degraded(Placeholder),
}

impl Enriched {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Enriched::Degraded(_))
    }

    pub fn into_text(self) -> String {
        match self {
            Enriched::Generated(text) => text,
            Enriched::Degraded(placeholder) => placeholder.as_str().to_string(),
        }
    }
}

impl fmt::Display for Enriched {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Enriched::Generated(text) => f.write_str(text),
            Enriched::Degraded(placeholder) => f.write_str(placeholder.as_str()),
        }
    }
}

#[derive(Clone, Copy)]
enum Task {
    Translate,
    Summarize,
}

impl Task {
    fn name(self) -> &'static str {
        match self {
            Task::Translate => "translate",
            Task::Summarize => "summarize",
        }
    }

    fn prompt(self, lang: Lang, text: &str) -> String {
        match self {
            Task::Translate => lang.translate_prompt(text),
            Task::Summarize => lang.summarize_prompt(text),
        }
    }

    fn skipped(self) -> Placeholder {
        match self {
            Task::Translate => Placeholder::NoTranslation,
            Task::Summarize => Placeholder::NoSummary,
        }
    }

    fn failed(self) -> Placeholder {
        match self {
            Task::Translate => Placeholder::TranslationFailed,
            Task::Summarize => Placeholder::SummaryFailed,
        }
    }
}

/// Translate/summarize operations over a [`TextGenerator`].
pub struct Enricher<G> {
    generator: G,
    lang: Lang,
}

impl<G: TextGenerator> Enricher<G> {
    pub fn new(generator: G, lang: Lang) -> Self {
        Self { generator, lang }
    }

    /// Full translation into the target language.
    pub async fn translate(&self, text: &str) -> Enriched {
        self.run(Task::Translate, text).await
    }

    /// Short (about 100 characters) summary in the target language.
    pub async fn summarize(&self, text: &str) -> Enriched {
        self.run(Task::Summarize, text).await
    }

    async fn run(&self, task: Task, text: &str) -> Enriched {
        let text = text.trim();
        if text.is_empty() || text == NO_ABSTRACT {
            return Enriched::Degraded(task.skipped());
        }

        match self.generator.generate(&task.prompt(self.lang, text)).await {
            Ok(output) => {
                debug!(task = task.name(), chars = output.chars().count(), "enrichment complete");
                Enriched::Generated(output.trim().to_string())
            }
            Err(e) => {
                warn!(task = task.name(), error = %e, "enrichment failed, using placeholder");
                Enriched::Degraded(task.failed())
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MockGenerator;
    use super::*;
    use crate::gemini::client::GeminiError;

    #[tokio::test]
    async fn translate_skips_generator_for_missing_abstract() {
        let mock = MockGenerator::always_ok();
        let enricher = Enricher::new(&mock, Lang::Ja);

        assert_eq!(
            enricher.translate("").await,
            Enriched::Degraded(Placeholder::NoTranslation)
        );
        assert_eq!(
            enricher.translate(NO_ABSTRACT).await,
            Enriched::Degraded(Placeholder::NoTranslation)
        );
        assert_eq!(
            enricher.translate("  (No abstract) \n").await,
            Enriched::Degraded(Placeholder::NoTranslation)
        );
        assert!(mock.captured_prompts().is_empty());
    }

    #[tokio::test]
    async fn summarize_skips_generator_for_missing_abstract() {
        let mock = MockGenerator::always_ok();
        let enricher = Enricher::new(&mock, Lang::Ja);

        assert_eq!(
            enricher.summarize("   ").await,
            Enriched::Degraded(Placeholder::NoSummary)
        );
        assert!(mock.captured_prompts().is_empty());
    }

    #[tokio::test]
    async fn translate_returns_trimmed_generated_text() {
        let mock = MockGenerator::scripted(vec![Ok("  インスリン抵抗性。 \n".into())]);
        let enricher = Enricher::new(&mock, Lang::Ja);

        let result = enricher.translate("Insulin resistance.").await;

        assert_eq!(result, Enriched::Generated("インスリン抵抗性。".into()));
        let prompts = mock.captured_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].ends_with("Insulin resistance."));
    }

    #[tokio::test]
    async fn generator_failure_degrades_to_failure_placeholder() {
        let mock = MockGenerator::scripted(vec![
            Err(GeminiError::RateLimited),
            Err(GeminiError::EmptyResponse("SAFETY".into())),
        ]);
        let enricher = Enricher::new(&mock, Lang::En);

        assert_eq!(
            enricher.summarize("Abstract.").await,
            Enriched::Degraded(Placeholder::SummaryFailed)
        );
        assert_eq!(
            enricher.translate("Abstract.").await,
            Enriched::Degraded(Placeholder::TranslationFailed)
        );
    }

    #[tokio::test]
    async fn summarize_uses_language_specific_prompt() {
        let mock = MockGenerator::always_ok();
        let enricher = Enricher::new(&mock, Lang::En);

        enricher.summarize("Abstract.").await;

        assert!(mock.captured_prompts()[0].contains("in English"));
    }

    #[test]
    fn degraded_text_is_the_placeholder() {
        assert_eq!(
            Enriched::Degraded(Placeholder::TranslationFailed).into_text(),
            "(translation failed)"
        );
        assert_eq!(Enriched::Generated("ok".into()).to_string(), "ok");
        assert!(Enriched::Degraded(Placeholder::NoSummary).is_degraded());
    }
}
