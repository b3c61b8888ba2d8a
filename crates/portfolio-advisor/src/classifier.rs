//! Intent Classification
//!
//! Routes a question to a specialist. The model is asked for a single label;
//! any transport failure or unexpected answer falls back to keyword scoring,
//! so classification itself never fails.

use std::sync::Arc;

use agent_core::{CompletionRequest, LlmProvider, Message, Result as CoreResult};
use tracing::{info, warn};

use crate::model::Intent;

const CLASSIFIER_PROMPT: &str = "You are a question classifier for an investment app. \
The user asks questions in German or English. \
Classify the question into exactly ONE category:\n\
- 'research': questions about specific stocks, fundamentals, buy/sell/hold, analysis, valuation, price targets\n\
- 'news': questions about current news, events, what happened today or recently\n\
- 'portfolio': questions about the user's portfolio, positions, returns, risk, diversification, rebalancing\n\
- 'multi': complex questions that need several specialists\n\n\
Answer ONLY with the category word, nothing else.";

const NEWS_KEYWORDS: &[&str] = &[
    "news",
    "nachrichten",
    "aktuell",
    "heute",
    "kuerzlich",
    "headline",
    "schlagzeile",
    "ereignis",
    "quartals",
    "meldung",
];

const PORTFOLIO_KEYWORDS: &[&str] = &[
    "portfolio",
    "positionen",
    "rendite",
    "performance",
    "konzentration",
    "diversifik",
    "rebalancing",
    "allokation",
    "meine aktien",
    "mein depot",
    "holdings",
    "risiko meines",
];

const RESEARCH_KEYWORDS: &[&str] = &[
    "kaufen",
    "verkaufen",
    "halten",
    "kursziel",
    "analyse",
    "bewertung",
    "fundamental",
    "soll ich",
    "lohnt sich",
    "unterbewertet",
    "ueberbewertet",
    "buy",
    "sell",
    "hold",
];

/// Number of keywords of `set` contained in `text`
fn score(text: &str, set: &[&str]) -> usize {
    set.iter().filter(|keyword| text.contains(*keyword)).count()
}

/// Deterministic keyword classification (German + English).
///
/// Highest count wins; ties resolve news, then portfolio, then research.
/// No match at all means research.
pub fn keyword_classify(question: &str) -> Intent {
    let text = question.to_lowercase();
    let news = score(&text, NEWS_KEYWORDS);
    let portfolio = score(&text, PORTFOLIO_KEYWORDS);
    let research = score(&text, RESEARCH_KEYWORDS);

    let best = news.max(portfolio).max(research);
    if best == 0 {
        Intent::Research
    } else if news == best {
        Intent::News
    } else if portfolio == best {
        Intent::Portfolio
    } else {
        Intent::Research
    }
}

/// Parse a model answer such as `"Portfolio."` or `'news'`
pub fn parse_label(raw: &str) -> Option<Intent> {
    let label = raw
        .trim()
        .trim_matches(|c: char| c == '\'' || c == '"' || c == '`')
        .trim_end_matches('.')
        .trim();
    label.parse().ok()
}

pub struct IntentClassifier {
    provider: Arc<dyn LlmProvider>,
    model: String,
}

impl IntentClassifier {
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Classify a question, optionally with a per-request model. The result
    /// may be `Multi`; callers dispatch through [`Intent::resolve`].
    pub async fn classify(&self, question: &str, model: Option<&str>) -> Intent {
        match self.classify_remote(question, model.unwrap_or(&self.model)).await {
            Ok(Some(intent)) => {
                info!(intent = %intent, "Classified intent");
                intent
            }
            Ok(None) => {
                let intent = keyword_classify(question);
                warn!(fallback = %intent, "Unrecognized classifier label, using keywords");
                intent
            }
            Err(e) => {
                let intent = keyword_classify(question);
                warn!(error = %e, fallback = %intent, "Classifier request failed, using keywords");
                intent
            }
        }
    }

    async fn classify_remote(&self, question: &str, model: &str) -> CoreResult<Option<Intent>> {
        let request = CompletionRequest::new(
            model,
            vec![Message::system(CLASSIFIER_PROMPT), Message::user(question)],
        )
        .with_temperature(0.0)
        .with_max_tokens(10);

        let completion = self.provider.complete(&request).await?;
        Ok(completion.content.as_deref().and_then(parse_label))
    }
}
