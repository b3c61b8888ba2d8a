//! News Search Tool
//!
//! Recent headlines for a ticker with publisher, link, and timestamp.

use std::sync::Arc;

use agent_core::tool::ParameterSchema;
use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};
use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::error;

use super::{or_na, ticker_arg};
use crate::market::{MarketData, NewsArticle};

const NAME: &str = "search_news";
const MAX_ARTICLES: usize = 10;

pub struct NewsSearchTool {
    market: Arc<dyn MarketData>,
}

impl NewsSearchTool {
    pub fn new(market: Arc<dyn MarketData>) -> Self {
        Self { market }
    }
}

fn render(ticker: &str, articles: &[NewsArticle]) -> Value {
    if articles.is_empty() {
        return json!({
            "ticker": ticker,
            "news": [],
            "message": "No recent news found.",
        });
    }

    let items: Vec<Value> = articles
        .iter()
        .take(MAX_ARTICLES)
        .map(|a| {
            json!({
                "title": a.title,
                "publisher": or_na(a.publisher.clone()),
                "link": or_na(a.link.clone()),
                "published": or_na(a.published.map(|p| p.to_rfc3339())),
                "summary": a.summary,
            })
        })
        .collect();

    json!({
        "ticker": ticker,
        "news_count": items.len(),
        "articles": items,
    })
}

#[async_trait]
impl Tool for NewsSearchTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description:
                "Retrieve recent news articles for a stock ticker with headlines, publishers, and summaries."
                    .into(),
            parameters: vec![ParameterSchema::required_string("ticker", "Stock ticker symbol")],
            category: Some("news".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let ticker = ticker_arg(call)?;

        match self.market.news(&ticker, MAX_ARTICLES).await {
            Ok(articles) => Ok(ToolResult::json(NAME, &render(&ticker, &articles))),
            Err(e) => {
                error!(ticker = %ticker, error = %e, "search_news failed");
                Ok(ToolResult::failure(NAME, format!("Error fetching news: {e}")))
            }
        }
    }
}
