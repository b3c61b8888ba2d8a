//! Analysis Workflows
//!
//! Fixed single-specialist workflows plus the sequential full analysis
//! (research, then news, then portfolio). Unlike chat turns, agent errors are
//! returned to the caller here.

use std::sync::Arc;

use agent_core::LlmProvider;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use crate::agents::AgentSpec;
use crate::config::AdvisorConfig;
use crate::currency::{FxConverter, format_eur};
use crate::error::Result;
use crate::model::parse_ticker;
use crate::store::ProfileStore;
use crate::svckit::Toolbox;
use crate::tasks::{news_analysis_task, portfolio_analysis_task, stock_analysis_task};
use crate::valuation::{Valuation, value_portfolio};

/// Reports of the three specialists for one ticker
#[derive(Clone, Debug, Serialize)]
pub struct FullAnalysis {
    pub ticker: String,
    pub research: String,
    pub news: String,
    pub portfolio: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Performer {
    pub ticker: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub return_pct: Decimal,
}

/// Dashboard aggregate in EUR
#[derive(Clone, Debug, Serialize)]
pub struct PortfolioOverview {
    #[serde(flatten)]
    pub valuation: Valuation,
    pub best: Option<Performer>,
    pub worst: Option<Performer>,
    pub total_value_display: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub usd_to_eur: Decimal,
    pub fx_fallback: bool,
}

/// Stock quote converted into EUR
#[derive(Clone, Debug, Serialize)]
pub struct QuoteOverview {
    pub ticker: String,
    pub name: Option<String>,
    pub native_currency: String,
    pub price: String,
    pub market_cap: String,
    pub fifty_two_week_low: String,
    pub fifty_two_week_high: String,
    pub sector: Option<String>,
}

async fn display_eur(fx: &FxConverter, amount: Option<Decimal>, currency: &str) -> String {
    match amount {
        Some(value) => format_eur(Some(fx.to_eur(value, currency).await)),
        None => format_eur(None),
    }
}

pub struct Crew {
    provider: Arc<dyn LlmProvider>,
    toolbox: Toolbox,
    profiles: Arc<ProfileStore>,
    config: AdvisorConfig,
}

impl Crew {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        toolbox: Toolbox,
        profiles: Arc<ProfileStore>,
        config: AdvisorConfig,
    ) -> Self {
        Self {
            provider,
            toolbox,
            profiles,
            config,
        }
    }

    async fn run(&self, spec: &AgentSpec, task: &str) -> Result<String> {
        let profile_context = self.profiles.load().await.context_block();
        let agent = spec.build(self.provider.clone(), &self.toolbox, &profile_context, &self.config)?;
        Ok(agent.execute(task).await?)
    }

    /// Research specialist: fundamental report for one ticker.
    ///
    /// `model` overrides the configured model for this run, as in every
    /// workflow below.
    pub async fn stock_analysis(&self, ticker: &str, model: Option<&str>) -> Result<String> {
        let ticker = parse_ticker(ticker)?;
        info!(ticker = %ticker, "Stock analysis started");
        let task = stock_analysis_task(&ticker, &self.config.response_language);
        let spec = AgentSpec::research(&self.config).with_model(model);
        let report = self.run(&spec, &task).await?;
        info!(ticker = %ticker, "Stock analysis complete");
        Ok(report)
    }

    /// News specialist: impact-rated news briefing
    pub async fn news_analysis(&self, ticker: &str, model: Option<&str>) -> Result<String> {
        let ticker = parse_ticker(ticker)?;
        info!(ticker = %ticker, "News analysis started");
        let task = news_analysis_task(&ticker, &self.config.response_language);
        let spec = AgentSpec::news(&self.config).with_model(model);
        let report = self.run(&spec, &task).await?;
        info!(ticker = %ticker, "News analysis complete");
        Ok(report)
    }

    /// Portfolio specialist: health report over all holdings
    pub async fn portfolio_analysis(&self, model: Option<&str>) -> Result<String> {
        info!("Portfolio analysis started");
        let task = portfolio_analysis_task(&self.config.response_language);
        let spec = AgentSpec::portfolio(&self.config).with_model(model);
        let report = self.run(&spec, &task).await?;
        info!("Portfolio analysis complete");
        Ok(report)
    }

    /// All three specialists in sequence
    pub async fn full_analysis(&self, ticker: &str, model: Option<&str>) -> Result<FullAnalysis> {
        let ticker = parse_ticker(ticker)?;
        info!(ticker = %ticker, "Full analysis started");

        let research = self.stock_analysis(&ticker, model).await?;
        let news = self.news_analysis(&ticker, model).await?;
        let portfolio = self.portfolio_analysis(model).await?;

        info!(ticker = %ticker, "Full analysis complete");
        Ok(FullAnalysis {
            ticker,
            research,
            news,
            portfolio,
        })
    }

    /// Valued holdings with best and worst performer
    pub async fn portfolio_overview(&self) -> PortfolioOverview {
        let holdings = self.toolbox.portfolio().load().await;
        let fx = self.toolbox.fx();
        let valuation = value_portfolio(&holdings, self.toolbox.market().as_ref(), fx).await;

        let performer = |p: &crate::valuation::PositionValue| Performer {
            ticker: p.ticker.clone(),
            return_pct: p.return_pct,
        };
        let status = fx.status().await;

        PortfolioOverview {
            best: valuation.best().map(performer),
            worst: valuation.worst().map(performer),
            total_value_display: format_eur(Some(valuation.summary.total_current_value)),
            usd_to_eur: status.usd_to_eur,
            fx_fallback: status.using_fallback,
            valuation,
        }
    }

    /// Quick lookup with every amount shown in EUR
    pub async fn quote_overview(&self, ticker: &str) -> Result<QuoteOverview> {
        let snapshot = self.toolbox.market().quote(ticker).await?;
        let currency = snapshot.currency.clone().unwrap_or_else(|| "USD".into());
        let fx = self.toolbox.fx();

        let price = display_eur(fx, snapshot.price, &currency).await;
        let market_cap = display_eur(fx, snapshot.market_cap, &currency).await;
        let low = display_eur(fx, snapshot.fifty_two_week_low, &currency).await;
        let high = display_eur(fx, snapshot.fifty_two_week_high, &currency).await;

        Ok(QuoteOverview {
            ticker: snapshot.ticker,
            name: snapshot.name,
            native_currency: currency,
            price,
            market_cap,
            fifty_two_week_low: low,
            fifty_two_week_high: high,
            sector: snapshot.sector,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdvisorError;
    use crate::svckit::tests::toolbox;
    use agent_core::{AgentError, ScriptedProvider};
    use rust_decimal_macros::dec;

    fn crew(provider: Arc<ScriptedProvider>, dir: &std::path::Path) -> Crew {
        Crew::new(
            provider,
            toolbox(dir),
            Arc::new(ProfileStore::new(dir.join("investment_profile.json"))),
            AdvisorConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_stock_analysis_uses_research_tools() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_call("call_1", "get_stock_data", r#"{"ticker": "RKLB"}"#),
            ScriptedProvider::text("## Company Overview\n..."),
        ]));
        let report = crew(provider.clone(), dir.path()).stock_analysis("rklb", None).await.unwrap();

        assert!(report.starts_with("## Company Overview"));
        let requests = provider.requests().await;
        assert!(requests[0].messages[1].content().unwrap().contains("fundamental analysis of RKLB"));
        let tool_output = requests[1].messages.last().unwrap().content().unwrap();
        assert!(tool_output.contains("Rocket Lab"));
    }

    #[tokio::test]
    async fn test_full_analysis_runs_three_specialists_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::text("research report"),
            ScriptedProvider::text("news report"),
            ScriptedProvider::text("portfolio report"),
        ]));
        let analysis = crew(provider.clone(), dir.path())
            .full_analysis("NVDA", Some("gpt-4o-mini"))
            .await
            .unwrap();

        assert_eq!(analysis.research, "research report");
        assert_eq!(analysis.news, "news report");
        assert_eq!(analysis.portfolio, "portfolio report");

        let requests = provider.requests().await;
        assert_eq!(requests[1].tools[0].name, "search_news");
        assert_eq!(requests[2].tools[0].name, "get_portfolio_data");
        assert!(requests.iter().all(|r| r.model == "gpt-4o-mini"));
    }

    #[tokio::test]
    async fn test_analysis_transport_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![Err(AgentError::Auth("bad key".into()))]));
        let err = crew(provider, dir.path()).portfolio_analysis(None).await.unwrap_err();
        assert!(matches!(err, AdvisorError::Agent(AgentError::Auth(_))));
    }

    #[tokio::test]
    async fn test_invalid_ticker_is_rejected_before_any_request() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let err = crew(provider.clone(), dir.path())
            .stock_analysis("RKLB?x=1", None)
            .await
            .unwrap_err();

        assert!(matches!(err, AdvisorError::InvalidInput(_)));
        assert!(provider.requests().await.is_empty());
    }

    #[tokio::test]
    async fn test_portfolio_overview_best_and_worst() {
        let dir = tempfile::tempdir().unwrap();
        let crew = crew(Arc::new(ScriptedProvider::new(vec![])), dir.path());
        let store = crew.toolbox.portfolio();
        // mock prices at 0.5 EUR/USD: NVDA 69.10, RKLB 12.40
        store.add_holding("NVDA", dec!(10), dec!(50)).await.unwrap();
        store.add_holding("RKLB", dec!(100), dec!(20)).await.unwrap();

        let overview = crew.portfolio_overview().await;
        assert_eq!(overview.best.as_ref().unwrap().ticker, "NVDA");
        assert_eq!(overview.worst.as_ref().unwrap().ticker, "RKLB");
        assert_eq!(overview.valuation.summary.total_current_value, dec!(1931));
        assert_eq!(overview.total_value_display, "€1.931,00");
        assert!(!overview.fx_fallback);
    }

    #[tokio::test]
    async fn test_quote_overview_converts_to_eur() {
        let dir = tempfile::tempdir().unwrap();
        let crew = crew(Arc::new(ScriptedProvider::new(vec![])), dir.path());

        let quote = crew.quote_overview("SAP.DE").await.unwrap();
        assert_eq!(quote.native_currency, "EUR");
        assert_eq!(quote.price, "€251,40");

        let usd = crew.quote_overview("AAPL").await.unwrap();
        assert_eq!(usd.price, "€116,25");
        assert_eq!(usd.market_cap, "€1.750,00 Mrd.");
    }
}
