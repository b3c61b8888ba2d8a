//! Mock Market Data
//!
//! For testing and demo purposes. Returns realistic static figures.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{CompanyProfile, MarketData, NewsArticle, Officer, StockSnapshot};
use crate::error::{AdvisorError, Result};
use crate::model::normalize_ticker;

/// Mock data source with static quotes
#[derive(Clone, Debug)]
pub struct MockMarketData {
    quotes: HashMap<String, StockSnapshot>,
}

impl Default for MockMarketData {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMarketData {
    pub fn new() -> Self {
        let mut mock = Self::empty();
        // (ticker, name, price, currency, sector, market cap, pe)
        for (ticker, name, price, currency, sector, market_cap, pe) in [
            ("AAPL", "Apple Inc.", dec!(232.50), "USD", "Technology", dec!(3_500_000_000_000), Some(35.2)),
            ("NVDA", "NVIDIA Corporation", dec!(138.20), "USD", "Technology", dec!(3_380_000_000_000), Some(54.6)),
            ("RKLB", "Rocket Lab USA, Inc.", dec!(24.80), "USD", "Industrials", dec!(11_200_000_000), None),
            ("ASTS", "AST SpaceMobile, Inc.", dec!(26.10), "USD", "Communication Services", dec!(7_600_000_000), None),
            ("SAP.DE", "SAP SE", dec!(251.40), "EUR", "Technology", dec!(293_000_000_000), Some(96.1)),
        ] {
            mock.quotes.insert(
                ticker.to_string(),
                StockSnapshot {
                    ticker: ticker.to_string(),
                    name: Some(name.to_string()),
                    price: Some(price),
                    currency: Some(currency.to_string()),
                    market_cap: Some(market_cap),
                    pe_ratio: pe,
                    sector: Some(sector.to_string()),
                    fifty_two_week_high: Some(price * dec!(1.25)),
                    fifty_two_week_low: Some(price * dec!(0.6)),
                    volume: Some(12_500_000),
                    ..StockSnapshot::default()
                },
            );
        }
        mock
    }

    /// No tickers at all
    pub fn empty() -> Self {
        Self {
            quotes: HashMap::new(),
        }
    }

    /// Add or replace a ticker with a bare price
    #[must_use]
    pub fn with_quote(mut self, ticker: &str, price: Decimal, currency: &str) -> Self {
        let ticker = normalize_ticker(ticker);
        self.quotes.insert(
            ticker.clone(),
            StockSnapshot {
                ticker,
                price: Some(price),
                currency: Some(currency.to_string()),
                ..StockSnapshot::default()
            },
        );
        self
    }

    fn lookup(&self, ticker: &str) -> Result<&StockSnapshot> {
        let key = normalize_ticker(ticker);
        self.quotes
            .get(&key)
            .ok_or(AdvisorError::TickerNotFound(key))
    }
}

#[async_trait]
impl MarketData for MockMarketData {
    async fn quote(&self, ticker: &str) -> Result<StockSnapshot> {
        self.lookup(ticker).cloned()
    }

    async fn company_info(&self, ticker: &str) -> Result<CompanyProfile> {
        let snapshot = self.lookup(ticker)?;
        Ok(CompanyProfile {
            ticker: snapshot.ticker.clone(),
            name: snapshot.name.clone(),
            summary: snapshot
                .name
                .as_ref()
                .map(|name| format!("{name} is a listed company in the {} sector.", snapshot.sector.as_deref().unwrap_or("N/A"))),
            website: None,
            employees: Some(1_000),
            city: Some("Long Beach".into()),
            state: Some("CA".into()),
            country: Some("United States".into()),
            sector: snapshot.sector.clone(),
            industry: snapshot.industry.clone(),
            officers: vec![Officer {
                name: "Jane Doe".into(),
                title: "Chief Executive Officer".into(),
            }],
        })
    }

    async fn news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsArticle>> {
        let snapshot = self.lookup(ticker)?;
        let name = snapshot.name.as_deref().unwrap_or(&snapshot.ticker);
        let now = Utc::now();
        let articles = (0..3)
            .map(|i| NewsArticle {
                title: format!("{name}: market update #{}", i + 1),
                publisher: Some("Mock Wire".into()),
                link: Some(format!("https://news.example.com/{}/{i}", snapshot.ticker)),
                published: Some(now - Duration::hours(i64::from(i) * 6)),
                summary: String::new(),
            })
            .take(limit)
            .collect();
        Ok(articles)
    }

    fn name(&self) -> &str {
        "MockMarketData"
    }
}
