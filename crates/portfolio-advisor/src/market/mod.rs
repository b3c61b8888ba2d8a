//! Market Data Integration
//!
//! Abstractions and implementations for stock quotes, company profiles, and
//! news. The agent tools only see the [`MarketData`] trait.

mod mock;
mod yahoo;

pub use mock::MockMarketData;
pub use yahoo::YahooMarketData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::error::Result;

/// Key figures of a listed stock. Absent values stay `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StockSnapshot {
    pub ticker: String,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub market_cap: Option<Decimal>,
    pub pe_ratio: Option<f64>,
    pub forward_pe: Option<f64>,
    pub eps: Option<f64>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub fifty_two_week_high: Option<Decimal>,
    pub fifty_two_week_low: Option<Decimal>,
    pub fifty_day_avg: Option<Decimal>,
    pub two_hundred_day_avg: Option<Decimal>,
    pub volume: Option<u64>,
    pub avg_volume: Option<u64>,
    pub dividend_yield: Option<f64>,
    pub beta: Option<f64>,
    pub revenue: Option<Decimal>,
    pub profit_margin: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub free_cash_flow: Option<Decimal>,
    /// Only price and market cap could be retrieved
    pub limited: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Officer {
    pub name: String,
    pub title: String,
}

/// Descriptive company data
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompanyProfile {
    pub ticker: String,
    pub name: Option<String>,
    pub summary: Option<String>,
    pub website: Option<String>,
    pub employees: Option<u64>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub officers: Vec<Officer>,
}

impl CompanyProfile {
    /// "City, State, Country" with the same separators even when parts are missing
    pub fn headquarters(&self) -> String {
        format!(
            "{}, {}, {}",
            self.city.as_deref().unwrap_or_default(),
            self.state.as_deref().unwrap_or_default(),
            self.country.as_deref().unwrap_or_default()
        )
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewsArticle {
    pub title: String,
    pub publisher: Option<String>,
    pub link: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub summary: String,
}

/// Last traded price in the listing currency
#[derive(Clone, Debug, PartialEq)]
pub struct PriceQuote {
    pub ticker: String,
    pub price: Decimal,
    pub currency: String,
}

/// Market data provider trait (Strategy pattern)
///
/// Implement this for each data vendor.
#[async_trait]
pub trait MarketData: Send + Sync {
    /// Key figures for a ticker
    async fn quote(&self, ticker: &str) -> Result<StockSnapshot>;

    /// Company description, headquarters, officers
    async fn company_info(&self, ticker: &str) -> Result<CompanyProfile>;

    /// Recent news, newest first, at most `limit` items
    async fn news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsArticle>>;

    /// Current price only
    async fn price(&self, ticker: &str) -> Result<PriceQuote> {
        let snapshot = self.quote(ticker).await?;
        let price = snapshot
            .price
            .ok_or_else(|| crate::error::AdvisorError::TickerNotFound(ticker.to_string()))?;
        Ok(PriceQuote {
            ticker: snapshot.ticker,
            price,
            currency: snapshot.currency.unwrap_or_else(|| "USD".into()),
        })
    }

    /// Data source name
    fn name(&self) -> &str;
}
