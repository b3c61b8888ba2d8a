//! Yahoo Finance Client
//!
//! Uses the public chart, quoteSummary, and search endpoints. Fundamentals
//! come from quoteSummary; when that fails the chart endpoint still yields a
//! price, and the snapshot is marked `limited`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::{debug, warn};

use super::{CompanyProfile, MarketData, NewsArticle, Officer, PriceQuote, StockSnapshot};
use crate::error::{AdvisorError, Result};
use crate::model::parse_ticker;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";
const SUMMARY_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,financialData,assetProfile";

pub struct YahooMarketData {
    client: reqwest::Client,
    base_url: String,
}

impl YahooMarketData {
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .user_agent("Mozilla/5.0 (portfolio-agent)")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "Yahoo request");
        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AdvisorError::MarketData(format!("{url} returned {status}")));
        }
        Ok(response.json().await?)
    }

    /// `quoteSummary.result[0]`
    async fn summary(&self, ticker: &str) -> Result<Value> {
        let body = self
            .get_json(
                &format!("/v10/finance/quoteSummary/{ticker}"),
                &[("modules", SUMMARY_MODULES)],
            )
            .await?;
        body.pointer("/quoteSummary/result/0")
            .cloned()
            .ok_or_else(|| AdvisorError::TickerNotFound(ticker.to_string()))
    }

    /// `chart.result[0].meta`
    async fn chart_meta(&self, ticker: &str) -> Result<Value> {
        let body = self
            .get_json(
                &format!("/v8/finance/chart/{ticker}"),
                &[("range", "1d"), ("interval", "1d")],
            )
            .await?;
        body.pointer("/chart/result/0/meta")
            .cloned()
            .ok_or_else(|| AdvisorError::TickerNotFound(ticker.to_string()))
    }

    async fn limited_snapshot(&self, ticker: &str) -> Result<StockSnapshot> {
        let meta = self.chart_meta(ticker).await?;
        let price = decimal(meta.get("regularMarketPrice"))
            .ok_or_else(|| AdvisorError::TickerNotFound(ticker.to_string()))?;
        Ok(StockSnapshot {
            ticker: ticker.to_string(),
            price: Some(price),
            currency: text(meta.get("currency")),
            market_cap: decimal(meta.get("marketCap")),
            limited: true,
            ..StockSnapshot::default()
        })
    }
}

/// Numeric field that is either a bare number or `{"raw": n, "fmt": ...}`
fn number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::Object(obj) => obj.get("raw").and_then(Value::as_f64),
        _ => None,
    }
}

fn decimal(value: Option<&Value>) -> Option<Decimal> {
    number(value).and_then(Decimal::from_f64_retain).map(|d| d.round_dp(4))
}

fn count(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64(),
        Value::Object(obj) => obj.get("raw").and_then(Value::as_u64),
        _ => None,
    }
}

fn text(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn parse_snapshot(ticker: &str, summary: &Value) -> StockSnapshot {
    let field = |module: &str, key: &str| summary.get(module).and_then(|m| m.get(key));

    StockSnapshot {
        ticker: ticker.to_string(),
        name: text(field("price", "shortName")),
        price: decimal(field("price", "regularMarketPrice"))
            .or_else(|| decimal(field("financialData", "currentPrice"))),
        currency: text(field("price", "currency")),
        market_cap: decimal(field("price", "marketCap")),
        pe_ratio: number(field("summaryDetail", "trailingPE")),
        forward_pe: number(field("summaryDetail", "forwardPE")),
        eps: number(field("defaultKeyStatistics", "trailingEps")),
        sector: text(field("assetProfile", "sector")),
        industry: text(field("assetProfile", "industry")),
        fifty_two_week_high: decimal(field("summaryDetail", "fiftyTwoWeekHigh")),
        fifty_two_week_low: decimal(field("summaryDetail", "fiftyTwoWeekLow")),
        fifty_day_avg: decimal(field("summaryDetail", "fiftyDayAverage")),
        two_hundred_day_avg: decimal(field("summaryDetail", "twoHundredDayAverage")),
        volume: count(field("summaryDetail", "volume")),
        avg_volume: count(field("summaryDetail", "averageVolume")),
        dividend_yield: number(field("summaryDetail", "dividendYield")),
        beta: number(field("summaryDetail", "beta")),
        revenue: decimal(field("financialData", "totalRevenue")),
        profit_margin: number(field("financialData", "profitMargins")),
        debt_to_equity: number(field("financialData", "debtToEquity")),
        return_on_equity: number(field("financialData", "returnOnEquity")),
        free_cash_flow: decimal(field("financialData", "freeCashflow")),
        limited: false,
    }
}

fn parse_profile(ticker: &str, summary: &Value) -> CompanyProfile {
    let profile = summary.get("assetProfile").cloned().unwrap_or(Value::Null);
    let officers = profile
        .get("companyOfficers")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .take(5)
                .map(|o| Officer {
                    name: text(o.get("name")).unwrap_or_else(|| "N/A".into()),
                    title: text(o.get("title")).unwrap_or_else(|| "N/A".into()),
                })
                .collect()
        })
        .unwrap_or_default();

    CompanyProfile {
        ticker: ticker.to_string(),
        name: text(summary.pointer("/price/shortName")),
        summary: text(profile.get("longBusinessSummary")),
        website: text(profile.get("website")),
        employees: count(profile.get("fullTimeEmployees")),
        city: text(profile.get("city")),
        state: text(profile.get("state")),
        country: text(profile.get("country")),
        sector: text(profile.get("sector")),
        industry: text(profile.get("industry")),
        officers,
    }
}

fn parse_news(body: &Value, limit: usize) -> Vec<NewsArticle> {
    body.get("news")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    Some(NewsArticle {
                        title: text(item.get("title"))?,
                        publisher: text(item.get("publisher")),
                        link: text(item.get("link")),
                        published: item
                            .get("providerPublishTime")
                            .and_then(Value::as_i64)
                            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
                        summary: text(item.get("summary")).unwrap_or_default(),
                    })
                })
                .take(limit)
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl MarketData for YahooMarketData {
    async fn quote(&self, ticker: &str) -> Result<StockSnapshot> {
        let ticker = parse_ticker(ticker)?;
        match self.summary(&ticker).await {
            Ok(summary) => {
                let snapshot = parse_snapshot(&ticker, &summary);
                if snapshot.price.is_some() {
                    return Ok(snapshot);
                }
                self.limited_snapshot(&ticker).await
            }
            Err(e) => {
                warn!(ticker = %ticker, error = %e, "quoteSummary failed, falling back to chart");
                self.limited_snapshot(&ticker).await
            }
        }
    }

    async fn company_info(&self, ticker: &str) -> Result<CompanyProfile> {
        let ticker = parse_ticker(ticker)?;
        let summary = self.summary(&ticker).await?;
        Ok(parse_profile(&ticker, &summary))
    }

    async fn news(&self, ticker: &str, limit: usize) -> Result<Vec<NewsArticle>> {
        let ticker = parse_ticker(ticker)?;
        let news_count = limit.to_string();
        let body = self
            .get_json(
                "/v1/finance/search",
                &[("q", ticker.as_str()), ("quotesCount", "0"), ("newsCount", news_count.as_str())],
            )
            .await?;
        Ok(parse_news(&body, limit))
    }

    async fn price(&self, ticker: &str) -> Result<PriceQuote> {
        let ticker = parse_ticker(ticker)?;
        let meta = self.chart_meta(&ticker).await?;
        let price = decimal(meta.get("regularMarketPrice"))
            .ok_or_else(|| AdvisorError::TickerNotFound(ticker.clone()))?;
        Ok(PriceQuote {
            currency: text(meta.get("currency")).unwrap_or_else(|| "USD".into()),
            ticker,
            price,
        })
    }

    fn name(&self) -> &str {
        "Yahoo Finance"
    }
}
