//! Domain Models
//!
//! Persisted records (holdings, chat messages) and the routing intent.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AdvisorError, Result};

/// A stock position. Cost basis is per share in the reporting currency (EUR).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Ticker symbol (e.g., "RKLB", "SAP.DE")
    pub ticker: String,

    /// Number of shares held
    #[serde(with = "rust_decimal::serde::float")]
    pub shares: Decimal,

    /// Average cost per share
    #[serde(alias = "cost_basis_eur", with = "rust_decimal::serde::float")]
    pub cost_basis: Decimal,

    /// When the position was first added
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<DateTime<Utc>>,
}

impl Holding {
    pub fn new(ticker: &str, shares: Decimal, cost_basis: Decimal) -> Self {
        Self {
            ticker: normalize_ticker(ticker),
            shares,
            cost_basis,
            date_added: Some(Utc::now()),
        }
    }

    /// Total amount invested
    pub fn total_cost(&self) -> Decimal {
        self.shares * self.cost_basis
    }
}

/// Upper-case and trim a ticker symbol
pub fn normalize_ticker(ticker: &str) -> String {
    ticker.trim().to_uppercase()
}

/// Normalized ticker, rejected unless it only uses `A-Z 0-9 . - ^ =`.
///
/// Symbols end up in market-data URL paths, so anything else is refused.
pub fn parse_ticker(raw: &str) -> Result<String> {
    let ticker = normalize_ticker(raw);
    if ticker.is_empty() {
        return Err(AdvisorError::InvalidInput("ticker must not be empty".into()));
    }
    let valid = ticker
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || matches!(c, '.' | '-' | '^' | '='));
    if !valid {
        return Err(AdvisorError::InvalidInput(format!("invalid ticker symbol '{}'", raw.trim())));
    }
    Ok(ticker)
}

/// Which specialist should answer a question
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// Stock fundamentals, valuation, buy/sell/hold
    Research,
    /// Recent news and events
    News,
    /// The user's own holdings, returns, risk
    Portfolio,
    /// Questions needing several specialists (dispatched as `Research`)
    Multi,
}

impl Intent {
    pub const ALL: [Self; 4] = [Self::Research, Self::News, Self::Portfolio, Self::Multi];

    /// Intent actually dispatched. There is no multi-agent fan-out, so
    /// `Multi` is answered by the research specialist.
    pub const fn resolve(self) -> Self {
        match self {
            Self::Multi => Self::Research,
            other => other,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::News => "news",
            Self::Portfolio => "portfolio",
            Self::Multi => "multi",
        }
    }

    /// Label shown next to an answer
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Research | Self::Multi => "Research Agent",
            Self::News => "News Agent",
            Self::Portfolio => "Portfolio Monitor",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Self::Research | Self::Multi => "🔍",
            Self::News => "📰",
            Self::Portfolio => "📊",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "research" => Ok(Self::Research),
            "news" => Ok(Self::News),
            "portfolio" => Ok(Self::Portfolio),
            "multi" => Ok(Self::Multi),
            other => Err(format!("unknown intent '{other}'")),
        }
    }
}

/// Speaker of a persisted chat message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry of the persisted chat log
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Specialist that produced an assistant message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<Intent>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            agent_type: None,
        }
    }

    pub fn assistant(content: impl Into<String>, agent_type: Intent) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            agent_type: Some(agent_type),
        }
    }
}
