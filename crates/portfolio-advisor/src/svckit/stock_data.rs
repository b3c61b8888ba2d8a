//! Stock Data Tool
//!
//! Key financial metrics for a ticker: price, valuation, ranges, margins.

use std::sync::Arc;

use agent_core::tool::ParameterSchema;
use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};
use async_trait::async_trait;
use serde_json::json;
use tracing::error;

use super::{money_or_na, number, or_na, ticker_arg};
use crate::market::{MarketData, StockSnapshot};

const NAME: &str = "get_stock_data";

pub struct StockDataTool {
    market: Arc<dyn MarketData>,
}

impl StockDataTool {
    pub fn new(market: Arc<dyn MarketData>) -> Self {
        Self { market }
    }
}

fn render(snapshot: &StockSnapshot) -> serde_json::Value {
    if snapshot.limited {
        return json!({
            "ticker": snapshot.ticker,
            "price": snapshot.price.map(|p| number(p.round_dp(2))),
            "market_cap": snapshot.market_cap.map(number),
            "note": "Limited data available via fallback.",
        });
    }

    json!({
        "ticker": snapshot.ticker,
        "name": or_na(snapshot.name.clone()),
        "price": money_or_na(snapshot.price),
        "currency": snapshot.currency.clone().unwrap_or_else(|| "USD".into()),
        "market_cap": money_or_na(snapshot.market_cap),
        "pe_ratio": or_na(snapshot.pe_ratio),
        "forward_pe": or_na(snapshot.forward_pe),
        "eps": or_na(snapshot.eps),
        "sector": or_na(snapshot.sector.clone()),
        "industry": or_na(snapshot.industry.clone()),
        "52_week_high": money_or_na(snapshot.fifty_two_week_high),
        "52_week_low": money_or_na(snapshot.fifty_two_week_low),
        "50_day_avg": money_or_na(snapshot.fifty_day_avg),
        "200_day_avg": money_or_na(snapshot.two_hundred_day_avg),
        "volume": or_na(snapshot.volume),
        "avg_volume": or_na(snapshot.avg_volume),
        "dividend_yield": or_na(snapshot.dividend_yield),
        "beta": or_na(snapshot.beta),
        "revenue": money_or_na(snapshot.revenue),
        "profit_margin": or_na(snapshot.profit_margin),
        "debt_to_equity": or_na(snapshot.debt_to_equity),
        "return_on_equity": or_na(snapshot.return_on_equity),
        "free_cash_flow": money_or_na(snapshot.free_cash_flow),
    })
}

#[async_trait]
impl Tool for StockDataTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Fetch key financial metrics for a stock: price, market cap, PE ratio, revenue, margins, etc."
                .into(),
            parameters: vec![ParameterSchema::required_string(
                "ticker",
                "Stock ticker symbol (e.g. AAPL, RKLB)",
            )],
            category: Some("research".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let ticker = ticker_arg(call)?;

        match self.market.quote(&ticker).await {
            Ok(snapshot) => Ok(ToolResult::json(NAME, &render(&snapshot))),
            Err(e) => {
                error!(ticker = %ticker, error = %e, "get_stock_data failed");
                Ok(ToolResult::failure(NAME, format!("Error fetching stock data: {e}")))
            }
        }
    }
}
