//! Returns Calculator Tool
//!
//! Live value, gain/loss, and return percentage for every holding, in EUR.

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};
use async_trait::async_trait;
use serde_json::{Value, json};

use crate::currency::FxConverter;
use crate::market::MarketData;
use crate::store::PortfolioStore;
use crate::valuation::{Valuation, value_portfolio};

const NAME: &str = "calculate_returns";

pub struct ReturnsTool {
    store: Arc<PortfolioStore>,
    market: Arc<dyn MarketData>,
    fx: Arc<FxConverter>,
}

impl ReturnsTool {
    pub fn new(store: Arc<PortfolioStore>, market: Arc<dyn MarketData>, fx: Arc<FxConverter>) -> Self {
        Self { store, market, fx }
    }
}

fn render(valuation: &Valuation) -> CoreResult<Value> {
    let mut holdings = Vec::with_capacity(valuation.positions.len() + valuation.unpriced.len());
    for position in &valuation.positions {
        holdings.push(serde_json::to_value(position)?);
    }
    for unpriced in &valuation.unpriced {
        holdings.push(serde_json::to_value(unpriced)?);
    }

    Ok(json!({
        "holdings": holdings,
        "summary": serde_json::to_value(&valuation.summary)?,
        "currency": valuation.currency,
        "timestamp": valuation.as_of.to_rfc3339(),
    }))
}

#[async_trait]
impl Tool for ReturnsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description:
                "Calculate live returns for all portfolio holdings: current value, gain/loss, return percentage."
                    .into(),
            parameters: vec![],
            category: Some("portfolio".into()),
        }
    }

    async fn execute(&self, _call: &ToolCall) -> CoreResult<ToolResult> {
        let holdings = self.store.load().await;
        if holdings.is_empty() {
            return Ok(ToolResult::json(NAME, &json!({ "message": "Portfolio is empty." })));
        }

        let valuation = value_portfolio(&holdings, self.market.as_ref(), &self.fx).await;
        Ok(ToolResult::json(NAME, &render(&valuation)?))
    }
}
