//! Portfolio Data Tool
//!
//! Reads the stored holdings (ticker, shares, cost basis).

use std::sync::Arc;

use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};
use async_trait::async_trait;
use serde_json::json;

use crate::store::PortfolioStore;

const NAME: &str = "get_portfolio_data";

pub struct PortfolioDataTool {
    store: Arc<PortfolioStore>,
}

impl PortfolioDataTool {
    pub fn new(store: Arc<PortfolioStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for PortfolioDataTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Read all current holdings from the portfolio (tickers, shares, cost basis).".into(),
            parameters: vec![],
            category: Some("portfolio".into()),
        }
    }

    async fn execute(&self, _call: &ToolCall) -> CoreResult<ToolResult> {
        let holdings = self.store.load().await;

        let output = if holdings.is_empty() {
            json!({ "holdings": [], "message": "Portfolio is empty." })
        } else {
            json!({
                "holdings": serde_json::to_value(&holdings)?,
                "count": holdings.len(),
                "currency": "EUR",
            })
        };
        Ok(ToolResult::json(NAME, &output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    #[tokio::test]
    async fn test_empty_and_filled_portfolio() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(PortfolioStore::new(dir.path().join("portfolio.json")));
        let tool = PortfolioDataTool::new(store.clone());

        let empty: Value = serde_json::from_str(&tool.execute(&ToolCall::new(NAME)).await.unwrap().output).unwrap();
        assert_eq!(empty["message"], "Portfolio is empty.");

        store.add_holding("RKLB", dec!(100), dec!(7.5)).await.unwrap();
        let filled: Value = serde_json::from_str(&tool.execute(&ToolCall::new(NAME)).await.unwrap().output).unwrap();
        assert_eq!(filled["count"], 1);
        assert_eq!(filled["holdings"][0]["ticker"], "RKLB");
        assert_eq!(filled["holdings"][0]["cost_basis"], 7.5);
    }
}
