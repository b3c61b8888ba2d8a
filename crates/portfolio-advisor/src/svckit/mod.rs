//! Service Kit - Agent Tools
//!
//! Domain-specific tools that implement `agent_core::Tool` for the portfolio
//! advisor. Tools are grouped per specialist; each specialist only sees the
//! tools of its group.

mod company_info;
mod news_search;
mod portfolio_data;
mod returns;
mod stock_data;

pub use company_info::CompanyInfoTool;
pub use news_search::NewsSearchTool;
pub use portfolio_data::PortfolioDataTool;
pub use returns::ReturnsTool;
pub use stock_data::StockDataTool;

use std::sync::Arc;

use agent_core::{AgentError, Result as CoreResult, ToolCall, ToolRegistry};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::currency::FxConverter;
use crate::market::MarketData;
use crate::model::parse_ticker;
use crate::store::PortfolioStore;

/// Tool set handed to one specialist
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolGroup {
    Research,
    News,
    Portfolio,
}

/// Shared back-ends from which per-group registries are built
#[derive(Clone)]
pub struct Toolbox {
    market: Arc<dyn MarketData>,
    portfolio: Arc<PortfolioStore>,
    fx: Arc<FxConverter>,
}

impl Toolbox {
    pub fn new(market: Arc<dyn MarketData>, portfolio: Arc<PortfolioStore>, fx: Arc<FxConverter>) -> Self {
        Self { market, portfolio, fx }
    }

    pub fn market(&self) -> &Arc<dyn MarketData> {
        &self.market
    }

    pub fn portfolio(&self) -> &Arc<PortfolioStore> {
        &self.portfolio
    }

    pub fn fx(&self) -> &Arc<FxConverter> {
        &self.fx
    }

    /// Registry with exactly the tools of `group`, in a fixed order
    pub fn registry(&self, group: ToolGroup) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        match group {
            ToolGroup::Research => {
                registry.register(StockDataTool::new(self.market.clone()));
                registry.register(CompanyInfoTool::new(self.market.clone()));
            }
            ToolGroup::News => {
                registry.register(NewsSearchTool::new(self.market.clone()));
            }
            ToolGroup::Portfolio => {
                registry.register(PortfolioDataTool::new(self.portfolio.clone()));
                registry.register(ReturnsTool::new(
                    self.portfolio.clone(),
                    self.market.clone(),
                    self.fx.clone(),
                ));
            }
        }
        registry
    }
}

/// Required, normalized `ticker` argument
fn ticker_arg(call: &ToolCall) -> CoreResult<String> {
    let raw = call
        .str_arg("ticker")
        .ok_or_else(|| AgentError::ToolValidation("Missing required parameter: ticker".into()))?;
    parse_ticker(raw).map_err(|e| AgentError::ToolValidation(e.to_string()))
}

/// Optional value, rendered as `"N/A"` when absent
fn or_na<T: Into<Value>>(value: Option<T>) -> Value {
    value.map_or_else(|| Value::from("N/A"), Into::into)
}

/// Decimal as a JSON number
fn number(value: Decimal) -> Value {
    value.to_f64().map_or(Value::Null, Value::from)
}

fn money_or_na(value: Option<Decimal>) -> Value {
    value.map_or_else(|| Value::from("N/A"), number)
}
