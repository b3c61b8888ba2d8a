//! Company Info Tool

use std::sync::Arc;

use agent_core::tool::ParameterSchema;
use agent_core::{Result as CoreResult, Tool, ToolCall, ToolResult, ToolSchema};
use async_trait::async_trait;
use serde_json::json;
use tracing::error;

use super::{or_na, ticker_arg};
use crate::market::{CompanyProfile, MarketData};

const NAME: &str = "get_company_info";

/// Business summary, headquarters, and key officers of a company
pub struct CompanyInfoTool {
    market: Arc<dyn MarketData>,
}

impl CompanyInfoTool {
    pub fn new(market: Arc<dyn MarketData>) -> Self {
        Self { market }
    }
}

fn render(profile: &CompanyProfile) -> serde_json::Value {
    let mut data = json!({
        "ticker": profile.ticker,
        "name": or_na(profile.name.clone()),
        "summary": profile.summary.clone().unwrap_or_else(|| "No summary available.".into()),
        "website": or_na(profile.website.clone()),
        "employees": or_na(profile.employees),
        "headquarters": profile.headquarters(),
        "sector": or_na(profile.sector.clone()),
        "industry": or_na(profile.industry.clone()),
    });

    if !profile.officers.is_empty() {
        data["key_officers"] = profile
            .officers
            .iter()
            .take(5)
            .map(|o| json!({ "name": o.name, "title": o.title }))
            .collect();
    }
    data
}

#[async_trait]
impl Tool for CompanyInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: NAME.into(),
            description: "Fetch detailed company information: business summary, employees, officers, sector."
                .into(),
            parameters: vec![ParameterSchema::required_string("ticker", "Stock ticker symbol")],
            category: Some("research".into()),
        }
    }

    async fn execute(&self, call: &ToolCall) -> CoreResult<ToolResult> {
        let ticker = ticker_arg(call)?;

        match self.market.company_info(&ticker).await {
            Ok(profile) => Ok(ToolResult::json(NAME, &render(&profile))),
            Err(e) => {
                error!(ticker = %ticker, error = %e, "get_company_info failed");
                Ok(ToolResult::failure(NAME, format!("Error fetching company info: {e}")))
            }
        }
    }
}
