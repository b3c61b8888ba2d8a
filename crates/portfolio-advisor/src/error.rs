//! Error Types for Portfolio Advisor

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdvisorError>;

#[derive(Error, Debug)]
pub enum AdvisorError {
    #[error("Market data error: {0}")]
    MarketData(String),

    #[error("No data found for '{0}'")]
    TickerNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Agent(#[from] agent_core::AgentError),
}

impl From<AdvisorError> for agent_core::AgentError {
    fn from(err: AdvisorError) -> Self {
        match err {
            AdvisorError::Agent(inner) => inner,
            other => Self::ToolExecution(other.to_string()),
        }
    }
}
