//! Error Types
//!
//! Two families: transport failures of the completion endpoint, which end an
//! agent invocation, and tool-side failures, which the loop turns into
//! `{"error": ...}` results for the model.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentError>;

#[derive(Error, Debug)]
pub enum AgentError {
    /// Completion endpoint answered with an error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Completion endpoint unreachable, timed out, or returned 5xx
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    /// Required argument missing or malformed
    #[error("Invalid arguments: {0}")]
    ToolValidation(String),

    #[error("Tool failed: {0}")]
    ToolExecution(String),

    /// Round budget spent (only raised with `fail_on_exhaustion`)
    #[error("No final answer after {0} rounds")]
    MaxIterations(usize),

    /// Undecodable model output, e.g. tool arguments that are not a JSON object
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Raised inside a tool call rather than by the completion transport
    pub const fn is_tool_error(&self) -> bool {
        matches!(
            self,
            Self::ToolNotFound(_) | Self::ToolValidation(_) | Self::ToolExecution(_) | Self::Parse(_)
        )
    }

    /// Message fit for an end user
    pub fn user_message(&self) -> String {
        match self {
            Self::Provider(msg) => format!("The language model returned an error: {msg}"),
            Self::ProviderUnavailable(_) => {
                "The language model is not reachable right now. Please try again later.".into()
            }
            Self::RateLimited(_) => "Too many requests to the language model. Please wait a moment.".into(),
            Self::Auth(_) => "The language model rejected the API key. Check OPENAI_API_KEY.".into(),
            Self::MaxIterations(n) => {
                format!("No answer could be produced within {n} rounds. Try a narrower question.")
            }
            err if err.is_tool_error() => format!("A data tool failed: {err}"),
            _ => "An unexpected error occurred.".into(),
        }
    }
}
