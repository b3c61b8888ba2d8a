//! Reasoning Loop
//!
//! Bounded function-calling loop. The agent alternates between two states:
//!
//! ```text
//!            tool calls requested
//!   Thinking ────────────────────▶ ToolExecuting
//!      ▲  │                            │
//!      │  │ text only                  │ one tool message per call
//!      │  ▼                            │
//!      │ Done                          │
//!      └───────────────────────────────┘
//! ```
//!
//! After `max_iterations` rounds the loop stops in `Exhausted` and returns
//! the content of the last message it saw.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message, ToolCallRequest};
use crate::provider::{CompletionRequest, GenerationOptions, LlmProvider};
use crate::tool::{Tool, ToolCall, ToolCallRecord, ToolRegistry};

/// Answer used when an exhausted loop has no text to fall back on
pub const EXHAUSTED_FALLBACK: &str = "The agent reached the maximum number of iterations.";

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt
    pub system_prompt: String,

    /// Maximum request/response rounds
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Treat iteration exhaustion as an error instead of a degraded answer
    pub fail_on_exhaustion: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 15,
            generation: GenerationOptions::default(),
            fail_on_exhaustion: false,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant. \
Use the available tools to gather data before drawing conclusions. \
Be concise and accurate.";

/// How a run terminated
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    /// The model answered without requesting tools
    Done,
    /// The iteration budget ran out
    Exhausted,
}

/// Everything a run produced
#[derive(Clone, Debug)]
pub struct AgentOutcome {
    pub answer: String,
    pub state: LoopState,
    /// Completion rounds performed
    pub iterations: usize,
    pub tool_calls: Vec<ToolCallRecord>,
    pub transcript: Conversation,
}

enum Step {
    Thinking,
    ToolExecuting(Vec<ToolCallRequest>),
}

/// The main Agent struct
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>, config: AgentConfig) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Run the agent on a task and return its answer
    pub async fn execute(&self, task: &str) -> Result<String> {
        self.run(task).await.map(|outcome| outcome.answer)
    }

    /// Run the agent on a task, keeping the full trace
    pub async fn run(&self, task: &str) -> Result<AgentOutcome> {
        let mut conversation = Conversation::with_system_prompt(self.config.system_prompt.clone());
        conversation.push(Message::user(task));

        let schemas = self.tools.schemas();
        let max = self.config.max_iterations;
        let mut records = Vec::new();
        let mut iterations = 0;
        let mut step = Step::Thinking;

        tracing::info!(model = %self.config.generation.model, tools = schemas.len(), "Starting agent task");

        loop {
            step = match step {
                Step::Thinking => {
                    if iterations >= max {
                        break;
                    }
                    iterations += 1;
                    tracing::debug!(iteration = iterations, max, "Requesting completion");

                    let request = CompletionRequest::from_options(
                        &self.config.generation,
                        conversation.messages().to_vec(),
                    )
                    .with_tools(schemas.clone());

                    let completion = self.provider.complete(&request).await?;

                    if !completion.wants_tools() {
                        let answer = completion.content.unwrap_or_default();
                        tracing::info!(iterations, "Agent task complete");
                        return Ok(AgentOutcome {
                            answer,
                            state: LoopState::Done,
                            iterations,
                            tool_calls: records,
                            transcript: conversation,
                        });
                    }

                    conversation.push(Message::assistant_with_tools(
                        completion.content,
                        completion.tool_calls.clone(),
                    ));
                    Step::ToolExecuting(completion.tool_calls)
                }
                Step::ToolExecuting(calls) => {
                    for request in &calls {
                        let record = self.execute_tool(request).await;
                        conversation.push(Message::tool(request.id.clone(), record.message_content()));
                        records.push(record);
                    }
                    Step::Thinking
                }
            };
        }

        tracing::warn!(max, "Agent reached max iterations");
        if self.config.fail_on_exhaustion {
            return Err(AgentError::MaxIterations(max));
        }

        let answer = conversation
            .last_content()
            .filter(|c| !c.is_empty())
            .unwrap_or(EXHAUSTED_FALLBACK)
            .to_string();

        Ok(AgentOutcome {
            answer,
            state: LoopState::Exhausted,
            iterations,
            tool_calls: records,
            transcript: conversation,
        })
    }

    /// Execute one requested call; failures are captured, never propagated
    async fn execute_tool(&self, request: &ToolCallRequest) -> ToolCallRecord {
        let decoded = ToolCall::from_request(request);
        let arguments = decoded
            .as_ref()
            .map(|call| call.arguments.clone())
            .unwrap_or_default();

        tracing::debug!(tool = %request.name, id = %request.id, "Executing tool");

        let result = match decoded {
            Ok(call) => match self.tools.execute(&call).await {
                Ok(result) if result.success => Ok(result.output),
                Ok(result) => Err(error_message(&result.output)),
                Err(e) => Err(e.to_string()),
            },
            Err(e) => Err(e.to_string()),
        };

        if let Err(error) = &result {
            tracing::warn!(tool = %request.name, %error, "Tool call failed");
        }

        ToolCallRecord {
            id: request.id.clone(),
            name: request.name.clone(),
            arguments,
            result,
            executed_at: Utc::now(),
        }
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Pull the message out of an `{"error": ...}` payload
fn error_message(output: &str) -> String {
    serde_json::from_str::<serde_json::Value>(output)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| output.to_string())
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn tool<T: Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    #[must_use]
    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub const fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    #[must_use]
    pub const fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    #[must_use]
    pub const fn fail_on_exhaustion(mut self, fail: bool) -> Self {
        self.config.fail_on_exhaustion = fail;
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;
    use crate::mock::ScriptedProvider;
    use crate::tool::{ParameterSchema, ToolResult, ToolSchema};
    use async_trait::async_trait;
    use serde_json::{Value, json};

    struct QuoteTool;

    #[async_trait]
    impl Tool for QuoteTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "get_stock_data".into(),
                description: "Quote".into(),
                parameters: vec![ParameterSchema::required_string("ticker", "Ticker")],
                category: None,
            }
        }

        async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
            let ticker = call.str_arg("ticker").unwrap_or_default().to_uppercase();
            Ok(ToolResult::json("get_stock_data", &json!({ "ticker": ticker, "price": 7.82 })))
        }
    }

    struct BrokenTool;

    #[async_trait]
    impl Tool for BrokenTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "get_company_info".into(),
                description: "Always fails".into(),
                parameters: vec![ParameterSchema::required_string("ticker", "Ticker")],
                category: None,
            }
        }

        async fn execute(&self, _call: &ToolCall) -> Result<ToolResult> {
            Err(AgentError::ToolExecution("data source unreachable".into()))
        }
    }

    fn agent(provider: Arc<ScriptedProvider>, max_iterations: usize) -> Agent {
        AgentBuilder::new()
            .provider(provider)
            .tool(QuoteTool)
            .tool(BrokenTool)
            .system_prompt("You are a test analyst.")
            .max_iterations(max_iterations)
            .build()
            .unwrap()
    }

    fn tool_messages(conv: &Conversation) -> Vec<(String, String)> {
        conv.messages()
            .iter()
            .filter_map(|m| match m {
                Message::Tool { tool_call_id, content } => Some((tool_call_id.clone(), content.clone())),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_direct_answer_is_done_in_one_round() {
        let provider = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text("All good.")]));
        let outcome = agent(provider.clone(), 5).run("Hi").await.unwrap();

        assert_eq!(outcome.answer, "All good.");
        assert_eq!(outcome.state, LoopState::Done);
        assert_eq!(outcome.iterations, 1);

        let requests = provider.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[0].messages[0].role(), Role::System);
        assert_eq!(requests[0].tools.len(), 2);
    }

    #[tokio::test]
    async fn test_tool_results_keep_ids_and_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_calls(vec![
                ToolCallRequest::new("call_b", "get_stock_data", r#"{"ticker":"rklb"}"#),
                ToolCallRequest::new("call_a", "get_stock_data", r#"{"ticker":"nvda"}"#),
            ]),
            ScriptedProvider::text("RKLB and NVDA look fine."),
        ]));
        let outcome = agent(provider.clone(), 5).run("Compare").await.unwrap();

        assert_eq!(outcome.state, LoopState::Done);
        let results = tool_messages(&outcome.transcript);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, "call_b");
        assert_eq!(results[1].0, "call_a");
        assert!(results[0].1.contains("RKLB"));
        assert!(results[1].1.contains("NVDA"));

        // The second request saw the assistant turn followed by both results
        let second = &provider.requests().await[1];
        assert_eq!(second.messages[2].tool_calls().len(), 2);
        assert_eq!(second.messages[3].role(), Role::Tool);
        assert_eq!(second.messages[4].role(), Role::Tool);
    }

    #[tokio::test]
    async fn test_failing_tool_becomes_error_result_and_loop_continues() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_call("call_1", "get_company_info", r#"{"ticker":"ZZZZ"}"#),
            ScriptedProvider::text("I could not find that company."),
        ]));
        let outcome = agent(provider.clone(), 5).run("Who is ZZZZ?").await.unwrap();

        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.answer, "I could not find that company.");

        let results = tool_messages(&outcome.transcript);
        assert_eq!(results.len(), 1);
        let body: Value = serde_json::from_str(&results[0].1).unwrap();
        assert!(body.get("error").is_some());
        assert!(outcome.tool_calls[0].is_error());
    }

    #[tokio::test]
    async fn test_unknown_tool_and_bad_arguments_are_contained() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_calls(vec![
                ToolCallRequest::new("call_1", "get_weather", "{}"),
                ToolCallRequest::new("call_2", "get_stock_data", "{not json"),
            ]),
            ScriptedProvider::text("Done."),
        ]));
        let outcome = agent(provider, 5).run("?").await.unwrap();

        let results = tool_messages(&outcome.transcript);
        assert_eq!(results.len(), 2);
        for (_, content) in &results {
            let body: Value = serde_json::from_str(content).unwrap();
            assert!(body["error"].is_string());
        }
        assert!(results[0].1.contains("Unknown tool: get_weather"));
    }

    #[tokio::test]
    async fn test_exhaustion_after_exactly_n_rounds() {
        let script = (0..10)
            .map(|i| ScriptedProvider::tool_call(format!("call_{i}"), "get_stock_data", r#"{"ticker":"aapl"}"#))
            .collect();
        let provider = Arc::new(ScriptedProvider::new(script));
        let outcome = agent(provider.clone(), 3).run("Loop forever").await.unwrap();

        assert_eq!(outcome.state, LoopState::Exhausted);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(provider.requests().await.len(), 3);
        // Last message is the final tool result
        assert!(outcome.answer.contains("AAPL"));
    }

    #[tokio::test]
    async fn test_exhaustion_can_be_fatal() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::tool_call("call_1", "get_stock_data", r#"{"ticker":"aapl"}"#),
        ]));
        let agent = AgentBuilder::new()
            .provider(provider)
            .tool(QuoteTool)
            .max_iterations(1)
            .fail_on_exhaustion(true)
            .build()
            .unwrap();

        let err = agent.execute("x").await.unwrap_err();
        assert!(matches!(err, AgentError::MaxIterations(1)));
    }

    #[tokio::test]
    async fn test_transport_failure_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(AgentError::ProviderUnavailable(
            "connection refused".into(),
        ))]));
        let err = agent(provider, 5).execute("Hi").await.unwrap_err();
        assert!(matches!(err, AgentError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_builder_requires_provider() {
        assert!(matches!(AgentBuilder::new().build(), Err(AgentError::Config(_))));
    }
}
