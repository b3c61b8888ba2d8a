//! OpenAI-compatible LLM Provider
//!
//! Implementation of `LlmProvider` for any server speaking the
//! chat-completions protocol with function calling (OpenAI itself,
//! Ollama's `/v1` endpoint, vLLM, LM Studio).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use agent_core::{
    error::{AgentError, Result},
    message::{Message, ToolCallRequest},
    provider::{
        Completion, CompletionRequest, FinishReason, LlmProvider, ModelInfo, ProviderInfo,
        TokenUsage,
    },
};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Source of ids for tool calls the server sent without one. Process-wide,
/// so ids never repeat across the rounds of one conversation.
static SYNTHETIC_CALL_IDS: AtomicU64 = AtomicU64::new(0);

fn synthetic_call_id() -> String {
    format!("call_local_{}", SYNTHETIC_CALL_IDS.fetch_add(1, Ordering::Relaxed))
}

/// OpenAI provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// Base URL including the API version prefix
    pub base_url: String,

    /// Bearer token (optional for local servers)
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: None,
            timeout_secs: 120,
        }
    }
}

impl OpenAiConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = std::env::var("OPENAI_BASE_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.base_url);
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let timeout_secs = std::env::var("REQUEST_TIMEOUT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        Self {
            base_url,
            api_key,
            timeout_secs,
        }
    }

    /// Whether an API key is present
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

/// OpenAI-compatible LLM provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    /// Create from configuration
    pub fn from_config(config: OpenAiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AgentError::Config(format!("HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(OpenAiConfig::from_env())
    }

    pub const fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    /// Convert agent messages to the wire format
    fn convert_messages(messages: &[Message]) -> Vec<WireMessage> {
        messages
            .iter()
            .map(|m| match m {
                Message::System { content } => WireMessage {
                    role: "system".into(),
                    content: Some(content.clone()),
                    ..WireMessage::default()
                },
                Message::User { content } => WireMessage {
                    role: "user".into(),
                    content: Some(content.clone()),
                    ..WireMessage::default()
                },
                Message::Assistant { content, tool_calls } => WireMessage {
                    role: "assistant".into(),
                    content: content.clone(),
                    tool_calls: tool_calls
                        .iter()
                        .map(|c| WireToolCall {
                            id: c.id.clone(),
                            kind: "function".into(),
                            function: WireFunction {
                                name: c.name.clone(),
                                arguments: c.arguments.clone(),
                            },
                        })
                        .collect(),
                    tool_call_id: None,
                },
                Message::Tool { tool_call_id, content } => WireMessage {
                    role: "tool".into(),
                    content: Some(content.clone()),
                    tool_call_id: Some(tool_call_id.clone()),
                    ..WireMessage::default()
                },
            })
            .collect()
    }

    /// Build the request body
    fn build_body(request: &CompletionRequest) -> ChatRequest {
        let tools: Vec<Value> = request.tools.iter().map(|t| t.to_function_json()).collect();
        let tool_choice = (!tools.is_empty()).then(|| "auto".to_string());

        ChatRequest {
            model: request.model.clone(),
            messages: Self::convert_messages(&request.messages),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tools,
            tool_choice,
        }
    }

    /// Convert a wire response to an agent completion
    fn convert_completion(response: ChatResponse) -> Result<Completion> {
        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Parse("response contained no choices".into()))?;

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|c| {
                // Some local servers omit call ids
                let id = if c.id.is_empty() { synthetic_call_id() } else { c.id };
                ToolCallRequest::new(id, c.function.name, c.function.arguments)
            })
            .collect();

        Ok(Completion {
            content: choice.message.content,
            tool_calls,
            model: response.model,
            usage: response.usage.map(|u| TokenUsage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
            finish_reason: choice.finish_reason.as_deref().map(FinishReason::parse),
        })
    }

    /// Map a non-success HTTP status to an agent error
    fn status_error(status: StatusCode, body: &str) -> AgentError {
        let detail = serde_json::from_str::<Value>(body)
            .ok()
            .and_then(|v| v["error"]["message"].as_str().map(String::from))
            .unwrap_or_else(|| body.chars().take(200).collect());

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AgentError::Auth(detail),
            StatusCode::TOO_MANY_REQUESTS => AgentError::RateLimited(detail),
            s if s.is_server_error() => AgentError::ProviderUnavailable(format!("{s}: {detail}")),
            s => AgentError::Provider(format!("{s}: {detail}")),
        }
    }

    fn transport_error(err: &reqwest::Error) -> AgentError {
        if err.is_connect() || err.is_timeout() {
            AgentError::ProviderUnavailable(err.to_string())
        } else {
            AgentError::Provider(err.to_string())
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "OpenAI-compatible".into(),
            endpoint: Some(self.config.base_url.clone()),
            supports_tools: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.list_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!("Provider health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        let body = Self::build_body(request);

        tracing::debug!(
            model = %body.model,
            messages = body.messages.len(),
            tools = body.tools.len(),
            "Sending chat completion"
        );

        let response = self
            .authorize(self.client.post(self.url("chat/completions")))
            .json(&body)
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        if !status.is_success() {
            return Err(Self::status_error(status, &text));
        }

        let parsed: ChatResponse = serde_json::from_str(&text)
            .map_err(|e| AgentError::Parse(format!("completion response: {e}")))?;

        Self::convert_completion(parsed)
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self
            .authorize(self.client.get(self.url("models")))
            .send()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Self::transport_error(&e))?;

        if !status.is_success() {
            return Err(Self::status_error(status, &text));
        }

        let list: ModelList = serde_json::from_str(&text)
            .map_err(|e| AgentError::Parse(format!("model list: {e}")))?;

        Ok(list
            .data
            .into_iter()
            .map(|m| ModelInfo {
                id: m.id,
                owned_by: m.owned_by,
            })
            .collect())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    tool_calls: Vec<WireToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

/// Explicit `null` reads like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Serialize, Deserialize)]
struct WireToolCall {
    #[serde(default)]
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: WireFunction,
}

fn function_kind() -> String {
    "function".into()
}

#[derive(Debug, Serialize, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: String,
    #[serde(default, deserialize_with = "null_as_default")]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<WireModel>,
}

#[derive(Debug, Deserialize)]
struct WireModel {
    id: String,
    #[serde(default)]
    owned_by: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::tool::{ParameterSchema, ToolSchema};

    #[test]
    fn test_config_defaults() {
        let config = OpenAiConfig::default();
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert_eq!(config.timeout_secs, 120);
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_message_conversion() {
        let messages = vec![
            Message::system("You are helpful."),
            Message::user("Quote RKLB"),
            Message::assistant_with_tools(
                None,
                vec![ToolCallRequest::new("call_1", "get_stock_data", r#"{"ticker":"RKLB"}"#)],
            ),
            Message::tool("call_1", r#"{"price": 7.82}"#),
        ];

        let converted = OpenAiProvider::convert_messages(&messages);
        assert_eq!(converted.len(), 4);

        let json = serde_json::to_value(&converted).unwrap();
        assert_eq!(json[2]["role"], "assistant");
        assert!(json[2]["content"].is_null());
        assert_eq!(json[2]["tool_calls"][0]["type"], "function");
        assert_eq!(json[2]["tool_calls"][0]["function"]["name"], "get_stock_data");
        assert_eq!(json[3]["tool_call_id"], "call_1");
        assert!(json[1].get("tool_calls").is_none());
    }

    #[test]
    fn test_body_sets_tool_choice_only_with_tools() {
        let schema = ToolSchema {
            name: "search_news".into(),
            description: "News".into(),
            parameters: vec![ParameterSchema::required_string("ticker", "Ticker")],
            category: None,
        };
        let plain = CompletionRequest::new("gpt-4o", vec![Message::user("hi")]);
        let body = serde_json::to_value(OpenAiProvider::build_body(&plain)).unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());

        let with_tools = plain.with_tools(vec![schema]);
        let body = serde_json::to_value(OpenAiProvider::build_body(&with_tools)).unwrap();
        assert_eq!(body["tool_choice"], "auto");
        assert_eq!(body["tools"][0]["function"]["name"], "search_news");
    }

    #[test]
    fn test_parse_tool_call_response() {
        let raw = r#"{
            "id": "chatcmpl-1",
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [
                        {"id": "call_x", "type": "function",
                         "function": {"name": "get_stock_data", "arguments": "{\"ticker\":\"AAPL\"}"}},
                        {"id": "call_y", "type": "function",
                         "function": {"name": "get_company_info", "arguments": "{\"ticker\":\"AAPL\"}"}}
                    ]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;

        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let completion = OpenAiProvider::convert_completion(parsed).unwrap();
        assert!(completion.wants_tools());
        assert_eq!(completion.tool_calls[0].id, "call_x");
        assert_eq!(completion.tool_calls[1].name, "get_company_info");
        assert_eq!(completion.finish_reason, Some(FinishReason::ToolCalls));
        assert_eq!(completion.usage.unwrap().total_tokens, 15);
    }

    #[test]
    fn test_missing_ids_are_synthesized() {
        let raw = r#"{"model": "llama3.2", "choices": [{"message": {"role": "assistant",
            "tool_calls": [{"function": {"name": "search_news", "arguments": "{}"}}]}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let first = OpenAiProvider::convert_completion(parsed).unwrap();
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let second = OpenAiProvider::convert_completion(parsed).unwrap();

        let (a, b) = (&first.tool_calls[0].id, &second.tool_calls[0].id);
        assert!(a.starts_with("call_local_"));
        assert_ne!(a, b, "ids must not repeat across rounds");
    }

    #[test]
    fn test_null_tool_calls_is_a_final_answer() {
        let raw = r#"{"model": "llama3.2", "choices": [{"message": {"role": "assistant",
            "content": "Final answer", "tool_calls": null}, "finish_reason": "stop"}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let completion = OpenAiProvider::convert_completion(parsed).unwrap();

        assert!(!completion.wants_tools());
        assert_eq!(completion.content.as_deref(), Some("Final answer"));
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
    }

    #[test]
    fn test_empty_choices_is_parse_error() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"model": "x", "choices": []}"#).unwrap();
        assert!(matches!(
            OpenAiProvider::convert_completion(parsed),
            Err(AgentError::Parse(_))
        ));
    }

    #[test]
    fn test_status_mapping() {
        let body = r#"{"error": {"message": "Incorrect API key"}}"#;
        assert!(matches!(
            OpenAiProvider::status_error(StatusCode::UNAUTHORIZED, body),
            AgentError::Auth(msg) if msg == "Incorrect API key"
        ));
        assert!(matches!(
            OpenAiProvider::status_error(StatusCode::TOO_MANY_REQUESTS, "{}"),
            AgentError::RateLimited(_)
        ));
        assert!(matches!(
            OpenAiProvider::status_error(StatusCode::BAD_GATEWAY, "upstream"),
            AgentError::ProviderUnavailable(_)
        ));
        assert!(matches!(
            OpenAiProvider::status_error(StatusCode::BAD_REQUEST, "nope"),
            AgentError::Provider(_)
        ));
    }
}
