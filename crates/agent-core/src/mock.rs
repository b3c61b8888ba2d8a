//! Scripted Provider
//!
//! Deterministic `LlmProvider` for tests and offline demos. Each call to
//! `complete` pops the next scripted response and records the request.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::{AgentError, Result};
use crate::message::ToolCallRequest;
use crate::provider::{
    Completion, CompletionRequest, FinishReason, LlmProvider, ModelInfo, ProviderInfo,
};

/// Provider that replays a fixed list of responses
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<Completion>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<Completion>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Plain text answer
    pub fn text(content: impl Into<String>) -> Result<Completion> {
        Ok(Completion {
            content: Some(content.into()),
            model: "scripted".into(),
            finish_reason: Some(FinishReason::Stop),
            ..Completion::default()
        })
    }

    /// A single tool call
    pub fn tool_call(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Result<Completion> {
        Self::tool_calls(vec![ToolCallRequest::new(id, name, arguments)])
    }

    /// Several tool calls in one round
    pub fn tool_calls(calls: Vec<ToolCallRequest>) -> Result<Completion> {
        Ok(Completion {
            content: None,
            tool_calls: calls,
            model: "scripted".into(),
            finish_reason: Some(FinishReason::ToolCalls),
            ..Completion::default()
        })
    }

    /// Every request received so far
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    /// Responses not yet consumed
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "Scripted".into(),
            endpoint: None,
            supports_tools: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        self.requests.lock().await.push(request.clone());
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::Provider("script exhausted".into())))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo {
            id: "scripted".into(),
            owned_by: None,
        }])
    }
}
