//! Chat Orchestrator
//!
//! One chat turn: classify the question, build a task with recent history and
//! the investment profile, dispatch to the matching specialist. Every failure
//! inside a turn ends up as an apologetic answer, never as an error.

use std::sync::Arc;

use agent_core::{LlmProvider, Result as CoreResult};
use serde::Serialize;
use tracing::{error, info};

use crate::agents::AgentSpec;
use crate::classifier::IntentClassifier;
use crate::config::AdvisorConfig;
use crate::error::Result;
use crate::model::{ChatMessage, ChatRole, Intent};
use crate::store::{ChatHistoryStore, ProfileStore};
use crate::svckit::Toolbox;

/// History entries quoted in a chat task
const HISTORY_WINDOW: usize = 6;
/// Characters kept per quoted history entry
const HISTORY_ENTRY_CHARS: usize = 300;

/// Answer of one chat turn with attribution
#[derive(Clone, Debug, Serialize)]
pub struct ChatReply {
    pub answer: String,
    pub intent: Intent,
    pub agent_name: &'static str,
}

/// Assemble the task handed to the specialist
pub fn build_task(question: &str, history: &[ChatMessage], profile_context: &str, language: &str) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !profile_context.trim().is_empty() {
        parts.push(profile_context.trim_end().to_string());
    }

    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let recent = &history[start..];
    if !recent.is_empty() {
        parts.push("RECENT CONVERSATION:".into());
        for message in recent {
            let speaker = match message.role {
                ChatRole::User => "User",
                ChatRole::Assistant => "Agent",
            };
            let excerpt: String = message.content.chars().take(HISTORY_ENTRY_CHARS).collect();
            parts.push(format!("{speaker}: {excerpt}"));
        }
        parts.push(String::new());
    }

    parts.push("CURRENT USER QUESTION:".into());
    parts.push(question.to_string());
    parts.push(String::new());
    parts.push(format!(
        "Instructions: Answer conversationally but professionally in {language}. \
         Use your tools to fetch real data when relevant. \
         Be concrete with figures and data points. \
         Keep the answer focused and concise (under 500 words). \
         If the user's investment profile is present, tailor your answer to their preferences."
    ));

    parts.join("\n")
}

pub struct ChatOrchestrator {
    provider: Arc<dyn LlmProvider>,
    classifier: IntentClassifier,
    toolbox: Toolbox,
    profiles: Arc<ProfileStore>,
    config: AdvisorConfig,
}

impl ChatOrchestrator {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        toolbox: Toolbox,
        profiles: Arc<ProfileStore>,
        config: AdvisorConfig,
    ) -> Self {
        let classifier = IntentClassifier::new(provider.clone(), config.classifier_model.clone());
        Self {
            provider,
            classifier,
            toolbox,
            profiles,
            config,
        }
    }

    /// Answer a question given the conversation so far. Never fails.
    ///
    /// `model` overrides the configured model for both the classifier and
    /// the specialist.
    pub async fn handle(&self, question: &str, history: &[ChatMessage], model: Option<&str>) -> (String, Intent) {
        let intent = self.classifier.classify(question, model).await.resolve();
        let profile_context = self.profiles.load().await.context_block();
        let task = build_task(question, history, &profile_context, &self.config.response_language);

        info!(intent = %intent, history = history.len(), "Routing chat question");

        let answer = match self.dispatch(intent, &task, &profile_context, model).await {
            Ok(answer) => answer,
            Err(e) => {
                error!(intent = %intent, error = %e, "Agent execution failed");
                format!("Sorry, an error occurred while processing your question: {e}")
            }
        };
        (answer, intent)
    }

    async fn dispatch(
        &self,
        intent: Intent,
        task: &str,
        profile_context: &str,
        model: Option<&str>,
    ) -> CoreResult<String> {
        let agent = AgentSpec::for_intent(intent, &self.config).with_model(model).build(
            self.provider.clone(),
            &self.toolbox,
            profile_context,
            &self.config,
        )?;
        agent.execute(task).await
    }

    /// Full chat turn against the persisted log: record the question, answer
    /// it, record the attributed answer.
    pub async fn chat_turn(
        &self,
        question: &str,
        history: &ChatHistoryStore,
        model: Option<&str>,
    ) -> Result<ChatReply> {
        let log = history.append(ChatMessage::user(question)).await?;
        let (answer, intent) = self.handle(question, &log, model).await;
        history
            .append(ChatMessage::assistant(answer.clone(), intent))
            .await?;

        Ok(ChatReply {
            answer,
            intent,
            agent_name: intent.display_name(),
        })
    }
}
