//! Specialist Agents
//!
//! An [`AgentSpec`] is the identity of a specialist (role, goal, backstory)
//! plus the tool group it may use. A fresh [`Agent`] is built from the spec
//! for every invocation, so no state is shared between calls.

use std::sync::Arc;

use agent_core::{Agent, AgentBuilder, LlmProvider, Result as CoreResult};
use serde::Serialize;

use crate::config::AdvisorConfig;
use crate::model::Intent;
use crate::svckit::{ToolGroup, Toolbox};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentSpec {
    pub role: String,
    pub goal: String,
    pub backstory: String,
    pub tool_group: ToolGroup,
    pub model: String,
    pub max_iterations: usize,
}

impl AgentSpec {
    /// Senior Investment Analyst: fundamental analysis
    pub fn research(config: &AdvisorConfig) -> Self {
        Self {
            role: "Senior Investment Analyst".into(),
            goal: "Deliver in-depth, actionable fundamental analysis of stocks. Assess financial \
                   health, growth potential, competitive position, and risk factors to arrive at \
                   a clear investment recommendation."
                .into(),
            backstory: "You are an investment analyst with more than 15 years of Wall Street \
                        experience. You specialize in high-growth opportunities, especially in \
                        space technology, robotics, AI, and emerging tech sectors. You have a sharp \
                        eye for small growth stocks with outsized potential and think in 5-10 year \
                        horizons. Portfolio managers value your thorough, data-driven reports."
                .into(),
            tool_group: ToolGroup::Research,
            model: config.default_model.clone(),
            max_iterations: config.max_iterations,
        }
    }

    /// Financial news analyst: news monitoring and impact assessment
    pub fn news(config: &AdvisorConfig) -> Self {
        Self {
            role: "Financial News Analyst".into(),
            goal: "Monitor, filter, and summarize the most relevant financial news for specific \
                   stocks. Assess the likely impact of each item on the share price and deliver \
                   actionable insights."
                .into(),
            backstory: "You are a financial journalist turned analyst with deep connections in the \
                        media landscape. You follow breaking news, earnings reports, regulatory \
                        changes, and market events that move stock prices, and you separate signal \
                        from noise."
                .into(),
            tool_group: ToolGroup::News,
            model: config.default_model.clone(),
            max_iterations: config.max_iterations,
        }
    }

    /// Portfolio manager: holdings tracking and portfolio-level insight
    pub fn portfolio(config: &AdvisorConfig) -> Self {
        Self {
            role: "Portfolio Manager".into(),
            goal: "Monitor the current portfolio, calculate performance metrics, identify top and \
                   bottom performers, assess overall risk, and give strategic recommendations for \
                   optimizing the portfolio."
                .into(),
            backstory: "You are a certified portfolio manager with expertise in risk management and \
                        asset allocation. You track cost bases and returns, identify concentration \
                        risk, and propose rebalancing strategies in clear, concise reports."
                .into(),
            tool_group: ToolGroup::Portfolio,
            model: config.default_model.clone(),
            max_iterations: config.max_iterations,
        }
    }

    /// Specialist answering `intent` (`Multi` is answered by research)
    pub fn for_intent(intent: Intent, config: &AdvisorConfig) -> Self {
        match intent.resolve() {
            Intent::News => Self::news(config),
            Intent::Portfolio => Self::portfolio(config),
            Intent::Research | Intent::Multi => Self::research(config),
        }
    }

    /// Same specialist on a per-request model; `None` keeps the configured one
    #[must_use]
    pub fn with_model(mut self, model: Option<&str>) -> Self {
        if let Some(model) = model {
            self.model = model.to_string();
        }
        self
    }

    /// Persona, working instructions, and the optional profile block
    pub fn system_prompt(&self, profile_context: &str, language: &str) -> String {
        let mut prompt = format!(
            "You are a {role}.\n\n\
             **Goal:** {goal}\n\n\
             **Backstory:** {backstory}\n\n\
             Instructions:\n\
             - Use the available tools to gather data before drawing conclusions.\n\
             - Be thorough, data-driven, and professional.\n\
             - Format your answer as clean Markdown.\n\
             - Always cite concrete figures and metrics from the tools.\n\
             - ALWAYS respond in {language}.\n",
            role = self.role,
            goal = self.goal,
            backstory = self.backstory,
        );

        if !profile_context.trim().is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(profile_context.trim_end());
            prompt.push('\n');
        }
        prompt
    }

    /// Fresh agent wired to this spec's tool group
    pub fn build(
        &self,
        provider: Arc<dyn LlmProvider>,
        toolbox: &Toolbox,
        profile_context: &str,
        config: &AdvisorConfig,
    ) -> CoreResult<Agent> {
        AgentBuilder::new()
            .provider(provider)
            .tools(toolbox.registry(self.tool_group))
            .system_prompt(self.system_prompt(profile_context, &config.response_language))
            .model(self.model.clone())
            .temperature(config.temperature)
            .max_iterations(self.max_iterations)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_intent_routing() {
        let config = AdvisorConfig::default();
        assert_eq!(AgentSpec::for_intent(Intent::News, &config).tool_group, ToolGroup::News);
        assert_eq!(
            AgentSpec::for_intent(Intent::Portfolio, &config).role,
            "Portfolio Manager"
        );
        assert_eq!(
            AgentSpec::for_intent(Intent::Multi, &config),
            AgentSpec::research(&config)
        );
    }

    #[test]
    fn test_with_model_override() {
        let config = AdvisorConfig::default();
        assert_eq!(AgentSpec::news(&config).with_model(None).model, "gpt-4o");
        assert_eq!(AgentSpec::news(&config).with_model(Some("gpt-4o-mini")).model, "gpt-4o-mini");
    }

    #[test]
    fn test_system_prompt_layout() {
        let spec = AgentSpec::research(&AdvisorConfig::default());

        let plain = spec.system_prompt("", "German");
        assert!(plain.starts_with("You are a Senior Investment Analyst.\n\n**Goal:**"));
        assert!(plain.contains("ALWAYS respond in German."));
        assert!(!plain.contains("ANLAGEPROFIL"));

        let personalized = spec.system_prompt("ANLAGEPROFIL DES NUTZERS:\n- Risikobereitschaft: Hoch", "German");
        assert!(personalized.ends_with("- Risikobereitschaft: Hoch\n"));
    }
}
