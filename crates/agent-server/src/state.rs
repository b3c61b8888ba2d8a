//! Application State

use std::sync::Arc;

use agent_core::LlmProvider;
use portfolio_advisor::{
    AdvisorConfig, ChatHistoryStore, ChatOrchestrator, Crew, FxConverter, MarketData, PortfolioStore,
    ProfileStore, Toolbox,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// LLM provider (OpenAI or a compatible local server)
    pub provider: Arc<dyn LlmProvider>,

    /// Routes chat questions to the specialists
    pub orchestrator: Arc<ChatOrchestrator>,

    /// Fixed analysis workflows and dashboard aggregates
    pub crew: Arc<Crew>,

    pub market: Arc<dyn MarketData>,
    pub portfolio: Arc<PortfolioStore>,
    pub profiles: Arc<ProfileStore>,
    pub history: Arc<ChatHistoryStore>,
    pub fx: Arc<FxConverter>,

    pub config: Arc<AdvisorConfig>,
}

impl AppState {
    /// Wire stores, tools and agents from one configuration
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        market: Arc<dyn MarketData>,
        fx: Arc<FxConverter>,
        config: AdvisorConfig,
    ) -> Self {
        let portfolio = Arc::new(PortfolioStore::new(config.portfolio_path()));
        let profiles = Arc::new(ProfileStore::new(config.profile_path()));
        let history = Arc::new(ChatHistoryStore::new(
            config.chat_history_path(),
            config.max_chat_messages,
        ));

        let toolbox = Toolbox::new(market.clone(), portfolio.clone(), fx.clone());
        let orchestrator = Arc::new(ChatOrchestrator::new(
            provider.clone(),
            toolbox.clone(),
            profiles.clone(),
            config.clone(),
        ));
        let crew = Arc::new(Crew::new(
            provider.clone(),
            toolbox,
            profiles.clone(),
            config.clone(),
        ));

        Self {
            provider,
            orchestrator,
            crew,
            market,
            portfolio,
            profiles,
            history,
            fx,
            config: Arc::new(config),
        }
    }
}
