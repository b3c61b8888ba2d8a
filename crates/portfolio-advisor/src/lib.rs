//! # portfolio-advisor
//!
//! Stock portfolio assistant built on `agent-core`: three specialist agents
//! (research, news, portfolio) behind an intent router, with market-data and
//! portfolio tools, an investment profile injected into every prompt, and all
//! amounts reported in EUR.
//!
//! ## Flow of a chat turn
//!
//! ```text
//! question ──► IntentClassifier ──► AgentSpec::for_intent ──► Agent loop
//!                (LLM label,            (persona + profile)      │   ▲
//!                 keyword fallback)                              ▼   │
//!                                                       Toolbox registry
//!                                               (MarketData, PortfolioStore, Fx)
//! ```
//!
//! Every data-source failure inside a tool reaches the model as an
//! `{"error": ...}` result; failures of a whole chat turn become an
//! apologetic answer.

pub mod agents;
pub mod classifier;
pub mod config;
pub mod crew;
pub mod currency;
pub mod error;
pub mod market;
pub mod model;
pub mod orchestrator;
pub mod profile;
pub mod store;
pub mod svckit;
pub mod tasks;
pub mod valuation;

pub use agents::AgentSpec;
pub use classifier::{IntentClassifier, keyword_classify};
pub use config::AdvisorConfig;
pub use crew::{Crew, FullAnalysis, PortfolioOverview, QuoteOverview};
pub use currency::{FxConverter, FxStatus, format_eur};
pub use error::{AdvisorError, Result};
pub use market::{MarketData, MockMarketData, YahooMarketData};
pub use model::{ChatMessage, ChatRole, Holding, Intent};
pub use orchestrator::{ChatOrchestrator, ChatReply};
pub use profile::UserProfile;
pub use store::{ChatHistoryStore, PortfolioStore, ProfileStore};
pub use svckit::{ToolGroup, Toolbox};
pub use valuation::Valuation;

/// Re-export tools for easy registration
pub mod tools {
    pub use crate::svckit::{
        CompanyInfoTool, NewsSearchTool, PortfolioDataTool, ReturnsTool, StockDataTool,
    };
}
