//! Portfolio advisor HTTP server
//!
//! Axum-based REST API over the chat orchestrator, the analysis workflows and
//! the JSON-backed portfolio, profile and chat-history stores.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::LlmProvider;
use agent_runtime::OpenAiProvider;
use portfolio_advisor::{AdvisorConfig, FxConverter, MarketData, MockMarketData, YahooMarketData};

use crate::handlers::{
    add_holding, chat_handler, chat_history, clear_chat_history, full_analysis, fx_status,
    get_profile, health_check, list_holdings, list_models, news_analysis, portfolio_analysis,
    portfolio_overview, quote, remove_holding, reset_profile, stock_analysis, update_profile,
};
use crate::state::AppState;

/// Router with every API route bound to `state`
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & info
        .route("/health", get(health_check))
        .route("/api/models", get(list_models))
        .route("/api/fx", get(fx_status))
        .route("/api/quote/{ticker}", get(quote))

        // Chat
        .route("/api/chat", post(chat_handler))
        .route("/api/chat/history", get(chat_history).delete(clear_chat_history))

        // Analysis workflows
        .route("/api/analysis/stock", post(stock_analysis))
        .route("/api/analysis/news", post(news_analysis))
        .route("/api/analysis/portfolio", post(portfolio_analysis))
        .route("/api/analysis/full", post(full_analysis))

        // Portfolio
        .route("/api/portfolio", get(list_holdings).post(add_holding))
        .route("/api/portfolio/overview", get(portfolio_overview))
        .route("/api/portfolio/{ticker}", delete(remove_holding))

        // Investment profile
        .route("/api/profile", get(get_profile).put(update_profile).delete(reset_profile))

        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// `MARKET_DATA=mock` selects the offline data set
fn market_data() -> anyhow::Result<Arc<dyn MarketData>> {
    let source = std::env::var("MARKET_DATA").unwrap_or_default();
    if source.eq_ignore_ascii_case("mock") {
        Ok(Arc::new(MockMarketData::new()))
    } else {
        Ok(Arc::new(YahooMarketData::new()?))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = AdvisorConfig::from_env()?;

    // Initialize LLM provider
    let openai = OpenAiProvider::from_env()?;
    if !openai.config().has_api_key() {
        tracing::warn!("⚠ OPENAI_API_KEY not set - only keyless local servers will work");
    }
    let provider: Arc<dyn LlmProvider> = Arc::new(openai);

    match provider.health_check().await {
        Ok(true) => {
            tracing::info!("✓ Connected to LLM provider");
            if let Ok(models) = provider.list_models().await {
                tracing::debug!("{} models available", models.len());
            }
        }
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ LLM provider not reachable - chat and analyses will fail");
            tracing::warn!("  Check OPENAI_BASE_URL and OPENAI_API_KEY in .env");
        }
    }

    let market = market_data()?;
    tracing::info!("Market data: {}", market.name());

    let fx = Arc::new(FxConverter::from_config(&config)?);

    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "Models: {} (agents), {} (classifier); answers in {}",
        config.default_model,
        config.classifier_model,
        config.response_language
    );

    let state = AppState::new(provider, market, fx, config);
    let app = app(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 portfolio advisor running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                   - Health check");
    tracing::info!("  POST /api/chat                 - Ask the advisor");
    tracing::info!("  GET  /api/chat/history         - Persisted conversation");
    tracing::info!("  POST /api/analysis/{{stock,news,full,portfolio}}");
    tracing::info!("  GET  /api/portfolio/overview   - Holdings valued in EUR");
    tracing::info!("  GET  /api/quote/{{ticker}}       - Quick lookup in EUR");
    tracing::info!("  GET  /api/profile              - Investment profile");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
