//! HTTP Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use agent_core::provider::ModelInfo;
use portfolio_advisor::{
    AdvisorError, ChatMessage, FullAnalysis, FxStatus, Holding, Intent, PortfolioOverview,
    QuoteOverview, UserProfile,
};

use crate::state::AppState;

// ============================================================================
// Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub llm_connected: bool,
    pub model: String,
    pub market_data: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Overrides the configured models for this turn
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
    pub intent: Intent,
    pub agent: &'static str,
    pub emoji: &'static str,
    pub model: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct TickerRequest {
    pub ticker: String,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModelQuery {
    #[serde(default)]
    pub model: Option<String>,
}

/// Requested model, blank treated as none
fn model_choice(model: Option<&String>) -> Option<&str> {
    model.map(|m| m.trim()).filter(|m| !m.is_empty())
}

#[derive(Debug, Serialize)]
pub struct ReportResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
    pub report: String,
}

#[derive(Debug, Deserialize)]
pub struct AddHoldingRequest {
    pub ticker: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub shares: Decimal,
    /// Purchase price per share in EUR
    #[serde(with = "rust_decimal::serde::float")]
    pub cost_basis: Decimal,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub configured: bool,
    pub summary: String,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            configured: profile.is_configured(),
            summary: profile.summary(),
            profile,
        }
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.into(),
        }),
    )
}

/// Map advisor failures onto status codes
fn advisor_error(err: AdvisorError) -> ApiError {
    match err {
        AdvisorError::InvalidInput(msg) => api_error(StatusCode::BAD_REQUEST, "INVALID_INPUT", msg),
        AdvisorError::TickerNotFound(_) => {
            api_error(StatusCode::NOT_FOUND, "TICKER_NOT_FOUND", err.to_string())
        }
        AdvisorError::Agent(inner) => {
            tracing::error!("Agent error: {}", inner);
            api_error(StatusCode::BAD_GATEWAY, "AGENT_ERROR", inner.user_message())
        }
        AdvisorError::MarketData(_) | AdvisorError::Network(_) => {
            tracing::warn!("Market data error: {}", err);
            api_error(StatusCode::BAD_GATEWAY, "MARKET_DATA_ERROR", err.to_string())
        }
        other => {
            tracing::error!("Request failed: {}", other);
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", other.to_string())
        }
    }
}

// ============================================================================
// Health & Models
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let llm_connected = state.provider.health_check().await.unwrap_or(false);

    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        llm_connected,
        model: state.config.default_model.clone(),
        market_data: state.market.name().to_string(),
    })
}

/// Models offered by the provider
pub async fn list_models(State(state): State<AppState>) -> ApiResult<Json<Vec<ModelInfo>>> {
    state.provider.list_models().await.map(Json).map_err(|e| {
        tracing::warn!("Model listing failed: {}", e);
        api_error(StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE", e.user_message())
    })
}

// ============================================================================
// Chat
// ============================================================================

/// One routed chat turn; the exchange is appended to the persisted log
pub async fn chat_handler(
    State(state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let question = payload.message.trim();
    if question.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "EMPTY_MESSAGE", "Message must not be empty"));
    }

    let model = model_choice(payload.model.as_ref());
    let reply = state
        .orchestrator
        .chat_turn(question, &state.history, model)
        .await
        .map_err(advisor_error)?;

    Ok(Json(ChatResponse {
        message: reply.answer,
        intent: reply.intent,
        agent: reply.agent_name,
        emoji: reply.intent.emoji(),
        model: model.map_or_else(|| state.config.default_model.clone(), String::from),
    }))
}

pub async fn chat_history(State(state): State<AppState>) -> Json<Vec<ChatMessage>> {
    Json(state.history.load().await)
}

pub async fn clear_chat_history(State(state): State<AppState>) -> ApiResult<StatusCode> {
    state.history.clear().await.map_err(advisor_error)?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Analysis workflows
// ============================================================================

pub async fn stock_analysis(
    State(state): State<AppState>,
    Json(payload): Json<TickerRequest>,
) -> ApiResult<Json<ReportResponse>> {
    let ticker = required_ticker(&payload.ticker)?;
    let model = model_choice(payload.model.as_ref());
    let report = state.crew.stock_analysis(&ticker, model).await.map_err(advisor_error)?;
    Ok(Json(ReportResponse {
        ticker: Some(ticker),
        report,
    }))
}

pub async fn news_analysis(
    State(state): State<AppState>,
    Json(payload): Json<TickerRequest>,
) -> ApiResult<Json<ReportResponse>> {
    let ticker = required_ticker(&payload.ticker)?;
    let model = model_choice(payload.model.as_ref());
    let report = state.crew.news_analysis(&ticker, model).await.map_err(advisor_error)?;
    Ok(Json(ReportResponse {
        ticker: Some(ticker),
        report,
    }))
}

/// Model override via `?model=`; the workflow takes no body
pub async fn portfolio_analysis(
    State(state): State<AppState>,
    Query(query): Query<ModelQuery>,
) -> ApiResult<Json<ReportResponse>> {
    let model = model_choice(query.model.as_ref());
    let report = state.crew.portfolio_analysis(model).await.map_err(advisor_error)?;
    Ok(Json(ReportResponse { ticker: None, report }))
}

pub async fn full_analysis(
    State(state): State<AppState>,
    Json(payload): Json<TickerRequest>,
) -> ApiResult<Json<FullAnalysis>> {
    let ticker = required_ticker(&payload.ticker)?;
    let model = model_choice(payload.model.as_ref());
    state
        .crew
        .full_analysis(&ticker, model)
        .await
        .map(Json)
        .map_err(advisor_error)
}

fn required_ticker(raw: &str) -> ApiResult<String> {
    portfolio_advisor::model::parse_ticker(raw).map_err(advisor_error)
}

// ============================================================================
// Portfolio
// ============================================================================

pub async fn list_holdings(State(state): State<AppState>) -> Json<Vec<Holding>> {
    Json(state.portfolio.load().await)
}

/// Add shares; an existing position is merged at the weighted cost basis
pub async fn add_holding(
    State(state): State<AppState>,
    Json(payload): Json<AddHoldingRequest>,
) -> ApiResult<(StatusCode, Json<Holding>)> {
    let holding = state
        .portfolio
        .add_holding(&payload.ticker, payload.shares, payload.cost_basis)
        .await
        .map_err(advisor_error)?;

    tracing::info!(ticker = %holding.ticker, shares = %holding.shares, "Holding saved");
    Ok((StatusCode::CREATED, Json(holding)))
}

pub async fn remove_holding(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> ApiResult<StatusCode> {
    if state.portfolio.remove_holding(&ticker).await.map_err(advisor_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(
            StatusCode::NOT_FOUND,
            "HOLDING_NOT_FOUND",
            format!("No holding for '{ticker}'"),
        ))
    }
}

pub async fn portfolio_overview(State(state): State<AppState>) -> Json<PortfolioOverview> {
    Json(state.crew.portfolio_overview().await)
}

// ============================================================================
// Profile, FX, quotes
// ============================================================================

pub async fn get_profile(State(state): State<AppState>) -> Json<ProfileResponse> {
    Json(state.profiles.load().await.into())
}

pub async fn update_profile(
    State(state): State<AppState>,
    Json(profile): Json<UserProfile>,
) -> ApiResult<Json<ProfileResponse>> {
    let saved = state.profiles.save(profile).await.map_err(advisor_error)?;
    Ok(Json(saved.into()))
}

pub async fn reset_profile(State(state): State<AppState>) -> ApiResult<Json<ProfileResponse>> {
    let profile = state.profiles.reset().await.map_err(advisor_error)?;
    Ok(Json(profile.into()))
}

pub async fn fx_status(State(state): State<AppState>) -> Json<FxStatus> {
    Json(state.fx.status().await)
}

pub async fn quote(
    State(state): State<AppState>,
    Path(ticker): Path<String>,
) -> ApiResult<Json<QuoteOverview>> {
    let ticker = required_ticker(&ticker)?;
    state.crew.quote_overview(&ticker).await.map(Json).map_err(advisor_error)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Method, Request},
    };
    use portfolio_advisor::currency::{ManualClock, RateSource};
    use portfolio_advisor::{AdvisorConfig, FxConverter, MockMarketData};
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use agent_core::ScriptedProvider;

    use super::*;

    struct HalfRate;

    #[async_trait]
    impl RateSource for HalfRate {
        async fn eur_rate(&self, _base: &str) -> portfolio_advisor::Result<Decimal> {
            Ok(dec!(0.5))
        }
    }

    fn app(provider: ScriptedProvider, dir: &std::path::Path) -> Router {
        app_with(Arc::new(provider), dir)
    }

    fn app_with(provider: Arc<ScriptedProvider>, dir: &std::path::Path) -> Router {
        let config = AdvisorConfig {
            data_dir: dir.to_path_buf(),
            ..AdvisorConfig::default()
        };
        let fx = FxConverter::new(Arc::new(HalfRate), Arc::new(ManualClock::new()));
        let state = AppState::new(
            provider,
            Arc::new(MockMarketData::new()),
            Arc::new(fx),
            config,
        );
        crate::app(state)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => request
                .header("content-type", "application/json")
                .body(Body::from(json.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_chat_turn_is_routed_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(
            ScriptedProvider::new(vec![
                ScriptedProvider::text("portfolio"),
                ScriptedProvider::text("Your depot is empty."),
            ]),
            dir.path(),
        );

        let (status, body) = send(&app, Method::POST, "/api/chat", Some(json!({"message": "Wie steht mein Depot?"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Your depot is empty.");
        assert_eq!(body["intent"], "portfolio");
        assert_eq!(body["agent"], "Portfolio Monitor");
        assert_eq!(body["model"], "gpt-4o");

        let (_, history) = send(&app, Method::GET, "/api/chat/history", None).await;
        assert_eq!(history.as_array().unwrap().len(), 2);
        assert_eq!(history[1]["agent_type"], "portfolio");

        let (status, _) = send(&app, Method::DELETE, "/api/chat/history", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, history) = send(&app, Method::GET, "/api/chat/history", None).await;
        assert!(history.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chat_model_override() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            ScriptedProvider::text("research"),
            ScriptedProvider::text("RKLB is a long-term bet."),
        ]));
        let app = app_with(provider.clone(), dir.path());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/chat",
            Some(json!({"message": "Soll ich RKLB kaufen?", "model": "gpt-4o-mini"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["model"], "gpt-4o-mini");
        assert!(provider.requests().await.iter().all(|r| r.model == "gpt-4o-mini"));
    }

    #[tokio::test]
    async fn test_portfolio_analysis_model_query() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![ScriptedProvider::text("Healthy.")]));
        let app = app_with(provider.clone(), dir.path());

        let (status, body) = send(&app, Method::POST, "/api/analysis/portfolio?model=llama3.1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["report"], "Healthy.");
        assert_eq!(provider.requests().await[0].model, "llama3.1");
    }

    #[tokio::test]
    async fn test_malformed_ticker_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(ScriptedProvider::new(vec![]), dir.path());

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/analysis/news",
            Some(json!({"ticker": "NVDA/../../v7"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_empty_chat_message_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(ScriptedProvider::new(vec![]), dir.path());

        let (status, body) = send(&app, Method::POST, "/api/chat", Some(json!({"message": "   "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "EMPTY_MESSAGE");
    }

    #[tokio::test]
    async fn test_holdings_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(ScriptedProvider::new(vec![]), dir.path());

        let (status, holding) = send(
            &app,
            Method::POST,
            "/api/portfolio",
            Some(json!({"ticker": "nvda", "shares": 10, "cost_basis": 50.0})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(holding["ticker"], "NVDA");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/portfolio",
            Some(json!({"ticker": "RKLB", "shares": 0, "cost_basis": 10.0})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_INPUT");

        let (_, overview) = send(&app, Method::GET, "/api/portfolio/overview", None).await;
        assert_eq!(overview["currency"], "EUR");
        assert_eq!(overview["best"]["ticker"], "NVDA");
        assert_eq!(overview["fx_fallback"], false);

        let (status, _) = send(&app, Method::DELETE, "/api/portfolio/NVDA", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app, Method::DELETE, "/api/portfolio/NVDA", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "HOLDING_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_profile_update_and_reset() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(ScriptedProvider::new(vec![]), dir.path());

        let (_, profile) = send(&app, Method::GET, "/api/profile", None).await;
        assert_eq!(profile["configured"], false);
        assert_eq!(profile["summary"], "Nicht konfiguriert");

        let (status, profile) = send(
            &app,
            Method::PUT,
            "/api/profile",
            Some(json!({"risk_tolerance": "Hoch", "philosophy": "Buy quality, hold long"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["configured"], true);
        assert!(profile["last_updated"].is_string());

        let (_, profile) = send(&app, Method::DELETE, "/api/profile", None).await;
        assert_eq!(profile["configured"], false);
    }

    #[tokio::test]
    async fn test_quote_lookup_and_unknown_ticker() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(ScriptedProvider::new(vec![]), dir.path());

        let (status, quote) = send(&app, Method::GET, "/api/quote/aapl", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["price"], "€116,25");

        let (status, body) = send(&app, Method::GET, "/api/quote/ZZZZ", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "TICKER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_analysis_provider_failure_is_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(
            ScriptedProvider::new(vec![Err(agent_core::AgentError::ProviderUnavailable("down".into()))]),
            dir.path(),
        );

        let (status, body) = send(&app, Method::POST, "/api/analysis/stock", Some(json!({"ticker": "SAP.DE"}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["code"], "AGENT_ERROR");
    }

    #[tokio::test]
    async fn test_fx_status() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(ScriptedProvider::new(vec![]), dir.path());

        let (_, fx) = send(&app, Method::GET, "/api/fx", None).await;
        assert_eq!(fx["using_fallback"], false);
    }
}
