//! Spendwise Web Server
//!
//! Axum-based REST API for Spendwise.
//!
//! Security features:
//! - Delegated authentication (upstream auth header or API key), use --no-auth for local dev
//! - Restrictive CORS policy
//! - Input validation (pagination limits, date and period parsing)
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{error, info, warn};

use spendwise_core::ai::{AIBackend, AIClient, AiLimits, Assistant};
use spendwise_core::db::Database;
use spendwise_core::{AnalyticsConfig, Outcome};

mod handlers;

/// Maximum pagination limit
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Default header carrying the user id set by an authenticating proxy
pub const DEFAULT_USER_HEADER: &str = "x-authenticated-user";

/// User id header accepted alongside an API key, and in no-auth mode
const USER_ID_HEADER: &str = "x-user-id";

/// Authorization header for API key auth
const AUTHORIZATION_HEADER: &str = "authorization";

/// User id used when auth is disabled and no x-user-id header is sent
const LOCAL_USER: &str = "local";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether authentication is required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only in production)
    pub allowed_origins: Vec<String>,
    /// API keys for service access; the caller names the user with `x-user-id`
    /// Format: "Bearer <key>" in Authorization header
    pub api_keys: Vec<String>,
    /// Header an upstream auth proxy sets to the authenticated user id
    pub user_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            api_keys: vec![],
            user_header: DEFAULT_USER_HEADER.to_string(),
        }
    }
}

impl ServerConfig {
    /// Parse a comma-separated API key list (as in `SPENDWISE_API_KEYS`)
    pub fn parse_api_keys(input: &str) -> Vec<String> {
        input
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: ServerConfig,
    pub analytics: AnalyticsConfig,
    /// Chat and narrative insights; None when no LLM backend is configured
    pub assistant: Option<Assistant>,
}

/// The user a request acts for, resolved by `auth_middleware`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

/// Authentication middleware - resolves the acting user or rejects the request
///
/// # Security Notes
///
/// **Upstream auth header**: the configured `user_header` is trusted as-is. Only
/// deploy this behind a proxy that strips the header from client requests.
///
/// **API keys**: compared in constant time. An API key authenticates the
/// calling service, which then names the user with `x-user-id`.
///
/// With auth disabled, `x-user-id` is honored when present and the user is
/// otherwise `local`.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match resolve_user(request.headers(), &state.config) {
        Ok(user) => {
            tracing::debug!(user = %user, path = %path, "Request authenticated");
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(rejection) => {
            warn!(path = %path, reason = rejection.message, "Unauthorized request");
            rejection.into_response()
        }
    }
}

struct Rejection {
    status: StatusCode,
    message: &'static str,
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({
                "success": false,
                "error": self.message
            })),
        )
            .into_response()
    }
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn resolve_user(headers: &HeaderMap, config: &ServerConfig) -> Result<String, Rejection> {
    if !config.require_auth {
        return Ok(header_value(headers, USER_ID_HEADER)
            .unwrap_or(LOCAL_USER)
            .to_string());
    }

    if let Some(user) = header_value(headers, &config.user_header) {
        return Ok(user.to_string());
    }

    let api_key_valid = header_value(headers, AUTHORIZATION_HEADER)
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(|key| validate_api_key(key, &config.api_keys))
        .unwrap_or(false);

    if api_key_valid {
        return header_value(headers, USER_ID_HEADER)
            .map(str::to_string)
            .ok_or(Rejection {
                status: StatusCode::BAD_REQUEST,
                message: "x-user-id header is required with an API key",
            });
    }

    Err(Rejection {
        status: StatusCode::UNAUTHORIZED,
        message: "Authentication required",
    })
}

/// Validate API key using constant-time comparison
fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();
    valid_keys.iter().any(|key| {
        let key_bytes = key.as_bytes();
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// GET /health - liveness check, outside authentication
async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Build the application router
///
/// `assistant` is None when no LLM backend is configured; AI routes then
/// answer 503.
pub fn create_router(
    db: Database,
    static_dir: Option<&str>,
    config: ServerConfig,
    analytics: AnalyticsConfig,
    assistant: Option<Assistant>,
) -> Router {
    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        analytics,
        assistant,
    });

    let api_routes = Router::new()
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route(
            "/transactions/:id",
            get(handlers::get_transaction)
                .put(handlers::update_transaction)
                .delete(handlers::delete_transaction),
        )
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route(
            "/categories/:id",
            put(handlers::update_category).delete(handlers::delete_category),
        )
        .route(
            "/categories/init-defaults",
            post(handlers::init_default_categories),
        )
        .route(
            "/budgets",
            get(handlers::list_budgets).post(handlers::upsert_budget),
        )
        .route("/budgets/:id", delete(handlers::delete_budget))
        .route("/goals", get(handlers::list_goals).post(handlers::create_goal))
        .route(
            "/goals/:id",
            put(handlers::update_goal).delete(handlers::delete_goal),
        )
        .route("/goals/:id/contribute", post(handlers::contribute_to_goal))
        .route(
            "/goals/:id/contributions",
            get(handlers::list_goal_contributions),
        )
        .route("/reports/summary", get(handlers::report_summary))
        .route("/reports/by-category", get(handlers::report_by_category))
        .route("/reports/monthly-trend", get(handlers::report_monthly_trend))
        .route("/reports/budget-status", get(handlers::report_budget_status))
        .route("/analytics/anomalies", get(handlers::detect_anomalies))
        .route("/analytics/health-score", get(handlers::health_score))
        .route("/analytics/savings", get(handlers::savings_recommendations))
        .route("/analytics/insights", get(handlers::generate_insights))
        .route("/smart/analysis", get(handlers::smart_analysis))
        .route("/smart/patterns", get(handlers::spending_patterns))
        .route("/smart/budget-suggestions", get(handlers::budget_suggestions))
        .route("/smart/forecast", get(handlers::financial_forecast))
        .route("/predictions/next-month", get(handlers::predict_next_month))
        .route("/predictions/by-category", get(handlers::predict_by_category))
        .route("/chat/message", post(handlers::send_message))
        .route("/chat/clear", post(handlers::clear_history));

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let headers = [
        header::CONTENT_TYPE,
        header::AUTHORIZATION,
        header::HeaderName::from_static(USER_ID_HEADER),
    ];
    let cors = if config.allowed_origins.is_empty() {
        // Same-origin only (no cross-origin requests allowed)
        CorsLayer::new().allow_methods(methods).allow_headers(headers)
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
    };

    let api = Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    let mut app = Router::new()
        .route("/health", get(health))
        .merge(api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'; frame-ancestors 'none'"),
        ));

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Bind `host:port` and serve until the process exits
pub async fn serve(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
    analytics: AnalyticsConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!("⚠️  Authentication disabled - do not expose to network!");
    }
    if config.require_auth && config.api_keys.is_empty() {
        info!(
            header = %config.user_header,
            "No API keys configured, relying on upstream auth header"
        );
    }

    let assistant = check_ai_connection().await;

    let app = create_router(db, static_dir, config, analytics, assistant);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection() -> Option<Assistant> {
    match AIClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                // Keep the assistant; calls fail per request until the backend recovers
                warn!(
                    "⚠️  AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
            Some(Assistant::new(client, AiLimits::default()))
        }
        None => {
            info!("ℹ️  AI backend not configured (set OPENAI_COMPATIBLE_HOST to enable chat and insights)");
            None
        }
    }
}

// ============================================================================
// Response envelope
// ============================================================================

/// Successful analytics response body
#[derive(Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Render an analytics outcome
///
/// Insufficient data is not an error: it becomes a 200 whose `data` is `empty`
/// (the result's collections, all empty) plus the user-facing `message`.
pub(crate) fn outcome_response<T: Serialize>(
    outcome: Outcome<T>,
    empty: Value,
) -> Result<Json<Value>, AppError> {
    match outcome {
        Outcome::Ready(data) => Ok(Json(serde_json::json!({
            "success": true,
            "data": data
        }))),
        Outcome::InsufficientData { message } => {
            let mut data = match empty {
                Value::Object(map) => map,
                _ => serde_json::Map::new(),
            };
            data.insert("message".to_string(), Value::String(message));
            Ok(Json(serde_json::json!({
                "success": true,
                "data": data
            })))
        }
        Outcome::Failure { cause } => Err(AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Analysis failed".to_string(),
            internal: Some(anyhow::anyhow!(cause)),
        }),
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn not_found(msg: &str) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn internal(msg: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn unavailable(msg: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map a core error, surfacing validation and lookup failures to the client
    pub fn from_core(err: spendwise_core::Error) -> Self {
        use spendwise_core::Error;

        match err {
            Error::InvalidData(msg) | Error::Import(msg) => Self::bad_request(&msg),
            Error::NotFound(what) => Self::not_found(&format!("Not found: {}", what)),
            other => other.into(),
        }
    }

    /// Map an LLM failure the way chat clients expect
    pub fn from_ai(err: spendwise_core::Error) -> Self {
        use spendwise_core::Error;

        match err {
            Error::InvalidData(msg) => Self::bad_request(&msg),
            Error::Ai { status: 401, .. } | Error::Ai { status: 403, .. } => Self {
                status: StatusCode::UNAUTHORIZED,
                message: "Invalid API key. Please check OPENAI_COMPATIBLE_API_KEY.".to_string(),
                internal: Some(err.into()),
            },
            Error::Ai { status: 429, .. } | Error::RateLimited { .. } => Self {
                status: StatusCode::TOO_MANY_REQUESTS,
                message: "Rate limit exceeded. Please try again later.".to_string(),
                internal: Some(err.into()),
            },
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "Failed to process message".to_string(),
                internal: Some(other.into()),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "success": false,
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        let err = err.into();
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            // Return generic message to client
            message: "An internal error occurred".to_string(),
            // Keep full error for logging
            internal: Some(err),
        }
    }
}
