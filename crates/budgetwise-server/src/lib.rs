//! BudgetWise Web Server
//!
//! Axum-based REST API for the BudgetWise expense tracker.
//!
//! Security features:
//! - Bearer authentication with user tokens or service API keys (use --no-auth for local dev)
//! - Restrictive CORS policy
//! - Audit logging for expense, report and prediction access
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use budgetwise_core::auth::bearer_token;
use budgetwise_core::{
    AppConfig, CategoryPredictor, Database, HttpPredictor, ServerConfig, UserRepository,
};

mod handlers;

/// Maximum audit log page size
pub const MAX_PAGE_LIMIT: i64 = 1000;

/// Header the web client uses to identify the user for preference learning
pub const USER_ID_HEADER: &str = "x-user-id";

/// Audit identity for unauthenticated local access
const LOCAL_USER: &str = "local-dev";

/// Audit identity for service API keys
const API_KEY_USER: &str = "api-key";

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    /// Category prediction service, when configured
    pub predictor: Option<Arc<dyn CategoryPredictor>>,
    pub users: Arc<dyn UserRepository>,
}

impl AppState {
    /// State backed by the database for users, with the predictor built from config
    pub fn new(db: Database, config: AppConfig) -> anyhow::Result<Self> {
        let predictor = HttpPredictor::from_config(&config.predictor)?
            .map(|p| Arc::new(p) as Arc<dyn CategoryPredictor>);
        Ok(Self {
            users: Arc::new(db.clone()),
            db,
            config,
            predictor,
        })
    }
}

/// Who is making the request (recorded in the audit log)
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser(pub String);

fn resolve_user(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let token = bearer_token(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
    )?;

    if validate_api_key(token, &state.config.server.api_keys) {
        return Some(API_KEY_USER.to_string());
    }

    match state.users.find_by_id(token) {
        Ok(user) => user.map(|u| u.id),
        Err(e) => {
            error!(error = %e, "User lookup failed");
            None
        }
    }
}

/// Authentication middleware - accepts user tokens or service API keys
///
/// Every request that passes gets a [`CurrentUser`] extension. With auth
/// disabled, unauthenticated requests run as `local-dev`.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let user = resolve_user(&state, request.headers());

    let user = match user {
        Some(user) => user,
        None if !state.config.server.require_auth => LOCAL_USER.to_string(),
        None => {
            warn!(path = %request.uri().path(), "Unauthorized request - no valid auth");
            return (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!({
                    "error": "Authentication required"
                })),
            )
                .into_response();
        }
    };

    request.extensions_mut().insert(CurrentUser(user));
    next.run(request).await
}

fn validate_api_key(provided: &str, valid_keys: &[String]) -> bool {
    use subtle::ConstantTimeEq;

    let provided_bytes = provided.as_bytes();
    valid_keys.iter().any(|key| {
        let key_bytes = key.as_bytes();
        provided_bytes.len() == key_bytes.len() && bool::from(provided_bytes.ct_eq(key_bytes))
    })
}

/// User id for predictor preference learning (`X-User-Id`, else `default`)
pub fn preference_user_id(headers: &HeaderMap) -> String {
    headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or("default")
        .to_string()
}

/// Create the application router from a database and config
pub fn create_router(db: Database, config: AppConfig) -> anyhow::Result<Router> {
    let state = AppState::new(db, config)?;
    if let Some(url) = &state.config.predictor.url {
        info!("Category predictor configured: {}", url);
    }
    Ok(create_router_with_state(state))
}

/// Create the application router around prepared state (for testing)
pub fn create_router_with_state(state: AppState) -> Router {
    let state = Arc::new(state);

    // Signup, login and logout are open; profile checks its own token
    let auth_routes = Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/profile", get(handlers::profile))
        .route("/logout", post(handlers::logout));

    let protected_routes = Router::new()
        .route(
            "/expenses",
            get(handlers::list_expenses).post(handlers::create_expense),
        )
        .route(
            "/expenses/:id",
            get(handlers::get_expense)
                .put(handlers::update_expense)
                .delete(handlers::delete_expense),
        )
        .route("/reports/trends", get(handlers::get_trends))
        .route("/reports/summary", get(handlers::get_summary))
        .route("/predict-category", post(handlers::predict_category))
        .route("/train-model", post(handlers::train_model))
        .route("/audit", get(handlers::list_audit_log))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    let cors = cors_layer(&state.config.server);

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
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
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static(USER_ID_HEADER),
        ]);

    if config.allowed_origins.is_empty() {
        // Same-origin only
        return base;
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    base.allow_origin(origins)
}

/// Start the server
pub async fn serve(db: Database, config: AppConfig) -> anyhow::Result<()> {
    if !config.server.require_auth {
        warn!("Authentication disabled - do not expose to network!");
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(db, config)?;
    check_predictor(&state).await;

    let app = create_router_with_state(state);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log prediction service status
async fn check_predictor(state: &AppState) {
    match (&state.predictor, &state.config.predictor.url) {
        (Some(predictor), Some(url)) => {
            if predictor.health_check().await {
                info!("Category predictor connected: {}", url);
            } else {
                warn!("Category predictor configured but not responding: {}", url);
            }
        }
        _ => info!("Category predictor not configured (set BW_PREDICTOR_URL to enable)"),
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
        Self::with_status(StatusCode::BAD_REQUEST, msg)
    }

    pub fn unauthorized(msg: &str) -> Self {
        Self::with_status(StatusCode::UNAUTHORIZED, msg)
    }

    pub fn not_found(msg: &str) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, msg)
    }

    pub fn conflict(msg: &str) -> Self {
        Self::with_status(StatusCode::CONFLICT, msg)
    }

    pub fn unavailable(msg: &str) -> Self {
        Self::with_status(StatusCode::SERVICE_UNAVAILABLE, msg)
    }

    fn with_status(status: StatusCode, msg: &str) -> Self {
        Self {
            status,
            message: msg.to_string(),
            internal: None,
        }
    }

    /// Map core errors that carry a client-facing meaning onto a status
    ///
    /// Anything else is a 500 with a generic message.
    pub fn from_core(err: budgetwise_core::Error) -> Self {
        use budgetwise_core::Error;
        match err {
            Error::InvalidData(msg) => Self::bad_request(&msg),
            Error::NotFound(msg) => Self::not_found(&msg),
            Error::Auth(msg) => Self::unauthorized(&msg),
            Error::Conflict(msg) => Self::conflict(&msg),
            Error::Predictor(msg) => Self {
                status: StatusCode::BAD_GATEWAY,
                message: "Category predictor failed".to_string(),
                internal: Some(anyhow::anyhow!(msg)),
            },
            Error::Http(e) => Self {
                status: StatusCode::BAD_GATEWAY,
                message: "Category predictor unreachable".to_string(),
                internal: Some(e.into()),
            },
            other => other.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
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
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "An internal error occurred".to_string(),
            internal: Some(err.into()),
        }
    }
}

#[cfg(test)]
mod tests;
