//! Signup, login and profile handlers

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{AppError, AppState};
use budgetwise_core::auth::{self, bearer_token};
use budgetwise_core::models::PublicUser;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Signup and login response
#[derive(Serialize)]
pub struct SessionResponse {
    pub message: String,
    pub user: PublicUser,
    pub token: String,
}

#[derive(Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// POST /api/auth/signup - Register and receive a token
pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = auth::signup(state.users.as_ref(), &body.name, &body.email, &body.password)
        .map_err(AppError::from_core)?;

    state.db.log_audit(
        &session.user.id,
        "signup",
        Some("user"),
        None,
        None,
    )?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            message: "User created successfully".to_string(),
            user: session.user,
            token: session.token,
        }),
    ))
}

/// POST /api/auth/login - Exchange credentials for a token
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = auth::login(state.users.as_ref(), &body.email, &body.password)
        .map_err(AppError::from_core)?;

    state
        .db
        .log_audit(&session.user.id, "login", Some("user"), None, None)?;

    Ok(Json(SessionResponse {
        message: "Login successful".to_string(),
        user: session.user,
        token: session.token,
    }))
}

/// GET /api/auth/profile - The user named by the bearer token
pub async fn profile(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<PublicUser>, AppError> {
    let token = bearer_token(
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok()),
    );

    let user = auth::profile(state.users.as_ref(), token).map_err(AppError::from_core)?;
    Ok(Json(user))
}

/// POST /api/auth/logout - Tokens are stateless, so this only acknowledges
pub async fn logout() -> Json<LogoutResponse> {
    Json(LogoutResponse {
        message: "Logout successful".to_string(),
    })
}
