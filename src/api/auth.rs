use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::services::Role;
use crate::services::auth_service::{AuthError, TokenPair, UserInfo};

use super::{ApiError, AppState};

// ============================================================================
// Request types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// The authenticated principal, inserted into request extensions by
/// [`auth_middleware`] and read by handlers and [`require_admin`].
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i32,
    pub email: String,
    pub role: Role,
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => Self::Unauthorized("Invalid credentials".to_string()),
            AuthError::EmailTaken => Self::Conflict("Email already registered".to_string()),
            AuthError::Validation(msg) => Self::ValidationError(vec![msg]),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Bearer-token authentication. On success the [`CurrentUser`] lands in the
/// request extensions; downstream layers and handlers read it from there.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_bearer(&headers) else {
        return Err(ApiError::unauthorized("Missing bearer token"));
    };

    let user = state
        .auth_service()
        .authenticate(&token)
        .await
        .map_err(|err| match err {
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
            _ => ApiError::unauthorized("Invalid or expired token"),
        })?;

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(CurrentUser {
        id: user.id,
        email: user.email,
        role: user.role,
    });
    Ok(next.run(request).await)
}

/// Role gate for the admin surface; runs after [`auth_middleware`].
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    match request.extensions().get::<CurrentUser>() {
        Some(user) if user.role == Role::Admin => Ok(next.run(request).await),
        Some(_) => Err(ApiError::Forbidden("Admin role required".to_string())),
        None => Err(ApiError::unauthorized("Not authenticated")),
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(axum::http::StatusCode, Json<TokenPair>), ApiError> {
    let tokens = state
        .auth_service()
        .register(&payload.email, &payload.password)
        .await?;
    Ok((axum::http::StatusCode::CREATED, Json(tokens)))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    if payload.email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let tokens = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;
    Ok(Json(tokens))
}

/// POST /auth/refresh
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenPair>, ApiError> {
    let tokens = state.auth_service().refresh(&payload.refresh_token).await?;
    Ok(Json(tokens))
}

/// GET /auth/me
pub async fn me(
    State(state): State<Arc<AppState>>,
    axum::Extension(user): axum::Extension<CurrentUser>,
) -> Result<Json<UserInfo>, ApiError> {
    let info = state.auth_service().user_info(user.id).await?;
    Ok(Json(info))
}
