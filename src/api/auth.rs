use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{HeaderMap, StatusCode, header, request::Parts},
    response::IntoResponse,
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, LoginRequest, TokenDto};
use crate::db::User;
use crate::services::AuthError;

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation { field, message } => Self::field(field, message),
            AuthError::InvalidCredentials => Self::validation(err.to_string()),
            AuthError::InvalidToken => Self::Unauthorized(err.to_string()),
            AuthError::Database(msg) => Self::DatabaseError(msg),
            AuthError::Internal(msg) => Self::internal(msg),
        }
    }
}

// ============================================================================
// Extractors
// ============================================================================

/// The caller, if the request carries a valid token. A token that does not
/// resolve is rejected rather than treated as anonymous.
pub struct Viewer(pub Option<User>);

impl Viewer {
    #[must_use]
    pub fn id(&self) -> Option<i32> {
        self.0.as_ref().map(|u| u.id)
    }
}

/// An authenticated caller; anonymous requests get 401.
pub struct AuthUser(pub User);

impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = extract_token(&parts.headers) else {
            return Ok(Self(None));
        };

        let user = state.auth_service().authenticate(&token).await?;
        tracing::Span::current().record("user_id", user.id);
        Ok(Self(Some(user)))
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Viewer(user) = Viewer::from_request_parts(parts, state).await?;
        user.map(Self).ok_or_else(ApiError::unauthenticated)
    }
}

/// Token from `Authorization: Token <t>` or `Authorization: Bearer <t>`.
/// A present but unparseable header yields an empty token so it fails
/// authentication instead of silently downgrading to anonymous.
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?;
    let Ok(raw) = value.to_str() else {
        return Some(String::new());
    };

    let token = raw
        .strip_prefix("Token ")
        .or_else(|| raw.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or_default();

    Some(token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/token/login/
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.email.trim().is_empty() {
        return Err(ApiError::field("email", "Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::field("password", "Password is required"));
    }

    let auth_token = state
        .auth_service()
        .login(&payload.email, &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(TokenDto { auth_token })),
    ))
}

/// POST /auth/token/logout/
pub async fn logout(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<StatusCode, ApiError> {
    state.auth_service().logout(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
