use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use super::auth::{AuthUser, Viewer};
use super::validation::{page_request, validate_id};
use super::{
    ApiError, ApiResponse, AppState, PaginationQuery, RecipesLimitQuery, RegisterRequest,
    SetPasswordRequest, SubscriptionDto, SubscriptionQuery, UserDto,
};
use crate::models::Page;
use crate::services::UserError;

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::NotFound(id) => Self::not_found("User", id),
            UserError::SelfFollowRejected | UserError::NotFollowing => {
                Self::validation(err.to_string())
            }
            UserError::AlreadyFollowing => Self::Conflict(err.to_string()),
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::internal(msg),
        }
    }
}

/// POST /users/
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = state.auth_service().register(payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(user))))
}

/// GET /users/
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ApiResponse<Page<UserDto>>>, ApiError> {
    let page = page_request(query.page, query.limit, &state.config().pagination)?;
    let users = state.user_service().list_users(viewer.id(), page).await?;
    Ok(Json(ApiResponse::success(users)))
}

/// GET /users/{id}/
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let id = validate_id("user", id)?;
    let user = state.user_service().get_user(viewer.id(), id).await?;
    Ok(Json(ApiResponse::success(user)))
}

/// GET /users/me/
pub async fn me(AuthUser(user): AuthUser) -> Json<ApiResponse<UserDto>> {
    Json(ApiResponse::success(UserDto::from_user(user, false)))
}

/// POST /users/set_password/
pub async fn set_password(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<SetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .auth_service()
        .change_password(user.id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /users/subscriptions/
pub async fn subscriptions(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Query(query): Query<SubscriptionQuery>,
) -> Result<Json<ApiResponse<Page<SubscriptionDto>>>, ApiError> {
    let page = page_request(query.page, query.limit, &state.config().pagination)?;
    let authors = state
        .user_service()
        .subscriptions(user.id, page, query.recipes_limit)
        .await?;
    Ok(Json(ApiResponse::success(authors)))
}

/// POST /users/{id}/subscribe/
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    Query(query): Query<RecipesLimitQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let id = validate_id("user", id)?;
    let author = state
        .user_service()
        .subscribe(user.id, id, query.recipes_limit)
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(author))))
}

/// DELETE /users/{id}/subscribe/
pub async fn unsubscribe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let id = validate_id("user", id)?;
    state.user_service().unsubscribe(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
