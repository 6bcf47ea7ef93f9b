use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::Query;
use std::sync::Arc;

use super::auth::{AuthUser, Viewer};
use super::validation::{page_request, parse_author, parse_flag, validate_id};
use super::{ApiError, ApiResponse, AppState, RecipeDto, RecipeListQuery, RecipeSummaryDto};
use crate::models::Page;
use crate::models::recipe::{RecipeFilter, RecipeInput, RecipeList};
use crate::services::{RecipeError, shopping_list};

impl From<RecipeError> for ApiError {
    fn from(err: RecipeError) -> Self {
        if let Some(field) = err.field_name() {
            let field = field.to_string();
            return Self::field(field, err.to_string());
        }

        match err {
            RecipeError::NotFound(id) => Self::not_found("Recipe", id),
            RecipeError::Forbidden => Self::Forbidden(err.to_string()),
            RecipeError::DuplicateRecipeName(_) | RecipeError::AlreadyPresent(_) => {
                Self::Conflict(err.to_string())
            }
            RecipeError::NotPresent(_) => Self::validation(err.to_string()),
            RecipeError::Database(msg) => Self::DatabaseError(msg),
            other => Self::internal(other.to_string()),
        }
    }
}

/// GET /recipes/
///
/// `is_favorited` and `is_in_shopping_cart` are ignored for anonymous callers.
pub async fn list_recipes(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Query(query): Query<RecipeListQuery>,
) -> Result<Json<ApiResponse<Page<RecipeDto>>>, ApiError> {
    let page = page_request(query.page, query.limit, &state.config().pagination)?;

    let favorited = parse_flag("is_favorited", query.is_favorited.as_deref())?;
    let in_cart = parse_flag("is_in_shopping_cart", query.is_in_shopping_cart.as_deref())?;
    let viewer_id = viewer.id();

    let filter = RecipeFilter {
        author: parse_author(query.author.as_deref())?,
        tags: query
            .tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect(),
        favorited_by: viewer_id.filter(|_| favorited),
        in_shopping_cart_of: viewer_id.filter(|_| in_cart),
    };

    let recipes = state.recipe_service().list(viewer_id, filter, page).await?;
    Ok(Json(ApiResponse::success(recipes)))
}

/// GET /recipes/{id}/
pub async fn get_recipe(
    State(state): State<Arc<AppState>>,
    viewer: Viewer,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let id = validate_id("recipe", id)?;
    let recipe = state.recipe_service().get(viewer.id(), id).await?;
    Ok(Json(ApiResponse::success(recipe)))
}

/// POST /recipes/
pub async fn create_recipe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(payload): Json<RecipeInput>,
) -> Result<impl IntoResponse, ApiError> {
    let recipe = state.recipe_service().create(user.id, payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(recipe))))
}

/// PUT|PATCH /recipes/{id}/
pub async fn update_recipe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<RecipeInput>,
) -> Result<Json<ApiResponse<RecipeDto>>, ApiError> {
    let id = validate_id("recipe", id)?;
    let recipe = state.recipe_service().update(user.id, id, payload).await?;
    Ok(Json(ApiResponse::success(recipe)))
}

/// DELETE /recipes/{id}/
pub async fn delete_recipe(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let id = validate_id("recipe", id)?;
    state.recipe_service().delete(user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_to_list(
    state: &AppState,
    user_id: i32,
    id: i32,
    list: RecipeList,
) -> Result<(StatusCode, Json<ApiResponse<RecipeSummaryDto>>), ApiError> {
    let id = validate_id("recipe", id)?;
    let summary = state.recipe_service().add_to_list(user_id, id, list).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(summary))))
}

async fn remove_from_list(
    state: &AppState,
    user_id: i32,
    id: i32,
    list: RecipeList,
) -> Result<StatusCode, ApiError> {
    let id = validate_id("recipe", id)?;
    state
        .recipe_service()
        .remove_from_list(user_id, id, list)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /recipes/{id}/favorite/
pub async fn add_favorite(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    add_to_list(&state, user.id, id, RecipeList::Favorites).await
}

/// DELETE /recipes/{id}/favorite/
pub async fn remove_favorite(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    remove_from_list(&state, user.id, id, RecipeList::Favorites).await
}

/// POST /recipes/{id}/shopping_cart/
pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    add_to_list(&state, user.id, id, RecipeList::ShoppingCart).await
}

/// DELETE /recipes/{id}/shopping_cart/
pub async fn remove_from_cart(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    remove_from_list(&state, user.id, id, RecipeList::ShoppingCart).await
}

/// GET /recipes/download_shopping_cart/
pub async fn download_shopping_cart(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let items = state.recipe_service().shopping_list(user.id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, shopping_list::CONTENT_TYPE),
            (header::CONTENT_DISPOSITION, shopping_list::CONTENT_DISPOSITION),
        ],
        shopping_list::render_csv(&items),
    ))
}
