use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::sync::Arc;

use super::validation::validate_id;
use super::{ApiError, ApiResponse, AppState, IngredientDto, IngredientQuery};

/// GET /ingredients/?name=<prefix>
pub async fn list_ingredients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<IngredientQuery>,
) -> Result<Json<ApiResponse<Vec<IngredientDto>>>, ApiError> {
    let prefix = query.name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let ingredients = state.store().search_ingredients(prefix).await?;
    Ok(Json(ApiResponse::success(
        ingredients.into_iter().map(IngredientDto::from).collect(),
    )))
}

/// GET /ingredients/{id}/
pub async fn get_ingredient(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<IngredientDto>>, ApiError> {
    let id = validate_id("ingredient", id)?;
    let ingredient = state
        .store()
        .get_ingredient(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Ingredient", id))?;
    Ok(Json(ApiResponse::success(IngredientDto::from(ingredient))))
}
