//! Domain service for recipes, favorites and the shopping cart.

use crate::api::types::{RecipeDto, RecipeSummaryDto};
use crate::models::recipe::{RecipeFilter, RecipeInput, RecipeList, ShoppingListItem};
use crate::models::{Page, PageRequest};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecipeError {
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Ingredient {0} is listed more than once")]
    DuplicateIngredient(i32),

    #[error("Amount for ingredient {0} must be greater than zero")]
    InvalidAmount(i32),

    #[error("A recipe needs at least one ingredient")]
    EmptyIngredientList,

    #[error("Tag {0} is listed more than once")]
    DuplicateTag(i32),

    #[error("You already have a recipe named '{0}'")]
    DuplicateRecipeName(String),

    #[error("Recipe {0} not found")]
    NotFound(i32),

    #[error("Only the author can modify this recipe")]
    Forbidden,

    #[error("Recipe is already in your {}", .0.label())]
    AlreadyPresent(RecipeList),

    #[error("Recipe is not in your {}", .0.label())]
    NotPresent(RecipeList),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecipeError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Request field a validation failure refers to, if any.
    #[must_use]
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Validation { field, .. } => Some(field),
            Self::DuplicateIngredient(_) | Self::InvalidAmount(_) | Self::EmptyIngredientList => {
                Some("ingredients")
            }
            Self::DuplicateTag(_) => Some("tags"),
            _ => None,
        }
    }
}

impl From<sea_orm::DbErr> for RecipeError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for RecipeError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for recipe operations.
///
/// `viewer` is the authenticated caller, if any; it only drives the
/// `is_favorited` / `is_in_shopping_cart` / `is_subscribed` flags.
#[async_trait::async_trait]
pub trait RecipeService: Send + Sync {
    async fn list(
        &self,
        viewer: Option<i32>,
        filter: RecipeFilter,
        page: PageRequest,
    ) -> Result<Page<RecipeDto>, RecipeError>;

    async fn get(&self, viewer: Option<i32>, id: i32) -> Result<RecipeDto, RecipeError>;

    /// Validates and stores a new recipe owned by `author_id`.
    ///
    /// # Errors
    ///
    /// Validation runs in a fixed order: duplicate ingredient, non-positive
    /// amount, empty ingredient list, duplicate tag, field checks, unknown
    /// references, then [`RecipeError::DuplicateRecipeName`].
    async fn create(&self, author_id: i32, input: RecipeInput) -> Result<RecipeDto, RecipeError>;

    /// Replaces the recipe contents and both association sets atomically.
    async fn update(
        &self,
        user_id: i32,
        id: i32,
        input: RecipeInput,
    ) -> Result<RecipeDto, RecipeError>;

    async fn delete(&self, user_id: i32, id: i32) -> Result<(), RecipeError>;

    /// # Errors
    ///
    /// [`RecipeError::NotFound`] before any membership check, then
    /// [`RecipeError::AlreadyPresent`].
    async fn add_to_list(
        &self,
        user_id: i32,
        recipe_id: i32,
        list: RecipeList,
    ) -> Result<RecipeSummaryDto, RecipeError>;

    async fn remove_from_list(
        &self,
        user_id: i32,
        recipe_id: i32,
        list: RecipeList,
    ) -> Result<(), RecipeError>;

    /// Ingredient totals across the user's shopping cart, sorted by name then unit.
    async fn shopping_list(&self, user_id: i32) -> Result<Vec<ShoppingListItem>, RecipeError>;
}
