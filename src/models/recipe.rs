use sea_orm::FromQueryResult;
use serde::{Deserialize, Serialize};

/// One `(ingredient, amount)` pair of a recipe write payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientAmount {
    pub id: i32,
    pub amount: i32,
}

/// Everything the author supplies when creating or replacing a recipe.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeInput {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    /// `data:image/<ext>;base64,<payload>`; `None` keeps the current image on update
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tags: Vec<i32>,
    #[serde(default)]
    pub ingredients: Vec<IngredientAmount>,
}

/// Validated recipe row contents handed to the repository.
#[derive(Debug, Clone)]
pub struct RecipeRecord {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub tags: Vec<i32>,
    pub ingredients: Vec<IngredientAmount>,
}

/// Predicates for the recipe listing. All set predicates are AND-ed; `tags`
/// matches a recipe carrying any of the slugs.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author: Option<i32>,
    pub tags: Vec<String>,
    pub favorited_by: Option<i32>,
    pub in_shopping_cart_of: Option<i32>,
}

/// The two per-user recipe sets with add/remove membership semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeList {
    Favorites,
    ShoppingCart,
}

impl RecipeList {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Favorites => "favorites",
            Self::ShoppingCart => "shopping cart",
        }
    }
}

/// Ingredient line of a recipe as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct RecipeIngredientLine {
    #[serde(skip)]
    pub recipe_id: i32,
    pub id: i32,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// One aggregated line of the shopping list export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}
