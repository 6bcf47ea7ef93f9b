//! `SeaORM` implementation of the `RecipeService` trait.

use crate::api::types::{RecipeDto, RecipeSummaryDto, TagDto, UserDto, media_url};
use crate::db::{Recipe, Store, is_unique_violation};
use crate::models::recipe::{
    RecipeFilter, RecipeInput, RecipeList, RecipeRecord, ShoppingListItem,
};
use crate::models::{Page, PageRequest};
use crate::services::image::{DecodedImage, ImageService};
use crate::services::recipe_service::{RecipeError, RecipeService};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::info;

const MAX_NAME_LEN: usize = 200;

/// Checks that need no database access, in their reporting order.
pub fn validate_recipe_input(input: &RecipeInput) -> Result<(), RecipeError> {
    let mut seen = HashSet::new();
    for item in &input.ingredients {
        if !seen.insert(item.id) {
            return Err(RecipeError::DuplicateIngredient(item.id));
        }
    }

    if let Some(item) = input.ingredients.iter().find(|i| i.amount <= 0) {
        return Err(RecipeError::InvalidAmount(item.id));
    }

    if input.ingredients.is_empty() {
        return Err(RecipeError::EmptyIngredientList);
    }

    let mut seen = HashSet::new();
    for tag in &input.tags {
        if !seen.insert(*tag) {
            return Err(RecipeError::DuplicateTag(*tag));
        }
    }

    let name = input.name.trim();
    if name.is_empty() {
        return Err(RecipeError::field("name", "Recipe name is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(RecipeError::field(
            "name",
            format!("Recipe name must be {MAX_NAME_LEN} characters or less"),
        ));
    }

    if input.text.trim().is_empty() {
        return Err(RecipeError::field("text", "Recipe text is required"));
    }

    if input.cooking_time < 1 {
        return Err(RecipeError::field(
            "cooking_time",
            "Cooking time must be at least 1 minute",
        ));
    }

    Ok(())
}

pub struct SeaOrmRecipeService {
    store: Store,
    images: Arc<ImageService>,
}

impl SeaOrmRecipeService {
    #[must_use]
    pub const fn new(store: Store, images: Arc<ImageService>) -> Self {
        Self { store, images }
    }

    async fn find_recipe(&self, id: i32) -> Result<Recipe, RecipeError> {
        self.store
            .get_recipe(id)
            .await?
            .ok_or(RecipeError::NotFound(id))
    }

    /// Everything after the pure checks: referenced ids exist, then the
    /// author-scoped name is free.
    async fn validate_against_store(
        &self,
        author_id: i32,
        input: &RecipeInput,
        except: Option<i32>,
    ) -> Result<(), RecipeError> {
        let tag_ids = input.tags.clone();
        let known_tags = self.store.existing_tag_ids(&tag_ids).await?;
        if let Some(missing) = tag_ids.iter().find(|id| !known_tags.contains(id)) {
            return Err(RecipeError::field("tags", format!("Tag {missing} does not exist")));
        }

        let ingredient_ids: Vec<i32> = input.ingredients.iter().map(|i| i.id).collect();
        let known_ingredients = self.store.existing_ingredient_ids(&ingredient_ids).await?;
        if let Some(missing) = ingredient_ids
            .iter()
            .find(|id| !known_ingredients.contains(id))
        {
            return Err(RecipeError::field(
                "ingredients",
                format!("Ingredient {missing} does not exist"),
            ));
        }

        let name = input.name.trim();
        if self.store.recipe_name_taken(author_id, name, except).await? {
            return Err(RecipeError::DuplicateRecipeName(name.to_string()));
        }

        Ok(())
    }

    fn decode_image(image: Option<&str>) -> Result<Option<DecodedImage>, RecipeError> {
        image
            .filter(|s| !s.trim().is_empty())
            .map(DecodedImage::parse)
            .transpose()
            .map_err(|e| RecipeError::field("image", e.to_string()))
    }

    fn record(input: RecipeInput, image: Option<String>) -> RecipeRecord {
        RecipeRecord {
            name: input.name.trim().to_string(),
            text: input.text,
            cooking_time: input.cooking_time,
            image,
            tags: input.tags,
            ingredients: input.ingredients,
        }
    }

    /// Map a store failure, turning a lost race on the per-author name index
    /// into the same error as the pre-check.
    fn write_error(err: anyhow::Error, name: &str) -> RecipeError {
        if err
            .downcast_ref::<sea_orm::DbErr>()
            .is_some_and(is_unique_violation)
        {
            RecipeError::DuplicateRecipeName(name.to_string())
        } else {
            err.into()
        }
    }

    async fn to_dtos(
        &self,
        viewer: Option<i32>,
        recipes: Vec<Recipe>,
    ) -> Result<Vec<RecipeDto>, RecipeError> {
        let ids: Vec<i32> = recipes.iter().map(|r| r.id).collect();
        let mut author_ids: Vec<i32> = recipes.iter().map(|r| r.author_id).collect();
        author_ids.sort_unstable();
        author_ids.dedup();

        let mut tags = self.store.tags_for_recipes(&ids).await?;
        let mut lines = self.store.ingredient_lines_for_recipes(&ids).await?;
        let authors: HashMap<i32, _> = self
            .store
            .get_users_by_ids(&author_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        let (followed, favorited, in_cart) = match viewer {
            Some(viewer) => (
                self.store.followed_among(viewer, &author_ids).await?,
                self.store
                    .list_recipe_ids_among(RecipeList::Favorites, viewer, &ids)
                    .await?,
                self.store
                    .list_recipe_ids_among(RecipeList::ShoppingCart, viewer, &ids)
                    .await?,
            ),
            None => (HashSet::new(), HashSet::new(), HashSet::new()),
        };

        recipes
            .into_iter()
            .map(|recipe| {
                let author = authors.get(&recipe.author_id).cloned().ok_or_else(|| {
                    RecipeError::Internal(format!(
                        "Author {} of recipe {} is missing",
                        recipe.author_id, recipe.id
                    ))
                })?;

                Ok(RecipeDto {
                    id: recipe.id,
                    tags: tags
                        .remove(&recipe.id)
                        .unwrap_or_default()
                        .into_iter()
                        .map(TagDto::from)
                        .collect(),
                    author: UserDto::from_user(author, followed.contains(&recipe.author_id)),
                    ingredients: lines.remove(&recipe.id).unwrap_or_default(),
                    is_favorited: favorited.contains(&recipe.id),
                    is_in_shopping_cart: in_cart.contains(&recipe.id),
                    image: media_url(recipe.image.as_deref()),
                    name: recipe.name,
                    text: recipe.text,
                    cooking_time: recipe.cooking_time,
                })
            })
            .collect()
    }

    async fn to_dto(&self, viewer: Option<i32>, recipe: Recipe) -> Result<RecipeDto, RecipeError> {
        let id = recipe.id;
        self.to_dtos(viewer, vec![recipe])
            .await?
            .pop()
            .ok_or(RecipeError::NotFound(id))
    }
}

#[async_trait]
impl RecipeService for SeaOrmRecipeService {
    async fn list(
        &self,
        viewer: Option<i32>,
        filter: RecipeFilter,
        page: PageRequest,
    ) -> Result<Page<RecipeDto>, RecipeError> {
        let (recipes, total) = self.store.list_recipes(&filter, page).await?;
        let dtos = self.to_dtos(viewer, recipes).await?;
        Ok(Page::new(dtos, total, page))
    }

    async fn get(&self, viewer: Option<i32>, id: i32) -> Result<RecipeDto, RecipeError> {
        let recipe = self.find_recipe(id).await?;
        self.to_dto(viewer, recipe).await
    }

    async fn create(&self, author_id: i32, input: RecipeInput) -> Result<RecipeDto, RecipeError> {
        validate_recipe_input(&input)?;
        let image = Self::decode_image(input.image.as_deref())?;
        self.validate_against_store(author_id, &input, None).await?;

        let image_path = match &image {
            Some(image) => Some(self.images.save(image).await?),
            None => None,
        };

        let record = Self::record(input, image_path.clone());
        let recipe = match self.store.create_recipe(author_id, &record).await {
            Ok(recipe) => recipe,
            Err(e) => {
                if let Some(path) = &image_path {
                    self.images.remove(path).await;
                }
                return Err(Self::write_error(e, &record.name));
            }
        };

        self.to_dto(Some(author_id), recipe).await
    }

    async fn update(
        &self,
        user_id: i32,
        id: i32,
        input: RecipeInput,
    ) -> Result<RecipeDto, RecipeError> {
        let existing = self.find_recipe(id).await?;
        if existing.author_id != user_id {
            return Err(RecipeError::Forbidden);
        }

        validate_recipe_input(&input)?;
        let image = Self::decode_image(input.image.as_deref())?;
        self.validate_against_store(user_id, &input, Some(id)).await?;

        let new_image = match &image {
            Some(image) => Some(self.images.save(image).await?),
            None => None,
        };

        let record = Self::record(input, new_image.clone());
        let recipe = match self.store.update_recipe(id, &record).await {
            Ok(recipe) => recipe,
            Err(e) => {
                if let Some(path) = &new_image {
                    self.images.remove(path).await;
                }
                return Err(Self::write_error(e, &record.name));
            }
        };

        if new_image.is_some()
            && let Some(old) = existing.image.as_deref()
        {
            self.images.remove(old).await;
        }

        self.to_dto(Some(user_id), recipe).await
    }

    async fn delete(&self, user_id: i32, id: i32) -> Result<(), RecipeError> {
        let recipe = self.find_recipe(id).await?;
        if recipe.author_id != user_id {
            return Err(RecipeError::Forbidden);
        }

        if !self.store.delete_recipe(id).await? {
            return Err(RecipeError::NotFound(id));
        }

        if let Some(path) = recipe.image.as_deref() {
            self.images.remove(path).await;
        }

        info!(recipe_id = id, user_id, "Deleted recipe");
        Ok(())
    }

    async fn add_to_list(
        &self,
        user_id: i32,
        recipe_id: i32,
        list: RecipeList,
    ) -> Result<RecipeSummaryDto, RecipeError> {
        let recipe = self.find_recipe(recipe_id).await?;

        if !self.store.add_to_list(list, user_id, recipe_id).await? {
            return Err(RecipeError::AlreadyPresent(list));
        }

        info!(user_id, recipe_id, list = list.label(), "Added recipe to list");
        Ok(RecipeSummaryDto::from(recipe))
    }

    async fn remove_from_list(
        &self,
        user_id: i32,
        recipe_id: i32,
        list: RecipeList,
    ) -> Result<(), RecipeError> {
        self.find_recipe(recipe_id).await?;

        if !self.store.remove_from_list(list, user_id, recipe_id).await? {
            return Err(RecipeError::NotPresent(list));
        }

        Ok(())
    }

    async fn shopping_list(&self, user_id: i32) -> Result<Vec<ShoppingListItem>, RecipeError> {
        Ok(self.store.shopping_list(user_id).await?)
    }
}
