use crate::entities::{
    favorites, prelude::*, recipe_ingredients, recipe_tags, recipes, shopping_cart, tags,
};
use crate::models::PageRequest;
use crate::models::recipe::{RecipeFilter, RecipeRecord};
use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, Query},
};
use std::collections::HashMap;
use tracing::info;

pub use crate::entities::recipes::Model as Recipe;

/// Repository for recipes and their tag/ingredient associations
pub struct RecipeRepository {
    conn: DatabaseConnection,
}

impl RecipeRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Newest-first page of recipes matching `filter`.
    pub async fn list(
        &self,
        filter: &RecipeFilter,
        page: PageRequest,
    ) -> Result<(Vec<Recipe>, u64)> {
        let paginator = Recipes::find()
            .filter(Self::condition(filter))
            .order_by_desc(recipes::Column::Id)
            .paginate(&self.conn, page.limit);

        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.index()).await?;

        Ok((rows, total))
    }

    fn condition(filter: &RecipeFilter) -> Condition {
        let mut condition = Condition::all();

        if let Some(author) = filter.author {
            condition = condition.add(recipes::Column::AuthorId.eq(author));
        }

        if !filter.tags.is_empty() {
            let tagged = Query::select()
                .column((RecipeTags, recipe_tags::Column::RecipeId))
                .from(RecipeTags)
                .inner_join(
                    Tags,
                    Expr::col((Tags, tags::Column::Id))
                        .equals((RecipeTags, recipe_tags::Column::TagId)),
                )
                .and_where(tags::Column::Slug.is_in(filter.tags.iter().cloned()))
                .to_owned();
            condition = condition.add(recipes::Column::Id.in_subquery(tagged));
        }

        if let Some(user_id) = filter.favorited_by {
            let favorited = Query::select()
                .column(favorites::Column::RecipeId)
                .from(Favorites)
                .and_where(favorites::Column::UserId.eq(user_id))
                .to_owned();
            condition = condition.add(recipes::Column::Id.in_subquery(favorited));
        }

        if let Some(user_id) = filter.in_shopping_cart_of {
            let in_cart = Query::select()
                .column(shopping_cart::Column::RecipeId)
                .from(ShoppingCart)
                .and_where(shopping_cart::Column::UserId.eq(user_id))
                .to_owned();
            condition = condition.add(recipes::Column::Id.in_subquery(in_cart));
        }

        condition
    }

    pub async fn get(&self, id: i32) -> Result<Option<Recipe>> {
        Ok(Recipes::find_by_id(id).one(&self.conn).await?)
    }

    /// Whether `author_id` already owns a recipe called `name` (other than `except`).
    pub async fn name_taken(&self, author_id: i32, name: &str, except: Option<i32>) -> Result<bool> {
        let mut query = Recipes::find()
            .filter(recipes::Column::AuthorId.eq(author_id))
            .filter(recipes::Column::Name.eq(name));

        if let Some(id) = except {
            query = query.filter(recipes::Column::Id.ne(id));
        }

        Ok(query.count(&self.conn).await? > 0)
    }

    /// Newest recipes of each author, at most `limit` per author.
    pub async fn by_authors(
        &self,
        author_ids: &[i32],
        limit: Option<u64>,
    ) -> Result<HashMap<i32, Vec<Recipe>>> {
        let mut map: HashMap<i32, Vec<Recipe>> = HashMap::new();
        if author_ids.is_empty() {
            return Ok(map);
        }

        let rows = Recipes::find()
            .filter(recipes::Column::AuthorId.is_in(author_ids.iter().copied()))
            .order_by_desc(recipes::Column::Id)
            .all(&self.conn)
            .await?;

        let cap = limit.and_then(|l| usize::try_from(l).ok());
        for recipe in rows {
            let entry = map.entry(recipe.author_id).or_default();
            if cap.is_none_or(|cap| entry.len() < cap) {
                entry.push(recipe);
            }
        }

        Ok(map)
    }

    pub async fn count_by_authors(&self, author_ids: &[i32]) -> Result<HashMap<i32, u64>> {
        if author_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(i32, i64)> = Recipes::find()
            .select_only()
            .column(recipes::Column::AuthorId)
            .column_as(recipes::Column::Id.count(), "recipe_count")
            .filter(recipes::Column::AuthorId.is_in(author_ids.iter().copied()))
            .group_by(recipes::Column::AuthorId)
            .into_tuple()
            .all(&self.conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(author, count)| (author, u64::try_from(count).unwrap_or(0)))
            .collect())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert the recipe row and its associations in one transaction.
    pub async fn create(&self, author_id: i32, record: &RecipeRecord) -> Result<Recipe> {
        let txn = self.conn.begin().await?;

        let recipe = recipes::ActiveModel {
            author_id: Set(author_id),
            name: Set(record.name.clone()),
            text: Set(record.text.clone()),
            image: Set(record.image.clone()),
            cooking_time: Set(record.cooking_time),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert recipe")?;

        Self::insert_links(&txn, recipe.id, record).await?;

        txn.commit().await?;
        info!(recipe_id = recipe.id, author_id, "Created recipe {}", recipe.name);
        Ok(recipe)
    }

    /// Overwrite the recipe row and replace both association sets. The old
    /// associations are only gone once the new ones are committed.
    pub async fn update(&self, id: i32, record: &RecipeRecord) -> Result<Recipe> {
        let txn = self.conn.begin().await?;

        let existing = Recipes::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Recipe not found: {id}"))?;

        let mut active: recipes::ActiveModel = existing.into();
        active.name = Set(record.name.clone());
        active.text = Set(record.text.clone());
        active.cooking_time = Set(record.cooking_time);
        if record.image.is_some() {
            active.image = Set(record.image.clone());
        }
        let recipe = active.update(&txn).await.context("Failed to update recipe")?;

        RecipeTags::delete_many()
            .filter(recipe_tags::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;

        RecipeIngredients::delete_many()
            .filter(recipe_ingredients::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;

        Self::insert_links(&txn, id, record).await?;

        txn.commit().await?;
        info!(recipe_id = id, "Updated recipe {}", recipe.name);
        Ok(recipe)
    }

    async fn insert_links(
        txn: &DatabaseTransaction,
        recipe_id: i32,
        record: &RecipeRecord,
    ) -> Result<()> {
        if !record.tags.is_empty() {
            let links: Vec<recipe_tags::ActiveModel> = record
                .tags
                .iter()
                .map(|tag_id| recipe_tags::ActiveModel {
                    recipe_id: Set(recipe_id),
                    tag_id: Set(*tag_id),
                    ..Default::default()
                })
                .collect();

            RecipeTags::insert_many(links).exec(txn).await?;
        }

        if !record.ingredients.is_empty() {
            let lines: Vec<recipe_ingredients::ActiveModel> = record
                .ingredients
                .iter()
                .map(|item| recipe_ingredients::ActiveModel {
                    recipe_id: Set(recipe_id),
                    ingredient_id: Set(item.id),
                    amount: Set(item.amount),
                    ..Default::default()
                })
                .collect();

            RecipeIngredients::insert_many(lines).exec(txn).await?;
        }

        Ok(())
    }

    /// Delete the recipe together with everything referencing it.
    pub async fn delete(&self, id: i32) -> Result<bool> {
        let txn = self.conn.begin().await?;

        Favorites::delete_many()
            .filter(favorites::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        ShoppingCart::delete_many()
            .filter(shopping_cart::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        RecipeTags::delete_many()
            .filter(recipe_tags::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;
        RecipeIngredients::delete_many()
            .filter(recipe_ingredients::Column::RecipeId.eq(id))
            .exec(&txn)
            .await?;

        let result = Recipes::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(result.rows_affected > 0)
    }
}
