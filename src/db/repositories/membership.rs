//! Favorites and shopping cart: two independent `(user, recipe)` sets.

use crate::db::is_unique_violation;
use crate::entities::{favorites, prelude::*, shopping_cart};
use crate::models::recipe::RecipeList;
use anyhow::Result;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::collections::HashSet;

pub struct MembershipRepository {
    conn: DatabaseConnection,
}

impl MembershipRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert the pair. Returns `false` when it already existed, including
    /// when a concurrent insert won the race on the unique index.
    pub async fn add(&self, list: RecipeList, user_id: i32, recipe_id: i32) -> Result<bool> {
        let now = chrono::Utc::now().to_rfc3339();

        let result = match list {
            RecipeList::Favorites => Favorites::insert(favorites::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                created_at: Set(now),
                ..Default::default()
            })
            .exec(&self.conn)
            .await
            .map(|_| ()),
            RecipeList::ShoppingCart => ShoppingCart::insert(shopping_cart::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
                created_at: Set(now),
                ..Default::default()
            })
            .exec(&self.conn)
            .await
            .map(|_| ()),
        };

        match result {
            Ok(()) => Ok(true),
            Err(e) if is_unique_violation(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete the pair. Returns `false` when there was nothing to delete.
    pub async fn remove(&self, list: RecipeList, user_id: i32, recipe_id: i32) -> Result<bool> {
        let result = match list {
            RecipeList::Favorites => {
                Favorites::delete_many()
                    .filter(favorites::Column::UserId.eq(user_id))
                    .filter(favorites::Column::RecipeId.eq(recipe_id))
                    .exec(&self.conn)
                    .await?
            }
            RecipeList::ShoppingCart => {
                ShoppingCart::delete_many()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                    .exec(&self.conn)
                    .await?
            }
        };

        Ok(result.rows_affected > 0)
    }

    /// Subset of `recipe_ids` present in the user's list.
    pub async fn recipe_ids_among(
        &self,
        list: RecipeList,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> Result<HashSet<i32>> {
        if recipe_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ids = match list {
            RecipeList::Favorites => Favorites::find()
                .filter(favorites::Column::UserId.eq(user_id))
                .filter(favorites::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|f| f.recipe_id)
                .collect(),
            RecipeList::ShoppingCart => ShoppingCart::find()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.is_in(recipe_ids.iter().copied()))
                .all(&self.conn)
                .await?
                .into_iter()
                .map(|c| c.recipe_id)
                .collect(),
        };

        Ok(ids)
    }
}
