use crate::entities::{ingredients, prelude::*, recipe_ingredients, shopping_cart};
use crate::models::recipe::{RecipeIngredientLine, ShoppingListItem};
use anyhow::Result;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
    sea_query::{LikeExpr, Query},
};
use std::collections::{HashMap, HashSet};

pub use crate::entities::ingredients::Model as Ingredient;

/// Repository for the ingredient catalog and ingredient lines of recipes
pub struct IngredientRepository {
    conn: DatabaseConnection,
}

impl IngredientRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Ingredients whose name starts with `prefix` (ASCII case-insensitive), by name.
    pub async fn search(&self, prefix: Option<&str>) -> Result<Vec<Ingredient>> {
        let mut query = Ingredients::find();

        if let Some(prefix) = prefix.filter(|p| !p.is_empty()) {
            let pattern = format!("{}%", escape_like(prefix));
            query = query
                .filter(ingredients::Column::Name.like(LikeExpr::new(pattern).escape('\\')));
        }

        let rows = query
            .order_by_asc(ingredients::Column::Name)
            .order_by_asc(ingredients::Column::Id)
            .all(&self.conn)
            .await?;

        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> Result<Option<Ingredient>> {
        Ok(Ingredients::find_by_id(id).one(&self.conn).await?)
    }

    /// Which of `ids` refer to existing ingredients.
    pub async fn existing_ids(&self, ids: &[i32]) -> Result<HashSet<i32>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows = Ingredients::find()
            .filter(ingredients::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|i| i.id).collect())
    }

    /// Insert `(name, measurement_unit)` pairs, skipping ones already present.
    /// Returns the number of rows inserted.
    pub async fn import(&self, items: &[(String, String)]) -> Result<usize> {
        let txn = self.conn.begin().await?;
        let mut inserted = 0;

        for (name, unit) in items {
            let exists = Ingredients::find()
                .filter(ingredients::Column::Name.eq(name.as_str()))
                .filter(ingredients::Column::MeasurementUnit.eq(unit.as_str()))
                .count(&txn)
                .await?
                > 0;

            if exists {
                continue;
            }

            Ingredients::insert(ingredients::ActiveModel {
                name: Set(name.clone()),
                measurement_unit: Set(unit.clone()),
                ..Default::default()
            })
            .exec(&txn)
            .await?;
            inserted += 1;
        }

        txn.commit().await?;
        Ok(inserted)
    }

    /// Ingredient lines of each of `recipe_ids`, in insertion order.
    pub async fn lines_for_recipes(
        &self,
        recipe_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<RecipeIngredientLine>>> {
        let mut map: HashMap<i32, Vec<RecipeIngredientLine>> = HashMap::new();
        if recipe_ids.is_empty() {
            return Ok(map);
        }

        let rows = RecipeIngredients::find()
            .select_only()
            .column_as(recipe_ingredients::Column::RecipeId, "recipe_id")
            .column_as(ingredients::Column::Id, "id")
            .column_as(ingredients::Column::Name, "name")
            .column_as(ingredients::Column::MeasurementUnit, "measurement_unit")
            .column_as(recipe_ingredients::Column::Amount, "amount")
            .join(
                JoinType::InnerJoin,
                recipe_ingredients::Relation::Ingredient.def(),
            )
            .filter(recipe_ingredients::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .order_by_asc(recipe_ingredients::Column::Id)
            .into_model::<RecipeIngredientLine>()
            .all(&self.conn)
            .await?;

        for line in rows {
            map.entry(line.recipe_id).or_default().push(line);
        }

        Ok(map)
    }

    /// Sum of amounts per (name, unit) over every recipe in the user's
    /// shopping cart, sorted by name then unit.
    pub async fn shopping_list(&self, user_id: i32) -> Result<Vec<ShoppingListItem>> {
        let in_cart = Query::select()
            .column(shopping_cart::Column::RecipeId)
            .from(ShoppingCart)
            .and_where(shopping_cart::Column::UserId.eq(user_id))
            .to_owned();

        let rows = RecipeIngredients::find()
            .select_only()
            .column_as(ingredients::Column::Name, "name")
            .column_as(ingredients::Column::MeasurementUnit, "measurement_unit")
            .column_as(recipe_ingredients::Column::Amount.sum(), "total_amount")
            .join(
                JoinType::InnerJoin,
                recipe_ingredients::Relation::Ingredient.def(),
            )
            .filter(recipe_ingredients::Column::RecipeId.in_subquery(in_cart))
            .group_by(ingredients::Column::Name)
            .group_by(ingredients::Column::MeasurementUnit)
            .order_by_asc(ingredients::Column::Name)
            .order_by_asc(ingredients::Column::MeasurementUnit)
            .into_model::<ShoppingListItem>()
            .all(&self.conn)
            .await?;

        Ok(rows)
    }
}

/// Escape `LIKE` wildcards so user input only ever matches literally.
fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
