use crate::entities::{prelude::*, recipe_tags, tags};
use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::collections::{HashMap, HashSet};
use tracing::info;

pub use crate::entities::tags::Model as Tag;

/// Repository for recipe tags
pub struct TagRepository {
    conn: DatabaseConnection,
}

impl TagRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn list(&self) -> Result<Vec<Tag>> {
        let rows = Tags::find()
            .order_by_asc(tags::Column::Id)
            .all(&self.conn)
            .await?;
        Ok(rows)
    }

    pub async fn get(&self, id: i32) -> Result<Option<Tag>> {
        Ok(Tags::find_by_id(id).one(&self.conn).await?)
    }

    pub async fn create(&self, name: &str, color: &str, slug: &str) -> Result<Tag> {
        let tag = tags::ActiveModel {
            name: Set(name.to_string()),
            color: Set(color.to_string()),
            slug: Set(slug.to_string()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await?;

        info!(slug = %tag.slug, "Created tag {}", tag.name);
        Ok(tag)
    }

    /// Which of `ids` refer to existing tags.
    pub async fn existing_ids(&self, ids: &[i32]) -> Result<HashSet<i32>> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let rows = Tags::find()
            .filter(tags::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await?;

        Ok(rows.into_iter().map(|t| t.id).collect())
    }

    /// Tags attached to each of `recipe_ids`, in attachment order.
    pub async fn for_recipes(&self, recipe_ids: &[i32]) -> Result<HashMap<i32, Vec<Tag>>> {
        let mut map: HashMap<i32, Vec<Tag>> = HashMap::new();
        if recipe_ids.is_empty() {
            return Ok(map);
        }

        let rows = RecipeTags::find()
            .find_also_related(Tags)
            .filter(recipe_tags::Column::RecipeId.is_in(recipe_ids.iter().copied()))
            .order_by_asc(recipe_tags::Column::Id)
            .all(&self.conn)
            .await?;

        for (link, tag) in rows {
            if let Some(tag) = tag {
                map.entry(link.recipe_id).or_default().push(tag);
            }
        }

        Ok(map)
    }
}
