use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// (index name, table, columns)
const UNIQUE_INDEXES: &[(&str, &str, &str)] = &[
    (
        "idx_ingredients_name_unit_unique",
        "ingredients",
        "name, measurement_unit",
    ),
    ("idx_recipes_author_name_unique", "recipes", "author_id, name"),
    (
        "idx_recipe_tags_pair_unique",
        "recipe_tags",
        "recipe_id, tag_id",
    ),
    (
        "idx_recipe_ingredients_pair_unique",
        "recipe_ingredients",
        "recipe_id, ingredient_id",
    ),
    ("idx_favorites_pair_unique", "favorites", "user_id, recipe_id"),
    (
        "idx_shopping_cart_pair_unique",
        "shopping_cart",
        "user_id, recipe_id",
    ),
    ("idx_follows_pair_unique", "follows", "user_id, author_id"),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        for (name, table, columns) in UNIQUE_INDEXES {
            conn.execute_unprepared(&format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS {name} ON {table}({columns})"
            ))
            .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let conn = manager.get_connection();

        for (name, _, _) in UNIQUE_INDEXES {
            conn.execute_unprepared(&format!("DROP INDEX IF EXISTS {name}"))
                .await?;
        }

        Ok(())
    }
}
