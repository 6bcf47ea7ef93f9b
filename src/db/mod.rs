use crate::config::SecurityConfig;
use crate::models::PageRequest;
use crate::models::recipe::{
    RecipeFilter, RecipeIngredientLine, RecipeList, RecipeRecord, ShoppingListItem,
};
use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::ingredient::Ingredient;
pub use repositories::recipe::Recipe;
pub use repositories::tag::Tag;
pub use repositories::user::{NewUser, User};

/// Whether the store rejected a write because of a unique index.
#[must_use]
pub fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        // Every pooled connection to :memory: would open its own empty database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn tag_repo(&self) -> repositories::tag::TagRepository {
        repositories::tag::TagRepository::new(self.conn.clone())
    }

    fn ingredient_repo(&self) -> repositories::ingredient::IngredientRepository {
        repositories::ingredient::IngredientRepository::new(self.conn.clone())
    }

    fn recipe_repo(&self) -> repositories::recipe::RecipeRepository {
        repositories::recipe::RecipeRepository::new(self.conn.clone())
    }

    fn membership_repo(&self) -> repositories::membership::MembershipRepository {
        repositories::membership::MembershipRepository::new(self.conn.clone())
    }

    fn follow_repo(&self) -> repositories::follow::FollowRepository {
        repositories::follow::FollowRepository::new(self.conn.clone())
    }

    // ========================================================================
    // Users
    // ========================================================================

    pub async fn create_user(&self, user: NewUser, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(user, security).await
    }

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_users_by_ids(&self, ids: &[i32]) -> Result<Vec<User>> {
        self.user_repo().get_by_ids(ids).await
    }

    pub async fn username_taken(&self, username: &str) -> Result<bool> {
        self.user_repo().username_taken(username).await
    }

    pub async fn email_taken(&self, email: &str) -> Result<bool> {
        self.user_repo().email_taken(email).await
    }

    pub async fn list_users(&self, page: PageRequest) -> Result<(Vec<User>, u64)> {
        self.user_repo().list(page).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(email, password).await
    }

    pub async fn verify_password_by_id(&self, id: i32, password: &str) -> Result<bool> {
        self.user_repo().verify_password_by_id(id, password).await
    }

    pub async fn update_user_password(
        &self,
        id: i32,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .update_password(id, new_password, security)
            .await
    }

    pub async fn get_user_by_token(&self, token: &str) -> Result<Option<User>> {
        self.user_repo().get_by_token(token).await
    }

    pub async fn rotate_user_token(&self, id: i32) -> Result<String> {
        self.user_repo().rotate_token(id).await
    }

    // ========================================================================
    // Tags & ingredients
    // ========================================================================

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.tag_repo().list().await
    }

    pub async fn get_tag(&self, id: i32) -> Result<Option<Tag>> {
        self.tag_repo().get(id).await
    }

    pub async fn create_tag(&self, name: &str, color: &str, slug: &str) -> Result<Tag> {
        self.tag_repo().create(name, color, slug).await
    }

    pub async fn existing_tag_ids(&self, ids: &[i32]) -> Result<HashSet<i32>> {
        self.tag_repo().existing_ids(ids).await
    }

    pub async fn tags_for_recipes(&self, recipe_ids: &[i32]) -> Result<HashMap<i32, Vec<Tag>>> {
        self.tag_repo().for_recipes(recipe_ids).await
    }

    pub async fn search_ingredients(&self, prefix: Option<&str>) -> Result<Vec<Ingredient>> {
        self.ingredient_repo().search(prefix).await
    }

    pub async fn get_ingredient(&self, id: i32) -> Result<Option<Ingredient>> {
        self.ingredient_repo().get(id).await
    }

    pub async fn existing_ingredient_ids(&self, ids: &[i32]) -> Result<HashSet<i32>> {
        self.ingredient_repo().existing_ids(ids).await
    }

    pub async fn import_ingredients(&self, items: &[(String, String)]) -> Result<usize> {
        self.ingredient_repo().import(items).await
    }

    pub async fn ingredient_lines_for_recipes(
        &self,
        recipe_ids: &[i32],
    ) -> Result<HashMap<i32, Vec<RecipeIngredientLine>>> {
        self.ingredient_repo().lines_for_recipes(recipe_ids).await
    }

    pub async fn shopping_list(&self, user_id: i32) -> Result<Vec<ShoppingListItem>> {
        self.ingredient_repo().shopping_list(user_id).await
    }

    // ========================================================================
    // Recipes
    // ========================================================================

    pub async fn list_recipes(
        &self,
        filter: &RecipeFilter,
        page: PageRequest,
    ) -> Result<(Vec<Recipe>, u64)> {
        self.recipe_repo().list(filter, page).await
    }

    pub async fn get_recipe(&self, id: i32) -> Result<Option<Recipe>> {
        self.recipe_repo().get(id).await
    }

    pub async fn recipe_name_taken(
        &self,
        author_id: i32,
        name: &str,
        except: Option<i32>,
    ) -> Result<bool> {
        self.recipe_repo().name_taken(author_id, name, except).await
    }

    pub async fn create_recipe(&self, author_id: i32, record: &RecipeRecord) -> Result<Recipe> {
        self.recipe_repo().create(author_id, record).await
    }

    pub async fn update_recipe(&self, id: i32, record: &RecipeRecord) -> Result<Recipe> {
        self.recipe_repo().update(id, record).await
    }

    pub async fn delete_recipe(&self, id: i32) -> Result<bool> {
        self.recipe_repo().delete(id).await
    }

    pub async fn recipes_by_authors(
        &self,
        author_ids: &[i32],
        limit: Option<u64>,
    ) -> Result<HashMap<i32, Vec<Recipe>>> {
        self.recipe_repo().by_authors(author_ids, limit).await
    }

    pub async fn recipe_counts_by_authors(&self, author_ids: &[i32]) -> Result<HashMap<i32, u64>> {
        self.recipe_repo().count_by_authors(author_ids).await
    }

    // ========================================================================
    // Favorites, shopping cart & follows
    // ========================================================================

    pub async fn add_to_list(&self, list: RecipeList, user_id: i32, recipe_id: i32) -> Result<bool> {
        self.membership_repo().add(list, user_id, recipe_id).await
    }

    pub async fn remove_from_list(
        &self,
        list: RecipeList,
        user_id: i32,
        recipe_id: i32,
    ) -> Result<bool> {
        self.membership_repo().remove(list, user_id, recipe_id).await
    }

    pub async fn list_recipe_ids_among(
        &self,
        list: RecipeList,
        user_id: i32,
        recipe_ids: &[i32],
    ) -> Result<HashSet<i32>> {
        self.membership_repo()
            .recipe_ids_among(list, user_id, recipe_ids)
            .await
    }

    pub async fn follow(&self, user_id: i32, author_id: i32) -> Result<bool> {
        self.follow_repo().add(user_id, author_id).await
    }

    pub async fn unfollow(&self, user_id: i32, author_id: i32) -> Result<bool> {
        self.follow_repo().remove(user_id, author_id).await
    }

    pub async fn followed_among(&self, user_id: i32, author_ids: &[i32]) -> Result<HashSet<i32>> {
        self.follow_repo().followed_among(user_id, author_ids).await
    }

    pub async fn followed_authors(
        &self,
        user_id: i32,
        page: PageRequest,
    ) -> Result<(Vec<User>, u64)> {
        self.follow_repo().followed_authors(user_id, page).await
    }
}
