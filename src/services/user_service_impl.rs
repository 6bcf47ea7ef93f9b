//! `SeaORM` implementation of the `UserService` trait.

use crate::api::types::{RecipeSummaryDto, SubscriptionDto, UserDto};
use crate::db::{Store, User};
use crate::models::{Page, PageRequest};
use crate::services::user_service::{UserError, UserService};
use async_trait::async_trait;
use tracing::info;

pub struct SeaOrmUserService {
    store: Store,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn to_dtos(&self, viewer: Option<i32>, users: Vec<User>) -> Result<Vec<UserDto>, UserError> {
        let followed = match viewer {
            Some(viewer) => {
                let ids: Vec<i32> = users.iter().map(|u| u.id).collect();
                self.store.followed_among(viewer, &ids).await?
            }
            None => std::collections::HashSet::new(),
        };

        Ok(users
            .into_iter()
            .map(|u| {
                let subscribed = followed.contains(&u.id);
                UserDto::from_user(u, subscribed)
            })
            .collect())
    }

    /// Authors the caller follows, each with a capped recipe list.
    async fn to_subscriptions(
        &self,
        authors: Vec<User>,
        recipes_limit: Option<u64>,
    ) -> Result<Vec<SubscriptionDto>, UserError> {
        let ids: Vec<i32> = authors.iter().map(|u| u.id).collect();
        let mut recipes = self.store.recipes_by_authors(&ids, recipes_limit).await?;
        let counts = self.store.recipe_counts_by_authors(&ids).await?;

        Ok(authors
            .into_iter()
            .map(|author| {
                let id = author.id;
                SubscriptionDto {
                    user: UserDto::from_user(author, true),
                    recipes: recipes
                        .remove(&id)
                        .unwrap_or_default()
                        .into_iter()
                        .map(RecipeSummaryDto::from)
                        .collect(),
                    recipes_count: counts.get(&id).copied().unwrap_or(0),
                }
            })
            .collect())
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn list_users(
        &self,
        viewer: Option<i32>,
        page: PageRequest,
    ) -> Result<Page<UserDto>, UserError> {
        let (users, total) = self.store.list_users(page).await?;
        let dtos = self.to_dtos(viewer, users).await?;
        Ok(Page::new(dtos, total, page))
    }

    async fn get_user(&self, viewer: Option<i32>, id: i32) -> Result<UserDto, UserError> {
        let user = self
            .store
            .get_user(id)
            .await?
            .ok_or(UserError::NotFound(id))?;

        let mut dtos = self.to_dtos(viewer, vec![user]).await?;
        dtos.pop().ok_or(UserError::NotFound(id))
    }

    async fn subscribe(
        &self,
        user_id: i32,
        author_id: i32,
        recipes_limit: Option<u64>,
    ) -> Result<SubscriptionDto, UserError> {
        if user_id == author_id {
            return Err(UserError::SelfFollowRejected);
        }

        let author = self
            .store
            .get_user(author_id)
            .await?
            .ok_or(UserError::NotFound(author_id))?;

        if !self.store.follow(user_id, author_id).await? {
            return Err(UserError::AlreadyFollowing);
        }

        info!(user_id, author_id, "Subscribed to author");

        let mut subscriptions = self.to_subscriptions(vec![author], recipes_limit).await?;
        subscriptions.pop().ok_or(UserError::NotFound(author_id))
    }

    async fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<(), UserError> {
        if user_id == author_id {
            return Err(UserError::SelfFollowRejected);
        }

        if self.store.get_user(author_id).await?.is_none() {
            return Err(UserError::NotFound(author_id));
        }

        if !self.store.unfollow(user_id, author_id).await? {
            return Err(UserError::NotFollowing);
        }

        info!(user_id, author_id, "Unsubscribed from author");
        Ok(())
    }

    async fn subscriptions(
        &self,
        user_id: i32,
        page: PageRequest,
        recipes_limit: Option<u64>,
    ) -> Result<Page<SubscriptionDto>, UserError> {
        let (authors, total) = self.store.followed_authors(user_id, page).await?;
        let dtos = self.to_subscriptions(authors, recipes_limit).await?;
        Ok(Page::new(dtos, total, page))
    }
}
