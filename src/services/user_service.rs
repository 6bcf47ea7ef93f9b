//! Domain service for user profiles and author subscriptions.

use crate::api::types::{SubscriptionDto, UserDto};
use crate::models::{Page, PageRequest};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("User {0} not found")]
    NotFound(i32),

    #[error("You cannot subscribe to yourself")]
    SelfFollowRejected,

    #[error("You are already subscribed to this author")]
    AlreadyFollowing,

    #[error("You are not subscribed to this author")]
    NotFollowing,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Profile reads and the follow toggle. `viewer` is the authenticated
/// caller, if any, and only affects `is_subscribed`.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn list_users(
        &self,
        viewer: Option<i32>,
        page: PageRequest,
    ) -> Result<Page<UserDto>, UserError>;

    async fn get_user(&self, viewer: Option<i32>, id: i32) -> Result<UserDto, UserError>;

    /// Follows `author_id` and returns the author with their recipes.
    ///
    /// # Errors
    ///
    /// [`UserError::SelfFollowRejected`] when following oneself,
    /// [`UserError::NotFound`] for an unknown author and
    /// [`UserError::AlreadyFollowing`] when the subscription exists.
    async fn subscribe(
        &self,
        user_id: i32,
        author_id: i32,
        recipes_limit: Option<u64>,
    ) -> Result<SubscriptionDto, UserError>;

    async fn unsubscribe(&self, user_id: i32, author_id: i32) -> Result<(), UserError>;

    async fn subscriptions(
        &self,
        user_id: i32,
        page: PageRequest,
        recipes_limit: Option<u64>,
    ) -> Result<Page<SubscriptionDto>, UserError>;
}
