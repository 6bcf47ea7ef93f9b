//! Domain service for registration and token authentication.

use crate::api::types::{RegisterRequest, UserDto};
use crate::db::User;
use thiserror::Error;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{message}")]
    Validation { field: String, message: String },

    #[error("Unable to log in with provided credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account after validating every field.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] naming the offending field, including
    /// when the username or email is already registered.
    async fn register(&self, request: RegisterRequest) -> Result<UserDto, AuthError>;

    /// Exchanges email and password for the user's auth token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if login fails.
    async fn login(&self, email: &str, password: &str) -> Result<String, AuthError>;

    /// Invalidates the user's current token.
    async fn logout(&self, user_id: i32) -> Result<(), AuthError>;

    /// Resolves a presented token to its user.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if no user holds the token.
    async fn authenticate(&self, token: &str) -> Result<User, AuthError>;

    /// Changes a user's password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] if current password is incorrect or new password invalid.
    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError>;
}
