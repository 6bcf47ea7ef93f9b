//! `SeaORM` implementation of the `AuthService` trait.

use crate::api::types::{RegisterRequest, UserDto};
use crate::config::SecurityConfig;
use crate::db::{NewUser, Store, User, is_unique_violation};
use crate::services::auth_service::{AuthError, AuthService};
use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use tracing::info;

const MAX_USERNAME_LEN: usize = 150;
const MAX_EMAIL_LEN: usize = 254;
const MAX_NAME_LEN: usize = 150;

fn username_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("Invalid regex"))
}

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }
}

/// Field checks that need no database access.
pub fn validate_registration(
    request: &RegisterRequest,
    min_password_length: usize,
) -> Result<(), AuthError> {
    let username = request.username.trim();
    if username.is_empty() {
        return Err(AuthError::field("username", "Username is required"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AuthError::field(
            "username",
            format!("Username must be {MAX_USERNAME_LEN} characters or less"),
        ));
    }
    if !username_regex().is_match(username) {
        return Err(AuthError::field(
            "username",
            "Username may only contain letters, digits and @/./+/-/_",
        ));
    }

    let email = request.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(AuthError::field("email", "Enter a valid email address"));
    }
    if email.chars().count() > MAX_EMAIL_LEN {
        return Err(AuthError::field(
            "email",
            format!("Email must be {MAX_EMAIL_LEN} characters or less"),
        ));
    }

    for (field, value) in [
        ("first_name", &request.first_name),
        ("last_name", &request.last_name),
    ] {
        if value.trim().is_empty() {
            return Err(AuthError::field(field, "This field is required"));
        }
        if value.chars().count() > MAX_NAME_LEN {
            return Err(AuthError::field(
                field,
                format!("Must be {MAX_NAME_LEN} characters or less"),
            ));
        }
    }

    validate_password(&request.password, min_password_length, "password")
}

fn validate_password(password: &str, min_length: usize, field: &str) -> Result<(), AuthError> {
    if password.chars().count() < min_length {
        return Err(AuthError::field(
            field,
            format!("Password must be at least {min_length} characters"),
        ));
    }
    Ok(())
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, request: RegisterRequest) -> Result<UserDto, AuthError> {
        validate_registration(&request, self.security.min_password_length)?;

        let username = request.username.trim().to_string();
        let email = request.email.trim().to_string();

        if self.store.username_taken(&username).await? {
            return Err(AuthError::field(
                "username",
                "A user with that username already exists",
            ));
        }

        if self.store.email_taken(&email).await? {
            return Err(AuthError::field("email", "A user with that email already exists"));
        }

        let new_user = NewUser {
            email,
            username,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            password: request.password,
        };

        let user = match self.store.create_user(new_user, &self.security).await {
            Ok(user) => user,
            Err(e) if e
                .downcast_ref::<sea_orm::DbErr>()
                .is_some_and(is_unique_violation) => {
                return Err(AuthError::field(
                    "username",
                    "A user with that username or email already exists",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = user.id, username = %user.username, "Registered user");
        Ok(UserDto::from_user(user, false))
    }

    async fn login(&self, email: &str, password: &str) -> Result<String, AuthError> {
        let user = self
            .store
            .verify_user_password(email.trim(), password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(user.auth_token)
    }

    async fn logout(&self, user_id: i32) -> Result<(), AuthError> {
        self.store.rotate_user_token(user_id).await?;
        Ok(())
    }

    async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        self.store
            .get_user_by_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(
            new_password,
            self.security.min_password_length,
            "new_password",
        )?;

        if current_password == new_password {
            return Err(AuthError::field(
                "new_password",
                "New password must be different from current password",
            ));
        }

        let is_valid = self
            .store
            .verify_password_by_id(user_id, current_password)
            .await?;

        if !is_valid {
            return Err(AuthError::field(
                "current_password",
                "Current password is incorrect",
            ));
        }

        self.store
            .update_user_password(user_id, new_password, &self.security)
            .await?;

        Ok(())
    }
}
