//! Registration, credentials and profile maintenance.

use std::sync::Arc;

use crate::domain::{NewUser, ProfileUpdate, User};
use crate::error::{DomainError, DomainResult, RepoError};
use crate::ports::{PasswordService, UserRepository};

use super::require_user;

pub const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Clone)]
pub struct Accounts {
    users: Arc<dyn UserRepository>,
    passwords: Arc<dyn PasswordService>,
}

impl Accounts {
    pub fn new(users: Arc<dyn UserRepository>, passwords: Arc<dyn PasswordService>) -> Self {
        Self { users, passwords }
    }

    pub async fn register(&self, username: &str, email: &str, password: &str) -> DomainResult<User> {
        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(DomainError::InvalidArgument(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_CHARS
            )));
        }

        // Validate before paying for the hash.
        let mut new_user = NewUser::new(username, email, String::new())?;

        if self.users.find_by_username(&new_user.username).await?.is_some() {
            return Err(DomainError::Duplicate(
                "Please use a different username".to_string(),
            ));
        }
        if self.users.find_by_email(&new_user.email).await?.is_some() {
            return Err(DomainError::Duplicate(
                "Please use a different email address".to_string(),
            ));
        }

        new_user.password_hash = self.passwords.hash(password)?;

        let user = self.users.create(new_user).await.map_err(|e| match e {
            // Lost a race with a concurrent registration.
            RepoError::Constraint(msg) => DomainError::Duplicate(msg),
            other => DomainError::Persistence(other),
        })?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check credentials; unknown users and wrong passwords look the same.
    pub async fn authenticate(&self, username: &str, password: &str) -> DomainResult<User> {
        let user = self
            .users
            .find_by_username(username.trim())
            .await?
            .ok_or(DomainError::Unauthorized)?;

        if !self.passwords.verify(password, &user.password_hash)? {
            tracing::debug!(user_id = user.id, "Password mismatch");
            return Err(DomainError::Unauthorized);
        }

        Ok(user)
    }

    pub async fn get(&self, user_id: i64) -> DomainResult<User> {
        require_user(self.users.as_ref(), user_id).await
    }

    pub async fn profile(&self, username: &str) -> DomainResult<User> {
        self.users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::UserNotFound(username.to_string()))
    }

    pub async fn update_profile(&self, user_id: i64, update: ProfileUpdate) -> DomainResult<User> {
        let mut user = require_user(self.users.as_ref(), user_id).await?;

        if update.username != user.username {
            if let Some(other) = self.users.find_by_username(&update.username).await? {
                if other.id != user_id {
                    return Err(DomainError::Duplicate(
                        "Please use a different username".to_string(),
                    ));
                }
            }
        }

        user.username = update.username;
        user.about_me = update.about_me;

        let saved = self.users.update(user).await.map_err(|e| match e {
            RepoError::Constraint(msg) => DomainError::Duplicate(msg),
            RepoError::NotFound => DomainError::user_not_found(user_id),
            other => DomainError::Persistence(other),
        })?;
        tracing::info!(user_id, "Profile updated");
        Ok(saved)
    }

    /// Delete the account together with its posts and follow edges.
    pub async fn delete(&self, user_id: i64) -> DomainResult<()> {
        self.users.delete(user_id).await.map_err(|e| match e {
            RepoError::NotFound => DomainError::user_not_found(user_id),
            other => DomainError::Persistence(other),
        })?;
        tracing::info!(user_id, "User deleted");
        Ok(())
    }
}
