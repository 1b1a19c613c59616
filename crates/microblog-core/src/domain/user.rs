use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::post::AuthorSummary;
use crate::error::DomainError;

pub const MAX_USERNAME_CHARS: usize = 64;
pub const MAX_EMAIL_CHARS: usize = 120;
pub const MAX_ABOUT_ME_CHARS: usize = 140;

/// User entity - an account that authors posts and follows other accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub about_me: Option<String>,
    pub last_seen: DateTime<Utc>,
}

impl User {
    /// Hex SHA-256 digest of the normalized email, as Gravatar expects it.
    pub fn avatar_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.email.trim().to_lowercase().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Gravatar URL for this user at the given pixel size.
    pub fn avatar(&self, size: u32) -> String {
        format!(
            "https://www.gravatar.com/avatar/{}?d=identicon&s={}",
            self.avatar_hash(),
            size
        )
    }

    /// The identity attached to this user's posts in listings.
    pub fn summary(&self) -> AuthorSummary {
        AuthorSummary {
            id: self.id,
            username: self.username.clone(),
            avatar_hash: self.avatar_hash(),
        }
    }
}

/// Fields needed to register a user. The id is assigned by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub last_seen: DateTime<Utc>,
}

impl NewUser {
    pub fn new(username: &str, email: &str, password_hash: String) -> Result<Self, DomainError> {
        let username = username.trim().to_string();
        // Stored lower-cased so uniqueness is case-insensitive on every store.
        let email = email.trim().to_lowercase();
        validate_username(&username)?;

        let email_len = email.chars().count();
        if email_len == 0 || email_len > MAX_EMAIL_CHARS || !email.contains('@') {
            return Err(DomainError::InvalidArgument(
                "Invalid email address".to_string(),
            ));
        }

        Ok(Self {
            username,
            email,
            password_hash,
            last_seen: Utc::now(),
        })
    }
}

/// Editable profile fields.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub username: String,
    pub about_me: Option<String>,
}

impl ProfileUpdate {
    pub fn new(username: &str, about_me: Option<&str>) -> Result<Self, DomainError> {
        let username = username.trim().to_string();
        validate_username(&username)?;

        let about_me = about_me
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if about_me
            .as_deref()
            .is_some_and(|s| s.chars().count() > MAX_ABOUT_ME_CHARS)
        {
            return Err(DomainError::InvalidArgument(format!(
                "About me must be at most {} characters",
                MAX_ABOUT_ME_CHARS
            )));
        }

        Ok(Self { username, about_me })
    }
}

fn validate_username(username: &str) -> Result<(), DomainError> {
    let len = username.chars().count();
    if len == 0 || len > MAX_USERNAME_CHARS {
        return Err(DomainError::InvalidArgument(format!(
            "Username must be between 1 and {} characters",
            MAX_USERNAME_CHARS
        )));
    }
    Ok(())
}
