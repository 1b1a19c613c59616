use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Longest accepted post body, counted in characters.
pub const MAX_BODY_CHARS: usize = 140;

/// Post entity - a short text update owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub author_id: i64,
}

impl Post {
    /// Sort key shared by every listing: newest first, then highest id.
    pub fn recency_key(&self) -> (DateTime<Utc>, i64) {
        (self.timestamp, self.id)
    }
}

/// A post that has not been stored yet.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub body: String,
    pub timestamp: DateTime<Utc>,
}

impl NewPost {
    pub fn new(author_id: i64, body: &str, timestamp: DateTime<Utc>) -> Result<Self, DomainError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(DomainError::InvalidArgument(
                "Post body must not be empty".to_string(),
            ));
        }
        if body.chars().count() > MAX_BODY_CHARS {
            return Err(DomainError::InvalidArgument(format!(
                "Post body must be at most {} characters",
                MAX_BODY_CHARS
            )));
        }

        Ok(Self {
            author_id,
            body: body.to_string(),
            timestamp,
        })
    }
}

/// Identity needed to render a post's author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorSummary {
    pub id: i64,
    pub username: String,
    pub avatar_hash: String,
}

/// A post paired with its author, ready for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct FeedEntry {
    pub post: Post,
    pub author: AuthorSummary,
}
