use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{NewPost, Post};
use crate::error::{DomainError, DomainResult};
use crate::ports::{PostRepository, UserRepository};

use super::require_user;

/// Authoring and lookup of individual posts.
#[derive(Clone)]
pub struct Posts {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
}

impl Posts {
    pub fn new(users: Arc<dyn UserRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { users, posts }
    }

    pub async fn compose(
        &self,
        author_id: i64,
        body: &str,
        now: DateTime<Utc>,
    ) -> DomainResult<Post> {
        let new_post = NewPost::new(author_id, body, now)?;
        require_user(self.users.as_ref(), author_id).await?;

        let post = self.posts.create(new_post).await?;
        tracing::info!(post_id = post.id, author_id, "Post created");
        Ok(post)
    }

    pub async fn get(&self, post_id: i64) -> DomainResult<Post> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::NotFound {
                entity_type: "Post",
                id: post_id,
            })
    }
}
