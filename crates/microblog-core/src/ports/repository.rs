use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{FollowEdge, NewPost, NewUser, Page, PageRequest, Post, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Overwrite an existing entity. Fails with `NotFound` if it is gone.
    async fn update(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
///
/// Deleting a user cascades: its posts and every follow edge that names it
/// are removed in the same atomic operation.
#[async_trait]
pub trait UserRepository: BaseRepository<User, i64> {
    /// Insert a new user; the store assigns the id.
    async fn create(&self, user: NewUser) -> Result<User, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Batch lookup; missing ids are skipped.
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, RepoError>;

    /// Record activity without rewriting the rest of the row.
    async fn touch_last_seen(&self, id: i64, now: DateTime<Utc>) -> Result<(), RepoError>;
}

/// Post repository. Every listing is ordered by timestamp descending, then
/// id descending.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, i64> {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError>;

    /// One page of the posts whose author is in `author_ids`.
    async fn find_by_authors(
        &self,
        author_ids: &[i64],
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError>;

    /// One page of every post in the system.
    async fn find_all(&self, page: PageRequest) -> Result<Page<Post>, RepoError>;
}

/// Edge set of the follow graph, indexed in both directions.
#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// Insert the edge. Returns `false` when it already existed.
    async fn insert(&self, edge: FollowEdge) -> Result<bool, RepoError>;

    /// Remove the edge. Returns `false` when it was absent.
    async fn remove(&self, edge: FollowEdge) -> Result<bool, RepoError>;

    async fn contains(&self, edge: FollowEdge) -> Result<bool, RepoError>;

    /// Ids of the accounts `user_id` follows, ascending.
    async fn followed_ids(&self, user_id: i64) -> Result<Vec<i64>, RepoError>;

    /// Ids of the accounts following `user_id`, ascending.
    async fn follower_ids(&self, user_id: i64) -> Result<Vec<i64>, RepoError>;

    async fn count_followed(&self, user_id: i64) -> Result<u64, RepoError>;

    async fn count_followers(&self, user_id: i64) -> Result<u64, RepoError>;
}
