//! The follow graph: a directed edge set over users.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::domain::{FollowCounts, FollowEdge, User};
use crate::error::{DomainError, DomainResult};
use crate::ports::{FollowRepository, UserRepository};

use super::require_user;

/// Follow/unfollow operations and membership queries.
///
/// Mutations are single-edge and idempotent: following twice leaves one edge,
/// unfollowing an absent edge is a no-op.
#[derive(Clone)]
pub struct FollowGraph {
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl FollowGraph {
    pub fn new(users: Arc<dyn UserRepository>, follows: Arc<dyn FollowRepository>) -> Self {
        Self { users, follows }
    }

    pub async fn follow(&self, follower_id: i64, followed_id: i64) -> DomainResult<()> {
        let edge = FollowEdge::new(follower_id, followed_id);
        if edge.is_self_loop() {
            return Err(DomainError::InvalidOperation(
                "You cannot follow yourself".to_string(),
            ));
        }
        self.check_endpoints(edge).await?;

        let inserted = self.follows.insert(edge).await?;
        tracing::debug!(follower_id, followed_id, inserted, "Follow edge stored");
        Ok(())
    }

    pub async fn unfollow(&self, follower_id: i64, followed_id: i64) -> DomainResult<()> {
        let edge = FollowEdge::new(follower_id, followed_id);
        self.check_endpoints(edge).await?;

        let removed = self.follows.remove(edge).await?;
        tracing::debug!(follower_id, followed_id, removed, "Follow edge removed");
        Ok(())
    }

    pub async fn is_following(&self, follower_id: i64, followed_id: i64) -> DomainResult<bool> {
        Ok(self
            .follows
            .contains(FollowEdge::new(follower_id, followed_id))
            .await?)
    }

    /// Everyone `user_id` follows.
    pub async fn followed_ids(&self, user_id: i64) -> DomainResult<BTreeSet<i64>> {
        require_user(self.users.as_ref(), user_id).await?;
        Ok(self.follows.followed_ids(user_id).await?.into_iter().collect())
    }

    /// Everyone following `user_id`.
    pub async fn follower_ids(&self, user_id: i64) -> DomainResult<BTreeSet<i64>> {
        require_user(self.users.as_ref(), user_id).await?;
        Ok(self.follows.follower_ids(user_id).await?.into_iter().collect())
    }

    pub async fn followed_users(&self, user_id: i64) -> DomainResult<Vec<User>> {
        let ids: Vec<i64> = self.followed_ids(user_id).await?.into_iter().collect();
        Ok(self.users.find_by_ids(&ids).await?)
    }

    pub async fn follower_users(&self, user_id: i64) -> DomainResult<Vec<User>> {
        let ids: Vec<i64> = self.follower_ids(user_id).await?.into_iter().collect();
        Ok(self.users.find_by_ids(&ids).await?)
    }

    pub async fn counts(&self, user_id: i64) -> DomainResult<FollowCounts> {
        Ok(FollowCounts {
            followers: self.follows.count_followers(user_id).await?,
            following: self.follows.count_followed(user_id).await?,
        })
    }

    async fn check_endpoints(&self, edge: FollowEdge) -> DomainResult<()> {
        require_user(self.users.as_ref(), edge.follower_id).await?;
        if self.users.find_by_id(edge.followed_id).await?.is_none() {
            return Err(DomainError::InvalidOperation(format!(
                "User {} does not exist",
                edge.followed_id
            )));
        }
        Ok(())
    }
}
