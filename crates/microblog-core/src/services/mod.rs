//! Core services. Each one is built from explicitly injected repository
//! handles; nothing here reaches for global state.

mod accounts;
mod feed;
mod follow_graph;
mod posts;
mod presence;

pub use accounts::{Accounts, MIN_PASSWORD_CHARS};
pub use feed::FeedResolver;
pub use follow_graph::FollowGraph;
pub use posts::Posts;
pub use presence::Presence;

use crate::domain::User;
use crate::error::{DomainError, DomainResult};
use crate::ports::UserRepository;

async fn require_user(users: &dyn UserRepository, id: i64) -> DomainResult<User> {
    users
        .find_by_id(id)
        .await?
        .ok_or_else(|| DomainError::user_not_found(id))
}
