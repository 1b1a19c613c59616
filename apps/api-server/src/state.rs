//! Application state - shared across all handlers.

use std::sync::Arc;

use microblog_core::ports::{FollowRepository, PasswordService, PostRepository, UserRepository};
use microblog_core::services::{Accounts, FeedResolver, FollowGraph, Posts, Presence};
use microblog_infra::{Argon2PasswordService, DatabaseConnections, InMemoryStore};

#[cfg(feature = "postgres")]
use microblog_infra::database::{
    PostgresFollowRepository, PostgresPostRepository, PostgresUserRepository,
};

use crate::config::AppConfig;

/// Shared application state. Every service receives its repositories here,
/// once, at startup.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Accounts,
    pub graph: FollowGraph,
    pub feed: FeedResolver,
    pub posts: Posts,
    pub presence: Presence,
    pub posts_per_page: u64,
    pub db: Option<Arc<DatabaseConnections>>,
}

/// The three repository handles the services are built from.
struct Repositories {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl Repositories {
    fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            posts: store.clone(),
            follows: store,
        }
    }

    #[cfg(feature = "postgres")]
    fn postgres(conn: &DatabaseConnections) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(conn.main.clone())),
            posts: Arc::new(PostgresPostRepository::new(conn.main.clone())),
            follows: Arc::new(PostgresFollowRepository::new(conn.main.clone())),
        }
    }
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        let (db, repos) = match &config.database {
            Some(db_config) => match DatabaseConnections::init(db_config).await {
                Ok(connections) => {
                    let repos = Repositories::postgres(&connections);
                    (Some(Arc::new(connections)), repos)
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    (None, Repositories::in_memory())
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (None, Repositories::in_memory())
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (db, repos) = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            (None, Repositories::in_memory())
        };

        let state = Self::assemble(
            repos,
            Arc::new(Argon2PasswordService::new()),
            config.posts_per_page,
            db,
        );
        tracing::info!(posts_per_page = state.posts_per_page, "Application state initialized");
        state
    }

    /// State backed by a fresh in-memory store.
    #[cfg(test)]
    pub fn in_memory(passwords: Arc<dyn PasswordService>, posts_per_page: u64) -> Self {
        Self::assemble(Repositories::in_memory(), passwords, posts_per_page, None)
    }

    fn assemble(
        repos: Repositories,
        passwords: Arc<dyn PasswordService>,
        posts_per_page: u64,
        db: Option<Arc<DatabaseConnections>>,
    ) -> Self {
        let Repositories {
            users,
            posts,
            follows,
        } = repos;

        Self {
            accounts: Accounts::new(users.clone(), passwords),
            graph: FollowGraph::new(users.clone(), follows.clone()),
            feed: FeedResolver::new(users.clone(), posts.clone(), follows),
            posts: Posts::new(users.clone(), posts),
            presence: Presence::new(users),
            posts_per_page,
            db,
        }
    }
}
