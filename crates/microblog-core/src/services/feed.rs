//! Feed resolution over the follow graph.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::domain::{AuthorSummary, FeedEntry, Page, PageRequest, Post};
use crate::error::DomainResult;
use crate::ports::{FollowRepository, PostRepository, UserRepository};

use super::require_user;

/// Computes the paginated post listings a user sees.
///
/// Every listing is ordered by `timestamp` descending with ties broken by
/// post id descending. The feed is resolved to a single author-set
/// membership query; no per-post graph lookups happen.
#[derive(Clone)]
pub struct FeedResolver {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl FeedResolver {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        follows: Arc<dyn FollowRepository>,
    ) -> Self {
        Self {
            users,
            posts,
            follows,
        }
    }

    /// Posts authored by `user_id`.
    pub async fn own_posts(&self, user_id: i64, page: PageRequest) -> DomainResult<Page<Post>> {
        require_user(self.users.as_ref(), user_id).await?;
        Ok(self.posts.find_by_authors(&[user_id], page).await?)
    }

    /// Posts authored by anyone `user_id` follows.
    pub async fn followed_posts(
        &self,
        user_id: i64,
        page: PageRequest,
    ) -> DomainResult<Page<Post>> {
        require_user(self.users.as_ref(), user_id).await?;
        let followed = self.follows.followed_ids(user_id).await?;
        if followed.is_empty() {
            return Ok(Page::empty(page));
        }
        Ok(self.posts.find_by_authors(&followed, page).await?)
    }

    /// Own posts and followed posts, merged.
    pub async fn feed(&self, user_id: i64, page: PageRequest) -> DomainResult<Page<Post>> {
        require_user(self.users.as_ref(), user_id).await?;

        // A set, so a self-edge cannot list the user twice.
        let mut authors: BTreeSet<i64> =
            self.follows.followed_ids(user_id).await?.into_iter().collect();
        authors.insert(user_id);
        let authors: Vec<i64> = authors.into_iter().collect();

        tracing::debug!(user_id, authors = authors.len(), page = page.page(), "Resolving feed");
        Ok(self.posts.find_by_authors(&authors, page).await?)
    }

    /// Every post, newest first.
    pub async fn explore(&self, page: PageRequest) -> DomainResult<Page<Post>> {
        Ok(self.posts.find_all(page).await?)
    }

    /// Attach author identity to each post with one batched user lookup.
    ///
    /// A post whose author vanished between the two reads is dropped from the
    /// page rather than failing the whole listing.
    pub async fn with_authors(&self, page: Page<Post>) -> DomainResult<Page<FeedEntry>> {
        let ids: Vec<i64> = page
            .items
            .iter()
            .map(|p| p.author_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let authors: HashMap<i64, AuthorSummary> = self
            .users
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.summary()))
            .collect();

        let Page {
            items,
            page,
            per_page,
            total,
            has_next,
            has_prev,
        } = page;

        let items = items
            .into_iter()
            .filter_map(|post| match authors.get(&post.author_id) {
                Some(author) => Some(FeedEntry {
                    author: author.clone(),
                    post,
                }),
                None => {
                    tracing::warn!(post_id = post.id, author_id = post.author_id, "Post author missing");
                    None
                }
            })
            .collect();

        Ok(Page {
            items,
            page,
            per_page,
            total,
            has_next,
            has_prev,
        })
    }
}
