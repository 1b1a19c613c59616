//! A single in-memory store implementing every repository port.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use microblog_core::domain::{FollowEdge, NewPost, NewUser, Page, PageRequest, Post, User};
use microblog_core::error::RepoError;
use microblog_core::ports::{BaseRepository, FollowRepository, PostRepository, UserRepository};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    posts: BTreeMap<i64, Post>,
    // (follower, followed) and its mirror (followed, follower).
    following: BTreeSet<(i64, i64)>,
    followers: BTreeSet<(i64, i64)>,
    next_user_id: i64,
    next_post_id: i64,
}

impl Tables {
    fn username_taken(&self, username: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.username == username && Some(u.id) != except)
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }

    fn neighbours(index: &BTreeSet<(i64, i64)>, user_id: i64) -> Vec<i64> {
        index
            .range((user_id, i64::MIN)..=(user_id, i64::MAX))
            .map(|&(_, other)| other)
            .collect()
    }

    fn page_of<'a>(posts: impl Iterator<Item = &'a Post>, page: PageRequest) -> Page<Post> {
        let mut ordered: Vec<&Post> = posts.collect();
        ordered.sort_by(|a, b| b.recency_key().cmp(&a.recency_key()));

        page.slice(&ordered).map(Post::clone)
    }
}

/// In-memory store using ordered maps behind an async RwLock.
///
/// Every operation takes the lock once, so each mutation is atomic with
/// respect to every other. Data is lost on process restart.
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                next_user_id: 1,
                next_post_id: 1,
                ..Tables::default()
            }),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseRepository<User, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepoError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn update(&self, user: User) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&user.id) {
            return Err(RepoError::NotFound);
        }
        if tables.username_taken(&user.username, Some(user.id)) {
            return Err(RepoError::Constraint("Username already taken".to_string()));
        }
        if tables.email_taken(&user.email, Some(user.id)) {
            return Err(RepoError::Constraint("Email already taken".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        if tables.users.remove(&id).is_none() {
            return Err(RepoError::NotFound);
        }

        tables.posts.retain(|_, p| p.author_id != id);
        tables.following.retain(|&(a, b)| a != id && b != id);
        tables.followers.retain(|&(a, b)| a != id && b != id);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let mut tables = self.tables.write().await;
        if tables.username_taken(&user.username, None) {
            return Err(RepoError::Constraint("Username already taken".to_string()));
        }
        if tables.email_taken(&user.email, None) {
            return Err(RepoError::Constraint("Email already taken".to_string()));
        }

        let id = tables.next_user_id;
        tables.next_user_id += 1;

        let user = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            about_me: None,
            last_seen: user.last_seen,
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let email = email.trim().to_lowercase();
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, RepoError> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn touch_last_seen(&self, id: i64, now: DateTime<Utc>) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        let user = tables.users.get_mut(&id).ok_or(RepoError::NotFound)?;
        user.last_seen = now;
        Ok(())
    }
}

#[async_trait]
impl BaseRepository<Post, i64> for InMemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Post>, RepoError> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn update(&self, post: Post) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post.id) {
            return Err(RepoError::NotFound);
        }
        if !tables.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint("Unknown author".to_string()));
        }
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: i64) -> Result<(), RepoError> {
        let mut tables = self.tables.write().await;
        tables
            .posts
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PostRepository for InMemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&post.author_id) {
            return Err(RepoError::Constraint("Unknown author".to_string()));
        }

        let id = tables.next_post_id;
        tables.next_post_id += 1;

        let post = Post {
            id,
            body: post.body,
            timestamp: post.timestamp,
            author_id: post.author_id,
        };
        tables.posts.insert(id, post.clone());
        Ok(post)
    }

    async fn find_by_authors(
        &self,
        author_ids: &[i64],
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let authors: BTreeSet<i64> = author_ids.iter().copied().collect();
        let tables = self.tables.read().await;
        Ok(Tables::page_of(
            tables.posts.values().filter(|p| authors.contains(&p.author_id)),
            page,
        ))
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Post>, RepoError> {
        let tables = self.tables.read().await;
        Ok(Tables::page_of(tables.posts.values(), page))
    }
}

#[async_trait]
impl FollowRepository for InMemoryStore {
    async fn insert(&self, edge: FollowEdge) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        if !tables.users.contains_key(&edge.follower_id)
            || !tables.users.contains_key(&edge.followed_id)
        {
            return Err(RepoError::Constraint("Unknown user".to_string()));
        }

        let inserted = tables.following.insert((edge.follower_id, edge.followed_id));
        tables.followers.insert((edge.followed_id, edge.follower_id));
        Ok(inserted)
    }

    async fn remove(&self, edge: FollowEdge) -> Result<bool, RepoError> {
        let mut tables = self.tables.write().await;
        let removed = tables.following.remove(&(edge.follower_id, edge.followed_id));
        tables.followers.remove(&(edge.followed_id, edge.follower_id));
        Ok(removed)
    }

    async fn contains(&self, edge: FollowEdge) -> Result<bool, RepoError> {
        let tables = self.tables.read().await;
        Ok(tables
            .following
            .contains(&(edge.follower_id, edge.followed_id)))
    }

    async fn followed_ids(&self, user_id: i64) -> Result<Vec<i64>, RepoError> {
        let tables = self.tables.read().await;
        Ok(Tables::neighbours(&tables.following, user_id))
    }

    async fn follower_ids(&self, user_id: i64) -> Result<Vec<i64>, RepoError> {
        let tables = self.tables.read().await;
        Ok(Tables::neighbours(&tables.followers, user_id))
    }

    async fn count_followed(&self, user_id: i64) -> Result<u64, RepoError> {
        Ok(self.followed_ids(user_id).await?.len() as u64)
    }

    async fn count_followers(&self, user_id: i64) -> Result<u64, RepoError> {
        Ok(self.follower_ids(user_id).await?.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser::new(name, &format!("{name}@example.com"), "hash".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_ids_are_assigned_sequentially() {
        let store = InMemoryStore::new();
        let a = UserRepository::create(&store, new_user("a")).await.unwrap();
        let b = UserRepository::create(&store, new_user("b")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[tokio::test]
    async fn test_duplicate_username_is_a_constraint_violation() {
        let store = InMemoryStore::new();
        UserRepository::create(&store, new_user("a")).await.unwrap();
        let err = UserRepository::create(&store, new_user("a"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_page_far_past_the_end_is_empty() {
        let store = InMemoryStore::new();
        let a = UserRepository::create(&store, new_user("a")).await.unwrap();
        PostRepository::create(&store, NewPost::new(a.id, "hello", Utc::now()).unwrap())
            .await
            .unwrap();

        let page = store
            .find_all(PageRequest::new(i64::MAX, 25).unwrap())
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 1);
        assert!(!page.has_next);
        assert!(page.has_prev);

        let page = store
            .find_by_authors(&[a.id], PageRequest::new(400_000_000_000_000_000, 25).unwrap())
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn test_insert_reports_existing_edge() {
        let store = InMemoryStore::new();
        let a = UserRepository::create(&store, new_user("a")).await.unwrap();
        let b = UserRepository::create(&store, new_user("b")).await.unwrap();
        let edge = FollowEdge::new(a.id, b.id);

        assert!(store.insert(edge).await.unwrap());
        assert!(!store.insert(edge).await.unwrap());
        assert_eq!(store.follower_ids(b.id).await.unwrap(), vec![a.id]);
        assert!(store.remove(edge).await.unwrap());
        assert!(!store.remove(edge).await.unwrap());
        assert!(store.follower_ids(b.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_cascades() {
        let store = InMemoryStore::new();
        let a = UserRepository::create(&store, new_user("a")).await.unwrap();
        let b = UserRepository::create(&store, new_user("b")).await.unwrap();
        store.insert(FollowEdge::new(a.id, b.id)).await.unwrap();
        store.insert(FollowEdge::new(b.id, a.id)).await.unwrap();
        PostRepository::create(&store, NewPost::new(a.id, "hi", Utc::now()).unwrap())
            .await
            .unwrap();

        BaseRepository::<User, i64>::delete(&store, a.id).await.unwrap();

        assert!(store.followed_ids(b.id).await.unwrap().is_empty());
        assert!(store.follower_ids(b.id).await.unwrap().is_empty());
        let all = store.find_all(PageRequest::first(10).unwrap()).await.unwrap();
        assert_eq!(all.total, 0);
    }
}
