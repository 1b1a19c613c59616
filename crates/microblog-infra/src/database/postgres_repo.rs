//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, NotSet, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};

use microblog_core::domain::{FollowEdge, NewPost, NewUser, Page, PageRequest, Post, User};
use microblog_core::error::RepoError;
use microblog_core::ports::{FollowRepository, PostRepository, UserRepository};

use super::entity::follower::{self, Entity as FollowerEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error, write_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL follow-edge repository.
pub type PostgresFollowRepository = PostgresBaseRepository<FollowerEntity>;

fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => match local.chars().next() {
            Some(first) if local.chars().count() > 1 => format!("{first}***@{domain}"),
            _ => format!("***@{domain}"),
        },
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: NewUser) -> Result<User, RepoError> {
        let model = user::ActiveModel {
            id: NotSet,
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            about_me: Set(None),
            last_seen: Set(user.last_seen.into()),
        }
        .insert(&self.db)
        .await
        .map_err(write_error)?;

        Ok(model.into())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let email = email.trim().to_lowercase();
        // Mask email for logging to avoid PII in logs
        tracing::debug!(user_email = %mask_email(&email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<User>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let result = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .order_by_asc(user::Column::Id)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(Into::into).collect())
    }

    async fn touch_last_seen(&self, id: i64, now: DateTime<Utc>) -> Result<(), RepoError> {
        let last_seen: sea_orm::prelude::DateTimeWithTimeZone = now.into();
        let result = UserEntity::update_many()
            .col_expr(user::Column::LastSeen, Expr::value(last_seen))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await
            .map_err(query_error)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

impl PostgresPostRepository {
    /// Apply the shared ordering and cut one page out of `select`.
    async fn fetch_page(
        &self,
        select: Select<PostEntity>,
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        let select = select
            .order_by_desc(post::Column::Timestamp)
            .order_by_desc(post::Column::Id);

        let total = select.clone().count(&self.db).await.map_err(query_error)?;
        // Past the last row there is nothing to fetch, and the offset may not
        // fit the BIGINT the driver binds it as.
        if page.offset() >= total {
            return Ok(Page::new(Vec::new(), page, total));
        }

        let items = select
            .offset(page.offset())
            .limit(page.per_page())
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(Page::new(
            items.into_iter().map(Into::into).collect(),
            page,
            total,
        ))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create(&self, new_post: NewPost) -> Result<Post, RepoError> {
        let model = post::ActiveModel {
            id: NotSet,
            body: Set(new_post.body),
            timestamp: Set(new_post.timestamp.into()),
            user_id: Set(new_post.author_id),
        }
        .insert(&self.db)
        .await
        .map_err(write_error)?;

        Ok(model.into())
    }

    async fn find_by_authors(
        &self,
        author_ids: &[i64],
        page: PageRequest,
    ) -> Result<Page<Post>, RepoError> {
        if author_ids.is_empty() {
            return Ok(Page::empty(page));
        }

        let select =
            PostEntity::find().filter(post::Column::UserId.is_in(author_ids.iter().copied()));
        self.fetch_page(select, page).await
    }

    async fn find_all(&self, page: PageRequest) -> Result<Page<Post>, RepoError> {
        self.fetch_page(PostEntity::find(), page).await
    }
}

#[async_trait]
impl FollowRepository for PostgresFollowRepository {
    async fn insert(&self, edge: FollowEdge) -> Result<bool, RepoError> {
        // Concurrent follows of the same pair collapse onto the primary key.
        let result = FollowerEntity::insert(follower::ActiveModel::from(edge))
            .on_conflict(
                OnConflict::columns([follower::Column::FollowerId, follower::Column::FollowedId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await;

        match result {
            Ok(rows) => Ok(rows > 0),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(write_error(e)),
        }
    }

    async fn remove(&self, edge: FollowEdge) -> Result<bool, RepoError> {
        let result = FollowerEntity::delete_many()
            .filter(follower::Column::FollowerId.eq(edge.follower_id))
            .filter(follower::Column::FollowedId.eq(edge.followed_id))
            .exec(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected > 0)
    }

    async fn contains(&self, edge: FollowEdge) -> Result<bool, RepoError> {
        let result = FollowerEntity::find_by_id((edge.follower_id, edge.followed_id))
            .one(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.is_some())
    }

    async fn followed_ids(&self, user_id: i64) -> Result<Vec<i64>, RepoError> {
        let result = FollowerEntity::find()
            .filter(follower::Column::FollowerId.eq(user_id))
            .order_by_asc(follower::Column::FollowedId)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(|edge| edge.followed_id).collect())
    }

    async fn follower_ids(&self, user_id: i64) -> Result<Vec<i64>, RepoError> {
        let result = FollowerEntity::find()
            .filter(follower::Column::FollowedId.eq(user_id))
            .order_by_asc(follower::Column::FollowerId)
            .all(&self.db)
            .await
            .map_err(query_error)?;

        Ok(result.into_iter().map(|edge| edge.follower_id).collect())
    }

    async fn count_followed(&self, user_id: i64) -> Result<u64, RepoError> {
        FollowerEntity::find()
            .filter(follower::Column::FollowerId.eq(user_id))
            .count(&self.db)
            .await
            .map_err(query_error)
    }

    async fn count_followers(&self, user_id: i64) -> Result<u64, RepoError> {
        FollowerEntity::find()
            .filter(follower::Column::FollowedId.eq(user_id))
            .count(&self.db)
            .await
            .map_err(query_error)
    }
}
