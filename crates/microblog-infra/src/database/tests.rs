use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

use microblog_core::domain::{FollowEdge, PageRequest, Post, User};
use microblog_core::ports::{BaseRepository, FollowRepository, PostRepository, UserRepository};

use crate::database::entity::{post, user};
use crate::database::postgres_repo::{
    PostgresFollowRepository, PostgresPostRepository, PostgresUserRepository,
};

fn post_model(id: i64, user_id: i64, secs: i64) -> post::Model {
    post::Model {
        id,
        body: format!("post {id}"),
        timestamp: Utc.timestamp_opt(secs, 0).unwrap().into(),
        user_id,
    }
}

fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    BTreeMap::from([("num_items", Value::BigInt(Some(n)))])
}

#[tokio::test]
async fn test_find_post_by_id() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![post_model(12, 3, 30)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);

    let result: Option<Post> = repo.find_by_id(12).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.id, 12);
    assert_eq!(post.author_id, 3);
    assert_eq!(post.body, "post 12");
}

#[tokio::test]
async fn test_find_user_by_username() {
    let now = Utc::now();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![user::Model {
            id: 7,
            username: "susan".to_owned(),
            email: "susan@example.com".to_owned(),
            password_hash: "hash".to_owned(),
            about_me: Some("hi".to_owned()),
            last_seen: now.into(),
        }]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);

    let user: User = repo.find_by_username("susan").await.unwrap().unwrap();
    assert_eq!(user.id, 7);
    assert_eq!(user.about_me.as_deref(), Some("hi"));
    assert_eq!(user.last_seen, now);
}

#[tokio::test]
async fn test_find_by_authors_pages_in_recency_order() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![count_row(3)]])
        .append_query_results([vec![post_model(12, 1, 3), post_model(11, 1, 2)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let page = repo
        .find_by_authors(&[1, 2], PageRequest::new(1, 2).unwrap())
        .await
        .unwrap();

    assert_eq!(page.items.iter().map(|p| p.id).collect::<Vec<_>>(), vec![12, 11]);
    assert_eq!(page.total, 3);
    assert!(page.has_next);
    assert!(!page.has_prev);
}

#[tokio::test]
async fn test_find_by_no_authors_skips_the_database() {
    // No results appended: any query would fail.
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let repo = PostgresPostRepository::new(db);
    let page = repo
        .find_by_authors(&[], PageRequest::first(5).unwrap())
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert!(!page.has_next);
}

#[tokio::test]
async fn test_follow_insert_reports_new_edge() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 1,
        }])
        .into_connection();

    let repo = PostgresFollowRepository::new(db);
    assert!(repo.insert(FollowEdge::new(1, 2)).await.unwrap());
}

#[tokio::test]
async fn test_find_by_authors_far_past_the_end_skips_the_row_query() {
    // Only the count is answered; a row query would fail the test.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![count_row(3)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let page = repo
        .find_by_authors(&[1], PageRequest::new(i64::MAX, 25).unwrap())
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total, 3);
    assert!(!page.has_next);
    assert!(page.has_prev);
}

#[tokio::test]
async fn test_find_all_on_empty_table_returns_empty_page() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![count_row(0)]])
        .into_connection();

    let repo = PostgresPostRepository::new(db);
    let page = repo
        .find_all(PageRequest::new(400_000_000_000_000_000, 25).unwrap())
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert!(!page.has_next);
    assert!(!page.has_prev);
}

#[tokio::test]
async fn test_follow_insert_of_existing_edge_reports_false() {
    // ON CONFLICT DO NOTHING leaves zero rows affected.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresFollowRepository::new(db);
    assert!(!repo.insert(FollowEdge::new(1, 2)).await.unwrap());
}

#[tokio::test]
async fn test_follow_remove_of_absent_edge_is_noop() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresFollowRepository::new(db);
    assert!(!repo.remove(FollowEdge::new(1, 2)).await.unwrap());
}

#[tokio::test]
async fn test_touch_missing_user_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let err = repo.touch_last_seen(99, Utc::now()).await.unwrap_err();
    assert!(matches!(err, microblog_core::error::RepoError::NotFound));
}
