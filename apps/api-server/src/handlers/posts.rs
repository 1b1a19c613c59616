//! Timeline handlers: the home feed, publishing, and explore.

use actix_web::{HttpResponse, web};
use chrono::Utc;

use microblog_core::domain::{FeedEntry, PageRequest};
use microblog_shared::dto::{CreatePostRequest, PageQuery};

use super::views::{page_response, post_response};
use crate::middleware::auth::Identity;
use crate::middleware::error::AppResult;
use crate::state::AppState;

pub(super) fn page_request(state: &AppState, query: &PageQuery) -> AppResult<PageRequest> {
    Ok(PageRequest::new(query.page_number(), state.posts_per_page)?)
}

/// GET /api/feed?page=
///
/// Posts by everyone the caller follows plus the caller's own.
pub async fn feed(
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = page_request(&state, &query)?;
    let page = state.feed.feed(identity.user_id, request).await?;
    let page = state.feed.with_authors(page).await?;

    Ok(HttpResponse::Ok().json(page_response(page, post_response)))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let author = state.accounts.get(identity.user_id).await?;
    let post = state
        .posts
        .compose(author.id, &body.body, Utc::now())
        .await?;

    let entry = FeedEntry {
        author: author.summary(),
        post,
    };
    Ok(HttpResponse::Created().json(post_response(entry)))
}

/// GET /api/posts/{id}
pub async fn get_post(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let post = state.posts.get(path.into_inner()).await?;
    let author = state.accounts.get(post.author_id).await?;

    Ok(HttpResponse::Ok().json(post_response(FeedEntry {
        author: author.summary(),
        post,
    })))
}

/// GET /api/explore?page=
pub async fn explore(
    state: web::Data<AppState>,
    _identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = page_request(&state, &query)?;
    let page = state.feed.explore(request).await?;
    let page = state.feed.with_authors(page).await?;

    Ok(HttpResponse::Ok().json(page_response(page, post_response)))
}
