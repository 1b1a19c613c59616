//! Profile and follow-graph handlers.

use actix_web::{HttpResponse, web};

use microblog_core::domain::{ProfileUpdate, User};
use microblog_shared::dto::{EditProfileRequest, FollowResponse, PageQuery, ProfileResponse, UserResponse};

use super::posts::page_request;
use super::views::{page_response, post_response, user_response};
use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/users/{username}
pub async fn profile(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = state.accounts.profile(&path).await?;
    let counts = state.graph.counts(user.id).await?;
    let is_following = state.graph.is_following(identity.user_id, user.id).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        user: user_response(&user),
        followers: counts.followers,
        following: counts.following,
        is_following,
        is_self: user.id == identity.user_id,
    }))
}

/// GET /api/users/{username}/posts?page=
pub async fn user_posts(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let request = page_request(&state, &query)?;
    let user = state.accounts.profile(&path).await?;
    let page = state.feed.own_posts(user.id, request).await?;
    let page = state.feed.with_authors(page).await?;

    Ok(HttpResponse::Ok().json(page_response(page, post_response)))
}

/// GET /api/users/{username}/followers
pub async fn followers(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = state.accounts.profile(&path).await?;
    let users = state.graph.follower_users(user.id).await?;
    Ok(HttpResponse::Ok().json(user_list(&users)))
}

/// GET /api/users/{username}/following
pub async fn following(
    state: web::Data<AppState>,
    _identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user = state.accounts.profile(&path).await?;
    let users = state.graph.followed_users(user.id).await?;
    Ok(HttpResponse::Ok().json(user_list(&users)))
}

fn user_list(users: &[User]) -> Vec<UserResponse> {
    users.iter().map(user_response).collect()
}

/// PUT /api/users/me
pub async fn edit_profile(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<EditProfileRequest>,
) -> AppResult<HttpResponse> {
    let update = ProfileUpdate::new(&body.username, body.about_me.as_deref())?;
    let user = state.accounts.update_profile(identity.user_id, update).await?;
    Ok(HttpResponse::Ok().json(user_response(&user)))
}

/// DELETE /api/users/me
pub async fn delete_me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    state.accounts.delete(identity.user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// POST /api/users/{username}/follow
pub async fn follow(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let target = state.accounts.profile(&path).await?;
    state.graph.follow(identity.user_id, target.id).await?;

    Ok(HttpResponse::Ok().json(FollowResponse {
        username: target.username,
        following: true,
    }))
}

/// DELETE /api/users/{username}/follow
pub async fn unfollow(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<String>,
) -> AppResult<HttpResponse> {
    let target = state.accounts.profile(&path).await?;
    if target.id == identity.user_id {
        return Err(AppError::BadRequest("You cannot unfollow yourself!".to_string()));
    }
    state.graph.unfollow(identity.user_id, target.id).await?;

    Ok(HttpResponse::Ok().json(FollowResponse {
        username: target.username,
        following: false,
    }))
}
