//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;
mod users;
mod views;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Timelines
            .route("/feed", web::get().to(posts::feed))
            .route("/posts", web::post().to(posts::create_post))
            .route("/posts/{id}", web::get().to(posts::get_post))
            .route("/explore", web::get().to(posts::explore))
            // Users; `/me` is registered before `/{username}` so it wins the match
            .service(
                web::scope("/users")
                    .service(
                        web::resource("/me")
                            .route(web::get().to(auth::me))
                            .route(web::put().to(users::edit_profile))
                            .route(web::delete().to(users::delete_me)),
                    )
                    .route("/{username}", web::get().to(users::profile))
                    .route("/{username}/posts", web::get().to(users::user_posts))
                    .route("/{username}/followers", web::get().to(users::followers))
                    .route("/{username}/following", web::get().to(users::following))
                    .service(
                        web::resource("/{username}/follow")
                            .route(web::post().to(users::follow))
                            .route(web::delete().to(users::unfollow)),
                    ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use serde_json::json;
    use std::sync::Arc;

    use microblog_core::ports::{AuthError, PasswordService, TokenService};
    use microblog_infra::{JwtConfig, JwtTokenService};
    use microblog_shared::dto::{
        AuthResponse, FollowResponse, PageResponse, PostResponse, ProfileResponse, UserResponse,
    };

    use crate::middleware::presence::PresenceMiddleware;
    use crate::state::AppState;

    struct PlainPasswords;

    impl PasswordService for PlainPasswords {
        fn hash(&self, password: &str) -> Result<String, AuthError> {
            Ok(format!("plain:{password}"))
        }

        fn verify(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
            Ok(hash == format!("plain:{password}"))
        }
    }

    fn tokens() -> Arc<dyn TokenService> {
        Arc::new(JwtTokenService::new(JwtConfig::default()))
    }

    macro_rules! init_app {
        ($per_page:expr) => {
            test::init_service(
                App::new()
                    .wrap(PresenceMiddleware)
                    .app_data(web::Data::new(AppState::in_memory(
                        Arc::new(PlainPasswords),
                        $per_page,
                    )))
                    .app_data(web::Data::new(tokens()))
                    .configure(configure_routes),
            )
            .await
        };
    }

    macro_rules! register {
        ($app:expr, $name:expr) => {{
            let req = test::TestRequest::post()
                .uri("/api/auth/register")
                .set_json(json!({
                    "username": $name,
                    "email": format!("{}@example.com", $name),
                    "password": "cat-password",
                }))
                .to_request();
            let body: AuthResponse = test::call_and_read_body_json(&$app, req).await;
            body.access_token
        }};
    }

    macro_rules! post_as {
        ($app:expr, $token:expr, $body:expr) => {{
            let req = test::TestRequest::post()
                .uri("/api/posts")
                .insert_header(("Authorization", format!("Bearer {}", $token)))
                .set_json(json!({ "body": $body }))
                .to_request();
            let resp = test::call_service(&$app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }};
    }

    fn get(uri: &str, token: &str) -> test::TestRequest {
        test::TestRequest::get()
            .uri(uri)
            .insert_header(("Authorization", format!("Bearer {token}")))
    }

    fn follow(username: &str, token: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri(&format!("/api/users/{username}/follow"))
            .insert_header(("Authorization", format!("Bearer {token}")))
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = init_app!(25);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health").to_request()).await;
        assert!(resp.status().is_success());
    }

    #[actix_web::test]
    async fn test_register_login_and_me() {
        let app = init_app!(25);
        register!(app, "john");

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": "john", "password": "cat-password" }))
            .to_request();
        let login: AuthResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(login.token_type, "Bearer");

        let me: UserResponse =
            test::call_and_read_body_json(&app, get("/api/auth/me", &login.access_token).to_request())
                .await;
        assert_eq!(me.username, "john");
        assert!(me.avatar.starts_with("https://www.gravatar.com/avatar/"));
    }

    #[actix_web::test]
    async fn test_wrong_password_is_unauthorized() {
        let app = init_app!(25);
        register!(app, "john");

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "username": "john", "password": "dog-password" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_duplicate_username_conflicts() {
        let app = init_app!(25);
        register!(app, "john");

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({
                "username": "john",
                "email": "other@example.com",
                "password": "cat-password",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_feed_requires_token() {
        let app = init_app!(25);

        let resp = test::call_service(&app, test::TestRequest::get().uri("/api/feed").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_feed_merges_own_and_followed_posts() {
        let app = init_app!(25);
        let john = register!(app, "john");
        let susan = register!(app, "susan");
        let david = register!(app, "david");

        post_as!(app, susan, "post from susan");
        post_as!(app, david, "post from david");
        post_as!(app, john, "post from john");

        let resp = test::call_service(&app, follow("susan", &john).to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let page: PageResponse<PostResponse> =
            test::call_and_read_body_json(&app, get("/api/feed", &john).to_request()).await;

        let bodies: Vec<&str> = page.items.iter().map(|p| p.body.as_str()).collect();
        assert_eq!(bodies, vec!["post from john", "post from susan"]);
        assert_eq!(page.total, 2);
        assert_eq!(page.items[1].author.username, "susan");
    }

    #[actix_web::test]
    async fn test_get_post_by_id() {
        let app = init_app!(25);
        let john = register!(app, "john");

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(("Authorization", format!("Bearer {john}")))
            .set_json(json!({ "body": "  hello  " }))
            .to_request();
        let created: PostResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(created.body, "hello");

        let fetched: PostResponse = test::call_and_read_body_json(
            &app,
            get(&format!("/api/posts/{}", created.id), &john).to_request(),
        )
        .await;
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.author.username, "john");

        let resp = test::call_service(&app, get("/api/posts/999", &john).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_explore_paginates() {
        let app = init_app!(2);
        let john = register!(app, "john");
        for n in 1..=3 {
            post_as!(app, john, format!("post {n}"));
        }

        let first: PageResponse<PostResponse> =
            test::call_and_read_body_json(&app, get("/api/explore?page=oops", &john).to_request()).await;
        assert_eq!(first.page, 1);
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_page, Some(2));
        assert_eq!(first.prev_page, None);

        let second: PageResponse<PostResponse> =
            test::call_and_read_body_json(&app, get("/api/explore?page=2", &john).to_request()).await;
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.items[0].body, "post 1");
        assert!(!second.has_next);
        assert_eq!(second.prev_page, Some(1));
    }

    #[actix_web::test]
    async fn test_empty_post_is_rejected() {
        let app = init_app!(25);
        let john = register!(app, "john");

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(("Authorization", format!("Bearer {john}")))
            .set_json(json!({ "body": "   " }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_self_follow_and_unfollow_are_rejected() {
        let app = init_app!(25);
        let john = register!(app, "john");

        let resp = test::call_service(&app, follow("john", &john).to_request()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::delete()
            .uri("/api/users/john/follow")
            .insert_header(("Authorization", format!("Bearer {john}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_follow_unknown_user_is_not_found() {
        let app = init_app!(25);
        let john = register!(app, "john");

        let resp = test::call_service(&app, follow("nobody", &john).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_profile_reports_follow_state() {
        let app = init_app!(25);
        let john = register!(app, "john");
        register!(app, "susan");

        let body: FollowResponse =
            test::call_and_read_body_json(&app, follow("susan", &john).to_request()).await;
        assert!(body.following);
        // Following twice is a no-op.
        test::call_service(&app, follow("susan", &john).to_request()).await;

        let profile: ProfileResponse =
            test::call_and_read_body_json(&app, get("/api/users/susan", &john).to_request()).await;
        assert_eq!(profile.followers, 1);
        assert_eq!(profile.following, 0);
        assert!(profile.is_following);
        assert!(!profile.is_self);

        let followers: Vec<UserResponse> =
            test::call_and_read_body_json(&app, get("/api/users/susan/followers", &john).to_request())
                .await;
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].username, "john");
    }

    #[actix_web::test]
    async fn test_edit_profile() {
        let app = init_app!(25);
        let john = register!(app, "john");
        register!(app, "susan");

        let req = test::TestRequest::put()
            .uri("/api/users/me")
            .insert_header(("Authorization", format!("Bearer {john}")))
            .set_json(json!({ "username": "johnny", "about_me": "hello" }))
            .to_request();
        let user: UserResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(user.username, "johnny");
        assert_eq!(user.about_me.as_deref(), Some("hello"));

        let req = test::TestRequest::put()
            .uri("/api/users/me")
            .insert_header(("Authorization", format!("Bearer {john}")))
            .set_json(json!({ "username": "susan" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_deleted_user_disappears() {
        let app = init_app!(25);
        let john = register!(app, "john");
        let susan = register!(app, "susan");
        post_as!(app, susan, "soon gone");

        let req = test::TestRequest::delete()
            .uri("/api/users/me")
            .insert_header(("Authorization", format!("Bearer {susan}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = test::call_service(&app, get("/api/users/susan", &john).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let page: PageResponse<PostResponse> =
            test::call_and_read_body_json(&app, get("/api/explore", &john).to_request()).await;
        assert_eq!(page.total, 0);
    }
}
