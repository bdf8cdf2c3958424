//! Axum router construction for the Pulse API.
//!
//! Assembles every REST route under `/api/v1` into a single [`Router`]
//! with CORS and request tracing middleware.

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{delete, get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{comments, messages, notifications, posts, users};

/// Build the CORS layer.
///
/// With a configured frontend origin, cookies are allowed and the origin
/// is pinned (credentialed CORS forbids a wildcard). Without one the
/// layer is fully permissive for development, credentials excluded.
pub fn cors_layer(frontend_url: Option<&str>) -> CorsLayer {
    frontend_url
        .and_then(|url| url.parse::<HeaderValue>().ok())
        .map_or_else(
            || {
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any)
            },
            |origin| {
                CorsLayer::new()
                    .allow_origin(origin)
                    .allow_credentials(true)
                    .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                    .allow_headers([header::CONTENT_TYPE])
            },
        )
}

/// Build the complete Axum router for the API server.
pub fn build_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        // Accounts and profiles
        .route("/api/v1/user/register", post(users::register))
        .route("/api/v1/user/login", post(users::login))
        .route("/api/v1/user/logout", get(users::logout))
        .route("/api/v1/user/me", get(users::me))
        .route("/api/v1/user/{id}/profile", get(users::profile))
        .route("/api/v1/user/profile/edit", post(users::edit_profile))
        .route("/api/v1/user/suggested", get(users::suggested))
        .route(
            "/api/v1/user/followorunfollow/{id}",
            post(users::follow_or_unfollow),
        )
        // Posts
        .route("/api/v1/post/addpost", post(posts::add_post))
        .route("/api/v1/post/all", get(posts::all_posts))
        .route("/api/v1/post/user/{id}", get(posts::user_posts))
        .route("/api/v1/post/{id}/like", put(posts::like))
        .route("/api/v1/post/{id}/dislike", put(posts::dislike))
        .route("/api/v1/post/delete/{id}", delete(posts::delete_post))
        .route("/api/v1/post/{id}/bookmark", get(posts::bookmark))
        // Comments
        .route("/api/v1/post/{id}/comment", post(comments::add_comment))
        .route("/api/v1/post/{id}/comment/all", get(comments::list_comments))
        .route(
            "/api/v1/comments/{id}/delete",
            delete(comments::delete_comment),
        )
        // Direct messages
        .route("/api/v1/message/send/{id}", post(messages::send_message))
        .route("/api/v1/message/all/{id}", get(messages::thread))
        // Notifications
        .route("/api/v1/notifications", get(notifications::list))
        .route(
            "/api/v1/notifications/mark-all-read",
            put(notifications::mark_all_read),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, Response, StatusCode, header};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::auth::Argon2Hasher;

    fn test_app() -> Router {
        let state = Arc::new(AppState::in_memory(
            Arc::new(Argon2Hasher),
            "router-test-secret",
        ));
        build_router(state, cors_layer(None))
    }

    fn request(method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let payload = body
            .map(|b| serde_json::to_vec(&b).unwrap_or_default())
            .unwrap_or_default();
        builder.body(Body::from(payload)).unwrap_or_default()
    }

    async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
        match app.clone().oneshot(req).await {
            Ok(res) => res,
            Err(never) => match never {},
        }
    }

    async fn read_json(res: Response<Body>) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap_or_default();
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    }

    /// Register an account, log in, and return the session cookie pair.
    async fn register_and_login(app: &Router, username: &str, email: &str) -> String {
        let res = send(
            app,
            request(
                Method::POST,
                "/api/v1/user/register",
                None,
                Some(json!({ "username": username, "email": email, "password": "hunter2" })),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = send(
            app,
            request(
                Method::POST,
                "/api/v1/user/login",
                None,
                Some(json!({ "email": email, "password": "hunter2" })),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(set_cookie.starts_with("token="));
        set_cookie
            .split(';')
            .next()
            .unwrap_or_default()
            .to_owned()
    }

    #[tokio::test]
    async fn me_requires_a_session() {
        let app = test_app();
        let res = send(&app, request(Method::GET, "/api/v1/user/me", None, None)).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn register_login_and_fetch_own_profile() {
        let app = test_app();
        let cookie = register_and_login(&app, "ada", "ada@example.com").await;

        let res = send(
            &app,
            request(Method::GET, "/api/v1/user/me", Some(&cookie), None),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = read_json(res).await;
        assert_eq!(body["success"], json!(true));
        assert_eq!(body["user"]["username"], json!("ada"));
        // The credential hash must never appear in a response.
        assert!(body["user"].get("password_hash").is_none());
    }

    #[tokio::test]
    async fn profile_lookup_requires_a_session() {
        let app = test_app();
        let cookie = register_and_login(&app, "ada", "ada@example.com").await;

        let res = send(
            &app,
            request(Method::GET, "/api/v1/user/me", Some(&cookie), None),
        )
        .await;
        let body = read_json(res).await;
        let id = body["user"]["id"].as_str().unwrap_or_default().to_owned();

        // Anonymous callers must not see another account's record.
        let res = send(
            &app,
            request(Method::GET, &format!("/api/v1/user/{id}/profile"), None, None),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = send(
            &app,
            request(
                Method::GET,
                &format!("/api/v1/user/{id}/profile"),
                Some(&cookie),
                None,
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let app = test_app();
        let body = json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "hunter2",
        });
        let res = send(
            &app,
            request(Method::POST, "/api/v1/user/register", None, Some(body.clone())),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = send(
            &app,
            request(Method::POST, "/api/v1/user/register", None, Some(body)),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = read_json(res).await;
        assert_eq!(body["message"], json!("Email already in use"));
    }

    #[tokio::test]
    async fn like_fans_out_a_notification_to_the_author() {
        let app = test_app();
        let author = register_and_login(&app, "ada", "ada@example.com").await;
        let fan = register_and_login(&app, "lin", "lin@example.com").await;

        let res = send(
            &app,
            request(
                Method::POST,
                "/api/v1/post/addpost",
                Some(&author),
                Some(json!({ "image": "cdn://sunset", "caption": "golden hour" })),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let body = read_json(res).await;
        let post_id = body["post"]["post"]["id"]
            .as_str()
            .unwrap_or_default()
            .to_owned();
        assert!(!post_id.is_empty());

        // Like twice: the second one must not create a second notification.
        for _ in 0_u8..2 {
            let res = send(
                &app,
                request(
                    Method::PUT,
                    &format!("/api/v1/post/{post_id}/like"),
                    Some(&fan),
                    None,
                ),
            )
            .await;
            assert_eq!(res.status(), StatusCode::OK);
        }

        let res = send(
            &app,
            request(Method::GET, "/api/v1/notifications", Some(&author), None),
        )
        .await;
        let body = read_json(res).await;
        let notifications = body["notifications"].as_array().cloned().unwrap_or_default();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0]["kind"], json!("like"));
        assert_eq!(notifications[0]["actor"]["username"], json!("lin"));
        assert_eq!(notifications[0]["post"]["caption"], json!("golden hour"));
    }

    #[tokio::test]
    async fn empty_comment_is_rejected() {
        let app = test_app();
        let author = register_and_login(&app, "ada", "ada@example.com").await;

        let res = send(
            &app,
            request(
                Method::POST,
                "/api/v1/post/addpost",
                Some(&author),
                Some(json!({ "image": "cdn://pic" })),
            ),
        )
        .await;
        let body = read_json(res).await;
        let post_id = body["post"]["post"]["id"]
            .as_str()
            .unwrap_or_default()
            .to_owned();

        let res = send(
            &app,
            request(
                Method::POST,
                &format!("/api/v1/post/{post_id}/comment"),
                Some(&author),
                Some(json!({ "text": "   " })),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn self_follow_is_rejected() {
        let app = test_app();
        let cookie = register_and_login(&app, "ada", "ada@example.com").await;

        let res = send(
            &app,
            request(Method::GET, "/api/v1/user/me", Some(&cookie), None),
        )
        .await;
        let body = read_json(res).await;
        let own_id = body["user"]["id"].as_str().unwrap_or_default().to_owned();

        let res = send(
            &app,
            request(
                Method::POST,
                &format!("/api/v1/user/followorunfollow/{own_id}"),
                Some(&cookie),
                None,
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        let body = read_json(res).await;
        assert_eq!(body["message"], json!("You cannot follow yourself"));
    }

    #[tokio::test]
    async fn direct_message_round_trip() {
        let app = test_app();
        let ada = register_and_login(&app, "ada", "ada@example.com").await;
        let lin_cookie = register_and_login(&app, "lin", "lin@example.com").await;

        let res = send(
            &app,
            request(Method::GET, "/api/v1/user/me", Some(&lin_cookie), None),
        )
        .await;
        let body = read_json(res).await;
        let lin_id = body["user"]["id"].as_str().unwrap_or_default().to_owned();

        let res = send(
            &app,
            request(
                Method::POST,
                &format!("/api/v1/message/send/{lin_id}"),
                Some(&ada),
                Some(json!({ "textMessage": "hey!" })),
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        // The receiver reads the same thread from their side.
        let res = send(
            &app,
            request(Method::GET, "/api/v1/user/me", Some(&ada), None),
        )
        .await;
        let body = read_json(res).await;
        let ada_id = body["user"]["id"].as_str().unwrap_or_default().to_owned();

        let res = send(
            &app,
            request(
                Method::GET,
                &format!("/api/v1/message/all/{ada_id}"),
                Some(&lin_cookie),
                None,
            ),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = read_json(res).await;
        let messages = body["messages"].as_array().cloned().unwrap_or_default();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["message"]["text"], json!("hey!"));
        assert_eq!(messages[0]["sender"]["username"], json!("ada"));
    }

    #[tokio::test]
    async fn logout_clears_the_session_cookie() {
        let app = test_app();
        let cookie = register_and_login(&app, "ada", "ada@example.com").await;

        let res = send(
            &app,
            request(Method::GET, "/api/v1/user/logout", Some(&cookie), None),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert!(set_cookie.starts_with("token="));
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
