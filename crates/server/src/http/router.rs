use super::handlers::{admin, challenge, comments};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    let methods = [Method::GET, Method::POST, Method::PUT];
    let cors = if allowed_origins == "*" {
        CorsLayer::new()
            .allow_methods(methods)
            .allow_origin(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .filter_map(|s| s.parse::<HeaderValue>().ok())
            .collect();

        if origins.is_empty() {
            tracing::warn!("CORS config is invalid or empty, falling back to allow ANY.");
            CorsLayer::new()
                .allow_methods(methods)
                .allow_origin(Any)
                .allow_headers(Any)
        } else {
            tracing::info!("CORS enabled for origins: {:?}", origins);
            CorsLayer::new()
                .allow_methods(methods)
                .allow_origin(origins)
                .allow_headers(Any)
        }
    };

    Router::new()
        .route("/api/challenge", get(challenge::get_challenge))
        .route("/api/posts/:slug", post(comments::post_action))
        .route("/api/posts/:slug/comments", get(comments::list_comments))
        .route("/api/admin/posts/:slug", put(admin::put_post))
        .route("/api/admin/accounts/:id", put(admin::put_account))
        .route("/api/admin/comments/:id/visibility", put(admin::put_visibility))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::tests::setup;
    use crate::pow::{solve, PowGuard};
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use domain::Account;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    const TOKEN: &str = "test-token";

    async fn app(enable_captcha: bool) -> (Router, AppState) {
        let (db, mut config) = setup().await;
        config.enable_captcha = enable_captcha;
        config.gravatar.default_secure = false;
        let state = AppState {
            db,
            config: Arc::new(config),
            pow: PowGuard::new(1),
            admin_token: TOKEN.to_string(),
        };
        (build_router(state.clone(), "*"), state)
    }

    fn form_post(uri: &str) -> axum::http::request::Builder {
        Request::post(uri).header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn anonymous_comment_round_trip() {
        let (app, _) = app(false).await;

        let body = "type=comment&message=hello&name=Ann&email=a%40x.com";
        let response = send(
            &app,
            form_post("/api/posts/hello-world")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json(response).await;
        assert_eq!(created["name"], "Ann");
        assert!(created.get("email").is_none());
        assert!(created["avatar"]["url"]
            .as_str()
            .unwrap()
            .starts_with("http://www.gravatar.com/avatar/743173788aa9166801df2e18f0e7ff24.png?s=80"));

        let response = send(
            &app,
            Request::get("/api/posts/hello-world/comments")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let thread = json(response).await;
        assert_eq!(thread["post"]["can_comment"], true);
        assert_eq!(thread["comments"].as_array().unwrap().len(), 1);
        assert_eq!(thread["comments"][0]["comment"], "hello");
    }

    #[tokio::test]
    async fn proxy_headers_reach_avatar_and_stored_ip() {
        let (app, state) = app(false).await;

        let body = "type=comment&message=hello&name=Ann&email=a%40x.com";
        let response = send(
            &app,
            form_post("/api/posts/hello-world")
                .header("X-Forwarded-Proto", "https")
                .header("X-Forwarded-For", "203.0.113.9, 10.0.0.1")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let created = json(response).await;
        assert!(created["avatar"]["url"]
            .as_str()
            .unwrap()
            .starts_with("https://secure.gravatar.com/avatar/"));

        let stored = state
            .db
            .list_comments(&state.config.site_id, "hello-world", domain::CommentFilter::all())
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].ip_address, "203.0.113.9".parse().ok());
    }

    #[tokio::test]
    async fn missing_identity_is_unprocessable() {
        let (app, _) = app(false).await;
        let body = "type=comment&message=hello";
        let response = send(
            &app,
            form_post("/api/posts/hello-world")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let error = json(response).await;
        assert!(error["fields"]["name"].is_array());
        assert!(error["fields"]["email"].is_array());
    }

    #[tokio::test]
    async fn remote_user_comments_as_account() {
        let (app, state) = app(false).await;
        state
            .db
            .upsert_account(&Account {
                id: "7".into(),
                username: "ann".into(),
                email: "ann@example.com".into(),
                full_name: String::new(),
            })
            .await
            .unwrap();

        let body = "type=comment&message=signed&name=Ignored";
        let response = send(
            &app,
            form_post("/api/posts/hello-world")
                .header("X-Remote-User", "7")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(json(response).await["name"], "ann");
    }

    #[tokio::test]
    async fn captcha_gates_comments() {
        let (app, state) = app(true).await;

        let body = "type=comment&message=hello&name=Ann&email=a%40x.com";
        let response = send(
            &app,
            form_post("/api/posts/hello-world")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let secret = state.pow.generate_challenge();
        let nonce = solve(&secret, state.pow.difficulty());
        let body = format!("{}&challenge_response={}%7C{}", body, secret, nonce);
        let response = send(
            &app,
            form_post("/api/posts/hello-world")
                .body(Body::from(body.clone()))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn moderation_requires_token_and_shows_placeholder() {
        let (app, state) = app(false).await;
        let comment = state
            .db
            .create_comment(
                &state.config.site_id,
                domain::CommentDraft::new(
                    "hello-world",
                    domain::Author::Anonymous {
                        name: "Spammer".into(),
                        email: "s@x.com".into(),
                    },
                    "buy now",
                ),
                state.config.max_length,
            )
            .await
            .unwrap();

        let body = format!("type=moderate&pk={}&moderate=1", comment.id);
        let response = send(
            &app,
            form_post("/api/posts/hello-world")
                .body(Body::from(body.clone()))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &app,
            form_post("/api/posts/hello-world")
                .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
                .body(Body::from(body.clone()))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let moderated = json(response).await;
        assert_eq!(moderated["is_removed"], true);
        assert_eq!(moderated["comment"], "This comment has been removed.");
    }

    #[tokio::test]
    async fn unknown_type_is_no_content() {
        let (app, _) = app(false).await;
        let body = "type=explode";
        let response = send(
            &app,
            form_post("/api/posts/hello-world")
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn handle_toggles_container() {
        let (app, _) = app(false).await;
        let body = "type=handle";
        let response = send(
            &app,
            form_post("/api/posts/hello-world")
                .header(header::AUTHORIZATION, format!("Bearer {}", TOKEN))
                .body(Body::from(body))
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["can_comment"], false);
    }

    #[tokio::test]
    async fn moderated_view_requires_token() {
        let (app, _) = app(false).await;
        let response = send(
            &app,
            Request::get("/api/posts/hello-world/comments?view=moderated")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = send(
            &app,
            Request::get("/api/posts/missing/comments")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
