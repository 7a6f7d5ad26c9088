mod comment;
mod health;
mod media;
mod post;
mod user;

use crate::AppState;
use axum::{
    BoxError, Json, Router,
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{self, get},
};
use std::time::Duration;
use tower::{ServiceBuilder, limit::GlobalConcurrencyLimitLayer, timeout::error::Elapsed};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

async fn handle_middleware_error(err: BoxError) -> (StatusCode, Json<serde_json::Value>) {
    let (status, message) = if err.is::<Elapsed>() {
        (StatusCode::REQUEST_TIMEOUT, "Request timed out")
    } else {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    };

    (
        status,
        Json(serde_json::json!({
          "error": message
        })),
    )
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let middleware = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(handle_middleware_error))
        .timeout(Duration::from_secs(state.config.request_timeout_secs))
        .layer(GlobalConcurrencyLimitLayer::new(
            state.config.max_concurrent_requests,
        ));
    let body_limit = DefaultBodyLimit::max(state.config.max_body_bytes());

    Router::new()
        // Public routes (no auth required)
        .route("/health", get(health::health_check))
        .route("/auth/signup", routing::post(user::signup))
        .route("/auth/login", routing::post(user::login))
        .route("/media/posts/{filename}", get(media::get_post_image))
        // Protected routes (auth required)
        .route("/users/me", get(user::get_current_user))
        .route("/users/{uid}/posts", get(post::get_profile_posts))
        .route("/feed", get(post::get_feed))
        .route("/posts", routing::post(post::create_post))
        .route(
            "/posts/{id}",
            get(post::get_post)
                .put(post::update_post)
                .delete(post::delete_post),
        )
        .route(
            "/posts/{id}/like",
            routing::post(post::like_post).delete(post::unlike_post),
        )
        .route("/posts/{id}/like/toggle", routing::post(post::toggle_like))
        .route(
            "/posts/{id}/comments",
            get(comment::get_comments).post(comment::add_comment),
        )
        .route(
            "/posts/{id}/comments/{comment_id}",
            routing::delete(comment::delete_comment),
        )
        // Add state and middleware
        .with_state(state)
        .layer(body_limit)
        .layer(middleware)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
