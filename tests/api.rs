use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use profile_feed::{AppState, Config, router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    let mut config = Config::new("test-secret");
    config.bcrypt_cost = 4;
    router(AppState::new(config))
}

async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

async fn signup(app: &Router, email: &str) -> (String, String) {
    let (status, body) = send(
        app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "email": email, "username": "yuna", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    (
        body["token"].as_str().unwrap().to_string(),
        body["user"]["id"].as_str().unwrap().to_string(),
    )
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = send(&app(), "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn feed_routes_require_a_token() {
    let app = app();
    for (method, uri) in [
        ("GET", "/feed"),
        ("GET", "/users/someone/posts"),
        ("POST", "/posts/p1/like"),
        ("GET", "/posts/p1/comments"),
    ] {
        let (status, _) = send(&app, method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
    }

    let (status, _) = send(&app, "GET", "/feed", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_login_and_me() {
    let app = app();
    let (token, uid) = signup(&app, "yuna@example.com").await;

    let (status, _) = send(
        &app,
        "POST",
        "/auth/signup",
        None,
        Some(json!({ "email": "yuna@example.com", "username": "again", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "yuna@example.com", "password": "wrong-password" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({ "email": "yuna@example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], uid.as_str());

    let (status, body) = send(&app, "GET", "/users/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "yuna@example.com");
}

#[tokio::test]
async fn profile_feed_flow() {
    let app = app();
    let (token, uid) = signup(&app, "feed@example.com").await;
    let token = Some(token.as_str());

    let (status, body) = send(&app, "GET", &format!("/users/{uid}/posts"), token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"], json!([]));

    let image = STANDARD.encode([137u8, 80, 78, 71]);
    let (status, created) = send(
        &app,
        "POST",
        "/posts",
        token,
        Some(json!({ "content": "first post", "image": { "filename": "pic.png", "data": image } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["authorId"], uid.as_str());
    assert_eq!(
        created["imageUrl"],
        "http://localhost:3000/media/posts/pic.png"
    );

    let (status, _) = send(&app, "GET", "/media/posts/pic.png", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, "POST", &format!("/posts/{post_id}/like"), token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["liked"], true);
    assert_eq!(body["like_count"], 1);

    let (_, body) = send(&app, "POST", &format!("/posts/{post_id}/like/toggle"), token, None).await;
    assert_eq!(body["liked"], false);
    assert_eq!(body["like_count"], 0);

    let (status, _) = send(&app, "GET", &format!("/posts/{post_id}/comments"), token, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, comment) = send(
        &app,
        "POST",
        &format!("/posts/{post_id}/comments"),
        token,
        Some(json!({ "content": "hello" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["content"], "hello");

    let (status, updated) = send(
        &app,
        "PUT",
        &format!("/posts/{post_id}"),
        token,
        Some(json!({ "content": "edited" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["content"], "edited");
    assert_eq!(updated["comments"][0]["content"], "hello");

    let (_, feed) = send(&app, "GET", "/feed", token, None).await;
    assert_eq!(feed["owner"], uid.as_str());
    assert_eq!(feed["posts"].as_array().unwrap().len(), 1);

    let comment_id = comment["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/posts/{post_id}/comments/{comment_id}"),
        token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    for _ in 0..2 {
        let (status, _) = send(&app, "DELETE", &format!("/posts/{post_id}"), token, None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    let (status, _) = send(&app, "GET", &format!("/posts/{post_id}"), token, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn visitors_cannot_change_someone_elses_posts() {
    let app = app();
    let (owner_token, owner) = signup(&app, "owner@example.com").await;
    let (visitor_token, _) = signup(&app, "visitor@example.com").await;
    let owner_token = Some(owner_token.as_str());
    let visitor_token = Some(visitor_token.as_str());

    let (_, created) = send(
        &app,
        "POST",
        "/posts",
        owner_token,
        Some(json!({ "content": "mine" })),
    )
    .await;
    let post_id = created["id"].as_str().unwrap().to_string();

    let (_, comment) = send(
        &app,
        "POST",
        &format!("/posts/{post_id}/comments"),
        owner_token,
        Some(json!({ "content": "owner comment" })),
    )
    .await;
    let comment_id = comment["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, "GET", &format!("/users/{owner}/posts"), visitor_token, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/posts/{post_id}"),
        visitor_token,
        Some(json!({ "content": "defaced" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, "DELETE", &format!("/posts/{post_id}"), visitor_token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/posts/{post_id}/comments/{comment_id}"),
        visitor_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Liking and commenting on another profile stay open.
    let (status, body) = send(&app, "POST", &format!("/posts/{post_id}/like"), visitor_token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["like_count"], 1);

    let (status, own) = send(
        &app,
        "POST",
        &format!("/posts/{post_id}/comments"),
        visitor_token,
        Some(json!({ "content": "visitor comment" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let own_id = own["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/posts/{post_id}/comments/{own_id}"),
        visitor_token,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &format!("/users/{owner}/posts"), owner_token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"][0]["content"], "mine");
    let (_, comments) = send(&app, "GET", &format!("/posts/{post_id}/comments"), owner_token, None).await;
    assert_eq!(comments.as_array().unwrap().len(), 1);
    assert_eq!(comments[0]["content"], "owner comment");
}

#[tokio::test]
async fn concurrent_signups_claim_an_email_once() {
    let app = app();
    let body = json!({ "email": "race@example.com", "username": "racer", "password": "password123" });

    let (a, b) = tokio::join!(
        send(&app, "POST", "/auth/signup", None, Some(body.clone())),
        send(&app, "POST", "/auth/signup", None, Some(body.clone())),
    );

    let statuses = [a.0, b.0];
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(), 1);
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let app = app();
    let (token, _) = signup(&app, "bad@example.com").await;
    let token = Some(token.as_str());

    let (status, _) = send(&app, "POST", "/posts", token, Some(json!({ "content": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/posts",
        token,
        Some(json!({ "content": "x", "image": { "filename": "a.png", "data": "***" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "PUT", "/posts/p1", token, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        "POST",
        "/posts/p1/comments",
        token,
        Some(json!({ "content": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
