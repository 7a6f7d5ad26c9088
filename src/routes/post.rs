use crate::{
    AppState,
    auth::current_uid,
    dto::{CreatePostRequest, FeedResponse, LikeResponse, UpdatePostRequest},
    errors::ApiError,
    models::{Post, PostUpdate},
    sync::PostSynchronizer,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use validator::Validate;

/// GET /users/{uid}/posts
/// Headers: Authorization: Bearer <token>
/// Loads that profile into the caller's feed.
pub async fn get_profile_posts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(owner): Path<String>,
) -> Result<Json<FeedResponse>, ApiError> {
    let uid = current_uid(&headers, &state.config.jwt_secret)?;
    let posts = state.feed(&uid).fetch_posts(&owner).await?;

    Ok(Json(FeedResponse {
        owner: Some(owner),
        posts,
    }))
}

/// GET /feed
/// The cached feed, no remote call.
pub async fn get_feed(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<FeedResponse>, ApiError> {
    let uid = current_uid(&headers, &state.config.jwt_secret)?;
    let feed = state.feed(&uid);

    Ok(Json(FeedResponse {
        owner: feed.owner().await,
        posts: feed.snapshot().await,
    }))
}

/// POST /posts
/// Headers: Authorization: Bearer <token>
/// Body: { "content": "...", "image": { "filename": "...", "data": "<base64>" } }
pub async fn create_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreatePostRequest>,
) -> Result<(StatusCode, Json<Post>), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let uid = current_uid(&headers, &state.config.jwt_secret)?;
    let image = payload
        .image
        .map(|image| image.decode(state.config.max_upload_bytes))
        .transpose()?;

    let post = state
        .feed(&uid)
        .create_post(&uid, &payload.content, image)
        .await?;

    Ok((StatusCode::CREATED, Json(post)))
}

/// GET /posts/{id}
pub async fn get_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Post>, ApiError> {
    let uid = current_uid(&headers, &state.config.jwt_secret)?;
    let post = state.feed(&uid).refresh_post(&uid, &id).await?;

    Ok(Json(post))
}

/// PUT /posts/{id}
/// Body: { "content": "...", "image": { ... } }, at least one of them
pub async fn update_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<Json<Post>, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let uid = current_uid(&headers, &state.config.jwt_secret)?;
    let update = PostUpdate {
        content: payload.content,
        image: payload
            .image
            .map(|image| image.decode(state.config.max_upload_bytes))
            .transpose()?,
    };

    let post = state.feed(&uid).update_post(&uid, &id, update).await?;

    Ok(Json(post))
}

/// DELETE /posts/{id}
pub async fn delete_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let uid = current_uid(&headers, &state.config.jwt_secret)?;
    state.feed(&uid).delete_post(&uid, &id).await?;

    Ok(StatusCode::NO_CONTENT)
}

async fn like_response(feed: &PostSynchronizer, post_id: String, liked: bool) -> LikeResponse {
    let like_count = feed.post(&post_id).await.map(|post| post.likes.len());
    LikeResponse {
        post_id,
        liked,
        like_count,
    }
}

/// POST /posts/{id}/like
pub async fn like_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, ApiError> {
    let uid = current_uid(&headers, &state.config.jwt_secret)?;
    let feed = state.feed(&uid);
    feed.like_post(&uid, &id).await?;

    Ok(Json(like_response(&feed, id, true).await))
}

/// DELETE /posts/{id}/like
pub async fn unlike_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, ApiError> {
    let uid = current_uid(&headers, &state.config.jwt_secret)?;
    let feed = state.feed(&uid);
    feed.unlike_post(&uid, &id).await?;

    Ok(Json(like_response(&feed, id, false).await))
}

/// POST /posts/{id}/like/toggle
pub async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, ApiError> {
    let uid = current_uid(&headers, &state.config.jwt_secret)?;
    let feed = state.feed(&uid);
    let liked = feed.toggle_like(&uid, &id).await?;

    Ok(Json(like_response(&feed, id, liked).await))
}
