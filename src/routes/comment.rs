use crate::{
    AppState, auth::current_uid, dto::CreateCommentRequest, errors::ApiError, models::Comment,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};
use validator::Validate;

/// GET /posts/{id}/comments
pub async fn get_comments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let uid = current_uid(&headers, &state.config.jwt_secret)?;
    let comments = state.feed(&uid).fetch_comments(&uid, &post_id).await?;

    Ok(Json(comments))
}

/// POST /posts/{id}/comments
/// Body: { "content": "..." }
pub async fn add_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(post_id): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError::ValidationError(e.to_string()))?;

    let uid = current_uid(&headers, &state.config.jwt_secret)?;
    let comment = state
        .feed(&uid)
        .add_comment(&uid, &post_id, &payload.content)
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

/// DELETE /posts/{id}/comments/{comment_id}
pub async fn delete_comment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let uid = current_uid(&headers, &state.config.jwt_secret)?;
    state
        .feed(&uid)
        .delete_comment(&uid, &post_id, &comment_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
