use crate::{AppState, errors::ApiError, store::paths};
use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

fn content_type(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "gif" => "image/gif",
        Some(ext) if ext == "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// GET /media/posts/{filename}
/// Serves images uploaded with posts. Public, like the bucket URLs it backs.
pub async fn get_post_image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = paths::post_image(&filename);
    let bytes = state.media.get(&path).ok_or(ApiError::NotFound(path))?;

    Ok(([(header::CONTENT_TYPE, content_type(&filename))], bytes))
}
