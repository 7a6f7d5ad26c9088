use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Deserialize;
use validator::Validate;

use crate::{errors::ApiError, models::ImageUpload};

#[derive(Debug, Validate, Deserialize)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 3, max = 20, message = "Username must be 3-20 characters"))]
    pub username: String,
    #[validate(length(min = 8, max = 100, message = "Password must be 8-100 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

/// Image attached to a post, base64 encoded.
#[derive(Debug, Validate, Deserialize)]
pub struct ImagePayload {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    pub data: String,
}

impl ImagePayload {
    pub fn decode(self, max_bytes: usize) -> Result<ImageUpload, ApiError> {
        let bytes = STANDARD
            .decode(self.data.as_bytes())
            .map_err(|e| ApiError::ValidationError(format!("Invalid image data: {}", e)))?;
        if bytes.len() > max_bytes {
            return Err(ApiError::ValidationError(format!(
                "Image exceeds {} bytes",
                max_bytes
            )));
        }
        Ok(ImageUpload {
            filename: self.filename,
            bytes,
        })
    }
}

#[derive(Debug, Validate, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub content: String,
    #[validate(nested)]
    pub image: Option<ImagePayload>,
}

#[derive(Debug, Validate, Deserialize)]
pub struct UpdatePostRequest {
    #[validate(length(max = 5000))]
    pub content: Option<String>,
    #[validate(nested)]
    pub image: Option<ImagePayload>,
}

#[derive(Debug, Validate, Deserialize)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}
