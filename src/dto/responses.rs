use crate::models::{Post, User};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub created_at: i64,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

/// What the profile view renders: whose profile and its posts, newest first.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub owner: Option<String>,
    pub posts: Vec<Post>,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub post_id: String,
    pub liked: bool,
    /// `None` when the post is not in the cached feed.
    pub like_count: Option<usize>,
}
