mod comment;
mod post;
mod user;

pub use comment::{Comment, CommentDocument};
pub use post::{ImageUpload, Post, PostDocument, PostUpdate};
pub use user::User;
