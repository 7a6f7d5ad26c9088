use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::Comment;
use crate::{errors::FeedResult, store::Document};

/// A post as the feed renders it.
///
/// `comments` is `None` until the comment sub-collection has been fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub content: String,
    pub image_url: Option<String>,
    pub likes: BTreeSet<String>,
    pub comments: Option<Vec<Comment>>,
    pub author_id: String,
}

/// Post document as stored under `users/{uid}/posts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDocument {
    pub content: String,
    #[serde(default)]
    pub likes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Image bytes attached to a new or edited post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Fields to merge into an existing post. At least one must be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostUpdate {
    pub content: Option<String>,
    pub image: Option<ImageUpload>,
}

impl PostDocument {
    pub fn decode(document: &Document) -> FeedResult<Self> {
        Ok(serde_json::from_value(document.data.clone())?)
    }
}

impl Post {
    /// Builds a post from a stored document owned by `author_id`.
    pub fn from_document(document: &Document, author_id: &str) -> FeedResult<Self> {
        let data = PostDocument::decode(document)?;
        Ok(Self {
            id: document.id.clone(),
            content: data.content,
            image_url: data.image_url,
            likes: data.likes.into_iter().collect(),
            comments: None,
            author_id: author_id.to_string(),
        })
    }

    /// Overwrites the stored fields, keeping the loaded comments.
    pub fn apply_document(&mut self, data: PostDocument) {
        self.content = data.content;
        self.image_url = data.image_url;
        self.likes = data.likes.into_iter().collect();
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.contains(user_id)
    }

    /// Returns true if the like was not already there.
    pub fn like(&mut self, user_id: &str) -> bool {
        self.likes.insert(user_id.to_string())
    }

    /// Returns true if a like was removed.
    pub fn unlike(&mut self, user_id: &str) -> bool {
        self.likes.remove(user_id)
    }

    pub fn comments_loaded(&self) -> bool {
        self.comments.is_some()
    }

    pub fn set_comments(&mut self, comments: Vec<Comment>) {
        self.comments = Some(comments);
    }

    /// Appends at the end of a loaded list. An unloaded list stays unloaded.
    pub fn append_comment(&mut self, comment: Comment) -> bool {
        match self.comments.as_mut() {
            Some(comments) => {
                comments.retain(|existing| existing.id != comment.id);
                comments.push(comment);
                true
            }
            None => false,
        }
    }

    pub fn remove_comment(&mut self, comment_id: &str) -> bool {
        match self.comments.as_mut() {
            Some(comments) => {
                let before = comments.len();
                comments.retain(|comment| comment.id != comment_id);
                comments.len() != before
            }
            None => false,
        }
    }
}
