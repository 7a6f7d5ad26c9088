use serde::{Deserialize, Serialize};

use crate::{errors::FeedResult, store::Document};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub author_id: String,
}

/// Comment document as stored under `users/{uid}/posts/{post}/comments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDocument {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
}

impl Comment {
    /// Older comment documents carry no author; they belong to the
    /// collection owner.
    pub fn from_document(document: &Document, owner: &str) -> FeedResult<Self> {
        let data: CommentDocument = serde_json::from_value(document.data.clone())?;
        Ok(Self {
            id: document.id.clone(),
            content: data.content,
            author_id: data.author_id.unwrap_or_else(|| owner.to_string()),
        })
    }
}
