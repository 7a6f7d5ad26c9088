//! Boundaries to the hosted document database and the image bucket.
//!
//! Every call is an independent round trip that may fail. Documents are
//! addressed by slash separated paths: a collection path has an odd number of
//! segments (`users/{uid}/posts`), a document path an even number
//! (`users/{uid}/posts/{post}`).

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::errors::FeedResult;

pub use memory::{MemoryDocumentStore, MemoryObjectStorage};

/// A stored document with its generated id.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
    pub create_time: DateTime<Utc>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates a document with a generated id in `collection`.
    async fn create(&self, collection: &str, data: Value) -> FeedResult<Document>;

    async fn get(&self, path: &str) -> FeedResult<Option<Document>>;

    /// Lists a collection in creation order, oldest first.
    async fn list(&self, collection: &str) -> FeedResult<Vec<Document>>;

    /// Merges top level `fields` into an existing document and returns the
    /// result. Fails with `NotFound` if the document is absent.
    async fn update(&self, path: &str, fields: Map<String, Value>) -> FeedResult<Document>;

    /// Deleting an absent document succeeds. Sub-collections are left alone.
    async fn delete(&self, path: &str) -> FeedResult<()>;

    /// Atomically adds `value` to the array `field` unless already present.
    /// Returns false, without writing, when the document is absent.
    async fn array_union(&self, path: &str, field: &str, value: Value) -> FeedResult<bool>;

    /// Atomically removes every occurrence of `value` from the array `field`.
    /// Returns false, without writing, when the document is absent.
    async fn array_remove(&self, path: &str, field: &str, value: Value) -> FeedResult<bool>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `bytes` at `path` and returns a retrievable URL. An existing
    /// object at the same path is overwritten.
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> FeedResult<String>;
}

pub mod paths {
    pub fn posts(uid: &str) -> String {
        format!("users/{uid}/posts")
    }

    pub fn post(uid: &str, post_id: &str) -> String {
        format!("users/{uid}/posts/{post_id}")
    }

    pub fn comments(uid: &str, post_id: &str) -> String {
        format!("users/{uid}/posts/{post_id}/comments")
    }

    pub fn comment(uid: &str, post_id: &str, comment_id: &str) -> String {
        format!("users/{uid}/posts/{post_id}/comments/{comment_id}")
    }

    pub fn post_image(filename: &str) -> String {
        format!("posts/{filename}")
    }
}
