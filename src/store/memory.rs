use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use serde_json::{Map, Value};
use tracing::debug;
use uuid::Uuid;

use super::{Document, DocumentStore, ObjectStorage};
use crate::errors::{FeedError, FeedResult};

/// In-process document database keyed by collection path.
///
/// Each collection lives in one `DashMap` shard entry, so every write below
/// runs while holding that entry's lock and array updates are atomic.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: DashMap<String, Vec<Document>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn segments(path: &str) -> FeedResult<usize> {
    let count = path.split('/').count();
    if path.split('/').any(str::is_empty) {
        return Err(FeedError::Validation(format!("malformed path: {path}")));
    }
    Ok(count)
}

fn collection_path(path: &str) -> FeedResult<&str> {
    if segments(path)? % 2 == 0 {
        return Err(FeedError::Validation(format!("not a collection path: {path}")));
    }
    Ok(path)
}

/// Splits a document path into its collection and id.
fn document_path(path: &str) -> FeedResult<(&str, &str)> {
    if segments(path)? % 2 != 0 {
        return Err(FeedError::Validation(format!("not a document path: {path}")));
    }
    path.rsplit_once('/')
        .ok_or_else(|| FeedError::Validation(format!("not a document path: {path}")))
}

fn array_field<'a>(document: &'a mut Document, field: &str) -> FeedResult<&'a mut Vec<Value>> {
    let object = document
        .data
        .as_object_mut()
        .ok_or_else(|| FeedError::Validation(format!("document {} is not an object", document.id)))?;
    object
        .entry(field)
        .or_insert_with(|| Value::Array(Vec::new()))
        .as_array_mut()
        .ok_or_else(|| FeedError::Validation(format!("field {field} is not an array")))
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn create(&self, collection: &str, data: Value) -> FeedResult<Document> {
        let collection = collection_path(collection)?;
        if !data.is_object() {
            return Err(FeedError::Validation("document data must be an object".into()));
        }

        let document = Document {
            id: Uuid::new_v4().simple().to_string(),
            data,
            create_time: Utc::now(),
        };
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());

        debug!("Created document {}/{}", collection, document.id);
        Ok(document)
    }

    async fn get(&self, path: &str) -> FeedResult<Option<Document>> {
        let (collection, id) = document_path(path)?;
        Ok(self
            .collections
            .get(collection)
            .and_then(|documents| documents.iter().find(|doc| doc.id == id).cloned()))
    }

    async fn list(&self, collection: &str) -> FeedResult<Vec<Document>> {
        let collection = collection_path(collection)?;
        Ok(self
            .collections
            .get(collection)
            .map(|documents| documents.clone())
            .unwrap_or_default())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> FeedResult<Document> {
        let (collection, id) = document_path(path)?;
        let mut documents = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| FeedError::NotFound(path.to_string()))?;
        let document = documents
            .iter_mut()
            .find(|doc| doc.id == id)
            .ok_or_else(|| FeedError::NotFound(path.to_string()))?;

        let object = document
            .data
            .as_object_mut()
            .ok_or_else(|| FeedError::Validation(format!("document {path} is not an object")))?;
        object.extend(fields);

        Ok(document.clone())
    }

    async fn delete(&self, path: &str) -> FeedResult<()> {
        let (collection, id) = document_path(path)?;
        if let Some(mut documents) = self.collections.get_mut(collection) {
            documents.retain(|doc| doc.id != id);
        }
        Ok(())
    }

    async fn array_union(&self, path: &str, field: &str, value: Value) -> FeedResult<bool> {
        let (collection, id) = document_path(path)?;
        let Some(mut documents) = self.collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(document) = documents.iter_mut().find(|doc| doc.id == id) else {
            return Ok(false);
        };

        let values = array_field(document, field)?;
        if !values.contains(&value) {
            values.push(value);
        }
        Ok(true)
    }

    async fn array_remove(&self, path: &str, field: &str, value: Value) -> FeedResult<bool> {
        let (collection, id) = document_path(path)?;
        let Some(mut documents) = self.collections.get_mut(collection) else {
            return Ok(false);
        };
        let Some(document) = documents.iter_mut().find(|doc| doc.id == id) else {
            return Ok(false);
        };

        array_field(document, field)?.retain(|existing| existing != &value);
        Ok(true)
    }
}

/// In-process image bucket. URLs are `{base_url}/{path}`.
#[derive(Debug)]
pub struct MemoryObjectStorage {
    base_url: String,
    objects: DashMap<String, Vec<u8>>,
}

impl MemoryObjectStorage {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: DashMap::new(),
        }
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.get(path).map(|bytes| bytes.clone())
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>) -> FeedResult<String> {
        segments(path)?;
        self.objects.insert(path.to_string(), bytes);
        Ok(format!("{}/{}", self.base_url, path))
    }
}
