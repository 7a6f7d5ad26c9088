#![allow(dead_code)]

use async_trait::async_trait;
use dashmap::DashSet;
use profile_feed::{
    FeedError, FeedResult, PostSynchronizer,
    store::{Document, DocumentStore, MemoryDocumentStore, MemoryObjectStorage, paths},
};
use serde_json::{Map, Value, json};
use std::{collections::HashMap, sync::Arc, sync::Mutex};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Create,
    Get,
    List,
    Update,
    Delete,
    ArrayUnion,
    ArrayRemove,
}

struct Hold {
    started: oneshot::Sender<()>,
    release: oneshot::Receiver<()>,
}

/// Memory store whose calls can be made to fail or to wait for a signal.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryDocumentStore,
    failing: DashSet<Op>,
    holds: Mutex<HashMap<Op, Hold>>,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn inner(&self) -> &MemoryDocumentStore {
        &self.inner
    }

    pub fn fail(&self, op: Op) {
        self.failing.insert(op);
    }

    pub fn heal(&self, op: Op) {
        self.failing.remove(&op);
    }

    /// The next `op` signals the first receiver when it starts and then
    /// waits until the returned sender fires.
    pub fn hold(&self, op: Op) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        self.holds.lock().unwrap().insert(
            op,
            Hold {
                started: started_tx,
                release: release_rx,
            },
        );
        (started_rx, release_tx)
    }

    async fn check(&self, op: Op) -> FeedResult<()> {
        let hold = self.holds.lock().unwrap().remove(&op);
        if let Some(hold) = hold {
            let _ = hold.started.send(());
            let _ = hold.release.await;
        }

        if self.failing.contains(&op) {
            return Err(FeedError::Network(format!("{op:?} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn create(&self, collection: &str, data: Value) -> FeedResult<Document> {
        self.check(Op::Create).await?;
        self.inner.create(collection, data).await
    }

    async fn get(&self, path: &str) -> FeedResult<Option<Document>> {
        self.check(Op::Get).await?;
        self.inner.get(path).await
    }

    async fn list(&self, collection: &str) -> FeedResult<Vec<Document>> {
        self.check(Op::List).await?;
        self.inner.list(collection).await
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> FeedResult<Document> {
        self.check(Op::Update).await?;
        self.inner.update(path, fields).await
    }

    async fn delete(&self, path: &str) -> FeedResult<()> {
        self.check(Op::Delete).await?;
        self.inner.delete(path).await
    }

    async fn array_union(&self, path: &str, field: &str, value: Value) -> FeedResult<bool> {
        self.check(Op::ArrayUnion).await?;
        self.inner.array_union(path, field, value).await
    }

    async fn array_remove(&self, path: &str, field: &str, value: Value) -> FeedResult<bool> {
        self.check(Op::ArrayRemove).await?;
        self.inner.array_remove(path, field, value).await
    }
}

pub struct Harness {
    pub store: Arc<FlakyStore>,
    pub media: Arc<MemoryObjectStorage>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(FlakyStore::new()),
            media: Arc::new(MemoryObjectStorage::new("http://media.test")),
        }
    }

    pub fn synchronizer(&self) -> PostSynchronizer {
        PostSynchronizer::new(self.store.clone(), self.media.clone())
    }

    /// Writes a post straight into the store, bypassing any synchronizer.
    pub async fn seed_post(&self, owner: &str, content: &str, likes: &[&str]) -> String {
        self.store
            .inner()
            .create(
                &paths::posts(owner),
                json!({ "content": content, "likes": likes }),
            )
            .await
            .unwrap()
            .id
    }

    pub async fn seed_comment(&self, owner: &str, post_id: &str, author: &str, content: &str) -> String {
        self.store
            .inner()
            .create(
                &paths::comments(owner, post_id),
                json!({ "content": content, "authorId": author }),
            )
            .await
            .unwrap()
            .id
    }

    /// Likes as stored remotely.
    pub async fn stored_likes(&self, owner: &str, post_id: &str) -> Vec<String> {
        let document = self
            .store
            .inner()
            .get(&paths::post(owner, post_id))
            .await
            .unwrap()
            .expect("post exists");
        serde_json::from_value(document.data["likes"].clone()).unwrap()
    }
}
