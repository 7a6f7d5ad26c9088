use crate::{
    config::Config,
    models::User,
    store::{DocumentStore, MemoryDocumentStore, MemoryObjectStorage},
    sync::PostSynchronizer,
};
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

// ============================================================================
// APPLICATION STATE - Shared data across all requests
// ============================================================================
/// The document store and image bucket stand in for the hosted backend.
///
/// `feeds` holds one synchronizer (and so one post cache) per signed-in uid,
/// created the first time that user asks for anything.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub media: Arc<MemoryObjectStorage>,
    pub users: Arc<DashMap<Uuid, User>>,
    pub email_index: Arc<DashMap<String, Uuid>>, // Quick Lookup by Email
    pub feeds: Arc<DashMap<String, Arc<PostSynchronizer>>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            media: Arc::new(MemoryObjectStorage::new(config.media_base_url.clone())),
            users: Arc::new(DashMap::new()),
            email_index: Arc::new(DashMap::new()),
            feeds: Arc::new(DashMap::new()),
            config: Arc::new(config),
        }
    }

    pub fn feed(&self, uid: &str) -> Arc<PostSynchronizer> {
        self.feeds
            .entry(uid.to_string())
            .or_insert_with(|| {
                Arc::new(PostSynchronizer::new(
                    self.store.clone(),
                    self.media.clone(),
                ))
            })
            .value()
            .clone()
    }
}
