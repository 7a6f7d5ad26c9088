// ============================================================================
// PROFILE FEED - posts, likes and comments of one profile, kept in sync with
// a remote document store
// ============================================================================

// - Post cache for the profile on screen
// - Synchronizer reconciling remote CRUD results into the cache
// - Optimistic likes with rollback on failure
// - Document store / object storage boundaries with in-memory backends
// - JWT authenticated HTTP surface

pub mod auth;
pub mod cache;
pub mod config;
pub mod dto;
pub mod errors;
pub mod models;
pub mod routes;
pub mod states;
pub mod store;
pub mod sync;

pub use cache::PostCache;
pub use config::Config;
pub use errors::{ApiError, FeedError, FeedResult};
pub use routes::router;
pub use states::AppState;
pub use sync::PostSynchronizer;
