//! Post synchronizer: turns user intents into remote store calls and folds the
//! results back into the [`PostCache`].
//!
//! Every operation issues its remote call first and only touches the cache
//! once the call succeeded. Likes are the exception: they are applied to the
//! cache up front and reverted if the store rejects them.
//!
//! Post level operations address the profile the cache currently shows
//! (`users/{owner}/posts/{post}`), falling back to the acting user's own
//! profile when nothing is loaded. The acting user is always the one who likes
//! or comments. Editing or deleting a post is limited to the profile's owner;
//! a comment may also be deleted by its author.

use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::{
    cache::PostCache,
    errors::{FeedError, FeedResult},
    models::{Comment, CommentDocument, ImageUpload, Post, PostDocument, PostUpdate},
    store::{Document, DocumentStore, ObjectStorage, paths},
};

const CONTENT_FIELD: &str = "content";
const IMAGE_URL_FIELD: &str = "imageUrl";
const LIKES_FIELD: &str = "likes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Membership {
    Add,
    Remove,
}

impl Membership {
    /// Returns true if the post's likes changed.
    fn apply(self, post: &mut Post, user_id: &str) -> bool {
        match self {
            Membership::Add => post.like(user_id),
            Membership::Remove => post.unlike(user_id),
        }
    }

    fn revert(self, post: &mut Post, user_id: &str) -> bool {
        match self {
            Membership::Add => post.unlike(user_id),
            Membership::Remove => post.like(user_id),
        }
    }
}

fn logged<T>(operation: &str, result: FeedResult<T>) -> FeedResult<T> {
    result.inspect_err(|err| error!("{} failed: {}", operation, err))
}

/// Newest first. Documents created in the same instant keep their reverse
/// creation order.
fn ensure_owner(owner: &str, user_id: &str, path: &str) -> FeedResult<()> {
    if owner == user_id {
        Ok(())
    } else {
        Err(FeedError::Forbidden(format!("{} may not change {}", user_id, path)))
    }
}

fn decode_posts(mut documents: Vec<Document>, owner: &str) -> FeedResult<Vec<Post>> {
    documents.sort_by_key(|document| document.create_time);
    documents
        .iter()
        .rev()
        .map(|document| Post::from_document(document, owner))
        .collect()
}

fn decode_comments(mut documents: Vec<Document>, owner: &str) -> FeedResult<Vec<Comment>> {
    documents.sort_by_key(|document| document.create_time);
    documents
        .iter()
        .map(|document| Comment::from_document(document, owner))
        .collect()
}

pub struct PostSynchronizer {
    store: Arc<dyn DocumentStore>,
    storage: Arc<dyn ObjectStorage>,
    cache: RwLock<PostCache>,
}

impl PostSynchronizer {
    pub fn new(store: Arc<dyn DocumentStore>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            store,
            storage,
            cache: RwLock::new(PostCache::new()),
        }
    }

    /// Cached posts, newest first.
    pub async fn snapshot(&self) -> Vec<Post> {
        self.cache.read().await.posts().to_vec()
    }

    pub async fn post(&self, post_id: &str) -> Option<Post> {
        self.cache.read().await.get(post_id).cloned()
    }

    /// The user whose profile is loaded, if any.
    pub async fn owner(&self) -> Option<String> {
        self.cache.read().await.owner().map(str::to_string)
    }

    /// Drops the cached profile, e.g. when the view goes away.
    pub async fn reset(&self) {
        self.cache.write().await.clear();
    }

    async fn profile_owner(&self, user_id: &str) -> String {
        self.cache
            .read()
            .await
            .owner()
            .unwrap_or(user_id)
            .to_string()
    }

    /// Runs `apply` against the cache unless it moved on to another profile
    /// while the remote call was in flight.
    async fn reconcile<R>(&self, owner: &str, apply: impl FnOnce(&mut PostCache) -> R) -> Option<R> {
        let mut cache = self.cache.write().await;
        if let Some(current) = cache.owner().filter(|current| *current != owner) {
            debug!("Dropping result for {}: profile switched to {}", owner, current);
            return None;
        }
        Some(apply(&mut *cache))
    }

    async fn upload_image(&self, image: ImageUpload) -> FeedResult<String> {
        if image.filename.is_empty() || image.filename.contains('/') {
            return Err(FeedError::Validation(format!(
                "invalid image filename: {:?}",
                image.filename
            )));
        }
        self.storage
            .upload(&paths::post_image(&image.filename), image.bytes)
            .await
    }

    /// Loads every post of `user_id` and makes that profile the cached one.
    pub async fn fetch_posts(&self, user_id: &str) -> FeedResult<Vec<Post>> {
        let documents = logged("fetch_posts", self.store.list(&paths::posts(user_id)).await)?;
        let posts = logged("fetch_posts", decode_posts(documents, user_id))?;

        let mut cache = self.cache.write().await;
        cache.scope_to(user_id);
        cache.replace_all(posts.clone());

        info!("Fetched {} posts for user {}", posts.len(), user_id);
        Ok(posts)
    }

    /// Creates a post under `user_id`. Nothing is cached until the store has
    /// assigned an id.
    pub async fn create_post(
        &self,
        user_id: &str,
        content: &str,
        image: Option<ImageUpload>,
    ) -> FeedResult<Post> {
        if content.trim().is_empty() && image.is_none() {
            return logged(
                "create_post",
                Err(FeedError::Validation("post needs content or an image".into())),
            );
        }

        // An image uploaded before a failed create stays in the bucket.
        let image_url = match image {
            Some(image) => Some(logged("create_post", self.upload_image(image).await)?),
            None => None,
        };

        let data = serde_json::to_value(PostDocument {
            content: content.to_string(),
            likes: Vec::new(),
            image_url,
        })?;
        let document = logged(
            "create_post",
            self.store.create(&paths::posts(user_id), data).await,
        )?;
        let post = logged("create_post", Post::from_document(&document, user_id))?;

        self.reconcile(user_id, |cache| cache.prepend(post.clone()))
            .await;

        info!("Post created: {} by user {}", post.id, user_id);
        Ok(post)
    }

    pub async fn like_post(&self, user_id: &str, post_id: &str) -> FeedResult<()> {
        self.change_like(user_id, post_id, Membership::Add).await
    }

    pub async fn unlike_post(&self, user_id: &str, post_id: &str) -> FeedResult<()> {
        self.change_like(user_id, post_id, Membership::Remove).await
    }

    /// Likes the post if `user_id` has not liked it yet, otherwise unlikes it.
    /// Returns whether the post is now liked.
    pub async fn toggle_like(&self, user_id: &str, post_id: &str) -> FeedResult<bool> {
        let liked = self
            .cache
            .read()
            .await
            .get(post_id)
            .is_some_and(|post| post.is_liked_by(user_id));

        if liked {
            self.unlike_post(user_id, post_id).await?;
        } else {
            self.like_post(user_id, post_id).await?;
        }
        Ok(!liked)
    }

    async fn change_like(&self, user_id: &str, post_id: &str, membership: Membership) -> FeedResult<()> {
        let owner = self.profile_owner(user_id).await;
        let path = paths::post(&owner, post_id);

        let tentative = self
            .reconcile(&owner, |cache| {
                cache.mutate(post_id, |post| membership.apply(post, user_id))
            })
            .await
            .flatten()
            .unwrap_or(false);

        let member = Value::String(user_id.to_string());
        let result = match membership {
            Membership::Add => self.store.array_union(&path, LIKES_FIELD, member).await,
            Membership::Remove => self.store.array_remove(&path, LIKES_FIELD, member).await,
        };

        match result {
            Ok(true) => {
                info!("{:?} like on {} by user {}", membership, path, user_id);
                Ok(())
            }
            Ok(false) => {
                warn!("Post {} not found, like change skipped", path);
                Ok(())
            }
            Err(err) => {
                error!("{:?} like on {} failed: {}", membership, path, err);
                if tentative {
                    self.settle_like(&owner, &path, post_id, user_id, membership)
                        .await;
                }
                Err(err)
            }
        }
    }

    /// Undoes a failed optimistic like change. Another request may have stored
    /// the same change meanwhile, so the stored likes win when they can be
    /// read; otherwise the tentative change is reverted.
    async fn settle_like(
        &self,
        owner: &str,
        path: &str,
        post_id: &str,
        user_id: &str,
        membership: Membership,
    ) {
        let stored = match self.store.get(path).await {
            Ok(Some(document)) => PostDocument::decode(&document)
                .ok()
                .map(|data| data.likes.iter().any(|id| id == user_id)),
            Ok(None) => None,
            Err(err) => {
                warn!("Could not re-read {} after failed like change: {}", path, err);
                None
            }
        };

        self.reconcile(owner, |cache| {
            cache.mutate(post_id, |post| match stored {
                Some(true) => post.like(user_id),
                Some(false) => post.unlike(user_id),
                None => membership.revert(post, user_id),
            })
        })
        .await;
    }

    /// Merges the provided fields into the stored post. The cache follows only
    /// after the store accepted the change; loaded comments are kept.
    pub async fn update_post(&self, user_id: &str, post_id: &str, update: PostUpdate) -> FeedResult<Post> {
        let PostUpdate { content, image } = update;
        let content = content.filter(|content| !content.trim().is_empty());
        if content.is_none() && image.is_none() {
            return logged(
                "update_post",
                Err(FeedError::Validation("update needs content or an image".into())),
            );
        }

        let owner = self.profile_owner(user_id).await;
        let path = paths::post(&owner, post_id);
        logged("update_post", ensure_owner(&owner, user_id, &path))?;

        let mut fields = Map::new();
        if let Some(content) = content {
            fields.insert(CONTENT_FIELD.into(), Value::String(content));
        }
        if let Some(image) = image {
            let url = logged("update_post", self.upload_image(image).await)?;
            fields.insert(IMAGE_URL_FIELD.into(), Value::String(url));
        }

        let document = logged(
            "update_post",
            self.store.update(&path, fields).await,
        )?;
        let post = self.apply_document(&owner, post_id, &document).await?;

        info!("Post updated: {} by user {}", post_id, user_id);
        Ok(post)
    }

    /// Re-reads one post. A post gone from the store is dropped from the cache
    /// and reported as `NotFound`.
    pub async fn refresh_post(&self, user_id: &str, post_id: &str) -> FeedResult<Post> {
        let owner = self.profile_owner(user_id).await;
        let path = paths::post(&owner, post_id);

        let Some(document) = logged("refresh_post", self.store.get(&path).await)? else {
            self.reconcile(&owner, |cache| cache.remove(post_id)).await;
            return logged("refresh_post", Err(FeedError::NotFound(path)));
        };

        self.apply_document(&owner, post_id, &document).await
    }

    async fn apply_document(&self, owner: &str, post_id: &str, document: &Document) -> FeedResult<Post> {
        let data = logged("decode post", PostDocument::decode(document))?;
        let cached = self
            .reconcile(owner, |cache| {
                cache.mutate(post_id, |post| {
                    post.apply_document(data);
                    post.clone()
                })
            })
            .await
            .flatten();

        match cached {
            Some(post) => Ok(post),
            None => Post::from_document(document, owner),
        }
    }

    /// Deleting an already deleted post succeeds; the cache removal is then a
    /// no-op.
    pub async fn delete_post(&self, user_id: &str, post_id: &str) -> FeedResult<()> {
        let owner = self.profile_owner(user_id).await;
        let path = paths::post(&owner, post_id);
        logged("delete_post", ensure_owner(&owner, user_id, &path))?;
        logged("delete_post", self.store.delete(&path).await)?;

        self.reconcile(&owner, |cache| cache.remove(post_id)).await;

        info!("Post deleted: {} by user {}", post_id, user_id);
        Ok(())
    }

    pub async fn fetch_comments(&self, user_id: &str, post_id: &str) -> FeedResult<Vec<Comment>> {
        let owner = self.profile_owner(user_id).await;
        let documents = logged(
            "fetch_comments",
            self.store.list(&paths::comments(&owner, post_id)).await,
        )?;
        let comments = logged("fetch_comments", decode_comments(documents, &owner))?;

        self.reconcile(&owner, |cache| {
            cache.mutate(post_id, |post| post.set_comments(comments.clone()))
        })
        .await;

        debug!("Fetched {} comments for post {}", comments.len(), post_id);
        Ok(comments)
    }

    /// Appends the stored comment to the post's loaded comments. A post whose
    /// comments were never fetched keeps them unloaded.
    pub async fn add_comment(&self, user_id: &str, post_id: &str, content: &str) -> FeedResult<Comment> {
        if content.trim().is_empty() {
            return logged(
                "add_comment",
                Err(FeedError::Validation("comment needs content".into())),
            );
        }

        let owner = self.profile_owner(user_id).await;
        let data = serde_json::to_value(CommentDocument {
            content: content.to_string(),
            author_id: Some(user_id.to_string()),
        })?;
        let document = logged(
            "add_comment",
            self.store.create(&paths::comments(&owner, post_id), data).await,
        )?;
        let comment = logged("add_comment", Comment::from_document(&document, &owner))?;

        self.reconcile(&owner, |cache| {
            cache.mutate(post_id, |post| post.append_comment(comment.clone()))
        })
        .await;

        info!("Comment {} added to post {} by user {}", comment.id, post_id, user_id);
        Ok(comment)
    }

    /// The post's owner may delete any comment on it, everyone else only their
    /// own. An already deleted comment counts as deleted.
    pub async fn delete_comment(&self, user_id: &str, post_id: &str, comment_id: &str) -> FeedResult<()> {
        let owner = self.profile_owner(user_id).await;
        let path = paths::comment(&owner, post_id, comment_id);

        if owner != user_id {
            if let Some(document) = logged("delete_comment", self.store.get(&path).await)? {
                let comment = logged("delete_comment", Comment::from_document(&document, &owner))?;
                logged("delete_comment", ensure_owner(&comment.author_id, user_id, &path))?;
            }
        }

        logged("delete_comment", self.store.delete(&path).await)?;

        self.reconcile(&owner, |cache| {
            cache.mutate(post_id, |post| post.remove_comment(comment_id))
        })
        .await;

        info!("Comment {} deleted from post {} by user {}", comment_id, post_id, user_id);
        Ok(())
    }
}
