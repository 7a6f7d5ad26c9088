use crate::models::Post;

/// Ordered posts of the profile currently on screen, newest first.
///
/// Only [`PostSynchronizer`](crate::sync::PostSynchronizer) holds a mutable
/// handle; views read through snapshots. Lookups of absent posts are no-ops,
/// since a stale local reference may outlive the remote document.
#[derive(Debug, Default, Clone)]
pub struct PostCache {
    owner: Option<String>,
    posts: Vec<Post>,
}

impl PostCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The user whose profile the cache holds.
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Switches the cache to `owner`'s profile, discarding posts of any other
    /// profile.
    pub fn scope_to(&mut self, owner: &str) {
        if self.owner.as_deref() != Some(owner) {
            self.posts.clear();
            self.owner = Some(owner.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.owner = None;
        self.posts.clear();
    }

    pub fn replace_all(&mut self, posts: Vec<Post>) {
        self.posts = posts;
    }

    /// Inserts at the front. A cached post with the same id is replaced.
    pub fn prepend(&mut self, post: Post) {
        self.remove(&post.id);
        self.posts.insert(0, post);
    }

    pub fn remove(&mut self, post_id: &str) -> Option<Post> {
        self.find_index(post_id).map(|index| self.posts.remove(index))
    }

    pub fn find_index(&self, post_id: &str) -> Option<usize> {
        self.posts.iter().position(|post| post.id == post_id)
    }

    /// Applies `updater` to the matching post and returns its result, or
    /// `None` if the post is not cached.
    pub fn mutate<R>(&mut self, post_id: &str, updater: impl FnOnce(&mut Post) -> R) -> Option<R> {
        let index = self.find_index(post_id)?;
        Some(updater(&mut self.posts[index]))
    }

    pub fn get(&self, post_id: &str) -> Option<&Post> {
        self.posts.iter().find(|post| post.id == post_id)
    }

    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }
}
