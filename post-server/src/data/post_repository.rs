use async_trait::async_trait;
use thiserror::Error;

use crate::domain::post::{PageWindow, Post, PostKey};
use crate::domain::title_filter::TitlePattern;

#[derive(Debug, Error)]
pub(crate) enum StorageError {
    #[error("storage connection failed: {0}")]
    Connection(String),

    #[error("duplicate key: {0}")]
    DuplicateKey(String),

    #[error("storage query failed: {0}")]
    Query(String),

    #[error("value of '{field}' does not fit storage integer: {value}")]
    Encode { field: &'static str, value: u64 },
}

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) blog_id: u64,
    pub(crate) post_id: u64,
    pub(crate) user_id: u64,
    pub(crate) title: String,
    pub(crate) text: String,
}

impl NewPost {
    pub(crate) fn key(&self) -> PostKey {
        PostKey::new(self.blog_id, self.post_id)
    }
}

/// Selection shared by the count and the page query of a search.
#[derive(Debug, Clone)]
pub(crate) struct PostQuery {
    pub(crate) blog_id: u64,
    pub(crate) title: Option<TitlePattern>,
}

/// Hands out request-scoped sessions.
#[async_trait]
pub(crate) trait PostStorage: Send + Sync + 'static {
    type Session: PostSession;

    async fn connect(&self) -> Result<Self::Session, StorageError>;
}

/// Collection-level operations over the posts of every blog.
///
/// The `(blog_id, post_id)` pair must be unique: `insert_post` reports a
/// violation as [`StorageError::DuplicateKey`] and nothing else does.
/// Sessions may be released from a spawned task, hence `'static`.
#[async_trait]
pub(crate) trait PostSession: Send + Sync + Sized + 'static {
    async fn find_max_post_id(&self, blog_id: u64) -> Result<Option<u64>, StorageError>;
    async fn insert_post(&self, post: &NewPost) -> Result<(), StorageError>;
    async fn find_post(&self, key: PostKey) -> Result<Option<Post>, StorageError>;
    async fn count_posts(&self, query: &PostQuery) -> Result<u64, StorageError>;
    /// Matching posts ordered by `post_id` descending.
    async fn find_posts(
        &self,
        query: &PostQuery,
        window: PageWindow,
    ) -> Result<Vec<Post>, StorageError>;
    async fn delete_posts(&self, key: PostKey) -> Result<u64, StorageError>;
    async fn release(self);
}
