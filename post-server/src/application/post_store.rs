use tokio::runtime::Handle;
use tracing::{debug, error, instrument, warn};

use crate::data::post_repository::{NewPost, PostQuery, PostSession, PostStorage, StorageError};
use crate::domain::error::DomainError;
use crate::domain::post::{
    CreatePostRequest, PageWindow, Post, PostKey, PostPage, SearchPostsRequest,
};
use crate::domain::title_filter::TitlePattern;

/// Post operations over request-scoped storage sessions.
///
/// Every call connects, runs its body and releases the session before
/// returning, whatever the outcome. See [`SessionScope`] for calls that do
/// not return.
pub(crate) struct PostStore<S: PostStorage> {
    storage: S,
}

impl<S: PostStorage> PostStore<S> {
    pub(crate) fn new(storage: S) -> Self {
        Self { storage }
    }

    #[instrument(skip_all, fields(blog_id = req.blog_id))]
    pub(crate) async fn create_post(&self, req: CreatePostRequest) -> Result<u64, DomainError> {
        let mut scope = SessionScope::empty();
        let session = scope.open(&self.storage).await?;
        let result = insert_with_next_id(session, req).await;
        scope.release().await;

        let post_id = result.map_err(internal)?;
        debug!(post_id, "post created");
        Ok(post_id)
    }

    #[instrument(skip(self))]
    pub(crate) async fn get_post(&self, key: PostKey) -> Result<Post, DomainError> {
        let mut scope = SessionScope::empty();
        let session = scope.open(&self.storage).await?;
        let result = session.find_post(key).await;
        scope.release().await;

        result.map_err(internal)?.ok_or_else(|| {
            DomainError::NotFound(format!(
                "blog id: {}, post id: {}",
                key.blog_id, key.post_id
            ))
        })
    }

    #[instrument(skip_all, fields(blog_id = req.blog_id, start = req.start, end = req.end))]
    pub(crate) async fn search_posts(
        &self,
        req: SearchPostsRequest,
    ) -> Result<PostPage, DomainError> {
        let query = PostQuery {
            blog_id: req.blog_id,
            title: TitlePattern::parse(&req.filter),
        };
        let window = PageWindow::between(req.start, req.end);

        let mut scope = SessionScope::empty();
        let session = scope.open(&self.storage).await?;
        let result = search_page(session, &query, window).await;
        scope.release().await;

        result.map_err(internal)
    }

    #[instrument(skip(self))]
    pub(crate) async fn delete_post(&self, key: PostKey) -> Result<(), DomainError> {
        let mut scope = SessionScope::empty();
        let session = scope.open(&self.storage).await?;
        let result = session.delete_posts(key).await;
        scope.release().await;

        let deleted = result.map_err(internal)?;
        debug!(deleted, "posts deleted");
        Ok(())
    }
}

/// Holds the session of one call.
///
/// `release` is the normal exit. A call that never gets there (its future is
/// dropped on timeout or cancellation, or the body panics) releases the
/// session on the runtime from `Drop`.
struct SessionScope<T: PostSession> {
    session: Option<T>,
}

impl<T: PostSession> SessionScope<T> {
    fn empty() -> Self {
        Self { session: None }
    }

    async fn open<S>(&mut self, storage: &S) -> Result<&T, DomainError>
    where
        S: PostStorage<Session = T>,
    {
        let session = storage.connect().await.map_err(internal)?;
        Ok(self.session.insert(session))
    }

    async fn release(mut self) {
        if let Some(session) = self.session.take() {
            session.release().await;
        }
    }
}

impl<T: PostSession> Drop for SessionScope<T> {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        match Handle::try_current() {
            Ok(handle) => {
                warn!("storage session abandoned before release, releasing in background");
                handle.spawn(session.release());
            }
            Err(_) => warn!("storage session dropped outside a runtime, not released"),
        }
    }
}

/// Assigns `max(post_id) + 1` for the blog and inserts; a duplicate key means
/// a concurrent writer took the id, so the id is derived again from storage.
async fn insert_with_next_id<T: PostSession>(
    session: &T,
    req: CreatePostRequest,
) -> Result<u64, StorageError> {
    let mut post = NewPost {
        blog_id: req.blog_id,
        post_id: 0,
        user_id: req.user_id,
        title: req.title,
        text: req.text,
    };

    let mut conflicts = 0u32;
    loop {
        post.post_id = match session.find_max_post_id(post.blog_id).await? {
            Some(max) => max.checked_add(1).ok_or(StorageError::Encode {
                field: "postId",
                value: max,
            })?,
            None => 1,
        };

        match session.insert_post(&post).await {
            Ok(()) => return Ok(post.post_id),
            Err(StorageError::DuplicateKey(detail)) => {
                conflicts += 1;
                debug!(candidate = post.post_id, conflicts, %detail, "post id taken, retrying");
            }
            Err(err) => return Err(err),
        }
    }
}

async fn search_page<T: PostSession>(
    session: &T,
    query: &PostQuery,
    window: Option<PageWindow>,
) -> Result<PostPage, StorageError> {
    let total = session.count_posts(query).await?;
    let posts = match window {
        Some(window) => session.find_posts(query, window).await?,
        None => Vec::new(),
    };
    Ok(PostPage { posts, total })
}

fn internal(err: StorageError) -> DomainError {
    error!(error = %err, "storage call failed");
    DomainError::Unexpected(err.to_string())
}
