use chrono::{DateTime, Utc};

/// Compound key of a post: `post_id` is only unique within its blog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct PostKey {
    pub(crate) blog_id: u64,
    pub(crate) post_id: u64,
}

impl PostKey {
    pub(crate) fn new(blog_id: u64, post_id: u64) -> Self {
        Self { blog_id, post_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Post {
    pub(crate) blog_id: u64,
    pub(crate) post_id: u64,
    pub(crate) user_id: u64,
    pub(crate) title: String,
    pub(crate) text: String,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub(crate) struct CreatePostRequest {
    pub(crate) blog_id: u64,
    pub(crate) user_id: u64,
    pub(crate) title: String,
    pub(crate) text: String,
}

#[derive(Debug, Clone)]
pub(crate) struct SearchPostsRequest {
    pub(crate) blog_id: u64,
    pub(crate) filter: String,
    pub(crate) start: u64,
    pub(crate) end: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct PostPage {
    pub(crate) posts: Vec<Post>,
    pub(crate) total: u64,
}

/// Slice of a sorted result set: skip `skip` entries, return at most `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageWindow {
    pub(crate) skip: u64,
    pub(crate) limit: u64,
}

impl PageWindow {
    /// Window for the half-open range `[start, end)`; `None` when it selects nothing.
    pub(crate) fn between(start: u64, end: u64) -> Option<Self> {
        let limit = end.checked_sub(start)?;
        if limit == 0 {
            return None;
        }
        Some(Self { skip: start, limit })
    }
}
