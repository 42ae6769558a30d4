//! Process-local post storage with the same uniqueness rules as MongoDB.
//!
//! Data is lost on restart.

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::data::post_repository::{NewPost, PostQuery, PostSession, PostStorage, StorageError};
use crate::domain::post::{PageWindow, Post, PostKey};

#[derive(Debug, Clone)]
struct StoredPost {
    user_id: u64,
    title: String,
    text: String,
    created_at: DateTime<Utc>,
}

type PostMap = BTreeMap<PostKey, StoredPost>;

#[derive(Debug, Clone, Default)]
pub(crate) struct InMemoryPostStorage {
    posts: Arc<RwLock<PostMap>>,
}

impl InMemoryPostStorage {
    pub(crate) fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostStorage for InMemoryPostStorage {
    type Session = InMemoryPostSession;

    async fn connect(&self) -> Result<Self::Session, StorageError> {
        Ok(InMemoryPostSession {
            posts: Arc::clone(&self.posts),
        })
    }
}

#[derive(Debug)]
pub(crate) struct InMemoryPostSession {
    posts: Arc<RwLock<PostMap>>,
}

fn blog_range(blog_id: u64) -> RangeInclusive<PostKey> {
    PostKey::new(blog_id, 0)..=PostKey::new(blog_id, u64::MAX)
}

fn to_post(key: PostKey, stored: &StoredPost) -> Post {
    Post {
        blog_id: key.blog_id,
        post_id: key.post_id,
        user_id: stored.user_id,
        title: stored.title.clone(),
        text: stored.text.clone(),
        created_at: stored.created_at,
    }
}

fn matches_query(query: &PostQuery, stored: &StoredPost) -> bool {
    query
        .title
        .as_ref()
        .is_none_or(|pattern| pattern.matches(&stored.title))
}

#[async_trait]
impl PostSession for InMemoryPostSession {
    async fn find_max_post_id(&self, blog_id: u64) -> Result<Option<u64>, StorageError> {
        let posts = self.posts.read().await;
        Ok(posts
            .range(blog_range(blog_id))
            .next_back()
            .map(|(key, _)| key.post_id))
    }

    async fn insert_post(&self, post: &NewPost) -> Result<(), StorageError> {
        let key = post.key();
        let mut posts = self.posts.write().await;
        if posts.contains_key(&key) {
            return Err(StorageError::DuplicateKey(format!(
                "blog_id: {}, post_id: {}",
                key.blog_id, key.post_id
            )));
        }

        posts.insert(
            key,
            StoredPost {
                user_id: post.user_id,
                title: post.title.clone(),
                text: post.text.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn find_post(&self, key: PostKey) -> Result<Option<Post>, StorageError> {
        let posts = self.posts.read().await;
        Ok(posts.get(&key).map(|stored| to_post(key, stored)))
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<u64, StorageError> {
        let posts = self.posts.read().await;
        let count = posts
            .range(blog_range(query.blog_id))
            .filter(|(_, stored)| matches_query(query, stored))
            .count();
        Ok(count as u64)
    }

    async fn find_posts(
        &self,
        query: &PostQuery,
        window: PageWindow,
    ) -> Result<Vec<Post>, StorageError> {
        let skip = usize::try_from(window.skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(window.limit).unwrap_or(usize::MAX);

        let posts = self.posts.read().await;
        Ok(posts
            .range(blog_range(query.blog_id))
            .rev()
            .filter(|(_, stored)| matches_query(query, stored))
            .skip(skip)
            .take(limit)
            .map(|(key, stored)| to_post(*key, stored))
            .collect())
    }

    async fn delete_posts(&self, key: PostKey) -> Result<u64, StorageError> {
        let mut posts = self.posts.write().await;
        Ok(posts.remove(&key).map_or(0, |_| 1))
    }

    async fn release(self) {}
}

#[cfg(test)]
mod tests {
    use super::InMemoryPostStorage;
    use crate::data::post_repository::{
        NewPost, PostQuery, PostSession, PostStorage, StorageError,
    };
    use crate::domain::post::{PageWindow, PostKey};
    use crate::domain::title_filter::TitlePattern;

    fn new_post(blog_id: u64, post_id: u64, title: &str) -> NewPost {
        NewPost {
            blog_id,
            post_id,
            user_id: 7,
            title: title.to_string(),
            text: "body".to_string(),
        }
    }

    #[tokio::test]
    async fn insert_rejects_duplicate_compound_key() {
        let storage = InMemoryPostStorage::new();
        let session = storage.connect().await.expect("connect must succeed");

        session
            .insert_post(&new_post(1, 1, "first"))
            .await
            .expect("first insert must succeed");
        let err = session
            .insert_post(&new_post(1, 1, "second"))
            .await
            .expect_err("duplicate must be rejected");
        assert!(matches!(err, StorageError::DuplicateKey(_)));

        session
            .insert_post(&new_post(2, 1, "other blog"))
            .await
            .expect("same post id in another blog must succeed");
    }

    #[tokio::test]
    async fn find_max_post_id_is_scoped_to_blog() {
        let storage = InMemoryPostStorage::new();
        let session = storage.connect().await.expect("connect must succeed");

        assert_eq!(session.find_max_post_id(1).await.expect("query"), None);

        for (blog_id, post_id) in [(1, 1), (1, 4), (2, 9)] {
            session
                .insert_post(&new_post(blog_id, post_id, "t"))
                .await
                .expect("insert must succeed");
        }

        assert_eq!(session.find_max_post_id(1).await.expect("query"), Some(4));
        assert_eq!(session.find_max_post_id(2).await.expect("query"), Some(9));
        assert_eq!(session.find_max_post_id(3).await.expect("query"), None);
    }

    #[tokio::test]
    async fn find_posts_sorts_descending_and_applies_window_and_filter() {
        let storage = InMemoryPostStorage::new();
        let session = storage.connect().await.expect("connect must succeed");

        for (post_id, title) in [(1, "cat one"), (2, "dog"), (3, "cat two"), (4, "cat three")] {
            session
                .insert_post(&new_post(1, post_id, title))
                .await
                .expect("insert must succeed");
        }

        let query = PostQuery {
            blog_id: 1,
            title: TitlePattern::parse("cat"),
        };
        assert_eq!(session.count_posts(&query).await.expect("count"), 3);

        let page = session
            .find_posts(&query, PageWindow { skip: 1, limit: 5 })
            .await
            .expect("find must succeed");
        let ids: Vec<u64> = page.iter().map(|post| post.post_id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[tokio::test]
    async fn delete_reports_removed_count() {
        let storage = InMemoryPostStorage::new();
        let session = storage.connect().await.expect("connect must succeed");
        session
            .insert_post(&new_post(1, 1, "t"))
            .await
            .expect("insert must succeed");

        let key = PostKey::new(1, 1);
        assert_eq!(session.delete_posts(key).await.expect("delete"), 1);
        assert_eq!(session.delete_posts(key).await.expect("delete"), 0);
        assert!(session.find_post(key).await.expect("find").is_none());
    }

    #[tokio::test]
    async fn sessions_share_the_same_data() {
        let storage = InMemoryPostStorage::new();
        let writer = storage.connect().await.expect("connect must succeed");
        writer
            .insert_post(&new_post(5, 1, "shared"))
            .await
            .expect("insert must succeed");
        writer.release().await;

        let reader = storage.connect().await.expect("connect must succeed");
        let post = reader
            .find_post(PostKey::new(5, 1))
            .await
            .expect("find must succeed")
            .expect("post must exist");
        assert_eq!(post.title, "shared");
        assert_eq!(post.user_id, 7);
    }
}
