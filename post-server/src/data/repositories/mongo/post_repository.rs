use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::{CommandError, ErrorKind, WriteError, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use tracing::{info, warn};

use crate::data::post_repository::{NewPost, PostQuery, PostSession, PostStorage, StorageError};
use crate::domain::post::{PageWindow, Post, PostKey};
use crate::domain::title_filter::REGEX_OPTIONS;

const COLLECTION_NAME: &str = "posts";

const ID_KEY: &str = "_id";
const BLOG_ID_KEY: &str = "blogId";
const POST_ID_KEY: &str = "postId";
const USER_ID_KEY: &str = "userId";
const TITLE_KEY: &str = "title";
const TEXT_KEY: &str = "text";

const DUPLICATE_KEY_CODE: i32 = 11000;

/// Opens one MongoDB client per session from shared, pre-parsed options.
#[derive(Debug, Clone)]
pub(crate) struct MongoPostStorage {
    options: ClientOptions,
    database: String,
}

impl MongoPostStorage {
    pub(crate) async fn from_uri(uri: &str, database: &str) -> Result<Self, StorageError> {
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(Self {
            options,
            database: database.to_string(),
        })
    }

    /// Creates the unique `(blogId, postId)` index that post id assignment relies on.
    pub(crate) async fn ensure_indexes(&self) -> Result<(), StorageError> {
        let session = self.connect().await?;

        let index = IndexModel::builder()
            .keys(doc! { BLOG_ID_KEY: 1, POST_ID_KEY: -1 })
            .options(
                IndexOptions::builder()
                    .name("blog_post_unique".to_string())
                    .unique(true)
                    .build(),
            )
            .build();
        let result = session
            .posts
            .create_index(index)
            .await
            .map(|created| info!(index = %created.index_name, "post index ensured"))
            .map_err(map_mongo_error);

        session.release().await;
        result
    }
}

#[async_trait]
impl PostStorage for MongoPostStorage {
    type Session = MongoPostSession;

    async fn connect(&self) -> Result<Self::Session, StorageError> {
        let client = Client::with_options(self.options.clone())
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        let posts = client
            .database(&self.database)
            .collection::<Document>(COLLECTION_NAME);

        Ok(MongoPostSession { client, posts })
    }
}

pub(crate) struct MongoPostSession {
    client: Client,
    posts: Collection<Document>,
}

#[async_trait]
impl PostSession for MongoPostSession {
    async fn find_max_post_id(&self, blog_id: u64) -> Result<Option<u64>, StorageError> {
        let found = self
            .posts
            .find_one(doc! { BLOG_ID_KEY: to_storage_int(BLOG_ID_KEY, blog_id)? })
            .sort(doc! { POST_ID_KEY: -1 })
            .projection(doc! { POST_ID_KEY: 1 })
            .await
            .map_err(map_mongo_error)?;

        Ok(found.map(|document| extract_u64(&document, POST_ID_KEY)))
    }

    async fn insert_post(&self, post: &NewPost) -> Result<(), StorageError> {
        let document = doc! {
            BLOG_ID_KEY: to_storage_int(BLOG_ID_KEY, post.blog_id)?,
            POST_ID_KEY: to_storage_int(POST_ID_KEY, post.post_id)?,
            USER_ID_KEY: to_storage_int(USER_ID_KEY, post.user_id)?,
            TITLE_KEY: post.title.as_str(),
            TEXT_KEY: post.text.as_str(),
        };

        self.posts
            .insert_one(document)
            .await
            .map(|_| ())
            .map_err(map_mongo_error)
    }

    async fn find_post(&self, key: PostKey) -> Result<Option<Post>, StorageError> {
        let found = self
            .posts
            .find_one(key_filter(key)?)
            .await
            .map_err(map_mongo_error)?;

        Ok(found.map(|document| document_to_post(&document)))
    }

    async fn count_posts(&self, query: &PostQuery) -> Result<u64, StorageError> {
        self.posts
            .count_documents(query_filter(query)?)
            .await
            .map_err(map_mongo_error)
    }

    async fn find_posts(
        &self,
        query: &PostQuery,
        window: PageWindow,
    ) -> Result<Vec<Post>, StorageError> {
        let limit = i64::try_from(window.limit).unwrap_or(i64::MAX);

        let mut cursor = self
            .posts
            .find(query_filter(query)?)
            .sort(doc! { POST_ID_KEY: -1 })
            .skip(window.skip)
            .limit(limit)
            .await
            .map_err(map_mongo_error)?;

        let mut posts = Vec::new();
        while cursor.advance().await.map_err(map_mongo_error)? {
            let document = cursor.deserialize_current().map_err(map_mongo_error)?;
            posts.push(document_to_post(&document));
        }
        Ok(posts)
    }

    async fn delete_posts(&self, key: PostKey) -> Result<u64, StorageError> {
        let result = self
            .posts
            .delete_many(key_filter(key)?)
            .await
            .map_err(map_mongo_error)?;

        Ok(result.deleted_count)
    }

    async fn release(self) {
        let Self { client, posts } = self;
        drop(posts);
        client.shutdown().await;
    }
}

fn key_filter(key: PostKey) -> Result<Document, StorageError> {
    Ok(doc! {
        BLOG_ID_KEY: to_storage_int(BLOG_ID_KEY, key.blog_id)?,
        POST_ID_KEY: to_storage_int(POST_ID_KEY, key.post_id)?,
    })
}

fn query_filter(query: &PostQuery) -> Result<Document, StorageError> {
    let mut filter = doc! { BLOG_ID_KEY: to_storage_int(BLOG_ID_KEY, query.blog_id)? };
    if let Some(pattern) = &query.title {
        filter.insert(
            TITLE_KEY,
            doc! { "$regex": pattern.to_regex(), "$options": REGEX_OPTIONS },
        );
    }
    Ok(filter)
}

// BSON has no unsigned 64-bit integer.
fn to_storage_int(field: &'static str, value: u64) -> Result<i64, StorageError> {
    i64::try_from(value).map_err(|_| StorageError::Encode { field, value })
}

fn extract_u64(document: &Document, key: &str) -> u64 {
    match document.get(key) {
        Some(Bson::Int32(value)) => u64::try_from(*value).unwrap_or_default(),
        Some(Bson::Int64(value)) => u64::try_from(*value).unwrap_or_default(),
        _ => 0,
    }
}

fn extract_string(document: &Document, key: &str) -> String {
    document.get_str(key).unwrap_or_default().to_string()
}

fn extract_created_at(document: &Document) -> DateTime<Utc> {
    document
        .get_object_id(ID_KEY)
        .ok()
        .and_then(|id| DateTime::<Utc>::from_timestamp_millis(id.timestamp().timestamp_millis()))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

fn document_to_post(document: &Document) -> Post {
    Post {
        blog_id: extract_u64(document, BLOG_ID_KEY),
        post_id: extract_u64(document, POST_ID_KEY),
        user_id: extract_u64(document, USER_ID_KEY),
        title: extract_string(document, TITLE_KEY),
        text: extract_string(document, TEXT_KEY),
        created_at: extract_created_at(document),
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(WriteError { code, .. })) => {
            *code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(CommandError { code, .. }) => *code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}

fn map_mongo_error(err: mongodb::error::Error) -> StorageError {
    if is_duplicate_key(&err) {
        return StorageError::DuplicateKey(err.to_string());
    }
    if matches!(err.kind.as_ref(), ErrorKind::ServerSelection { .. }) {
        warn!(error = %err, "mongodb server selection failed");
        return StorageError::Connection(err.to_string());
    }
    StorageError::Query(err.to_string())
}
