use std::sync::Arc;

use crate::application::post_store::PostStore;
use crate::data::post_repository::PostStorage;

pub(crate) mod grpc;
pub(crate) mod http;

pub(crate) struct AppState<S: PostStorage> {
    pub(crate) post_store: Arc<PostStore<S>>,
}

impl<S: PostStorage> AppState<S> {
    pub(crate) fn new(post_store: Arc<PostStore<S>>) -> Self {
        Self { post_store }
    }
}

impl<S: PostStorage> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            post_store: Arc::clone(&self.post_store),
        }
    }
}
