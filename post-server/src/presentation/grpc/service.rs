use tonic::{Request, Response as GrpcResponse, Status};

use crate::data::post_repository::PostStorage;
use crate::presentation::{
    AppState,
    grpc::mappers::{
        to_domain_create_post_request, to_domain_search_posts_request, to_post_key,
        to_proto_content, to_proto_contents,
    },
};

use super::proto::{
    Blog, BlogServer, Content, Contents, CreateRequest, IdRequest, Response, SearchRequest,
};
use super::status::map_domain_error;

pub(crate) struct GrpcBlogService<S: PostStorage> {
    state: AppState<S>,
}

impl<S: PostStorage> GrpcBlogService<S> {
    pub(crate) fn new(state: AppState<S>) -> Self {
        Self { state }
    }

    pub(crate) fn into_server(self) -> BlogServer<Self> {
        BlogServer::new(self)
    }
}

#[tonic::async_trait]
impl<S: PostStorage> Blog for GrpcBlogService<S> {
    async fn create_post(
        &self,
        request: Request<CreateRequest>,
    ) -> Result<GrpcResponse<Response>, Status> {
        let req = to_domain_create_post_request(request.into_inner());

        let post_id = self
            .state
            .post_store
            .create_post(req)
            .await
            .map_err(map_domain_error)?;

        Ok(GrpcResponse::new(Response {
            success: true,
            id: post_id,
        }))
    }

    async fn get_post(
        &self,
        request: Request<IdRequest>,
    ) -> Result<GrpcResponse<Content>, Status> {
        let key = to_post_key(request.get_ref());

        let post = self
            .state
            .post_store
            .get_post(key)
            .await
            .map_err(map_domain_error)?;

        Ok(GrpcResponse::new(to_proto_content(post)))
    }

    async fn get_posts(
        &self,
        request: Request<SearchRequest>,
    ) -> Result<GrpcResponse<Contents>, Status> {
        let req = to_domain_search_posts_request(request.into_inner());

        let page = self
            .state
            .post_store
            .search_posts(req)
            .await
            .map_err(map_domain_error)?;

        Ok(GrpcResponse::new(to_proto_contents(page)))
    }

    async fn delete_post(
        &self,
        request: Request<IdRequest>,
    ) -> Result<GrpcResponse<Response>, Status> {
        let key = to_post_key(request.get_ref());

        self.state
            .post_store
            .delete_post(key)
            .await
            .map_err(map_domain_error)?;

        Ok(GrpcResponse::new(Response {
            success: true,
            id: 0,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tonic::{Code, Request};

    use super::GrpcBlogService;
    use crate::application::post_store::PostStore;
    use crate::data::repositories::memory::post_repository::InMemoryPostStorage;
    use crate::presentation::AppState;
    use crate::presentation::grpc::proto::{Blog, CreateRequest, IdRequest, SearchRequest};

    fn service() -> GrpcBlogService<InMemoryPostStorage> {
        let store = Arc::new(PostStore::new(InMemoryPostStorage::new()));
        GrpcBlogService::new(AppState::new(store))
    }

    fn create(blog_id: u64, title: &str) -> Request<CreateRequest> {
        Request::new(CreateRequest {
            blog_id,
            user_id: 21,
            title: title.to_string(),
            text: format!("{title} body"),
        })
    }

    #[tokio::test]
    async fn create_then_get_round_trips_content() {
        let service = service();

        let created = service
            .create_post(create(1, "hello"))
            .await
            .expect("create must succeed")
            .into_inner();
        assert!(created.success);
        assert_eq!(created.id, 1);

        let content = service
            .get_post(Request::new(IdRequest {
                blog_id: 1,
                post_id: created.id,
            }))
            .await
            .expect("get must succeed")
            .into_inner();
        assert_eq!(content.blog_id, 1);
        assert_eq!(content.post_id, 1);
        assert_eq!(content.user_id, 21);
        assert_eq!(content.title, "hello");
        assert_eq!(content.text, "hello body");
        assert!(content.created_at.is_some());
    }

    #[tokio::test]
    async fn get_missing_post_is_not_found() {
        let service = service();

        let status = service
            .get_post(Request::new(IdRequest {
                blog_id: 1,
                post_id: 404,
            }))
            .await
            .expect_err("post must be missing");
        assert_eq!(status.code(), Code::NotFound);
    }

    #[tokio::test]
    async fn get_posts_returns_window_and_total() {
        let service = service();
        for title in ["one", "two", "three", "four"] {
            service
                .create_post(create(2, title))
                .await
                .expect("create must succeed");
        }

        let contents = service
            .get_posts(Request::new(SearchRequest {
                blog_id: 2,
                start: 1,
                end: 3,
                filter: String::new(),
            }))
            .await
            .expect("search must succeed")
            .into_inner();

        assert_eq!(contents.total, 4);
        let titles: Vec<&str> = contents.list.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["three", "two"]);
    }

    #[tokio::test]
    async fn delete_post_succeeds_twice() {
        let service = service();
        service
            .create_post(create(3, "gone soon"))
            .await
            .expect("create must succeed");

        for _ in 0..2 {
            let response = service
                .delete_post(Request::new(IdRequest {
                    blog_id: 3,
                    post_id: 1,
                }))
                .await
                .expect("delete must succeed")
                .into_inner();
            assert!(response.success);
        }
    }
}
