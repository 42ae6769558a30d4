pub(crate) mod pb {
    tonic::include_proto!("blog");
}

pub(crate) use pb::blog_server::{Blog, BlogServer};
pub(crate) use pb::{Content, Contents, CreateRequest, IdRequest, Response, SearchRequest};
