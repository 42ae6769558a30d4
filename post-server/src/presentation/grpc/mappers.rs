use chrono::{DateTime, Utc};
use prost_types::Timestamp;

use crate::domain::post::{
    CreatePostRequest as DomainCreatePostRequest, Post as DomainPost, PostKey, PostPage,
    SearchPostsRequest as DomainSearchPostsRequest,
};

use super::proto::{Content, Contents, CreateRequest, IdRequest, SearchRequest};

pub(crate) fn to_domain_create_post_request(input: CreateRequest) -> DomainCreatePostRequest {
    DomainCreatePostRequest {
        blog_id: input.blog_id,
        user_id: input.user_id,
        title: input.title,
        text: input.text,
    }
}

pub(crate) fn to_domain_search_posts_request(input: SearchRequest) -> DomainSearchPostsRequest {
    DomainSearchPostsRequest {
        blog_id: input.blog_id,
        filter: input.filter,
        start: input.start,
        end: input.end,
    }
}

pub(crate) fn to_post_key(input: &IdRequest) -> PostKey {
    PostKey::new(input.blog_id, input.post_id)
}

pub(crate) fn to_proto_content(post: DomainPost) -> Content {
    Content {
        blog_id: post.blog_id,
        post_id: post.post_id,
        user_id: post.user_id,
        title: post.title,
        text: post.text,
        created_at: Some(to_proto_timestamp(post.created_at)),
    }
}

pub(crate) fn to_proto_contents(page: PostPage) -> Contents {
    Contents {
        list: page.posts.into_iter().map(to_proto_content).collect(),
        total: page.total,
    }
}

fn to_proto_timestamp(value: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: value.timestamp(),
        nanos: value.timestamp_subsec_nanos() as i32,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{to_domain_search_posts_request, to_proto_contents};
    use crate::domain::post::{Post, PostPage};
    use crate::presentation::grpc::proto::SearchRequest;

    #[test]
    fn search_request_keeps_window_and_filter() {
        let req = to_domain_search_posts_request(SearchRequest {
            blog_id: 3,
            start: 10,
            end: 20,
            filter: "%rust%".to_string(),
        });

        assert_eq!(req.blog_id, 3);
        assert_eq!(req.start, 10);
        assert_eq!(req.end, 20);
        assert_eq!(req.filter, "%rust%");
    }

    #[test]
    fn contents_carry_posts_in_order_and_total() {
        let created_at = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 30, 0)
            .single()
            .expect("valid date");
        let post = |post_id: u64| Post {
            blog_id: 1,
            post_id,
            user_id: 8,
            title: format!("title {post_id}"),
            text: "text".to_string(),
            created_at,
        };

        let contents = to_proto_contents(PostPage {
            posts: vec![post(5), post(4)],
            total: 12,
        });

        assert_eq!(contents.total, 12);
        let ids: Vec<u64> = contents.list.iter().map(|c| c.post_id).collect();
        assert_eq!(ids, vec![5, 4]);

        let timestamp = contents.list[0]
            .created_at
            .clone()
            .expect("timestamp must be set");
        assert_eq!(timestamp.seconds, created_at.timestamp());
        assert_eq!(timestamp.nanos, 0);
    }
}
