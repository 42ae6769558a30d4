use tonic::Status;

use crate::domain::error::DomainError;

pub(crate) fn map_domain_error(err: DomainError) -> Status {
    match err {
        DomainError::NotFound(_) => Status::not_found(err.to_string()),
        DomainError::Unexpected(_) => Status::internal("internal error"),
    }
}

#[cfg(test)]
mod tests {
    use tonic::Code;

    use super::map_domain_error;
    use crate::domain::error::DomainError;

    #[test]
    fn not_found_keeps_its_message() {
        let status = map_domain_error(DomainError::NotFound("blog id: 1, post id: 2".to_string()));
        assert_eq!(status.code(), Code::NotFound);
        assert!(status.message().contains("post id: 2"));
    }

    #[test]
    fn unexpected_hides_storage_details() {
        let status = map_domain_error(DomainError::Unexpected(
            "storage query failed: connection reset by 10.0.0.3".to_string(),
        ));
        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.message(), "internal error");
    }
}
