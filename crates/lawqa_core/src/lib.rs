pub mod config;
pub mod error;
pub mod ingest;
pub mod normalize;

#[cfg(test)]
mod tests {
    use super::error::AppError;

    #[test]
    fn app_error_is_structured() {
        let err = AppError::new("RAG_TEST", "retrieval failed").with_retryable(true);
        assert_eq!(err.code, "RAG_TEST");
        assert_eq!(err.message, "retrieval failed");
        assert!(err.retryable);
        assert!(err.has_code("RAG_TEST"));
    }

    #[test]
    fn describe_includes_details_when_present() {
        let bare = AppError::new("RAG_QUERY_INVALID", "Query must not be empty");
        assert_eq!(bare.describe(), "[RAG_QUERY_INVALID] Query must not be empty");

        let detailed = bare.with_details("k=3");
        assert_eq!(
            detailed.describe(),
            "[RAG_QUERY_INVALID] Query must not be empty (k=3)"
        );
    }
}
