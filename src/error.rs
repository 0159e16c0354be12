//! Error types for the discovery pipeline.
//!
//! Each stage reports a typed failure so the aggregator can branch on
//! the kind instead of swallowing exceptions. None of these cross the
//! `search_products` boundary: a failed candidate or search round is
//! logged and treated as an empty result.

/// A single product-page fetch failed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-200 status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// Connection error or timeout before a response arrived.
    #[error("transport error: {0}")]
    Transport(String),
}

/// One call to the external search API failed.
#[derive(Debug, thiserror::Error)]
pub enum SearchApiError {
    #[error("search API status {0}")]
    Status(u16),

    #[error("search transport error: {0}")]
    Transport(String),

    /// The response body was not the expected JSON shape.
    #[error("malformed search response: {0}")]
    Malformed(String),
}

/// Errors surfaced when constructing the pipeline itself.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("config error: {0}")]
    Config(String),

    #[error("HTTP client build failed: {0}")]
    ClientBuild(String),

    #[error("runtime error: {0}")]
    Runtime(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_status_display_includes_code() {
        let err = FetchError::Status(403);
        assert_eq!(err.to_string(), "HTTP status 403");
    }

    #[test]
    fn search_error_display() {
        let err = SearchApiError::Malformed("missing items".into());
        assert_eq!(err.to_string(), "malformed search response: missing items");
    }

    #[test]
    fn errors_are_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FetchError>();
        assert_send_sync::<SearchApiError>();
        assert_send_sync::<ScoutError>();
    }
}
