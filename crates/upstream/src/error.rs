//! Upstream error types

use thiserror::Error;

/// Upstream transport errors
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// HTTP client could not be constructed
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),

    /// Endpoint is not a valid URL
    #[error("invalid endpoint '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// Relative endpoint without a configured origin to resolve it against
    #[error("relative endpoint '{url}' requires a configured origin")]
    MissingOrigin { url: String },

    /// Server answered with a status other than 200
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Server answered with something other than an event stream
    #[error("unexpected content type '{content_type}' from {url}")]
    ContentType { url: String, content_type: String },

    /// Request or body read failed
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl UpstreamError {
    /// Create an invalid url error
    pub fn invalid_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Whether the connection must stay closed instead of reconnecting
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Request(_))
    }

    /// Short label used as a metrics dimension
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Client(_) => "client",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::MissingOrigin { .. } => "missing_origin",
            Self::Status { .. } => "status",
            Self::ContentType { .. } => "content_type",
            Self::Request(_) => "request",
        }
    }
}

/// Upstream Result type alias
pub type Result<T> = std::result::Result<T, UpstreamError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_errors_are_fatal() {
        let status = UpstreamError::Status {
            url: "http://x".to_string(),
            status: 404,
        };
        assert!(status.is_fatal());
        assert_eq!(status.kind(), "status");
        assert!(UpstreamError::MissingOrigin { url: "/a".to_string() }.is_fatal());
        assert_eq!(
            UpstreamError::invalid_url("::", "bad").to_string(),
            "invalid endpoint '::': bad"
        );
    }
}
