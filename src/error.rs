use thiserror::Error as ThisError;

/// Errors raised while talking to the Beanstalk API or resolving models.
///
/// Every `url` carried here is the credential-stripped form of the request.
#[derive(Debug, ThisError)]
pub enum ApiError {
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid response from {url}: {reason}")]
    Protocol {
        url: String,
        body: String,
        reason: String,
    },

    #[error("unsupported {operation} for model {model} (resource kind: {kind})")]
    UnsupportedResource {
        operation: &'static str,
        model: &'static str,
        kind: String,
    },

    #[error("page size {0} is outside 1..=30")]
    InvalidPageSize(u32),
}

impl ApiError {
    /// `true` when no usable response was obtained.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport { .. } | ApiError::Status { .. })
    }

    /// Raw response body of a protocol failure.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Protocol { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
