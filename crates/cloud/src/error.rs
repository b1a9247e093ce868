use vidhub_core::error::CoreError;

/// Errors from the storage and transcoding gateways.
#[derive(Debug, thiserror::Error)]
pub enum CloudError {
    /// A required credential or endpoint is missing or malformed.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The object store rejected or failed a request.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The transcoding service returned a non-2xx status or an unusable
    /// response.
    #[error("Transcoder error ({status}): {message}")]
    Transcoder { status: u16, message: String },

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The caller cancelled an in-flight transfer.
    #[error("Upload cancelled")]
    Cancelled,
}

impl From<CloudError> for CoreError {
    fn from(err: CloudError) -> Self {
        match err {
            CloudError::Configuration(msg) => CoreError::Configuration(msg),
            other => CoreError::ExternalService(other.to_string()),
        }
    }
}
