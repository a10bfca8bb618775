//! Error types shared by the service client, the pager and the pipeline.

use thiserror::Error;

/// Failures talking to Azure DevOps. None of these are retried.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request never produced a response.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// 401/403: the access token is missing, expired or lacks scope.
    #[error("Authorization failed ({status}) for {endpoint}")]
    Unauthorized { status: u16, endpoint: String },

    #[error("Not found: {endpoint}")]
    NotFound { endpoint: String },

    /// Any other non-success status.
    #[error("Azure DevOps returned {status} for {endpoint}: {message}")]
    Api {
        status: u16,
        endpoint: String,
        message: String,
    },

    /// The body did not match the expected shape.
    #[error("Failed to decode response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound { .. })
    }
}

/// Outcome of a fetch that is raced against the run's cancellation token.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Operation cancelled")]
    Cancelled,
}

impl FetchError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }
}
