//! Outcome taxonomy of the request facade.

use service_core::error::AppError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServiceError {
    /// Caller-supplied input failed a precondition.
    #[error("{0}")]
    InvalidArgument(String),

    /// An optional backend is not available in this process.
    #[error("{0}")]
    FeatureDisabled(String),

    /// A delegated backend call failed; carries the backend's message.
    #[error("{0}")]
    UpstreamFailure(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidArgument(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::FeatureDisabled(msg) => AppError::ServiceUnavailable(msg),
            ServiceError::UpstreamFailure(msg) => AppError::UpstreamFailure(msg),
        }
    }
}
