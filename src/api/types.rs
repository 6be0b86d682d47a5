// src/api/types.rs
// Backend error taxonomy and operation failure reporting

use std::fmt;
use thiserror::Error;

/// Failure of a single backend call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    TransportFailure(String),

    #[error("Backend rejected request: HTTP {status}: {body}")]
    BackendRejected { status: u16, body: String },

    #[error("Malformed response body: {0}")]
    DecodeFailure(String),

    #[error("Invalid attachment '{file_name}': {reason}")]
    InvalidAttachment { file_name: String, reason: String },
}

impl ApiError {
    /// Returns true if a later identical request could reasonably succeed.
    /// The poller uses it to pick the log level; shells can use it to decide
    /// whether to offer a retry.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::TransportFailure(_) => true,
            ApiError::BackendRejected { status, .. } => *status == 429 || *status >= 500,
            ApiError::DecodeFailure(_) | ApiError::InvalidAttachment { .. } => false,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::DecodeFailure(err.to_string())
        } else if err.is_timeout() {
            ApiError::TransportFailure(format!("request timed out: {}", err))
        } else {
            ApiError::TransportFailure(err.to_string())
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationOperation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for AnnotationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AnnotationOperation::Create => "create",
            AnnotationOperation::Update => "update",
            AnnotationOperation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A create/update/delete that the backend did not confirm.
///
/// `target` is the segment id for creates and the annotation id otherwise.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Annotation {operation} failed for '{target}': {source}")]
pub struct AnnotationOperationFailed {
    pub operation: AnnotationOperation,
    pub target: String,
    #[source]
    pub source: ApiError,
}

impl AnnotationOperationFailed {
    pub fn new(operation: AnnotationOperation, target: impl Into<String>, source: ApiError) -> Self {
        Self {
            operation,
            target: target.into(),
            source,
        }
    }
}
