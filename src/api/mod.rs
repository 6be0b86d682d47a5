// src/api/mod.rs
// Backend seams: segment list, annotation store, capture control

pub mod attachments;
mod http;
mod types;

pub use attachments::{encode, AttachmentFile, MultipartPayload, PartBody};
pub use http::HttpBackend;
pub use types::{AnnotationOperation, AnnotationOperationFailed, ApiError};

use crate::model::{Annotation, Segment};
use async_trait::async_trait;

/// Source of the authoritative segment list
#[async_trait]
pub trait SegmentSource: Send + Sync {
    /// Fetch every segment currently known to the backend, with annotations
    async fn fetch_segments(&self) -> Result<Vec<Segment>, ApiError>;
}

/// Remote annotation store. Each call is exactly one request; no retries.
#[async_trait]
pub trait AnnotationBackend: Send + Sync {
    /// Create an annotation and return the backend's canonical record
    async fn create(
        &self,
        segment_id: &str,
        text: &str,
        files: &[AttachmentFile],
    ) -> Result<Annotation, AnnotationOperationFailed>;

    /// Replace an annotation's text/attachments and return the canonical record
    async fn update(
        &self,
        segment_id: &str,
        annotation_id: &str,
        text: &str,
        files: &[AttachmentFile],
    ) -> Result<Annotation, AnnotationOperationFailed>;

    async fn delete(
        &self,
        segment_id: &str,
        annotation_id: &str,
    ) -> Result<(), AnnotationOperationFailed>;
}

/// Start/stop of the upstream capture pipeline
#[async_trait]
pub trait CaptureControl: Send + Sync {
    async fn start_listening(&self) -> Result<(), ApiError>;

    async fn stop_listening(&self) -> Result<(), ApiError>;
}
