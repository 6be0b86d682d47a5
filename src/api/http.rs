// src/api/http.rs
// reqwest implementation of the transcription + comment endpoints

use super::attachments::{self, AttachmentFile, MultipartPayload};
use super::{
    AnnotationBackend, AnnotationOperation, AnnotationOperationFailed, ApiError, CaptureControl,
    SegmentSource,
};
use crate::config::AppConfig;
use crate::model::{Annotation, Segment};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

const ANNOTATION_ID_FIELD: &str = "id";

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    summary: String,
}

#[derive(Clone)]
pub struct HttpBackend {
    backend_url: String,
    annotation_url: String,
    client: Client,
}

impl HttpBackend {
    /// `annotation_url` falls back to `backend_url` when not given.
    pub fn new(
        backend_url: &str,
        annotation_url: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::TransportFailure(format!("Failed to create HTTP client: {}", e)))?;

        let backend_url = trim_base(backend_url);
        let annotation_url = annotation_url
            .map(trim_base)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| backend_url.clone());

        tracing::info!(
            "HTTP backend initialized: transcriptions={}, comments={}",
            backend_url,
            annotation_url
        );

        Ok(Self {
            backend_url,
            annotation_url,
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(
            &config.backend_url,
            config.annotation_url.as_deref(),
            config.request_timeout(),
        )
    }

    /// Summary of everything transcribed so far in this capture run
    pub async fn conversation_summary(&self) -> Result<String, ApiError> {
        let url = format!("{}/conversation-summary", self.backend_url);
        let body: SummaryResponse = send_json(self.client.get(&url), &url).await?;
        Ok(body.summary)
    }

    fn comments_url(&self, segment_id: &str) -> String {
        format!("{}/{}/comments", self.annotation_url, segment_id)
    }

    fn comment_url(&self, segment_id: &str, annotation_id: &str) -> String {
        format!("{}/{}/comments/{}", self.annotation_url, segment_id, annotation_id)
    }
}

#[async_trait]
impl SegmentSource for HttpBackend {
    async fn fetch_segments(&self) -> Result<Vec<Segment>, ApiError> {
        let url = format!("{}/transcriptions", self.backend_url);
        send_json(self.client.get(&url), &url).await
    }
}

#[async_trait]
impl AnnotationBackend for HttpBackend {
    async fn create(
        &self,
        segment_id: &str,
        text: &str,
        files: &[AttachmentFile],
    ) -> Result<Annotation, AnnotationOperationFailed> {
        let url = self.comments_url(segment_id);
        let payload = attachments::encode(text, files);
        send_multipart(self.client.post(&url), &url, payload)
            .await
            .map_err(|e| AnnotationOperationFailed::new(AnnotationOperation::Create, segment_id, e))
    }

    async fn update(
        &self,
        segment_id: &str,
        annotation_id: &str,
        text: &str,
        files: &[AttachmentFile],
    ) -> Result<Annotation, AnnotationOperationFailed> {
        let url = self.comments_url(segment_id);
        let payload = attachments::encode(text, files).with_text(ANNOTATION_ID_FIELD, annotation_id);
        send_multipart(self.client.put(&url), &url, payload)
            .await
            .map_err(|e| {
                AnnotationOperationFailed::new(AnnotationOperation::Update, annotation_id, e)
            })
    }

    async fn delete(
        &self,
        segment_id: &str,
        annotation_id: &str,
    ) -> Result<(), AnnotationOperationFailed> {
        let url = self.comment_url(segment_id, annotation_id);
        send_ack(self.client.delete(&url), &url)
            .await
            .map_err(|e| {
                AnnotationOperationFailed::new(AnnotationOperation::Delete, annotation_id, e)
            })
    }
}

#[async_trait]
impl CaptureControl for HttpBackend {
    async fn start_listening(&self) -> Result<(), ApiError> {
        let url = format!("{}/startListening", self.backend_url);
        send_ack(self.client.get(&url), &url).await
    }

    async fn stop_listening(&self) -> Result<(), ApiError> {
        let url = format!("{}/stopListening", self.backend_url);
        send_ack(self.client.get(&url), &url).await
    }
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

async fn send_multipart<T: DeserializeOwned>(
    request: RequestBuilder,
    url: &str,
    payload: MultipartPayload,
) -> Result<T, ApiError> {
    let form = payload.into_form()?;
    send_json(request.multipart(form), url).await
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder, url: &str) -> Result<T, ApiError> {
    let response = checked(request, url).await?;
    let bytes = response.bytes().await.map_err(ApiError::from_reqwest)?;

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::warn!("Malformed response from {}: {}", url, e);
        ApiError::DecodeFailure(e.to_string())
    })
}

async fn send_ack(request: RequestBuilder, url: &str) -> Result<(), ApiError> {
    checked(request, url).await.map(|_| ())
}

/// Send the request and turn transport errors and non-2xx statuses into
/// `ApiError`.
async fn checked(request: RequestBuilder, url: &str) -> Result<Response, ApiError> {
    tracing::debug!("HTTP request: {}", url);

    let response = request.send().await.map_err(|e| {
        tracing::warn!("Request to {} failed: {}", url, e);
        ApiError::from_reqwest(e)
    })?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!("Request to {} rejected: HTTP {}", url, status);
    Err(ApiError::BackendRejected {
        status: status.as_u16(),
        body,
    })
}
