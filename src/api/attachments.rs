// src/api/attachments.rs
// Multipart packaging of annotation text + files

use super::ApiError;
use reqwest::multipart;

pub const TEXT_FIELD: &str = "text";
pub const ATTACHMENTS_FIELD: &str = "attachments";
const DEFAULT_MIME: &str = "application/octet-stream";

/// A file staged for upload with an annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl AttachmentFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime: DEFAULT_MIME.to_string(),
            bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        let mime = mime.into();
        if !mime.trim().is_empty() {
            self.mime = mime.trim().to_string();
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartBody {
    Text(String),
    File(AttachmentFile),
}

/// Ordered multipart body, kept inspectable until it is turned into a
/// `reqwest` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPayload {
    parts: Vec<(String, PartBody)>,
}

impl MultipartPayload {
    pub fn with_text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parts.push((name.to_string(), PartBody::Text(value.into())));
        self
    }

    pub fn parts(&self) -> &[(String, PartBody)] {
        &self.parts
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.parts.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn into_form(self) -> Result<multipart::Form, ApiError> {
        let mut form = multipart::Form::new();

        for (name, body) in self.parts {
            form = match body {
                PartBody::Text(value) => form.text(name, value),
                PartBody::File(file) => {
                    let part = multipart::Part::bytes(file.bytes)
                        .file_name(file.file_name.clone())
                        .mime_str(&file.mime)
                        .map_err(|e| ApiError::InvalidAttachment {
                            file_name: file.file_name.clone(),
                            reason: e.to_string(),
                        })?;
                    form.part(name, part)
                }
            };
        }

        Ok(form)
    }
}

/// Package `text` and `files` into one body: a single `text` field followed
/// by one repeated `attachments` field per file, in the given order.
pub fn encode(text: &str, files: &[AttachmentFile]) -> MultipartPayload {
    let mut parts = Vec::with_capacity(files.len() + 1);
    parts.push((TEXT_FIELD.to_string(), PartBody::Text(text.to_string())));
    for file in files {
        parts.push((ATTACHMENTS_FIELD.to_string(), PartBody::File(file.clone())));
    }

    MultipartPayload { parts }
}
