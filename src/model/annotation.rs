use serde::{Deserialize, Serialize};

/// A user comment attached to exactly one segment.
///
/// `id` and `attachments` are only ever taken from the backend's response;
/// a locally composed draft never becomes an `Annotation` on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub text: String,
    /// Locators of uploaded files.
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(
        default,
        alias = "parentSegmentId",
        skip_serializing_if = "Option::is_none"
    )]
    pub parent_segment_id: Option<String>,
    #[serde(default, alias = "authorId", skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Annotation {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            attachments: Vec::new(),
            parent_segment_id: None,
            author_id: None,
            created_at: None,
        }
    }

    pub fn with_attachments(mut self, attachments: Vec<String>) -> Self {
        self.attachments = attachments;
        self
    }
}
