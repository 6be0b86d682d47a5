use super::Annotation;
use serde::{Deserialize, Serialize};

/// One transcribed utterance as published by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    #[serde(rename = "audio_url")]
    pub audio_ref: String,
    pub text: String,
    /// Display order is insertion order.
    #[serde(rename = "comments", default)]
    pub annotations: Vec<Annotation>,
}

impl Segment {
    pub fn new(id: impl Into<String>, audio_ref: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            audio_ref: audio_ref.into(),
            text: text.into(),
            annotations: Vec::new(),
        }
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations = annotations;
        self
    }

    pub fn annotation(&self, annotation_id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == annotation_id)
    }

    pub(crate) fn annotation_position(&self, annotation_id: &str) -> Option<usize> {
        self.annotations.iter().position(|a| a.id == annotation_id)
    }
}
