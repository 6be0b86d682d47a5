use crate::api::AttachmentFile;
use uuid::Uuid;

/// Text and staged files of the annotation being composed.
///
/// `correlation_id` only tells drafts apart locally; it is never sent to the
/// backend or used as an annotation id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub files: Vec<AttachmentFile>,
    pub correlation_id: Uuid,
}

impl Draft {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            files: Vec::new(),
            correlation_id: Uuid::new_v4(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty() && self.files.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorState {
    Idle,
    ComposingNew {
        segment_id: String,
        draft: Draft,
    },
    ComposingEdit {
        segment_id: String,
        annotation_id: String,
        draft: Draft,
    },
}

impl EditorState {
    pub fn draft(&self) -> Option<&Draft> {
        match self {
            EditorState::Idle => None,
            EditorState::ComposingNew { draft, .. } | EditorState::ComposingEdit { draft, .. } => {
                Some(draft)
            }
        }
    }

    pub fn draft_mut(&mut self) -> Option<&mut Draft> {
        match self {
            EditorState::Idle => None,
            EditorState::ComposingNew { draft, .. } | EditorState::ComposingEdit { draft, .. } => {
                Some(draft)
            }
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, EditorState::Idle)
    }
}
