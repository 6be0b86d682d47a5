use crate::api::{AnnotationBackend, AnnotationOperationFailed, AttachmentFile};
use crate::model::Annotation;
use crate::store::SharedStore;
use std::sync::Arc;
use thiserror::Error;

pub mod draft;

pub use draft::{Draft, EditorState};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No annotation is being composed")]
    NotComposing,

    #[error("Annotation {annotation_id} not found on segment {segment_id}")]
    AnnotationNotFound {
        segment_id: String,
        annotation_id: String,
    },

    #[error("Annotation text is empty")]
    EmptyDraft,

    #[error(transparent)]
    Operation(#[from] AnnotationOperationFailed),
}

/// The single in-flight annotation edit.
///
/// Remote results are written into the store only once the backend has
/// confirmed them. On failure the draft stays open so the user can retry.
pub struct EditorSession {
    backend: Arc<dyn AnnotationBackend>,
    store: SharedStore,
    state: EditorState,
    last_error: Option<AnnotationOperationFailed>,
}

impl EditorSession {
    pub fn new(backend: Arc<dyn AnnotationBackend>, store: SharedStore) -> Self {
        Self {
            backend,
            store,
            state: EditorState::Idle,
            last_error: None,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.state.draft()
    }

    pub fn is_idle(&self) -> bool {
        self.state.is_idle()
    }

    /// Most recent unconfirmed operation, if the user has not retried
    /// successfully since.
    pub fn last_error(&self) -> Option<&AnnotationOperationFailed> {
        self.last_error.as_ref()
    }

    /// Open a new annotation on `segment_id`, discarding any open draft.
    pub fn begin_new(&mut self, segment_id: &str) {
        self.discard_open_draft();
        self.state = EditorState::ComposingNew {
            segment_id: segment_id.to_string(),
            draft: Draft::new(""),
        };
        tracing::debug!("Composing new annotation on segment {}", segment_id);
    }

    /// Open an existing annotation for editing. The draft text is seeded from
    /// the stored annotation; staged files start empty.
    pub fn begin_edit(&mut self, segment_id: &str, annotation_id: &str) -> Result<(), SessionError> {
        let existing = self.store.annotation(segment_id, annotation_id).ok_or_else(|| {
            SessionError::AnnotationNotFound {
                segment_id: segment_id.to_string(),
                annotation_id: annotation_id.to_string(),
            }
        })?;

        self.discard_open_draft();
        self.state = EditorState::ComposingEdit {
            segment_id: segment_id.to_string(),
            annotation_id: annotation_id.to_string(),
            draft: Draft::new(existing.text),
        };
        tracing::debug!("Editing annotation {} on segment {}", annotation_id, segment_id);
        Ok(())
    }

    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), SessionError> {
        let draft = self.state.draft_mut().ok_or(SessionError::NotComposing)?;
        draft.text = text.into();
        Ok(())
    }

    /// Replace the staged files.
    pub fn stage_files(&mut self, files: Vec<AttachmentFile>) -> Result<(), SessionError> {
        let draft = self.state.draft_mut().ok_or(SessionError::NotComposing)?;
        draft.files = files;
        Ok(())
    }

    /// Drop the open draft and return to idle.
    pub fn cancel(&mut self) -> Option<Draft> {
        let previous = std::mem::replace(&mut self.state, EditorState::Idle);
        match previous {
            EditorState::Idle => None,
            EditorState::ComposingNew { draft, .. } | EditorState::ComposingEdit { draft, .. } => {
                Some(draft)
            }
        }
    }

    /// Send the open draft. On success the store receives the backend's
    /// canonical annotation and the session returns to idle; on failure the
    /// session is left exactly as it was.
    pub async fn submit(&mut self) -> Result<Annotation, SessionError> {
        let draft = self.state.draft().ok_or(SessionError::NotComposing)?;
        if draft.is_blank() {
            return Err(SessionError::EmptyDraft);
        }

        let result = match &self.state {
            EditorState::Idle => return Err(SessionError::NotComposing),
            EditorState::ComposingNew { segment_id, draft } => {
                self.backend
                    .create(segment_id, &draft.text, &draft.files)
                    .await
            }
            EditorState::ComposingEdit {
                segment_id,
                annotation_id,
                draft,
            } => {
                self.backend
                    .update(segment_id, annotation_id, &draft.text, &draft.files)
                    .await
            }
        };

        match result {
            Ok(annotation) => {
                match std::mem::replace(&mut self.state, EditorState::Idle) {
                    EditorState::ComposingNew { segment_id, .. } => {
                        self.store
                            .apply_annotation_created(&segment_id, annotation.clone());
                        tracing::info!(
                            "Annotation {} created on segment {}",
                            annotation.id,
                            segment_id
                        );
                    }
                    EditorState::ComposingEdit {
                        segment_id,
                        annotation_id,
                        ..
                    } => {
                        if annotation.id != annotation_id {
                            tracing::warn!(
                                "Backend answered edit of {} with annotation {}",
                                annotation_id,
                                annotation.id
                            );
                        }
                        self.store
                            .apply_annotation_updated(&segment_id, annotation.clone());
                        tracing::info!(
                            "Annotation {} updated on segment {}",
                            annotation.id,
                            segment_id
                        );
                    }
                    EditorState::Idle => {}
                }
                self.last_error = None;
                Ok(annotation)
            }
            Err(e) => {
                tracing::error!("{}", e);
                self.last_error = Some(e.clone());
                Err(SessionError::Operation(e))
            }
        }
    }

    /// Delete an annotation. The store is only updated once the backend
    /// confirms; a failed delete leaves the annotation visible.
    pub async fn delete(&mut self, segment_id: &str, annotation_id: &str) -> Result<(), SessionError> {
        match self.backend.delete(segment_id, annotation_id).await {
            Ok(()) => {
                self.store.apply_annotation_deleted(segment_id, annotation_id);

                let editing_deleted = matches!(
                    &self.state,
                    EditorState::ComposingEdit { annotation_id: editing, .. } if editing == annotation_id
                );
                if editing_deleted {
                    self.state = EditorState::Idle;
                    tracing::info!("Closed editor: annotation {} was deleted", annotation_id);
                }

                self.last_error = None;
                tracing::info!(
                    "Annotation {} deleted from segment {}",
                    annotation_id,
                    segment_id
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!("{}", e);
                self.last_error = Some(e.clone());
                Err(SessionError::Operation(e))
            }
        }
    }

    fn discard_open_draft(&mut self) {
        if let Some(draft) = self.cancel() {
            if !draft.is_blank() {
                tracing::debug!("Discarding open draft {}", draft.correlation_id);
            }
        }
        self.last_error = None;
    }
}
