use crate::model::{Annotation, Segment};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

pub mod segments;

pub use segments::{SegmentStore, SyncTicket};

/// Cloneable handle to the one `SegmentStore` of an app.
///
/// The lock is never held across an `.await`. Every mutation publishes the
/// new revision to subscribers.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<SegmentStore>>,
    revision_tx: Arc<watch::Sender<u64>>,
}

impl SharedStore {
    pub fn new() -> Self {
        let (revision_tx, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(SegmentStore::new())),
            revision_tx: Arc::new(revision_tx),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision_tx.subscribe()
    }

    pub fn snapshot(&self) -> Vec<Segment> {
        self.lock().segments().to_vec()
    }

    pub fn segment(&self, segment_id: &str) -> Option<Segment> {
        self.lock().segment(segment_id).cloned()
    }

    pub fn annotation(&self, segment_id: &str, annotation_id: &str) -> Option<Annotation> {
        self.lock().annotation(segment_id, annotation_id).cloned()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision()
    }

    pub fn begin_sync(&self) -> SyncTicket {
        self.lock().begin_sync()
    }

    pub fn abandon_sync(&self, ticket: SyncTicket) {
        self.lock().abandon_sync(ticket)
    }

    pub fn replace_all(&self, segments: Vec<Segment>) {
        self.mutate(|store| store.replace_all(segments))
    }

    pub fn replace_all_since(&self, ticket: SyncTicket, segments: Vec<Segment>) -> usize {
        self.mutate(|store| store.replace_all_since(ticket, segments))
    }

    pub fn apply_annotation_created(&self, segment_id: &str, annotation: Annotation) -> bool {
        self.mutate(|store| store.apply_annotation_created(segment_id, annotation))
    }

    pub fn apply_annotation_updated(&self, segment_id: &str, annotation: Annotation) -> bool {
        self.mutate(|store| store.apply_annotation_updated(segment_id, annotation))
    }

    pub fn apply_annotation_deleted(&self, segment_id: &str, annotation_id: &str) -> bool {
        self.mutate(|store| store.apply_annotation_deleted(segment_id, annotation_id))
    }

    #[cfg(test)]
    pub(crate) fn journal_len(&self) -> usize {
        self.lock().journal_len()
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut SegmentStore) -> T) -> T {
        let (result, revision) = {
            let mut store = self.lock();
            let result = f(&mut *store);
            (result, store.revision())
        };
        self.revision_tx.send_replace(revision);
        result
    }

    fn lock(&self) -> MutexGuard<'_, SegmentStore> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_new_revision() {
        let store = SharedStore::new();
        let mut rx = store.subscribe();

        store.replace_all(vec![Segment::new("S1", "https://audio/1", "hi")]);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), store.revision());
    }

    #[test]
    fn test_clones_share_state() {
        let store = SharedStore::new();
        let other = store.clone();

        other.replace_all(vec![Segment::new("S1", "https://audio/1", "hi")]);
        other.apply_annotation_created("S1", Annotation::new("A1", "note"));

        assert_eq!(store.snapshot().len(), 1);
        assert_eq!(store.annotation("S1", "A1").unwrap().text, "note");
    }
}
