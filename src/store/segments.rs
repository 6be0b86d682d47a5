use crate::model::{Annotation, Segment};
use std::collections::HashSet;

/// Revision of the store at the moment a bulk fetch was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SyncTicket(u64);

#[derive(Debug, Clone)]
enum TargetedOp {
    Created {
        segment_id: String,
        annotation: Annotation,
    },
    Updated {
        segment_id: String,
        annotation: Annotation,
    },
    Deleted {
        segment_id: String,
        annotation_id: String,
    },
}

#[derive(Debug, Clone)]
struct JournalEntry {
    revision: u64,
    op: TargetedOp,
}

/// In-memory list of segments and their annotations.
///
/// Confirmed targeted applies are journaled so that a bulk sync whose fetch
/// was issued before them cannot roll them back.
#[derive(Debug, Default)]
pub struct SegmentStore {
    segments: Vec<Segment>,
    revision: u64,
    journal: Vec<JournalEntry>,
    open_syncs: Vec<SyncTicket>,
}

impl SegmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn segment(&self, segment_id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == segment_id)
    }

    pub fn annotation(&self, segment_id: &str, annotation_id: &str) -> Option<&Annotation> {
        self.segment(segment_id)
            .and_then(|segment| segment.annotation(annotation_id))
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Open a sync at the current revision. Targeted applies are journaled
    /// until every open sync is settled or abandoned.
    pub fn begin_sync(&mut self) -> SyncTicket {
        let ticket = SyncTicket(self.revision);
        self.open_syncs.push(ticket);
        ticket
    }

    /// Close a sync whose fetch never produced a list.
    pub fn abandon_sync(&mut self, ticket: SyncTicket) {
        self.close_sync(ticket);
        self.prune_journal();
    }

    /// Bulk sync with no fetch in flight: the incoming list wins outright.
    pub fn replace_all(&mut self, segments: Vec<Segment>) {
        self.install(segments);
        self.revision += 1;
        self.prune_journal();

        tracing::debug!(
            "Bulk sync applied: {} segments, revision {}",
            self.segments.len(),
            self.revision
        );
    }

    /// Swap in `segments`, then replay every targeted apply recorded after
    /// `ticket`. Returns the number of replayed operations.
    pub fn replace_all_since(&mut self, ticket: SyncTicket, segments: Vec<Segment>) -> usize {
        self.close_sync(ticket);
        self.install(segments);

        let pending: Vec<TargetedOp> = self
            .journal
            .iter()
            .filter(|entry| entry.revision > ticket.0)
            .map(|entry| entry.op.clone())
            .collect();
        for op in &pending {
            self.apply_op(op);
        }

        self.revision += 1;
        self.prune_journal();

        if !pending.is_empty() {
            tracing::debug!(
                "Bulk sync replayed {} local operation(s) newer than the fetch",
                pending.len()
            );
        }
        tracing::debug!(
            "Bulk sync applied: {} segments, revision {}",
            self.segments.len(),
            self.revision
        );

        pending.len()
    }

    #[cfg(test)]
    pub(crate) fn journal_len(&self) -> usize {
        self.journal.len()
    }

    fn install(&mut self, segments: Vec<Segment>) {
        let mut seen = HashSet::new();
        let mut incoming = Vec::with_capacity(segments.len());
        for mut segment in segments {
            if !seen.insert(segment.id.clone()) {
                tracing::warn!("Duplicate segment id '{}' in sync payload, keeping first", segment.id);
                continue;
            }

            let mut annotation_ids = HashSet::new();
            let before = segment.annotations.len();
            segment
                .annotations
                .retain(|annotation| annotation_ids.insert(annotation.id.clone()));
            if segment.annotations.len() != before {
                tracing::warn!(
                    "Duplicate annotation ids on segment '{}' in sync payload, keeping first",
                    segment.id
                );
            }

            incoming.push(segment);
        }
        self.segments = incoming;
    }

    fn close_sync(&mut self, ticket: SyncTicket) {
        if let Some(pos) = self.open_syncs.iter().position(|open| *open == ticket) {
            self.open_syncs.swap_remove(pos);
        }
    }

    /// Keep only entries some open sync may still need to replay.
    fn prune_journal(&mut self) {
        match self.open_syncs.iter().min() {
            Some(oldest) => {
                let oldest = oldest.0;
                self.journal.retain(|entry| entry.revision > oldest);
            }
            None => self.journal.clear(),
        }
    }

    /// Append `annotation` to the segment, or replace the entry with the
    /// same id in place.
    pub fn apply_annotation_created(&mut self, segment_id: &str, annotation: Annotation) -> bool {
        self.record(TargetedOp::Created {
            segment_id: segment_id.to_string(),
            annotation,
        })
    }

    pub fn apply_annotation_updated(&mut self, segment_id: &str, annotation: Annotation) -> bool {
        self.record(TargetedOp::Updated {
            segment_id: segment_id.to_string(),
            annotation,
        })
    }

    pub fn apply_annotation_deleted(&mut self, segment_id: &str, annotation_id: &str) -> bool {
        self.record(TargetedOp::Deleted {
            segment_id: segment_id.to_string(),
            annotation_id: annotation_id.to_string(),
        })
    }

    fn record(&mut self, op: TargetedOp) -> bool {
        let changed = self.apply_op(&op);
        self.revision += 1;
        if !self.open_syncs.is_empty() {
            self.journal.push(JournalEntry {
                revision: self.revision,
                op,
            });
        }
        changed
    }

    fn apply_op(&mut self, op: &TargetedOp) -> bool {
        match op {
            TargetedOp::Created {
                segment_id,
                annotation,
            } => {
                let Some(segment) = self.segments.iter_mut().find(|s| &s.id == segment_id) else {
                    tracing::warn!(
                        "Annotation {} created on unknown segment {}, ignoring",
                        annotation.id,
                        segment_id
                    );
                    return false;
                };

                match segment.annotation_position(&annotation.id) {
                    Some(idx) if segment.annotations[idx] == *annotation => {
                        tracing::debug!("Annotation {} already present", annotation.id);
                        false
                    }
                    Some(idx) => {
                        segment.annotations[idx] = annotation.clone();
                        true
                    }
                    None => {
                        segment.annotations.push(annotation.clone());
                        true
                    }
                }
            }
            TargetedOp::Updated {
                segment_id,
                annotation,
            } => {
                let Some(segment) = self.segments.iter_mut().find(|s| &s.id == segment_id) else {
                    tracing::debug!("Update for unknown segment {}, ignoring", segment_id);
                    return false;
                };

                match segment.annotation_position(&annotation.id) {
                    Some(idx) if segment.annotations[idx] != *annotation => {
                        segment.annotations[idx] = annotation.clone();
                        true
                    }
                    Some(_) => false,
                    None => {
                        tracing::debug!(
                            "Update for unknown annotation {} on segment {}, ignoring",
                            annotation.id,
                            segment_id
                        );
                        false
                    }
                }
            }
            TargetedOp::Deleted {
                segment_id,
                annotation_id,
            } => {
                let Some(segment) = self.segments.iter_mut().find(|s| &s.id == segment_id) else {
                    tracing::debug!("Delete for unknown segment {}, ignoring", segment_id);
                    return false;
                };

                let before = segment.annotations.len();
                segment.annotations.retain(|a| &a.id != annotation_id);
                before != segment.annotations.len()
            }
        }
    }
}
