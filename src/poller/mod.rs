use crate::api::{ApiError, SegmentSource};
use crate::store::{SharedStore, SyncTicket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub mod status;

pub use status::PollerStatus;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Fetch succeeded and was bulk-synced into the store
    Applied { segments: usize, replayed: usize },
    /// Another fetch was still in flight
    Skipped,
    Failed(ApiError),
}

struct PollerShared {
    source: Arc<dyn SegmentSource>,
    store: SharedStore,
    in_flight: AtomicBool,
    status: Mutex<PollerStatus>,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Abandons the sync ticket unless the fetch result reached the store.
struct OpenSync<'a> {
    store: &'a SharedStore,
    ticket: SyncTicket,
    settled: bool,
}

impl Drop for OpenSync<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.store.abandon_sync(self.ticket);
        }
    }
}

impl PollerShared {
    async fn poll_once(&self) -> PollOutcome {
        if self.in_flight.swap(true, Ordering::AcqRel) {
            self.status().record_skip();
            tracing::debug!("Segment poll skipped: previous fetch still in flight");
            return PollOutcome::Skipped;
        }
        let _guard = InFlightGuard(&self.in_flight);

        let mut sync = OpenSync {
            store: &self.store,
            ticket: self.store.begin_sync(),
            settled: false,
        };
        match self.source.fetch_segments().await {
            Ok(segments) => {
                let count = segments.len();
                let replayed = self.store.replace_all_since(sync.ticket, segments);
                sync.settled = true;
                self.status().record_success();
                tracing::debug!("Segment poll applied: {} segments", count);
                PollOutcome::Applied {
                    segments: count,
                    replayed,
                }
            }
            Err(e) => {
                let consecutive = {
                    let mut status = self.status();
                    status.record_failure(e.to_string());
                    status.consecutive_failures
                };
                if e.is_transient() {
                    tracing::warn!("Segment poll failed ({} in a row): {}", consecutive, e);
                } else {
                    tracing::error!(
                        "Segment poll failed ({} in a row, not transient): {}",
                        consecutive,
                        e
                    );
                }
                PollOutcome::Failed(e)
            }
        }
    }

    fn status(&self) -> MutexGuard<'_, PollerStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Periodically pulls the full segment list into a `SharedStore`.
///
/// At most one fetch is in flight; ticks that land while one is pending are
/// dropped. Failures are logged and the next tick tries again.
pub struct SegmentPoller {
    shared: Arc<PollerShared>,
    interval: Duration,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl SegmentPoller {
    pub fn new(source: Arc<dyn SegmentSource>, store: SharedStore, interval: Duration) -> Self {
        Self {
            shared: Arc::new(PollerShared {
                source,
                store,
                in_flight: AtomicBool::new(false),
                status: Mutex::new(PollerStatus::default()),
            }),
            interval,
            ticker: Mutex::new(None),
        }
    }

    /// Start ticking. Returns false if already running. Must be called from
    /// within a tokio runtime.
    pub fn start(&self) -> bool {
        let mut ticker = self.ticker();
        if ticker.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return false;
        }

        let shared = self.shared.clone();
        let interval = self.interval;
        *ticker = Some(tokio::spawn(async move {
            let mut cadence = tokio::time::interval_at(Instant::now() + interval, interval);
            cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                cadence.tick().await;

                if shared.in_flight.load(Ordering::Acquire) {
                    shared.status().record_skip();
                    tracing::debug!("Poll tick skipped: fetch still in flight");
                    continue;
                }

                let fetch = shared.clone();
                tokio::spawn(async move {
                    fetch.poll_once().await;
                });
            }
        }));

        tracing::info!("Segment polling started (every {}ms)", interval.as_millis());
        true
    }

    /// Suppress future ticks. A fetch already in flight still completes and
    /// is applied.
    pub fn stop(&self) -> bool {
        match self.ticker().take() {
            Some(handle) => {
                handle.abort();
                tracing::info!("Segment polling stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.ticker()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Run one fetch now, subject to the same in-flight exclusion as ticks.
    pub async fn poll_once(&self) -> PollOutcome {
        self.shared.poll_once().await
    }

    pub fn is_fetching(&self) -> bool {
        self.shared.in_flight.load(Ordering::Acquire)
    }

    pub fn status(&self) -> PollerStatus {
        self.shared.status().clone()
    }

    fn ticker(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for SegmentPoller {
    fn drop(&mut self) {
        if let Some(handle) = self.ticker().take() {
            handle.abort();
        }
    }
}
