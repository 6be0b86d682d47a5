use chrono::{DateTime, Utc};

/// Running counters of a `SegmentPoller`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollerStatus {
    pub success_count: u64,
    pub failure_count: u64,
    pub skipped_ticks: u64,
    pub consecutive_failures: u32,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl PollerStatus {
    pub fn record_success(&mut self) {
        self.success_count += 1;
        self.consecutive_failures = 0;
        self.last_success_at = Some(Utc::now());
        self.last_error = None;
    }

    pub fn record_failure(&mut self, error: String) {
        self.failure_count += 1;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        self.last_error = Some(error);
    }

    pub fn record_skip(&mut self) {
        self.skipped_ticks += 1;
    }
}
