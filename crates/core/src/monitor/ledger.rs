//! Record of which queue transitions have already been announced.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// How often stale entries are swept.
pub const SWEEP_INTERVAL_HOURS: i64 = 24;

/// Entries older than this are dropped on sweep.
pub const RETENTION_HOURS: i64 = 48;

/// A download in a particular status. Status is compared lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedgerKey {
    pub download_id: u64,
    pub status: String,
}

impl LedgerKey {
    pub fn new(download_id: u64, status: &str) -> Self {
        Self {
            download_id,
            status: status.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerDecision {
    /// First sighting of this key.
    New,
    /// Seen before, but an active download has been quiet long enough.
    Renotify,
    Suppress,
}

impl LedgerDecision {
    pub fn should_notify(self) -> bool {
        !matches!(self, LedgerDecision::Suppress)
    }
}

/// Statuses that keep producing progress worth re-announcing.
fn is_active(status: &str) -> bool {
    matches!(status, "downloading" | "queued")
}

#[derive(Debug)]
pub struct NotificationLedger {
    entries: HashMap<LedgerKey, DateTime<Utc>>,
    renotify_window: Duration,
    last_sweep: DateTime<Utc>,
}

impl NotificationLedger {
    pub fn new(renotify_window: Duration, now: DateTime<Utc>) -> Self {
        Self {
            entries: HashMap::new(),
            renotify_window,
            last_sweep: now,
        }
    }

    pub fn check(&self, key: &LedgerKey, progress: f64, now: DateTime<Utc>) -> LedgerDecision {
        match self.entries.get(key) {
            None => LedgerDecision::New,
            Some(at) if is_active(&key.status) && progress > 0.0 => {
                if now - *at >= self.renotify_window {
                    LedgerDecision::Renotify
                } else {
                    LedgerDecision::Suppress
                }
            }
            Some(_) => LedgerDecision::Suppress,
        }
    }

    pub fn record(&mut self, key: LedgerKey, now: DateTime<Utc>) {
        self.entries.insert(key, now);
    }

    /// Drop old entries, at most once per sweep interval. Returns how many
    /// were removed.
    pub fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        if now - self.last_sweep <= Duration::hours(SWEEP_INTERVAL_HOURS) {
            return 0;
        }
        let cutoff = now - Duration::hours(RETENTION_HOURS);
        let before = self.entries.len();
        self.entries.retain(|_, at| *at >= cutoff);
        self.last_sweep = now;

        let removed = before - self.entries.len();
        if removed > 0 {
            debug!("Swept {} notification ledger entries", removed);
        }
        removed
    }

    pub fn last_recorded(&self, key: &LedgerKey) -> Option<DateTime<Utc>> {
        self.entries.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn ledger() -> NotificationLedger {
        NotificationLedger::new(Duration::minutes(30), t0())
    }

    #[test]
    fn test_key_lowercases_status() {
        assert_eq!(LedgerKey::new(1, "Downloading"), LedgerKey::new(1, "downloading"));
        assert_ne!(LedgerKey::new(1, "canceled"), LedgerKey::new(1, "cancelled"));
    }

    #[test]
    fn test_active_renotify_window() {
        let mut ledger = ledger();
        let key = LedgerKey::new(9, "downloading");
        assert_eq!(ledger.check(&key, 40.0, t0()), LedgerDecision::New);
        ledger.record(key.clone(), t0());

        let later = t0() + Duration::minutes(10);
        assert_eq!(ledger.check(&key, 40.0, later), LedgerDecision::Suppress);

        let almost = t0() + Duration::minutes(30) - Duration::seconds(1);
        assert_eq!(ledger.check(&key, 40.0, almost), LedgerDecision::Suppress);

        let much_later = t0() + Duration::minutes(31);
        assert_eq!(ledger.check(&key, 40.0, much_later), LedgerDecision::Renotify);
    }

    #[test]
    fn test_renotify_at_window_boundary() {
        let mut ledger = ledger();
        let key = LedgerKey::new(9, "downloading");
        ledger.record(key.clone(), t0());

        let boundary = t0() + Duration::minutes(30);
        assert_eq!(ledger.check(&key, 40.0, boundary), LedgerDecision::Renotify);
    }

    #[test]
    fn test_no_progress_never_renotifies() {
        let mut ledger = ledger();
        let key = LedgerKey::new(9, "queued");
        ledger.record(key.clone(), t0());
        assert_eq!(
            ledger.check(&key, 0.0, t0() + Duration::hours(5)),
            LedgerDecision::Suppress
        );
    }

    #[test]
    fn test_terminal_status_announced_once() {
        let mut ledger = ledger();
        let key = LedgerKey::new(9, "completed");
        ledger.record(key.clone(), t0());
        assert_eq!(
            ledger.check(&key, 100.0, t0() + Duration::hours(10)),
            LedgerDecision::Suppress
        );
        // a different status of the same download is a new key
        let failed = LedgerKey::new(9, "failed");
        assert!(ledger.check(&failed, 0.0, t0()).should_notify());
    }

    #[test]
    fn test_sweep_is_lazy() {
        let mut ledger = ledger();
        ledger.record(LedgerKey::new(1, "completed"), t0());
        ledger.record(LedgerKey::new(2, "completed"), t0() + Duration::hours(20));

        assert_eq!(ledger.sweep(t0() + Duration::hours(23)), 0);
        assert_eq!(ledger.len(), 2);

        // past the interval: only the entry older than retention goes
        assert_eq!(ledger.sweep(t0() + Duration::hours(50)), 1);
        assert_eq!(ledger.len(), 1);
        assert!(ledger.last_recorded(&LedgerKey::new(2, "completed")).is_some());

        // next sweep waits another full interval
        assert_eq!(ledger.sweep(t0() + Duration::hours(60)), 0);
    }
}
