//! Time source for the store.
//!
//! Actions stamp entities through a [`Clock`] so tests can pin the time and
//! roll the calendar day forward.

use crate::model::Timestamp;
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Source of the current time and calendar date
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;

    /// Calendar date used for once-per-day gates
    fn today(&self) -> NaiveDate;
}

/// Wall clock; days roll over at local midnight
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Hand-driven clock; days roll over at UTC midnight.
///
/// Clones share the same time, so a test can keep one copy and hand another
/// to the store.
#[derive(Debug, Clone)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self { millis: Arc::new(AtomicU64::new(start.as_millis())) }
    }

    /// Clock pinned to noon UTC on the given date
    pub fn at_noon(date: NaiveDate) -> Self {
        let millis = date
            .and_hms_opt(12, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis().max(0) as u64)
            .unwrap_or(0);
        Self::new(Timestamp::from_millis(millis))
    }

    pub fn set(&self, at: Timestamp) {
        self.millis.store(at.as_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.millis.load(Ordering::SeqCst))
    }

    fn today(&self) -> NaiveDate {
        let millis = self.millis.load(Ordering::SeqCst) as i64;
        DateTime::<Utc>::from_timestamp_millis(millis)
            .map(|dt| dt.date_naive())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_day_rollover() {
        let day = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let clock = ManualClock::at_noon(day);
        assert_eq!(clock.today(), day);

        clock.advance(Duration::from_secs(11 * 3600));
        assert_eq!(clock.today(), day);

        clock.advance(Duration::from_secs(3600));
        assert_eq!(clock.today(), day.succ_opt().unwrap());
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(Timestamp::from_millis(5));
        let other = clock.clone();
        clock.advance(Duration::from_millis(10));
        assert_eq!(other.now(), Timestamp::from_millis(15));
    }
}
