//! Clock abstraction
//!
//! Consolidation stamps `first_seen`, `last_seen` and `consolidated_at` from a
//! [`TimeProvider`], so tests can pin wall-clock time and compare snapshots exactly.

use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};
use std::time::Instant;

pub trait TimeProvider: Send + Sync {
    /// Monotonic time, used for elapsed measurements
    fn now(&self) -> Instant;

    /// Wall-clock time, used for timestamps written to snapshots
    fn utc_now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Wall clock that only moves when told to
#[derive(Debug, Clone)]
pub struct FixedTimeProvider {
    utc: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedTimeProvider {
    pub fn new(utc: DateTime<Utc>) -> Self {
        Self {
            utc: Arc::new(Mutex::new(utc)),
        }
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut utc) = self.utc.lock() {
            *utc += by;
        }
    }

    pub fn set(&self, utc: DateTime<Utc>) {
        if let Ok(mut current) = self.utc.lock() {
            *current = utc;
        }
    }
}

impl TimeProvider for FixedTimeProvider {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        match self.utc.lock() {
            Ok(utc) => *utc,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemTimeProvider;
        let first = clock.now();
        std::thread::sleep(std::time::Duration::from_millis(1));
        assert!(clock.now() > first);
    }

    #[test]
    fn test_fixed_clock_only_moves_when_advanced() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        let clock = FixedTimeProvider::new(start);
        assert_eq!(clock.utc_now(), start);
        assert_eq!(clock.utc_now(), start);

        clock.advance(Duration::seconds(5));
        assert_eq!(clock.utc_now(), start + Duration::seconds(5));

        clock.set(start);
        assert_eq!(clock.utc_now(), start);
    }
}
