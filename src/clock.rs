//! # Clock
//! Injectable time source so freshness math and cache TTLs are testable.
//!
//! Production code holds an `Arc<dyn Clock>` and never calls `Utc::now()`
//! directly; tests swap in `FixedClock` and move time by hand.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for deterministic tests.
#[derive(Debug, Clone)]
pub struct FixedClock {
    instant: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(instant)),
        }
    }

    /// Move the clock forward by whole seconds.
    pub fn advance_secs(&self, secs: i64) {
        let mut t = self.instant.lock().expect("fixed clock mutex poisoned");
        *t += Duration::seconds(secs);
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        let mut t = self.instant.lock().expect("fixed clock mutex poisoned");
        *t = instant;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock().expect("fixed clock mutex poisoned")
    }
}
