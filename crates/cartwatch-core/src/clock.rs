//! Injectable wall-clock abstraction
//!
//! Abandonment ages depend on the instant the analysis runs at, so services
//! take the clock as a dependency instead of reading the system clock
//! directly. Tests pin it to a fixed instant.

use crate::types::UtcDateTime;
use chrono::Utc;

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> UtcDateTime;
}

/// Production clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> UtcDateTime {
        Utc::now()
    }
}
