//! Wall-clock adapter.
//!
//! The core takes `now` as a plain unix timestamp; this is where the
//! daemon gets it from.

use chrono::Utc;

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Seconds since the unix epoch.
    pub fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}
