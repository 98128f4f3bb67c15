//! Day/night phase of a timestamp.

use chrono::{DateTime, FixedOffset, Local, Timelike};

/// Daytime window `[start_hour, end_hour)` in wall-clock hours.
///
/// A window with `start_hour > end_hour` wraps midnight. `offset = None`
/// evaluates hours in the host's local time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Daylight {
    pub start_hour: u8,
    pub end_hour: u8,
    pub offset: Option<FixedOffset>,
}

impl Default for Daylight {
    fn default() -> Self {
        Self {
            start_hour: 6,
            end_hour: 18,
            offset: None,
        }
    }
}

impl Daylight {
    pub fn contains_hour(&self, hour: u8) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    /// Wall-clock hour of a unix timestamp. Out-of-range timestamps map
    /// to hour 0.
    pub fn hour_of(&self, timestamp: i64) -> u8 {
        let Some(utc) = DateTime::from_timestamp(timestamp, 0) else {
            return 0;
        };
        let hour = match self.offset {
            Some(offset) => utc.with_timezone(&offset).hour(),
            None => utc.with_timezone(&Local).hour(),
        };
        hour as u8
    }

    pub fn is_day(&self, timestamp: i64) -> bool {
        self.contains_hour(self.hour_of(timestamp))
    }

    /// True when both timestamps fall in the same phase.
    pub fn same_phase(&self, a: i64, b: i64) -> bool {
        self.is_day(a) == self.is_day(b)
    }
}
