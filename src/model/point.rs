//! The persisted observation record.

/// One brightness observation.
///
/// Persisted as one flat history row; see [`CsvHistory`]. New fields go
/// in new trailing columns, which older readers ignore.
///
/// [`CsvHistory`]: crate::adapters::history::CsvHistory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataPoint {
    /// Unix time, seconds.
    pub timestamp: i64,
    /// Ambient light in raw sensor units.
    pub ambient_light: u32,
    /// Backlight level in raw hardware units.
    pub screen_brightness: u32,
    /// True for user/external adjustments, false for automatic ones.
    pub is_manual_adjustment: bool,
}

impl DataPoint {
    pub fn manual(timestamp: i64, ambient_light: u32, screen_brightness: u32) -> Self {
        Self {
            timestamp,
            ambient_light,
            screen_brightness,
            is_manual_adjustment: true,
        }
    }

    pub fn automatic(timestamp: i64, ambient_light: u32, screen_brightness: u32) -> Self {
        Self {
            timestamp,
            ambient_light,
            screen_brightness,
            is_manual_adjustment: false,
        }
    }
}
