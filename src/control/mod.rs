//! Actuation-side control primitives.
//!
//! - [`BrightnessRange`]: the configured raw backlight window and the
//!   percent ↔ raw conversions every other layer goes through.
//! - [`HysteresisGate`]: suppresses automatic targets that are too close
//!   to the current level.
//! - [`transition::TransitionStepper`]: the perceptual ramp.

pub mod transition;

use crate::config::SystemConfig;

/// Inclusive raw backlight window `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessRange {
    min: u32,
    max: u32,
}

impl BrightnessRange {
    /// `None` unless `min < max`.
    pub fn new(min: u32, max: u32) -> Option<Self> {
        (min < max).then_some(Self { min, max })
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Width of the window in raw units.
    pub fn span(&self) -> u32 {
        self.max - self.min
    }

    pub fn contains(&self, raw: u32) -> bool {
        (self.min..=self.max).contains(&raw)
    }

    pub fn clamp(&self, raw: u32) -> u32 {
        raw.clamp(self.min, self.max)
    }

    /// Round a real-valued raw level and clamp it into the window.
    pub fn clamp_f64(&self, raw: f64) -> u32 {
        if raw.is_nan() {
            return self.min;
        }
        raw.round().clamp(f64::from(self.min), f64::from(self.max)) as u32
    }

    /// `min + percent/100 × span`, rounded and clamped.
    pub fn to_raw(&self, percent: f64) -> u32 {
        let pct = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self.clamp_f64(f64::from(self.min) + pct / 100.0 * f64::from(self.span()))
    }

    /// Position of `raw` in the window as a percentage (not clamped).
    pub fn to_percent(&self, raw: f64) -> f64 {
        (raw - f64::from(self.min)) / f64::from(self.span()) * 100.0
    }
}

/// Dead band around the current level inside which automatic targets
/// are not acted upon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HysteresisGate {
    fraction: f64,
}

impl HysteresisGate {
    pub fn new(fraction: f64) -> Self {
        Self { fraction }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(config.hysteresis_fraction)
    }

    /// Band half-width in raw units for `range`.
    pub fn threshold(&self, range: BrightnessRange) -> f64 {
        f64::from(range.span()) * self.fraction
    }

    /// True if moving from `current` to `target` clears the band.
    pub fn should_actuate(&self, current: u32, target: u32, range: BrightnessRange) -> bool {
        let delta = (i64::from(target) - i64::from(current)).unsigned_abs();
        delta as f64 > self.threshold(range)
    }
}
