//! Hardware adapter: bridges a light sensor and a backlight to the
//! domain port traits.
//!
//! The service wants a single `hw` value implementing both
//! [`SensorPort`] and [`BacklightPort`]; this adapter pairs any two
//! implementations and delegates.

use crate::app::ports::{BacklightPort, SensorPort};
use crate::error::{ActuatorError, SensorError};

/// Concrete adapter that combines a sensor and a backlight behind the ports.
pub struct HardwareAdapter<S, B> {
    sensor: S,
    backlight: B,
}

impl<S, B> HardwareAdapter<S, B> {
    pub fn new(sensor: S, backlight: B) -> Self {
        Self { sensor, backlight }
    }

    pub fn backlight(&self) -> &B {
        &self.backlight
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<S: SensorPort, B> SensorPort for HardwareAdapter<S, B> {
    fn read_ambient(&mut self) -> Result<u32, SensorError> {
        self.sensor.read_ambient()
    }
}

// ── BacklightPort implementation ──────────────────────────────

impl<S, B: BacklightPort> BacklightPort for HardwareAdapter<S, B> {
    fn get_raw(&mut self) -> Result<u32, ActuatorError> {
        self.backlight.get_raw()
    }

    fn set_raw(&mut self, raw: u32) -> Result<(), ActuatorError> {
        self.backlight.set_raw(raw)
    }

    fn max_raw(&self) -> u32 {
        self.backlight.max_raw()
    }
}
