//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ BrightnessService (domain)
//! ```
//!
//! Driven adapters (light sensor, backlight, history file, event sinks)
//! implement these traits. The [`BrightnessService`](super::service::BrightnessService)
//! consumes them via generics, so the decision loop never touches sysfs
//! or the filesystem directly.

use crate::error::{ActuatorError, HistoryError, SensorError};
use crate::model::DataPoint;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain ambient light.
pub trait SensorPort {
    /// Current illuminance in raw sensor units.
    fn read_ambient(&mut self) -> Result<u32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Backlight port (driven adapter: domain ↔ hardware)
// ───────────────────────────────────────────────────────────────

/// The raw brightness control.
pub trait BacklightPort {
    /// Current raw level as reported by the device.
    fn get_raw(&mut self) -> Result<u32, ActuatorError>;

    /// Write a raw level. Callers clamp beforehand; implementations
    /// perform exactly one write.
    fn set_raw(&mut self, raw: u32) -> Result<(), ActuatorError>;

    /// Device maximum, fixed for the lifetime of the adapter.
    fn max_raw(&self) -> u32;
}

// ───────────────────────────────────────────────────────────────
// History port (driven adapter: domain ↔ persistent record)
// ───────────────────────────────────────────────────────────────

/// Append-only store of [`DataPoint`]s.
///
/// Records are never rewritten. Readers must tolerate fields they do not
/// know about so the schema can grow with new optional fields.
pub trait HistoryPort {
    fn append(&mut self, point: &DataPoint) -> Result<(), HistoryError>;

    /// Every stored record, oldest first.
    fn read_all(&self) -> Result<Vec<DataPoint>, HistoryError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Emission is fire-and-forget: a sink must never
/// block or fail the control path.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
