//! Unified error types for the brightness controller.
//!
//! A single [`Error`] enum that every subsystem converts into, so the
//! decision loop and the command surface handle failures uniformly.
//! Insufficient data and rejected outliers are *not* errors; they are
//! represented as absent results or silent no-ops in the model.

use thiserror::Error;

use crate::config::ConfigError;

// ---------------------------------------------------------------------------
// Top-level controller error
// ---------------------------------------------------------------------------

/// Every fallible core operation funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The ambient-light sensor could not be read.
    #[error("sensor: {0}")]
    Sensor(#[from] SensorError),
    /// The backlight could not be read or written.
    #[error("actuator: {0}")]
    Actuator(#[from] ActuatorError),
    /// A brightness ramp was refused or aborted.
    #[error("transition: {0}")]
    Transition(#[from] TransitionError),
    /// The history store failed.
    #[error("history: {0}")]
    History(#[from] HistoryError),
    /// Configuration is invalid or could not be loaded.
    #[error("config: {0}")]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SensorError {
    /// No ambient-light sensor could be located.
    #[error("no ambient light sensor found")]
    NotFound,
    /// The sensor node could not be read.
    #[error("read failed: {0}")]
    ReadFailed(String),
    /// The sensor returned something that is not a non-negative integer.
    #[error("malformed reading: {0:?}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActuatorError {
    /// No backlight device could be located.
    #[error("no backlight device found")]
    NotFound,
    /// Reading the current brightness failed.
    #[error("read failed: {0}")]
    ReadFailed(String),
    /// Writing a brightness value failed.
    #[error("write of {value} failed: {reason}")]
    WriteFailed { value: u32, reason: String },
    /// The device returned an unparsable value.
    #[error("malformed value: {0:?}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// Transition errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The requested target lies outside the configured raw range.
    #[error("target {target} outside [{min}, {max}]")]
    TargetOutOfRange { target: u32, min: u32, max: u32 },
    /// An intermediate write failed; the backlight holds `last_written`.
    #[error("ramp aborted after {steps_written} steps: {source}")]
    Aborted {
        steps_written: usize,
        last_written: Option<u32>,
        #[source]
        source: ActuatorError,
    },
}

// ---------------------------------------------------------------------------
// History errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// The backing file could not be opened, read or written.
    #[error("I/O error: {0}")]
    Io(String),
    /// A record could not be encoded.
    #[error("encode failed: {0}")]
    Encode(String),
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Controller-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
