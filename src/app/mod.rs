//! Application core: decision logic, zero direct I/O.
//!
//! This module contains the rules of the brightness controller: the
//! automatic cycle, manual and external adjustments, mode switching and
//! the command surface. All interaction with hardware and storage
//! happens through **port traits** defined in [`ports`], keeping this
//! layer fully testable without a real backlight.

pub mod commands;
pub mod events;
pub mod external;
pub mod ports;
pub mod service;
