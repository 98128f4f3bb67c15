//! Beelight library.
//!
//! Adaptive ambient-light backlight control: a per-user statistical model
//! of preferred brightness, the decision loop that acts on it, and the
//! perceptual ramp that moves the hardware. Exposes every module for
//! integration testing; the binary in `main.rs` only wires adapters.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod control;
pub mod daemon;
pub mod error;
pub mod ipc;
pub mod model;
