//! Inbound commands and their responses.
//!
//! These represent requests from the outside world (CLI client, desktop
//! key bindings) that the [`BrightnessService`](super::service::BrightnessService)
//! interprets and acts upon. Both enums travel over the command socket
//! as internally tagged JSON.

use serde::{Deserialize, Serialize};

/// Commands that external clients can send into the application core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Set the backlight to a percentage (0–100) immediately.
    SetBrightness { percent: f64 },

    /// Report the current backlight level as a percentage.
    GetBrightness,

    /// Flip between automatic and manual mode.
    ToggleAuto,

    /// Force automatic mode on or off.
    SetAuto { enabled: bool },

    /// Report ambient light, brightness and mode.
    GetStats,
}

/// Replies to [`Command`]s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Brightness { percent: f64 },
    AutoMode { enabled: bool },
    Stats(Stats),
    Error { message: String },
}

/// Snapshot returned by [`Command::GetStats`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub ambient: u32,
    pub brightness_percent: f64,
    pub auto_mode: bool,
}
