//! Outbound application events.
//!
//! The [`BrightnessService`](super::service::BrightnessService) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on the
//! other side decide what to do with them.

/// Why the backlight was moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustSource {
    /// The automatic loop acted on a prediction.
    Automatic,
    /// An explicit user request through the command surface.
    Manual,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the initial mode and seed size).
    Started { auto_mode: bool, seeded_points: usize },

    /// The backlight was ramped to a new level.
    Adjusted {
        source: AdjustSource,
        ambient: u32,
        from_raw: u32,
        to_raw: u32,
        steps: usize,
    },

    /// Automatic/manual mode changed.
    ModeChanged { auto_mode: bool },

    /// Another agent changed the backlight; the value was used for training.
    ExternalChange { raw: u32, ambient: u32 },

    /// Old samples were pruned from the model.
    Pruned { removed: usize },
}
