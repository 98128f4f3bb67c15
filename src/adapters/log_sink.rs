//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (rendered by whatever subscriber the binary installs).

use log::info;

use crate::app::events::{AdjustSource, AppEvent};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as a single line.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                auto_mode,
                seeded_points,
            } => {
                info!("START | auto={} | seeded={}", auto_mode, seeded_points);
            }
            AppEvent::Adjusted {
                source,
                ambient,
                from_raw,
                to_raw,
                steps,
            } => {
                let source = match source {
                    AdjustSource::Automatic => "auto",
                    AdjustSource::Manual => "manual",
                };
                info!(
                    "ADJUST | {} | ambient={} | {} -> {} in {} steps",
                    source, ambient, from_raw, to_raw, steps
                );
            }
            AppEvent::ModeChanged { auto_mode } => {
                info!("MODE | auto={}", auto_mode);
            }
            AppEvent::ExternalChange { raw, ambient } => {
                info!("TRAIN | external raw={} ambient={}", raw, ambient);
            }
            AppEvent::Pruned { removed } => {
                info!("PRUNE | removed={}", removed);
            }
        }
    }
}
