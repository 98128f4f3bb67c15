//! Application service: the hexagonal core.
//!
//! [`BrightnessService`] owns the adaptive model, the controller state
//! and the actuation primitives. All I/O flows through port traits
//! injected at call sites, making the whole decision loop testable with
//! mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │      BrightnessService        │
//! BacklightPort ◀─│ model · hysteresis · ramp     │──▶ HistoryPort
//!                 └──────────────────────────────┘
//! ```

use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::control::transition::TransitionStepper;
use crate::control::{BrightnessRange, HysteresisGate};
use crate::error::Result;
use crate::model::{AdaptiveBinModel, DataPoint, ModelConfig, TrainOutcome};

use super::commands::{Command, Response, Stats};
use super::events::{AdjustSource, AppEvent};
use super::external::ExternalChanges;
use super::ports::{BacklightPort, EventSink, HistoryPort, SensorPort};

// ───────────────────────────────────────────────────────────────
// Controller state
// ───────────────────────────────────────────────────────────────

/// Mode and activity bookkeeping of the decision loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    pub auto_mode: bool,
    /// Unix time of the last manual or external adjustment. Automatic
    /// cycles never touch it.
    pub last_activity_time: i64,
    /// Seconds after the last activity during which the user counts as
    /// active.
    pub activity_timeout: i64,
}

impl ControllerState {
    pub fn is_active(&self, now: i64) -> bool {
        now - self.last_activity_time < self.activity_timeout
    }
}

/// Result of one [`BrightnessService::automatic_cycle`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CycleOutcome {
    /// Manual mode; nothing was read or written.
    Disabled,
    /// Target within the hysteresis band; hardware untouched.
    Held { ambient: u32, current: u32, target: u32 },
    /// The backlight was ramped.
    Adjusted {
        ambient: u32,
        from: u32,
        to: u32,
        steps: usize,
    },
}

// ───────────────────────────────────────────────────────────────
// BrightnessService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct BrightnessService {
    model: AdaptiveBinModel,
    stepper: TransitionStepper,
    gate: HysteresisGate,
    range: BrightnessRange,
    state: ControllerState,
}

impl BrightnessService {
    /// Construct the service from configuration and the resolved raw range.
    ///
    /// `now` seeds `last_activity_time`, so the user counts as active
    /// right after startup.
    pub fn new(config: &SystemConfig, range: BrightnessRange, now: i64) -> Self {
        let model = AdaptiveBinModel::new(ModelConfig::from_config(config), range);
        Self::with_model(config, model, now)
    }

    /// Like [`new`](Self::new) with a pre-built model. The model's range
    /// becomes the service's range.
    pub fn with_model(config: &SystemConfig, model: AdaptiveBinModel, now: i64) -> Self {
        Self {
            range: model.range(),
            model,
            stepper: TransitionStepper::from_config(config),
            gate: HysteresisGate::from_config(config),
            state: ControllerState {
                auto_mode: config.start_in_auto,
                last_activity_time: now,
                activity_timeout: config.activity_timeout_secs as i64,
            },
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Warm the model up from persisted history. Returns the number of
    /// points the model accepted.
    pub fn seed(&mut self, history: &impl HistoryPort, now: i64) -> Result<usize> {
        let points = history.read_all()?;
        let accepted = self.model.seed(&points, now);
        info!(
            "Model seeded: {} of {} historical points accepted, bins {:?}",
            accepted,
            points.len(),
            self.model.bin_bounds()
        );
        Ok(accepted)
    }

    pub fn start(&mut self, seeded_points: usize, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started {
            auto_mode: self.state.auto_mode,
            seeded_points,
        });
        info!(
            "BrightnessService started (auto={}, range {}..={})",
            self.state.auto_mode,
            self.range.min(),
            self.range.max()
        );
    }

    // ── Decision loop ─────────────────────────────────────────

    pub fn is_active(&self, now: i64) -> bool {
        self.state.is_active(now)
    }

    /// Raw target for `ambient`: the model's prediction, or the
    /// closed-form mapping when no bin covers the reading.
    pub fn target_for(&mut self, ambient: u32, now: i64, is_active: bool) -> u32 {
        let percent = self
            .model
            .predict(ambient, now, is_active)
            .unwrap_or_else(|| self.model.closed_form_percent(ambient));
        self.range.to_raw(percent)
    }

    /// One pass of the automatic loop.
    ///
    /// The `hw` parameter satisfies **both** [`SensorPort`] and
    /// [`BacklightPort`]. A read failure aborts the cycle before any
    /// state changes.
    pub fn automatic_cycle(
        &mut self,
        now: i64,
        hw: &mut (impl SensorPort + BacklightPort),
        store: &mut impl HistoryPort,
        sink: &mut impl EventSink,
    ) -> Result<CycleOutcome> {
        if !self.state.auto_mode {
            return Ok(CycleOutcome::Disabled);
        }

        let ambient = hw.read_ambient()?;
        let current = hw.get_raw()?;
        let active = self.is_active(now);
        let target = self.target_for(ambient, now, active);

        if !self.gate.should_actuate(current, target, self.range) {
            debug!("Cycle held: ambient={ambient} current={current} target={target}");
            return Ok(CycleOutcome::Held {
                ambient,
                current,
                target,
            });
        }

        let steps = self.stepper.apply(hw, current, target, self.range)?;
        self.record(store, &DataPoint::automatic(now, ambient, target));
        sink.emit(&AppEvent::Adjusted {
            source: AdjustSource::Automatic,
            ambient,
            from_raw: current,
            to_raw: target,
            steps,
        });
        Ok(CycleOutcome::Adjusted {
            ambient,
            from: current,
            to: target,
            steps,
        })
    }

    /// Learn from a level another agent set on the hardware. Does not
    /// actuate: in auto mode the next cycle reconciles, in manual mode
    /// the value stands.
    pub fn external_change_observed(
        &mut self,
        new_raw: u32,
        ambient: u32,
        observed_at: i64,
        store: &mut impl HistoryPort,
        sink: &mut impl EventSink,
    ) -> TrainOutcome {
        self.state.last_activity_time = self.state.last_activity_time.max(observed_at);
        let point = DataPoint::manual(observed_at, ambient, new_raw);
        self.record(store, &point);
        let outcome = self.model.train(&point, observed_at, true);
        sink.emit(&AppEvent::ExternalChange {
            raw: new_raw,
            ambient,
        });
        debug!("External change raw={new_raw} ambient={ambient}: {outcome:?}");
        outcome
    }

    /// Feed every queued external change to the model. The ambient level
    /// is read once for the whole batch; nothing is dequeued if that read
    /// fails.
    pub fn drain_external_changes(
        &mut self,
        queue: &ExternalChanges,
        hw: &mut impl SensorPort,
        store: &mut impl HistoryPort,
        sink: &mut impl EventSink,
    ) -> Result<usize> {
        if queue.is_empty() {
            return Ok(0);
        }
        let ambient = hw.read_ambient()?;
        let changes = queue.drain();
        for change in &changes {
            self.external_change_observed(change.raw, ambient, change.observed_at, store, sink);
        }
        Ok(changes.len())
    }

    /// Apply a user-chosen raw level immediately, bypassing hysteresis,
    /// and train on it. Returns the level actually written.
    pub fn manual_adjustment(
        &mut self,
        target_raw: u32,
        now: i64,
        hw: &mut (impl SensorPort + BacklightPort),
        store: &mut impl HistoryPort,
        sink: &mut impl EventSink,
    ) -> Result<u32> {
        let target = self.range.clamp(target_raw);
        let ambient = hw.read_ambient()?;
        let current = hw.get_raw()?;
        let steps = self.stepper.apply(hw, current, target, self.range)?;

        self.state.last_activity_time = now;
        let point = DataPoint::manual(now, ambient, target);
        self.record(store, &point);
        let outcome = self.model.train(&point, now, true);
        debug!("Manual adjustment trained: {outcome:?}");

        sink.emit(&AppEvent::Adjusted {
            source: AdjustSource::Manual,
            ambient,
            from_raw: current,
            to_raw: target,
            steps,
        });
        Ok(target)
    }

    // ── Mode ──────────────────────────────────────────────────

    /// Switch mode. Entering auto runs one cycle right away; a failure of
    /// that cycle is logged and does not undo the mode change.
    pub fn set_auto_mode(
        &mut self,
        enabled: bool,
        now: i64,
        hw: &mut (impl SensorPort + BacklightPort),
        store: &mut impl HistoryPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if self.state.auto_mode == enabled {
            return enabled;
        }
        self.state.auto_mode = enabled;
        sink.emit(&AppEvent::ModeChanged { auto_mode: enabled });
        info!("Auto mode {}", if enabled { "enabled" } else { "disabled" });

        if enabled {
            if let Err(e) = self.automatic_cycle(now, hw, store, sink) {
                warn!("Initial automatic cycle failed: {e}");
            }
        }
        enabled
    }

    pub fn toggle_auto(
        &mut self,
        now: i64,
        hw: &mut (impl SensorPort + BacklightPort),
        store: &mut impl HistoryPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let next = !self.state.auto_mode;
        self.set_auto_mode(next, now, hw, store, sink)
    }

    // ── Exposed operations ────────────────────────────────────

    /// Manual adjustment expressed as a percentage of the range.
    pub fn set_brightness(
        &mut self,
        percent: f64,
        now: i64,
        hw: &mut (impl SensorPort + BacklightPort),
        store: &mut impl HistoryPort,
        sink: &mut impl EventSink,
    ) -> Result<u32> {
        let raw = self.range.to_raw(percent);
        self.manual_adjustment(raw, now, hw, store, sink)
    }

    pub fn get_brightness(&self, hw: &mut impl BacklightPort) -> Result<f64> {
        let raw = hw.get_raw()?;
        Ok(self.range.to_percent(f64::from(raw)).clamp(0.0, 100.0))
    }

    pub fn stats(&self, hw: &mut (impl SensorPort + BacklightPort)) -> Result<Stats> {
        Ok(Stats {
            ambient: hw.read_ambient()?,
            brightness_percent: self.get_brightness(hw)?,
            auto_mode: self.state.auto_mode,
        })
    }

    /// Process a command from the outside world. Never fails: errors are
    /// reported in the response.
    pub fn handle_command(
        &mut self,
        cmd: Command,
        now: i64,
        hw: &mut (impl SensorPort + BacklightPort),
        store: &mut impl HistoryPort,
        sink: &mut impl EventSink,
    ) -> Response {
        let result = match cmd {
            Command::SetBrightness { percent } => self
                .set_brightness(percent, now, hw, store, sink)
                .map(|_| Response::Ok),
            Command::GetBrightness => self
                .get_brightness(hw)
                .map(|percent| Response::Brightness { percent }),
            Command::ToggleAuto => Ok(Response::AutoMode {
                enabled: self.toggle_auto(now, hw, store, sink),
            }),
            Command::SetAuto { enabled } => Ok(Response::AutoMode {
                enabled: self.set_auto_mode(enabled, now, hw, store, sink),
            }),
            Command::GetStats => self.stats(hw).map(Response::Stats),
        };
        result.unwrap_or_else(|e| {
            warn!("Command failed: {e}");
            Response::Error {
                message: e.to_string(),
            }
        })
    }

    /// Prune expired samples. Returns the number removed.
    pub fn maintenance(&mut self, now: i64, sink: &mut impl EventSink) -> usize {
        let removed = self.model.cleanup(now);
        if removed > 0 {
            sink.emit(&AppEvent::Pruned { removed });
        }
        removed
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn auto_mode(&self) -> bool {
        self.state.auto_mode
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn model(&self) -> &AdaptiveBinModel {
        &self.model
    }

    pub fn range(&self) -> BrightnessRange {
        self.range
    }

    // ── Internal ──────────────────────────────────────────────

    /// Append to history. The hardware has already moved, so a failure
    /// here is only logged.
    fn record(&self, store: &mut impl HistoryPort, point: &DataPoint) {
        if let Err(e) = store.append(point) {
            warn!("History append failed: {e}");
        }
    }
}
