//! Daemon runtime: the threads around [`BrightnessService`].
//!
//! ```text
//!  watcher thread ──ExternalChanges──▶ auto-loop thread ─┐
//!                                                        ├─▶ Mutex<Core>
//!  command socket (caller's thread) ─────────────────────┘
//! ```
//!
//! Every mutation of controller or model state happens under the single
//! [`Core`] lock, so training never interleaves with a predict/actuate
//! sequence. Ramps and file I/O run while the lock is held; later
//! requests wait.

use std::io;
use std::os::unix::net::UnixListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;

use crate::adapters::time::SystemClock;
use crate::adapters::tracked::TrackedBacklight;
use crate::app::commands::{Command, Response};
use crate::app::external::{ExternalChange, ExternalChanges};
use crate::app::ports::{BacklightPort, EventSink, HistoryPort, SensorPort};
use crate::app::service::{BrightnessService, CycleOutcome};
use crate::config::{ConfigError, SystemConfig};
use crate::control::BrightnessRange;
use crate::error::Result;
use crate::ipc;

/// Raw window from config, capped at the hardware maximum.
pub fn resolve_range(
    config: &SystemConfig,
    hw_max: u32,
) -> std::result::Result<BrightnessRange, ConfigError> {
    let max = config.max_brightness_raw.map_or(hw_max, |m| m.min(hw_max));
    BrightnessRange::new(config.min_brightness_raw, max).ok_or(ConfigError::ValidationFailed(
        "min_brightness_raw must be below the usable maximum",
    ))
}

// ───────────────────────────────────────────────────────────────
// Core: everything behind the lock
// ───────────────────────────────────────────────────────────────

pub struct Core<H, S, E> {
    pub service: BrightnessService,
    pub hw: H,
    pub store: S,
    pub sink: E,
    last_cleanup: i64,
}

impl<H, S, E> Core<H, S, E>
where
    H: SensorPort + BacklightPort,
    S: HistoryPort,
    E: EventSink,
{
    pub fn new(service: BrightnessService, hw: H, store: S, sink: E, now: i64) -> Self {
        Self {
            service,
            hw,
            store,
            sink,
            last_cleanup: now,
        }
    }

    /// One iteration of the automatic loop: fold in external changes,
    /// then run the cycle. External changes are drained in both modes.
    pub fn tick(&mut self, now: i64, queue: &ExternalChanges) -> Result<CycleOutcome> {
        if let Err(e) =
            self.service
                .drain_external_changes(queue, &mut self.hw, &mut self.store, &mut self.sink)
        {
            warn!("External changes left queued: {e}");
        }
        self.service
            .automatic_cycle(now, &mut self.hw, &mut self.store, &mut self.sink)
    }

    /// Prune the model if `interval_secs` have passed since the last run.
    pub fn maintain(&mut self, now: i64, interval_secs: i64) -> Option<usize> {
        if now - self.last_cleanup < interval_secs {
            return None;
        }
        self.last_cleanup = now;
        Some(self.service.maintenance(now, &mut self.sink))
    }

    pub fn handle(&mut self, cmd: Command, now: i64) -> Response {
        self.service
            .handle_command(cmd, now, &mut self.hw, &mut self.store, &mut self.sink)
    }
}

// ───────────────────────────────────────────────────────────────
// Threads
// ───────────────────────────────────────────────────────────────

/// Loop timings, from [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub auto_interval: Duration,
    pub manual_interval: Duration,
    pub watch_interval: Duration,
    pub cleanup_interval_secs: i64,
    pub queue_capacity: usize,
}

impl Timings {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            auto_interval: Duration::from_millis(config.auto_interval_ms),
            manual_interval: Duration::from_millis(config.manual_interval_ms),
            watch_interval: Duration::from_millis(config.watch_interval_ms),
            cleanup_interval_secs: config.cleanup_interval_secs as i64,
            queue_capacity: config.external_queue_capacity,
        }
    }
}

fn spawn_auto_loop<H, S, E>(
    core: Arc<Mutex<Core<H, S, E>>>,
    queue: ExternalChanges,
    timings: Timings,
) -> io::Result<thread::JoinHandle<()>>
where
    H: SensorPort + BacklightPort + Send + 'static,
    S: HistoryPort + Send + 'static,
    E: EventSink + Send + 'static,
{
    thread::Builder::new()
        .name("auto-loop".into())
        .spawn(move || {
            let clock = SystemClock;
            loop {
                let auto = {
                    let mut guard = core.lock();
                    let now = clock.now();
                    match guard.tick(now, &queue) {
                        Ok(outcome) => debug!("Cycle: {outcome:?}"),
                        Err(e) => warn!("Automatic cycle aborted: {e}"),
                    }
                    guard.maintain(now, timings.cleanup_interval_secs);
                    guard.service.auto_mode()
                };
                thread::sleep(if auto {
                    timings.auto_interval
                } else {
                    timings.manual_interval
                });
            }
        })
}

fn spawn_watcher<B>(
    backlight: TrackedBacklight<B>,
    queue: ExternalChanges,
    interval: Duration,
) -> io::Result<thread::JoinHandle<()>>
where
    B: BacklightPort + Send + 'static,
{
    thread::Builder::new()
        .name("backlight-watch".into())
        .spawn(move || {
            let clock = SystemClock;
            loop {
                match backlight.poll_external() {
                    Ok(Some(raw)) => {
                        debug!("External backlight change to {raw}");
                        queue.notify(ExternalChange {
                            raw,
                            observed_at: clock.now(),
                        });
                    }
                    Ok(None) => {}
                    Err(e) => debug!("Backlight poll failed: {e}"),
                }
                thread::sleep(interval);
            }
        })
}

/// Start the background threads and serve commands on `listener` from
/// the calling thread. Only returns if a thread cannot be spawned.
pub fn run<H, S, E, B>(
    core: Core<H, S, E>,
    watched: TrackedBacklight<B>,
    listener: &UnixListener,
    timings: Timings,
) -> io::Result<()>
where
    H: SensorPort + BacklightPort + Send + 'static,
    S: HistoryPort + Send + 'static,
    E: EventSink + Send + 'static,
    B: BacklightPort + Send + 'static,
{
    let core = Arc::new(Mutex::new(core));
    let queue = ExternalChanges::new(timings.queue_capacity);

    spawn_watcher(watched, queue.clone(), timings.watch_interval)?;
    spawn_auto_loop(Arc::clone(&core), queue, timings)?;
    info!("Daemon running");

    let clock = SystemClock;
    ipc::serve(listener, |cmd| core.lock().handle(cmd, clock.now()));
    Ok(())
}
