//! Mock adapters for integration tests.
//!
//! Records every backlight write and history append so tests can assert
//! on the full call history without touching sysfs.

use beelight::app::events::AppEvent;
use beelight::app::ports::{BacklightPort, EventSink, HistoryPort, SensorPort};
use beelight::app::service::BrightnessService;
use beelight::config::SystemConfig;
use beelight::control::BrightnessRange;
use beelight::error::{ActuatorError, HistoryError, SensorError};
use beelight::model::{AdaptiveBinModel, DataPoint, Daylight, ModelConfig};
use chrono::FixedOffset;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

// ── Fixtures ──────────────────────────────────────────────────

/// 1970-01-02T12:00:00Z
pub const NOON: i64 = 36 * 3600;

/// Four bins over `[0, 1000)`, no ramp delay.
pub fn test_config() -> SystemConfig {
    SystemConfig {
        ambient_min: 0,
        ambient_max: 1000,
        bin_count: 4,
        transition_duration_ms: 0,
        ..SystemConfig::default()
    }
}

/// Service over `[0, 24000]` whose day/night window is evaluated in UTC,
/// created at [`NOON`].
pub fn test_service(config: &SystemConfig) -> BrightnessService {
    let range = BrightnessRange::new(0, 24_000).unwrap();
    let model_config = ModelConfig {
        daylight: Daylight {
            start_hour: config.day_start_hour,
            end_hour: config.day_end_hour,
            offset: FixedOffset::east_opt(0),
        },
        ..ModelConfig::from_config(config)
    };
    BrightnessService::with_model(config, AdaptiveBinModel::new(model_config, range), NOON)
}

// ── MockHardware ──────────────────────────────────────────────

/// Sensor and backlight in one, like the service's `hw` parameter.
pub struct MockHardware {
    pub ambient: u32,
    pub level: u32,
    pub max: u32,
    pub writes: Vec<u32>,
    pub sensor_reads: usize,
    pub fail_sensor: bool,
    pub fail_backlight_read: bool,
    /// Fail the write with this index (0-based, counted over all writes).
    pub fail_write_at: Option<usize>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new(ambient: u32, level: u32) -> Self {
        Self {
            ambient,
            level,
            max: 24_000,
            writes: Vec::new(),
            sensor_reads: 0,
            fail_sensor: false,
            fail_backlight_read: false,
            fail_write_at: None,
        }
    }

    pub fn last_write(&self) -> Option<u32> {
        self.writes.last().copied()
    }
}

impl SensorPort for MockHardware {
    fn read_ambient(&mut self) -> Result<u32, SensorError> {
        self.sensor_reads += 1;
        if self.fail_sensor {
            return Err(SensorError::ReadFailed("mock sensor unplugged".into()));
        }
        Ok(self.ambient)
    }
}

impl BacklightPort for MockHardware {
    fn get_raw(&mut self) -> Result<u32, ActuatorError> {
        if self.fail_backlight_read {
            return Err(ActuatorError::ReadFailed("mock".into()));
        }
        Ok(self.level)
    }

    fn set_raw(&mut self, raw: u32) -> Result<(), ActuatorError> {
        if self.fail_write_at == Some(self.writes.len()) {
            return Err(ActuatorError::WriteFailed {
                value: raw,
                reason: "mock EIO".into(),
            });
        }
        self.writes.push(raw);
        self.level = raw;
        Ok(())
    }

    fn max_raw(&self) -> u32 {
        self.max
    }
}

// ── Shared panel ──────────────────────────────────────────────

/// Backlight whose level can be changed behind the controller's back.
#[derive(Clone)]
pub struct SharedPanel {
    pub level: Arc<AtomicU32>,
}

#[allow(dead_code)]
impl SharedPanel {
    pub fn new(level: u32) -> Self {
        Self {
            level: Arc::new(AtomicU32::new(level)),
        }
    }

    pub fn set_by_other_agent(&self, raw: u32) {
        self.level.store(raw, Ordering::SeqCst);
    }

    pub fn get(&self) -> u32 {
        self.level.load(Ordering::SeqCst)
    }
}

impl BacklightPort for SharedPanel {
    fn get_raw(&mut self) -> Result<u32, ActuatorError> {
        Ok(self.get())
    }

    fn set_raw(&mut self, raw: u32) -> Result<(), ActuatorError> {
        self.level.store(raw, Ordering::SeqCst);
        Ok(())
    }

    fn max_raw(&self) -> u32 {
        24_000
    }
}

/// Sensor returning a fixed value.
pub struct FixedSensor(pub u32);

impl SensorPort for FixedSensor {
    fn read_ambient(&mut self) -> Result<u32, SensorError> {
        Ok(self.0)
    }
}

// ── MemoryHistory ─────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryHistory {
    pub points: Vec<DataPoint>,
    pub fail_append: bool,
}

#[allow(dead_code)]
impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_points(points: Vec<DataPoint>) -> Self {
        Self {
            points,
            fail_append: false,
        }
    }
}

impl HistoryPort for MemoryHistory {
    fn append(&mut self, point: &DataPoint) -> Result<(), HistoryError> {
        if self.fail_append {
            return Err(HistoryError::Io("disk full".into()));
        }
        self.points.push(*point);
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<DataPoint>, HistoryError> {
        Ok(self.points.clone())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
