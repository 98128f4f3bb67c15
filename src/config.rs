//! System configuration parameters
//!
//! All tunable parameters for the brightness controller. Values are read
//! from a TOML file; every field has a default so a partial (or absent)
//! file is valid.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Brightness range ---
    /// Lowest raw backlight value the controller will ever write
    pub min_brightness_raw: u32,
    /// Highest raw backlight value; `None` uses the device maximum
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_brightness_raw: Option<u32>,

    // --- Model ---
    /// Lower bound of the ambient-light domain (raw sensor units)
    pub ambient_min: u32,
    /// Upper bound of the ambient-light domain (raw sensor units)
    pub ambient_max: u32,
    /// Number of adaptive bins partitioning the ambient domain
    pub bin_count: usize,
    /// Blend coefficient for day/night phase similarity
    pub time_weight: f64,
    /// Blend coefficient for sample recency
    pub recency_weight: f64,
    /// Blend coefficient for user activity
    pub activity_weight: f64,
    /// First hour (0-23) considered daytime
    pub day_start_hour: u8,
    /// First hour (0-23) no longer considered daytime
    pub day_end_hour: u8,

    // --- Decision loop ---
    /// Seconds after the last manual input during which the user counts as active
    pub activity_timeout_secs: u64,
    /// Fraction of the raw range a target must differ by before actuation
    pub hysteresis_fraction: f64,
    /// Start the daemon in automatic mode
    pub start_in_auto: bool,

    // --- Transition ---
    /// Total duration of a brightness ramp (milliseconds)
    pub transition_duration_ms: u64,
    /// Base number of steps per ramp
    pub transition_steps: usize,
    /// Largest log2-domain distance covered by a single step
    pub max_log_step: f64,

    // --- Timing ---
    /// Automatic loop interval while in automatic mode (milliseconds)
    pub auto_interval_ms: u64,
    /// Automatic loop interval while in manual mode (milliseconds)
    pub manual_interval_ms: u64,
    /// Backlight polling interval for out-of-band changes (milliseconds)
    pub watch_interval_ms: u64,
    /// Capacity of the out-of-band change queue
    pub external_queue_capacity: usize,
    /// Interval between sample-retention sweeps (seconds)
    pub cleanup_interval_secs: u64,

    // --- Paths ---
    /// Backlight class directory, e.g. `/sys/class/backlight/intel_backlight`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backlight_dir: Option<PathBuf>,
    /// Illuminance node, e.g. `/sys/bus/iio/devices/iio:device0/in_illuminance_raw`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambient_sensor_path: Option<PathBuf>,
    /// History file (CSV)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history_path: Option<PathBuf>,
    /// Command socket
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket_path: Option<PathBuf>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Brightness range
            min_brightness_raw: 1,
            max_brightness_raw: None,

            // Model
            ambient_min: 0,
            ambient_max: 2000,
            bin_count: 10,
            time_weight: 0.3,
            recency_weight: 0.4,
            activity_weight: 0.3,
            day_start_hour: 6,
            day_end_hour: 18,

            // Decision loop
            activity_timeout_secs: 300,
            hysteresis_fraction: 0.05,
            start_in_auto: true,

            // Transition
            transition_duration_ms: 200,
            transition_steps: 30,
            max_log_step: 0.1,

            // Timing
            auto_interval_ms: 3000,
            manual_interval_ms: 15_000,
            watch_interval_ms: 1000,
            external_queue_capacity: 16,
            cleanup_interval_secs: 3600,

            // Paths
            backlight_dir: None,
            ambient_sensor_path: None,
            history_path: None,
            socket_path: None,
        }
    }
}

impl SystemConfig {
    /// Parse the config file at `path`.
    ///
    /// A missing file yields [`SystemConfig::default()`]; a file that
    /// exists but does not parse or validate is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::info!("No config at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e.to_string())),
        };
        Self::from_toml(&contents)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let cfg: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Corrupted(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Render an example configuration file.
    pub fn example_toml() -> String {
        toml::to_string(&Self::default()).unwrap_or_default()
    }

    /// Range-check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(max) = self.max_brightness_raw {
            if max <= self.min_brightness_raw {
                return Err(ConfigError::ValidationFailed(
                    "max_brightness_raw must be > min_brightness_raw",
                ));
            }
        }
        if self.ambient_min >= self.ambient_max {
            return Err(ConfigError::ValidationFailed(
                "ambient_min must be < ambient_max",
            ));
        }
        if self.bin_count == 0 || self.bin_count > 256 {
            return Err(ConfigError::ValidationFailed("bin_count must be 1–256"));
        }
        if self.bin_count as u64 > u64::from(self.ambient_max - self.ambient_min) {
            return Err(ConfigError::ValidationFailed(
                "bin_count must not exceed the ambient domain width",
            ));
        }
        let weights = [self.time_weight, self.recency_weight, self.activity_weight];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::ValidationFailed(
                "blend weights must be finite and >= 0",
            ));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(ConfigError::ValidationFailed(
                "at least one blend weight must be > 0",
            ));
        }
        if self.day_start_hour > 23 || self.day_end_hour > 23 {
            return Err(ConfigError::ValidationFailed("day hours must be 0–23"));
        }
        if self.day_start_hour == self.day_end_hour {
            return Err(ConfigError::ValidationFailed(
                "day_start_hour and day_end_hour must differ",
            ));
        }
        if self.activity_timeout_secs == 0 {
            return Err(ConfigError::ValidationFailed(
                "activity_timeout_secs must be > 0",
            ));
        }
        if !(self.hysteresis_fraction > 0.0 && self.hysteresis_fraction < 1.0) {
            return Err(ConfigError::ValidationFailed(
                "hysteresis_fraction must be in (0, 1)",
            ));
        }
        if !(1..=1000).contains(&self.transition_steps) {
            return Err(ConfigError::ValidationFailed(
                "transition_steps must be 1–1000",
            ));
        }
        if self.transition_duration_ms > 10_000 {
            return Err(ConfigError::ValidationFailed(
                "transition_duration_ms must be <= 10000",
            ));
        }
        if !(self.max_log_step.is_finite() && self.max_log_step > 0.0) {
            return Err(ConfigError::ValidationFailed("max_log_step must be > 0"));
        }
        if !(100..=600_000).contains(&self.auto_interval_ms)
            || !(100..=600_000).contains(&self.manual_interval_ms)
        {
            return Err(ConfigError::ValidationFailed(
                "loop intervals must be 100–600000 ms",
            ));
        }
        if !(100..=60_000).contains(&self.watch_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "watch_interval_ms must be 100–60000",
            ));
        }
        if !(1..=1024).contains(&self.external_queue_capacity) {
            return Err(ConfigError::ValidationFailed(
                "external_queue_capacity must be 1–1024",
            ));
        }
        if self.cleanup_interval_secs < 60 {
            return Err(ConfigError::ValidationFailed(
                "cleanup_interval_secs must be >= 60",
            ));
        }
        Ok(())
    }

    /// History file, falling back to `$XDG_CONFIG_HOME/beelight/brightness_data.csv`.
    pub fn resolved_history_path(&self) -> PathBuf {
        self.history_path
            .clone()
            .unwrap_or_else(|| config_dir().join("brightness_data.csv"))
    }

    /// Command socket, falling back to `$XDG_RUNTIME_DIR/beelight.sock`.
    pub fn resolved_socket_path(&self) -> PathBuf {
        self.socket_path.clone().unwrap_or_else(|| {
            std::env::var_os("XDG_RUNTIME_DIR")
                .map_or_else(std::env::temp_dir, PathBuf::from)
                .join("beelight.sock")
        })
    }
}

/// `$XDG_CONFIG_HOME/beelight`, or `~/.config/beelight`.
pub fn config_dir() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"));
    base.join("beelight")
}

/// Errors from loading or validating [`SystemConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("I/O error: {0}")]
    Io(String),
    /// The config file is not valid TOML for this schema.
    #[error("config corrupted: {0}")]
    Corrupted(String),
    /// A config field failed range validation.
    #[error("validation failed: {0}")]
    ValidationFailed(&'static str),
}
