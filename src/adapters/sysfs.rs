//! Linux sysfs adapters.
//!
//! - [`SysfsBacklight`] drives `/sys/class/backlight/<device>/brightness`.
//! - [`IioLightSensor`] reads an IIO illuminance channel.
//!
//! Both take their root directory as a parameter so tests can point them
//! at a temporary tree.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::{BacklightPort, SensorPort};
use crate::error::{ActuatorError, SensorError};

pub const BACKLIGHT_CLASS_DIR: &str = "/sys/class/backlight";
pub const IIO_DEVICES_DIR: &str = "/sys/bus/iio/devices";

const ILLUMINANCE_CHANNELS: [&str; 2] = ["in_illuminance_raw", "in_illuminance_input"];

/// Sorted subdirectories of `dir`, empty if it cannot be listed.
fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .map(|rd| rd.filter_map(|e| e.ok().map(|e| e.path())).collect())
        .unwrap_or_default();
    entries.sort();
    entries
}

// ───────────────────────────────────────────────────────────────
// Backlight
// ───────────────────────────────────────────────────────────────

pub struct SysfsBacklight {
    dir: PathBuf,
    max: u32,
}

impl SysfsBacklight {
    /// Open a device directory containing `brightness` and `max_brightness`.
    pub fn open(dir: &Path) -> Result<Self, ActuatorError> {
        let max = read_u32(&dir.join("max_brightness"))?;
        info!("Backlight {} (max {})", dir.display(), max);
        Ok(Self {
            dir: dir.to_path_buf(),
            max,
        })
    }

    /// First device under `class_dir` in name order.
    pub fn discover(class_dir: &Path) -> Result<Self, ActuatorError> {
        let dir = sorted_entries(class_dir)
            .into_iter()
            .find(|p| p.join("max_brightness").is_file())
            .ok_or(ActuatorError::NotFound)?;
        Self::open(&dir)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl BacklightPort for SysfsBacklight {
    fn get_raw(&mut self) -> Result<u32, ActuatorError> {
        read_u32(&self.dir.join("brightness"))
    }

    fn set_raw(&mut self, raw: u32) -> Result<(), ActuatorError> {
        let value = raw.min(self.max);
        fs::write(self.dir.join("brightness"), value.to_string()).map_err(|e| {
            ActuatorError::WriteFailed {
                value,
                reason: e.to_string(),
            }
        })
    }

    fn max_raw(&self) -> u32 {
        self.max
    }
}

fn read_u32(path: &Path) -> Result<u32, ActuatorError> {
    let text = fs::read_to_string(path)
        .map_err(|e| ActuatorError::ReadFailed(format!("{}: {e}", path.display())))?;
    let trimmed = text.trim();
    trimmed
        .parse()
        .map_err(|_| ActuatorError::Malformed(trimmed.to_string()))
}

// ───────────────────────────────────────────────────────────────
// Ambient light sensor
// ───────────────────────────────────────────────────────────────

pub struct IioLightSensor {
    path: PathBuf,
}

impl IioLightSensor {
    /// Use a specific channel file.
    pub fn open(path: &Path) -> Result<Self, SensorError> {
        if !path.is_file() {
            return Err(SensorError::NotFound);
        }
        info!("Ambient light sensor {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// First `iio:device*` under `devices_dir` exposing an illuminance
    /// channel, preferring `in_illuminance_raw`.
    pub fn discover(devices_dir: &Path) -> Result<Self, SensorError> {
        sorted_entries(devices_dir)
            .iter()
            .filter(|dev| {
                dev.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("iio:device"))
            })
            .find_map(|dev| {
                ILLUMINANCE_CHANNELS
                    .iter()
                    .map(|c| dev.join(c))
                    .find(|p| p.is_file())
            })
            .ok_or(SensorError::NotFound)
            .and_then(|p| Self::open(&p))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SensorPort for IioLightSensor {
    fn read_ambient(&mut self) -> Result<u32, SensorError> {
        let text = fs::read_to_string(&self.path)
            .map_err(|e| SensorError::ReadFailed(format!("{}: {e}", self.path.display())))?;
        parse_illuminance(text.trim())
    }
}

/// Integer channels parse directly; processed channels may be decimal.
fn parse_illuminance(text: &str) -> Result<u32, SensorError> {
    if let Ok(v) = text.parse::<u32>() {
        return Ok(v);
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => Ok(v.round().min(f64::from(u32::MAX)) as u32),
        _ => Err(SensorError::Malformed(text.to_string())),
    }
}
