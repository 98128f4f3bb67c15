//! Backlight wrapper that remembers what this process wrote.
//!
//! Cloned handles share one device behind a [`parking_lot::Mutex`]: the
//! decision loop writes through one handle, the watcher thread polls
//! through another and reports levels it did not write.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::app::ports::BacklightPort;
use crate::error::ActuatorError;

struct Inner<B> {
    device: B,
    last_written: Option<u32>,
}

pub struct TrackedBacklight<B> {
    inner: Arc<Mutex<Inner<B>>>,
    max: u32,
}

impl<B> Clone for TrackedBacklight<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            max: self.max,
        }
    }
}

impl<B: BacklightPort> TrackedBacklight<B> {
    pub fn new(device: B) -> Self {
        let max = device.max_raw();
        Self {
            inner: Arc::new(Mutex::new(Inner {
                device,
                last_written: None,
            })),
            max,
        }
    }

    /// Last level known to be on the hardware, if any.
    pub fn last_written(&self) -> Option<u32> {
        self.inner.lock().last_written
    }

    /// Read the device and report a level that differs from the last
    /// known one. The first poll only records a baseline.
    pub fn poll_external(&self) -> Result<Option<u32>, ActuatorError> {
        let mut inner = self.inner.lock();
        let current = inner.device.get_raw()?;
        let changed = match inner.last_written {
            Some(known) if known != current => Some(current),
            _ => None,
        };
        inner.last_written = Some(current);
        Ok(changed)
    }
}

impl<B: BacklightPort> BacklightPort for TrackedBacklight<B> {
    fn get_raw(&mut self) -> Result<u32, ActuatorError> {
        self.inner.lock().device.get_raw()
    }

    fn set_raw(&mut self, raw: u32) -> Result<(), ActuatorError> {
        let mut inner = self.inner.lock();
        inner.device.set_raw(raw)?;
        inner.last_written = Some(raw);
        Ok(())
    }

    fn max_raw(&self) -> u32 {
        self.max
    }
}
