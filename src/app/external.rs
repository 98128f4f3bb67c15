//! Bounded queue of backlight changes made by other agents.
//!
//! The watcher thread pushes, the automatic loop drains everything before
//! each prediction. A full queue drops the newest change.

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// A backlight level observed on the hardware that this process did not write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExternalChange {
    pub raw: u32,
    /// Unix time of the observation, seconds.
    pub observed_at: i64,
}

/// Cloneable handle; all clones share one channel.
#[derive(Debug, Clone)]
pub struct ExternalChanges {
    tx: Sender<ExternalChange>,
    rx: Receiver<ExternalChange>,
    dropped: Arc<AtomicU64>,
}

impl ExternalChanges {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self {
            tx,
            rx,
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Enqueue without blocking. Returns `false` if the change was dropped.
    pub fn notify(&self, change: ExternalChange) -> bool {
        match self.tx.try_send(change) {
            Ok(()) => true,
            Err(TrySendError::Full(c) | TrySendError::Disconnected(c)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                log::debug!("external change queue full, dropping raw={}", c.raw);
                false
            }
        }
    }

    /// Take everything currently queued, oldest first.
    pub fn drain(&self) -> Vec<ExternalChange> {
        self.rx.try_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Changes lost to a full queue since creation.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
