//! Log-domain brightness ramp.
//!
//! Perceived brightness is roughly logarithmic in backlight level, so the
//! ramp is spaced evenly in `log2(raw + 1)` rather than in raw units. The
//! `+ 1` keeps a zero endpoint finite.
//!
//! ```text
//!  raw ──log2(v+1)──▶ [a ─── a+δ ─── a+2δ ─── … ─── b] ──2^x−1──▶ writes
//! ```

use std::thread;
use std::time::Duration;

use crate::app::ports::BacklightPort;
use crate::config::SystemConfig;
use crate::error::TransitionError;

use super::BrightnessRange;

/// Upper bound on the number of writes in a single ramp.
pub const MAX_RAMP_STEPS: usize = 240;

/// Drives a backlight from one raw level to another.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionStepper {
    duration: Duration,
    steps: usize,
    max_log_step: f64,
}

impl TransitionStepper {
    pub fn new(duration: Duration, steps: usize, max_log_step: f64) -> Self {
        Self {
            duration,
            steps: steps.max(1),
            max_log_step,
        }
    }

    pub fn from_config(config: &SystemConfig) -> Self {
        Self::new(
            Duration::from_millis(config.transition_duration_ms),
            config.transition_steps,
            config.max_log_step,
        )
    }

    /// Number of steps for a ramp between two log-domain endpoints.
    ///
    /// The configured count is a floor; large jumps get more steps so no
    /// single step exceeds `max_log_step`.
    fn step_count(&self, from: f64, to: f64) -> usize {
        let needed = if self.max_log_step > 0.0 {
            ((to - from).abs() / self.max_log_step).ceil() as usize
        } else {
            0
        };
        self.steps.max(needed).min(MAX_RAMP_STEPS.max(self.steps))
    }

    /// Compute the sequence of raw values a ramp would write.
    ///
    /// Empty when `current == target`. The last element is always
    /// exactly `target`.
    pub fn plan(
        &self,
        current: u32,
        target: u32,
        range: BrightnessRange,
    ) -> Result<Vec<u32>, TransitionError> {
        if !range.contains(target) {
            return Err(TransitionError::TargetOutOfRange {
                target,
                min: range.min(),
                max: range.max(),
            });
        }
        if current == target {
            return Ok(Vec::new());
        }

        let from = to_log(current);
        let to = to_log(target);
        let count = self.step_count(from, to);

        let values = (1..=count)
            .map(|i| {
                if i == count {
                    target
                } else {
                    let x = from + (to - from) * (i as f64 / count as f64);
                    range.clamp_f64(from_log(x))
                }
            })
            .collect();
        Ok(values)
    }

    /// Ramp the backlight from `current` to `target`.
    ///
    /// Blocks for roughly the configured duration. Returns the number of
    /// writes performed. The first failing write aborts the ramp; the
    /// backlight is left at the last value that was written successfully.
    pub fn apply(
        &self,
        backlight: &mut impl BacklightPort,
        current: u32,
        target: u32,
        range: BrightnessRange,
    ) -> Result<usize, TransitionError> {
        let plan = self.plan(current, target, range)?;
        if plan.is_empty() {
            return Ok(0);
        }

        let pause = self.duration / plan.len() as u32;
        for (i, &value) in plan.iter().enumerate() {
            backlight
                .set_raw(value)
                .map_err(|source| TransitionError::Aborted {
                    steps_written: i,
                    last_written: i.checked_sub(1).map(|j| plan[j]),
                    source,
                })?;
            if i + 1 < plan.len() && !pause.is_zero() {
                thread::sleep(pause);
            }
        }
        log::debug!(
            "Ramp {} -> {} done in {} steps",
            current,
            target,
            plan.len()
        );
        Ok(plan.len())
    }
}

fn to_log(raw: u32) -> f64 {
    (f64::from(raw) + 1.0).log2()
}

fn from_log(x: f64) -> f64 {
    x.exp2() - 1.0
}
