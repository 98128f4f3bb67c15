//! A single ambient-light bin and its bounded sample window.

use heapless::Vec;

/// Maximum samples held per bin.
pub const BIN_CAPACITY: usize = 50;

/// A past brightness observation with a confidence weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedSample {
    /// Raw backlight level.
    pub brightness: u32,
    /// Confidence, always `>= 0`.
    pub weight: f64,
    /// Unix time of the observation, seconds.
    pub timestamp: i64,
}

/// Half-open ambient interval `[min_value, max_value)` with its samples.
///
/// `total_weight` always equals the sum of the sample weights; every
/// mutation goes through a method that keeps it in step.
#[derive(Debug, Clone)]
pub struct AdaptiveBin {
    min_value: u32,
    max_value: u32,
    samples: Vec<WeightedSample, BIN_CAPACITY>,
    total_weight: f64,
}

impl AdaptiveBin {
    pub fn new(min_value: u32, max_value: u32) -> Self {
        debug_assert!(min_value < max_value);
        Self {
            min_value,
            max_value,
            samples: Vec::new(),
            total_weight: 0.0,
        }
    }

    pub fn min_value(&self) -> u32 {
        self.min_value
    }

    pub fn max_value(&self) -> u32 {
        self.max_value
    }

    /// Samples in insertion order.
    pub fn samples(&self) -> &[WeightedSample] {
        &self.samples
    }

    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn contains(&self, ambient: u32) -> bool {
        (self.min_value..self.max_value).contains(&ambient)
    }

    /// Fractional position of `ambient` inside the interval.
    pub fn position(&self, ambient: u32) -> f64 {
        let width = f64::from(self.max_value - self.min_value);
        (f64::from(ambient) - f64::from(self.min_value)) / width
    }

    /// Add a sample. When the window is full the lightest sample among
    /// the stored ones and the newcomer is dropped; ties keep the
    /// newcomer and drop the earliest stored candidate.
    pub fn insert(&mut self, sample: WeightedSample) {
        if !self.samples.is_full() {
            self.push(sample);
            return;
        }

        let (idx, lightest) = self
            .samples
            .iter()
            .enumerate()
            .fold((0, f64::INFINITY), |(bi, bw), (i, s)| {
                if s.weight < bw { (i, s.weight) } else { (bi, bw) }
            });
        if sample.weight < lightest {
            return;
        }
        let evicted = self.samples.remove(idx);
        self.total_weight -= evicted.weight;
        self.push(sample);
    }

    fn push(&mut self, sample: WeightedSample) {
        if self.samples.push(sample).is_ok() {
            self.total_weight += sample.weight;
        }
    }

    /// `Σ(brightness × weight) / total_weight`, or `None` without usable data.
    pub fn weighted_average(&self) -> Option<f64> {
        if self.samples.is_empty() || self.total_weight <= 0.0 {
            return None;
        }
        let sum: f64 = self
            .samples
            .iter()
            .map(|s| f64::from(s.brightness) * s.weight)
            .sum();
        Some(sum / self.total_weight)
    }

    /// Drop samples older than `max_age_secs` relative to `now`.
    /// Returns the number removed.
    pub fn cleanup(&mut self, now: i64, max_age_secs: i64) -> usize {
        let before = self.samples.len();
        self.samples.retain(|s| now - s.timestamp <= max_age_secs);
        self.total_weight = self.samples.iter().map(|s| s.weight).sum();
        before - self.samples.len()
    }

    /// Move the interval and discard the samples, which belonged to the
    /// old partition.
    pub(crate) fn repartition(&mut self, min_value: u32, max_value: u32) {
        debug_assert!(min_value < max_value);
        self.min_value = min_value;
        self.max_value = max_value;
        self.samples.clear();
        self.total_weight = 0.0;
    }
}
