//! Adaptive bin model: learns the user's preferred backlight level per
//! ambient-light band.
//!
//! The ambient domain is split into contiguous half-open bins. Manual
//! adjustments are stored in the matching bin as [`WeightedSample`]s and
//! a prediction is the weighted mean of the bin, adjusted for time of day
//! and user activity, blended with the neighbouring bin near the edges,
//! then smoothed over the last three predictions.
//!
//! All ambient values are raw sensor units, both for partitioning and for
//! lookup. Samples store raw backlight levels; predictions are percentages
//! of the configured [`BrightnessRange`].

pub mod bin;
pub mod daylight;
pub mod point;

pub use bin::{AdaptiveBin, BIN_CAPACITY, WeightedSample};
pub use daylight::Daylight;
pub use point::DataPoint;

use log::debug;

use crate::config::SystemConfig;
use crate::control::BrightnessRange;

/// Samples older than this are pruned.
pub const RETENTION_SECS: i64 = 7 * 24 * 3600;

/// A manual point whose brightness differs from the last trained one by
/// more than this (raw units) is rejected.
pub const OUTLIER_BRIGHTNESS_DELTA: u32 = 80;

/// Same as [`OUTLIER_BRIGHTNESS_DELTA`] for ambient light.
pub const OUTLIER_AMBIENT_DELTA: u32 = 1200;

/// Quantile re-binning needs at least this many points.
pub const MIN_REBIN_POINTS: usize = 10;

/// Fraction of a bin's width on each side where neighbour blending kicks in.
const EDGE_ZONE: f64 = 0.2;

const SMOOTHING_WINDOW: usize = 3;

const NIGHT_FACTOR: f64 = 0.8;
const IDLE_FACTOR: f64 = 0.9;
const OFF_PHASE_SIMILARITY: f64 = 0.2;
const IDLE_SIMILARITY: f64 = 0.5;

/// Coefficients of the three training-weight components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendWeights {
    pub time: f64,
    pub recency: f64,
    pub activity: f64,
}

impl Default for BlendWeights {
    fn default() -> Self {
        Self {
            time: 0.3,
            recency: 0.4,
            activity: 0.3,
        }
    }
}

/// Construction parameters for [`AdaptiveBinModel`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelConfig {
    pub ambient_min: u32,
    pub ambient_max: u32,
    pub bin_count: usize,
    pub weights: BlendWeights,
    pub daylight: Daylight,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            ambient_min: 0,
            ambient_max: 2000,
            bin_count: 10,
            weights: BlendWeights::default(),
            daylight: Daylight::default(),
        }
    }
}

impl ModelConfig {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            ambient_min: config.ambient_min,
            ambient_max: config.ambient_max,
            bin_count: config.bin_count,
            weights: BlendWeights {
                time: config.time_weight,
                recency: config.recency_weight,
                activity: config.activity_weight,
            },
            daylight: Daylight {
                start_hour: config.day_start_hour,
                end_hour: config.day_end_hour,
                offset: None,
            },
        }
    }
}

/// What [`AdaptiveBinModel::train`] did with a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainOutcome {
    /// Automatic points carry no preference and are not learned from.
    Ignored,
    /// Too far from the previously trained point.
    Rejected,
    /// Below the first bin.
    Unbinned,
    /// Stored in bin `bin`.
    Accepted { bin: usize },
}

#[derive(Debug, Clone)]
pub struct AdaptiveBinModel {
    bins: Vec<AdaptiveBin>,
    weights: BlendWeights,
    daylight: Daylight,
    ambient_min: u32,
    ambient_max: u32,
    range: BrightnessRange,
    ring: [f64; SMOOTHING_WINDOW],
    head: usize,
    last_trained: Option<DataPoint>,
}

impl AdaptiveBinModel {
    /// Uniform partition of `[ambient_min, ambient_max)`; the last bin
    /// takes the remainder of the integer division.
    pub fn new(config: ModelConfig, range: BrightnessRange) -> Self {
        let count = config.bin_count.max(1);
        let width = config.ambient_max.saturating_sub(config.ambient_min);
        let bin_size = (width / count as u32).max(1);

        let bins = (0..count)
            .map(|i| {
                let lo = config.ambient_min + i as u32 * bin_size;
                let hi = if i + 1 == count {
                    config.ambient_max.max(lo + 1)
                } else {
                    lo + bin_size
                };
                AdaptiveBin::new(lo, hi)
            })
            .collect();

        Self {
            bins,
            weights: config.weights,
            daylight: config.daylight,
            ambient_min: config.ambient_min,
            ambient_max: config.ambient_max,
            range,
            ring: [0.0; SMOOTHING_WINDOW],
            head: 0,
            last_trained: None,
        }
    }

    pub fn bins(&self) -> &[AdaptiveBin] {
        &self.bins
    }

    pub fn bin_bounds(&self) -> Vec<(u32, u32)> {
        self.bins
            .iter()
            .map(|b| (b.min_value(), b.max_value()))
            .collect()
    }

    pub fn sample_count(&self) -> usize {
        self.bins.iter().map(AdaptiveBin::len).sum()
    }

    pub fn range(&self) -> BrightnessRange {
        self.range
    }

    pub fn daylight(&self) -> Daylight {
        self.daylight
    }

    /// Index of the bin responsible for `ambient`. The last bin also
    /// takes readings at or above its upper bound.
    pub fn find_bin(&self, ambient: u32) -> Option<usize> {
        if let Some(idx) = self.bins.iter().position(|b| b.contains(ambient)) {
            return Some(idx);
        }
        let last = self.bins.len().checked_sub(1)?;
        (ambient >= self.bins[last].min_value()).then_some(last)
    }

    /// Logarithmic mapping of ambient light onto `[0, 100]`, used when no
    /// learned data is available. Both ends are measured from
    /// `ambient_min`, so the curve starts at 0 % on the domain floor.
    pub fn closed_form_percent(&self, ambient: u32) -> f64 {
        if ambient <= self.ambient_min {
            return 0.0;
        }
        let ln_span = (f64::from(self.ambient_max.saturating_sub(self.ambient_min)) + 1.0).ln();
        if ln_span <= 0.0 {
            return 100.0;
        }
        let offset = f64::from(ambient - self.ambient_min) + 1.0;
        (offset.ln() / ln_span).clamp(0.0, 1.0) * 100.0
    }

    /// Predicted brightness percentage for `ambient` at `now`.
    ///
    /// `None` only when no bin covers `ambient`; the smoothing ring is left
    /// untouched in that case.
    pub fn predict(&mut self, ambient: u32, now: i64, is_active: bool) -> Option<f64> {
        let Some(idx) = self.find_bin(ambient) else {
            debug!("predict: ambient {ambient} below every bin");
            return None;
        };

        let time_factor = if self.daylight.is_day(now) {
            1.0
        } else {
            NIGHT_FACTOR
        };
        let activity_factor = if is_active { 1.0 } else { IDLE_FACTOR };
        let factor = time_factor * activity_factor;

        let base = self
            .bin_percent(idx)
            .unwrap_or_else(|| self.closed_form_percent(ambient));
        let mut value = base * factor;

        let pos = self.bins[idx].position(ambient);
        let neighbour = if pos < EDGE_ZONE {
            idx.checked_sub(1)
                .map(|n| (n, (EDGE_ZONE - pos) / EDGE_ZONE))
        } else if pos > 1.0 - EDGE_ZONE && idx + 1 < self.bins.len() {
            Some((idx + 1, (pos - (1.0 - EDGE_ZONE)) / EDGE_ZONE))
        } else {
            None
        };
        if let Some((n, w)) = neighbour {
            if let Some(other) = self.bin_percent(n) {
                let w = w.clamp(0.0, 1.0);
                value = value * (1.0 - w) + other * factor * w;
            }
        }

        Some(self.smooth(value))
    }

    fn bin_percent(&self, idx: usize) -> Option<f64> {
        self.bins[idx]
            .weighted_average()
            .map(|raw| self.range.to_percent(raw))
    }

    fn smooth(&mut self, value: f64) -> f64 {
        self.ring[self.head] = value;
        self.head = (self.head + 1) % SMOOTHING_WINDOW;
        let mean = self.ring.iter().sum::<f64>() / SMOOTHING_WINDOW as f64;
        mean.clamp(0.0, 100.0)
    }

    /// Confidence weight of `point` as seen from `now`.
    pub fn sample_weight(&self, point: &DataPoint, now: i64, is_active: bool) -> f64 {
        let phase = if self.daylight.same_phase(point.timestamp, now) {
            1.0
        } else {
            OFF_PHASE_SIMILARITY
        };
        let age = (now - point.timestamp).max(0) as f64;
        let freshness = (1.0 - age / RETENTION_SECS as f64).max(0.0);
        let activity = if is_active { 1.0 } else { IDLE_SIMILARITY };

        self.weights.time * phase + self.weights.recency * freshness + self.weights.activity * activity
    }

    fn is_outlier(&self, point: &DataPoint) -> bool {
        self.last_trained.is_some_and(|last| {
            point.screen_brightness.abs_diff(last.screen_brightness) > OUTLIER_BRIGHTNESS_DELTA
                || point.ambient_light.abs_diff(last.ambient_light) > OUTLIER_AMBIENT_DELTA
        })
    }

    /// Learn from a manual adjustment.
    pub fn train(&mut self, point: &DataPoint, now: i64, is_active: bool) -> TrainOutcome {
        if !point.is_manual_adjustment {
            return TrainOutcome::Ignored;
        }
        if self.is_outlier(point) {
            debug!(
                "train: outlier rejected (ambient {}, brightness {})",
                point.ambient_light, point.screen_brightness
            );
            return TrainOutcome::Rejected;
        }
        let Some(idx) = self.find_bin(point.ambient_light) else {
            debug!("train: ambient {} below every bin", point.ambient_light);
            return TrainOutcome::Unbinned;
        };

        let weight = self.sample_weight(point, now, is_active);
        self.bins[idx].insert(WeightedSample {
            brightness: point.screen_brightness,
            weight,
            timestamp: point.timestamp,
        });
        self.last_trained = Some(*point);
        TrainOutcome::Accepted { bin: idx }
    }

    /// Re-partition the bins on equal-count quantiles of the ambient
    /// values in `points`. Existing samples are dropped.
    ///
    /// Quantile edges that collapse onto a repeated value (a long run of
    /// dark readings, say) are pushed up to the next distinct value, and
    /// held low enough that every later bin still gets one. Returns
    /// `false` (and changes nothing) with fewer than [`MIN_REBIN_POINTS`]
    /// points or fewer distinct ambient values than bins.
    pub fn adapt_bins(&mut self, points: &[DataPoint]) -> bool {
        if points.len() < MIN_REBIN_POINTS {
            debug!("adapt_bins: {} points, need {MIN_REBIN_POINTS}", points.len());
            return false;
        }

        let mut sorted: Vec<u32> = points.iter().map(|p| p.ambient_light).collect();
        sorted.sort_unstable();
        let mut distinct = sorted.clone();
        distinct.dedup();

        let len = sorted.len();
        let n = self.bins.len();
        let d = distinct.len();
        if d < n {
            debug!("adapt_bins: {d} distinct ambient values for {n} bins, keeping current bins");
            return false;
        }

        // Edges as indices into `distinct`: strictly increasing, and edge i
        // leaves at least n - i distinct values for bins i..n.
        let mut edges = Vec::with_capacity(n + 1);
        let mut prev: Option<usize> = None;
        for i in 0..n {
            let quantile = sorted[(i * len / n).min(len - 1)];
            let q = distinct.partition_point(|&v| v < quantile);
            let idx = prev
                .map_or(q, |p| q.max(p + 1))
                .min(d - n + i);
            edges.push(distinct[idx]);
            prev = Some(idx);
        }
        edges.push(sorted[len - 1].saturating_add(1));

        for (bin, w) in self.bins.iter_mut().zip(edges.windows(2)) {
            bin.repartition(w[0], w[1]);
        }
        self.last_trained = None;
        true
    }

    /// Prune samples past the retention window. Returns how many were removed.
    pub fn cleanup(&mut self, now: i64) -> usize {
        if self
            .last_trained
            .is_some_and(|p| now - p.timestamp > RETENTION_SECS)
        {
            self.last_trained = None;
        }
        self.bins
            .iter_mut()
            .map(|b| b.cleanup(now, RETENTION_SECS))
            .sum()
    }

    /// Warm up from persisted history: re-bin, replay the points in
    /// timestamp order as if each were trained when it was recorded, then
    /// prune. Returns the number of accepted points.
    pub fn seed(&mut self, history: &[DataPoint], now: i64) -> usize {
        self.adapt_bins(history);

        let mut ordered = history.to_vec();
        ordered.sort_by_key(|p| p.timestamp);
        let accepted = ordered
            .iter()
            .filter(|p| {
                matches!(
                    self.train(p, p.timestamp, true),
                    TrainOutcome::Accepted { .. }
                )
            })
            .count();

        self.cleanup(now);
        accepted
    }
}
