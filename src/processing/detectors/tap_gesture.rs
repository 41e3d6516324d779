use super::{DetectorInstance, Sample, SlidingWindow, TriggerEvent};
use crate::config::preferences::{keys, read_parsed, ConfigStore};

use serde::{Deserialize, Serialize};

const NANOS_PER_MILLI: i64 = 1_000_000;

/// Windows shorter than this per half cannot hold two separate peaks.
const MIN_HALF_SIZE: usize = 4;

/// Bounds memory if the sensor clock stalls before the first window fills.
const MAX_WINDOW_LEN: usize = 1024;

pub const DEFAULT_DELAY_MS: i64 = 600;
pub const DEFAULT_LOWER_BOUND: f32 = 0.8;
pub const DEFAULT_HIGHER_BOUND: f32 = 4.0;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Time span covered by each axis window, and length of the rearm window.
    pub passthrough_delay_ms: i64,
    /// Rest threshold for the summed motion and minimum peak height.
    pub lower_bound: f32,
    /// Upper limit for a peak or the summed motion to still count as a tap.
    pub higher_bound: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            passthrough_delay_ms: DEFAULT_DELAY_MS,
            lower_bound: DEFAULT_LOWER_BOUND,
            higher_bound: DEFAULT_HIGHER_BOUND,
        }
    }
}

impl DetectorConfig {
    /// Reads `passthrough_delay`, `passthrough_lower` and `passthrough_upper`.
    /// Anything unparsable falls back to the default for that field.
    pub fn from_store<S: ConfigStore + ?Sized>(store: &S) -> Self {
        Self {
            passthrough_delay_ms: read_parsed(store, keys::PASSTHROUGH_DELAY, DEFAULT_DELAY_MS, |v| {
                *v > 0
            }),
            lower_bound: read_parsed(store, keys::PASSTHROUGH_LOWER, DEFAULT_LOWER_BOUND, |v| {
                v.is_finite()
            }),
            higher_bound: read_parsed(store, keys::PASSTHROUGH_UPPER, DEFAULT_HIGHER_BOUND, |v| {
                v.is_finite()
            }),
        }
    }

    fn delay_ns(&self) -> i64 {
        self.passthrough_delay_ms.saturating_mul(NANOS_PER_MILLI)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorState {
    pub window_start_ts: Option<i64>,
    pub rearm_start_ts: Option<i64>,
    pub half_size: usize,
    pub trigger_armed: bool,
}

/// Recognizes "tap, tap, then hold still" on a stream of accelerometer samples.
///
/// Every sample slides three per-axis windows spanning `passthrough_delay_ms`.
/// When one axis shows a peak in each half of its derivative window, after a
/// resting phase, the rearm timer restarts. While that timer runs, the first
/// sample whose summed mean motion drops below `lower_bound` fires a single
/// [`TriggerEvent`].
///
/// Samples must arrive with non-decreasing timestamps; out-of-order input is
/// not detected and gives meaningless results. Callers with several producer
/// threads serialize calls themselves, e.g. through a single-consumer queue.
pub struct GestureDetector {
    id: String,
    config: DetectorConfig,
    state: DetectorState,
    axes: [SlidingWindow; 3],
    derivatives: [Vec<f32>; 3],
    sum_means: SlidingWindow,
}

impl GestureDetector {
    pub fn new(id: impl Into<String>, config: DetectorConfig) -> Self {
        GestureDetector {
            id: id.into(),
            config,
            state: DetectorState::default(),
            axes: Default::default(),
            derivatives: Default::default(),
            sum_means: SlidingWindow::new(),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Replaces the thresholds and starts over with empty windows.
    pub fn reconfigure(&mut self, config: DetectorConfig) {
        self.config = config;
        self.reset();
    }

    pub fn state(&self) -> &DetectorState {
        &self.state
    }

    pub fn half_size(&self) -> usize {
        self.state.half_size
    }

    pub fn is_trigger_armed(&self) -> bool {
        self.state.trigger_armed
    }

    pub fn window_len(&self) -> usize {
        self.axes[0].len()
    }

    pub fn sum_history_len(&self) -> usize {
        self.sum_means.len()
    }

    pub fn derivative_len(&self) -> usize {
        self.derivatives[0].len()
    }

    pub fn ingest(&mut self, sample: Sample) -> Option<TriggerEvent> {
        let ts = sample.timestamp;
        let [x, y, z] = sample.axis_values;
        log::trace!("{}: [{:.6}, {:.6}, {:.6}]", ts, x, y, z);

        let window_start = *self.state.window_start_ts.get_or_insert(ts);
        let rearm_start = *self.state.rearm_start_ts.get_or_insert(ts);
        let delay_ns = self.config.delay_ns();
        let window_full = ts.saturating_sub(window_start) > delay_ns;
        let rearm_elapsed = ts.saturating_sub(rearm_start) > delay_ns;

        self.update_windows(sample.axis_values, window_full);
        if self.state.half_size == 0 {
            return None;
        }

        for (axis, derivative) in self.axes.iter().zip(self.derivatives.iter_mut()) {
            axis.abs_differences_into(derivative);
        }

        let sum_mean = self.sum_of_axis_means();
        self.sum_means.push(sum_mean);
        if self.sum_means.len() < self.derivative_len() {
            return None;
        }
        self.sum_means.drop_oldest();

        if !rearm_elapsed {
            return self.check_resting(ts, sum_mean);
        }

        self.state.trigger_armed = false;
        if let Some(axis) = self.find_tap_axis(sum_mean) {
            log::debug!(
                "{}: tap pattern on axis {} at {} (sum_mean {:.3}), rearming",
                self.id,
                axis,
                ts,
                sum_mean
            );
            self.state.rearm_start_ts = Some(ts);
        }
        None
    }

    fn update_windows(&mut self, values: [f32; 3], window_full: bool) {
        for (axis, value) in self.axes.iter_mut().zip(values) {
            axis.push(value);
        }

        if !window_full {
            if self.window_len() > MAX_WINDOW_LEN {
                for axis in self.axes.iter_mut() {
                    axis.drop_oldest();
                }
            }
            return;
        }

        // keep only the samples of the last delay span
        for axis in self.axes.iter_mut() {
            axis.drop_oldest();
        }
        if self.state.half_size == 0 {
            self.state.half_size = self.window_len() / 2;
        }
        if self.state.half_size < MIN_HALF_SIZE {
            log::debug!(
                "{}: window of {} samples too short, refilling",
                self.id,
                self.window_len()
            );
            for axis in self.axes.iter_mut() {
                axis.clear();
            }
            self.state.window_start_ts = None;
            self.state.half_size = 0;
        }
    }

    // Sequential f32 sums, axis by axis, so thresholds see the same values
    // every time the same window is evaluated.
    fn sum_of_axis_means(&self) -> f32 {
        let mut sum_mean = 0.0f32;
        for derivative in &self.derivatives {
            let mut total = 0.0f32;
            for value in derivative {
                total += *value;
            }
            sum_mean += total / derivative.len() as f32;
        }
        sum_mean
    }

    fn check_resting(&mut self, ts: i64, sum_mean: f32) -> Option<TriggerEvent> {
        if self.state.trigger_armed || sum_mean >= self.config.lower_bound {
            return None;
        }
        self.state.trigger_armed = true;
        log::info!("{}: trigger at {} (sum_mean {:.3})", self.id, ts, sum_mean);
        Some(TriggerEvent {
            detector_id: self.id.clone(),
            timestamp: ts,
            sum_mean,
        })
    }

    /// Returns the first axis (x, y, z order) whose derivative window holds a
    /// confirmed double peak.
    fn find_tap_axis(&self, sum_mean: f32) -> Option<usize> {
        let lower = self.config.lower_bound;
        let higher = self.config.higher_bound;
        let half = self.state.half_size;
        let outside = |value: f32| value < lower || value > higher;

        if outside(sum_mean) {
            return None;
        }
        let rest_limit = (lower - 0.3).max(0.5);
        let rested_before = self
            .sum_means
            .first()
            .map_or(false, |first| first < rest_limit);

        for (axis, derivative) in self.derivatives.iter().enumerate() {
            if derivative.len() < half || half == 0 {
                continue;
            }
            // the halves share index half - 1
            let t1 = &derivative[..half];
            let t2 = &derivative[half - 1..];
            let max1 = slice_max(t1);
            let max2 = slice_max(t2);

            if !is_peak(t1, max1, lower) || !is_peak(t2, max2, lower) {
                continue;
            }
            if outside(max1) || outside(max2) {
                continue;
            }

            let end2 = decay_index(t2, max2, lower);
            if rested_before && t2[end2] < max2 {
                return Some(axis);
            }
        }
        None
    }
}

impl DetectorInstance for GestureDetector {
    fn id(&self) -> &str {
        &self.id
    }

    fn process_sample(&mut self, sample: &Sample) -> Option<TriggerEvent> {
        self.ingest(*sample)
    }

    fn reset(&mut self) {
        self.state = DetectorState::default();
        for axis in self.axes.iter_mut() {
            axis.clear();
        }
        for derivative in self.derivatives.iter_mut() {
            derivative.clear();
        }
        self.sum_means.clear();
    }
}

fn slice_max(values: &[f32]) -> f32 {
    values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

/// A real peak rises at least `lower` above both ends of its half.
fn is_peak(half: &[f32], max: f32, lower: f32) -> bool {
    match (half.first(), half.last()) {
        (Some(&first), Some(&last)) => max - first >= lower && max - last >= lower,
        _ => false,
    }
}

/// Index where the second peak has decayed: the last index of the maximum,
/// then the first later index below `lower`. A maximum at index 0 never
/// starts the search.
fn decay_index(t2: &[f32], max2: f32, lower: f32) -> usize {
    let mut end = 0;
    for (i, &value) in t2.iter().enumerate() {
        if value == max2 {
            end = i;
        }
        if end > 0 && value < lower {
            return i;
        }
    }
    end
}
