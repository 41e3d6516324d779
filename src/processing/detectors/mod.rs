pub mod tap_gesture;

use std::collections::VecDeque;

// DETECTOR COMPONENT ----------------------------------------------------------
pub trait DetectorInstance: Send {
    fn id(&self) -> &str;

    fn process_sample(&mut self, sample: &Sample) -> Option<TriggerEvent>;

    fn reset(&mut self);
}

/// One accelerometer reading. `timestamp` is monotonic nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: i64,
    pub axis_values: [f32; 3],
}

impl Sample {
    pub fn new(timestamp: i64, axis_values: [f32; 3]) -> Self {
        Self {
            timestamp,
            axis_values,
        }
    }
}

/// "Flip passthrough now."
#[derive(Debug, Clone, PartialEq)]
pub struct TriggerEvent {
    pub detector_id: String,
    pub timestamp: i64,
    pub sum_mean: f32,
}

// BUFFER COMPONENT ------------------------------------------------------------
/// Ordered window of recent values. Unlike a fixed ring buffer the length is
/// decided by the caller, which drops the oldest value once its time span is
/// covered.
#[derive(Clone, Debug, Default)]
pub struct SlidingWindow {
    buffer: VecDeque<f32>,
}

impl SlidingWindow {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::new(),
        }
    }

    pub fn push(&mut self, element: f32) {
        self.buffer.push_back(element);
    }

    pub fn drop_oldest(&mut self) -> Option<f32> {
        self.buffer.pop_front()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn first(&self) -> Option<f32> {
        self.buffer.front().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        self.buffer.iter().copied()
    }

    /// Writes `|v[i] - v[i-1]|` for every adjacent pair into `out`.
    pub fn abs_differences_into(&self, out: &mut Vec<f32>) {
        out.clear();
        let mut previous: Option<f32> = None;
        for value in self.buffer.iter().copied() {
            if let Some(prev) = previous {
                out.push((value - prev).abs());
            }
            previous = Some(value);
        }
    }
}
