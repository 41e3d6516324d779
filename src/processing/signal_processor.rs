use super::detectors::tap_gesture::{DetectorConfig, GestureDetector};
use super::detectors::{DetectorInstance, Sample, TriggerEvent};
use crate::config::ProcessorConfig;
use crate::utils::log::log_csv;

// -----------------------------------------------------------------------------
// SENSOR PROCESSOR
// -----------------------------------------------------------------------------

pub const TAP_DETECTOR_ID: &str = "passthrough_tap";

const TRACE_HEADERS: [&str; 6] = ["index", "timestamp_ns", "x", "y", "z", "triggered"];

pub struct SensorProcessor {
    pub index: usize,
    detectors: Detectors,
    config: ProcessorConfig,
}

impl SensorProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        SensorProcessor {
            index: 0,
            detectors: Detectors::new(),
            config,
        }
    }

    /// Processor with the passthrough tap detector registered.
    pub fn with_tap_detector(config: ProcessorConfig, detector_config: DetectorConfig) -> Self {
        let mut processor = Self::new(config);
        processor.add_detector(Box::new(GestureDetector::new(
            TAP_DETECTOR_ID,
            detector_config,
        )));
        processor
    }

    pub fn add_detector(&mut self, detector: Box<dyn DetectorInstance>) {
        self.detectors.add_detector(detector);
    }

    /// Swaps the tap detector for a fresh one using `detector_config`.
    pub fn set_detector_config(&mut self, detector_config: DetectorConfig) {
        self.detectors.replace(Box::new(GestureDetector::new(
            TAP_DETECTOR_ID,
            detector_config,
        )));
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.detectors.reset();
    }

    pub fn process_sample(&mut self, sample: &Sample) -> Vec<TriggerEvent> {
        let events = self.detectors.run_detectors(sample);

        if self.config.enable_debug_logging {
            self.trace_sample(sample, !events.is_empty());
        }
        if self.config.verbose {
            for event in &events {
                log::info!(
                    "{} triggered at sample {} (ts {}, sum_mean {:.3})",
                    event.detector_id,
                    self.index,
                    event.timestamp,
                    event.sum_mean
                );
            }
        }

        self.index += 1;
        events
    }

    pub fn run_chunk(&mut self, samples: &[Sample]) -> Vec<TriggerEvent> {
        samples
            .iter()
            .flat_map(|sample| self.process_sample(sample))
            .collect()
    }

    fn trace_sample(&self, sample: &Sample, triggered: bool) {
        let [x, y, z] = sample.axis_values;
        let row = [
            self.index.to_string(),
            sample.timestamp.to_string(),
            x.to_string(),
            y.to_string(),
            z.to_string(),
            u8::from(triggered).to_string(),
        ];
        if let Err(e) = log_csv(&self.config.trace_file, &TRACE_HEADERS, &row) {
            log::warn!("failed to write sensor trace: {}", e);
        }
    }
}

// DETECTOR COMPONENT ----------------------------------------------------------

pub struct Detectors {
    detectors: Vec<Box<dyn DetectorInstance>>,
}

impl Detectors {
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    pub fn add_detector(&mut self, detector: Box<dyn DetectorInstance>) {
        self.detectors.push(detector);
    }

    /// Replaces the detector with the same id, or adds it.
    pub fn replace(&mut self, detector: Box<dyn DetectorInstance>) {
        match self
            .detectors
            .iter_mut()
            .find(|existing| existing.id() == detector.id())
        {
            Some(slot) => *slot = detector,
            None => self.detectors.push(detector),
        }
    }

    pub fn reset(&mut self) {
        for detector in self.detectors.iter_mut() {
            detector.reset();
        }
    }

    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    pub fn run_detectors(&mut self, sample: &Sample) -> Vec<TriggerEvent> {
        self.detectors
            .iter_mut()
            .filter_map(|detector| detector.process_sample(sample))
            .collect()
    }
}

impl Default for Detectors {
    fn default() -> Self {
        Self::new()
    }
}
