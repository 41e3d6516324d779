pub mod detectors;
pub mod signal_processor;
