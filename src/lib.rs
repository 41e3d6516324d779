pub mod bindings;
pub mod config;
pub mod error;
pub mod passthrough;
pub mod processing;
pub mod session;
pub mod utils;

pub use error::PassthroughError;
pub use processing::detectors::tap_gesture::{DetectorConfig, GestureDetector};
pub use processing::detectors::{Sample, TriggerEvent};
pub use session::{DispatchOutcome, Session, SessionEvent};
