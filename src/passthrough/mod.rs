pub mod controller;
pub mod devices;
pub mod preview_size;

pub use controller::{PassthroughController, PassthroughState};
pub use devices::{CameraDevice, CameraError, HeadsetLink, NativeOverlay, PreviewRequest, SensorSource};
pub use preview_size::{select_preview_size, PreviewSizeSelector, Resolution, SelectionError};
