//! Interfaces to the platform side: camera, renderer overlay, sensor
//! registration and the native streaming client.

use thiserror::Error;

use super::preview_size::{PreviewSizeSelector, Resolution, SelectionError};

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera already initialized")]
    AlreadyOpen,

    #[error("unable to open camera")]
    Unavailable,

    #[error("failed to attach preview texture: {0}")]
    PreviewAttach(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

/// What the controller asks of the camera when passthrough turns on.
#[derive(Debug, Clone, Copy)]
pub struct PreviewRequest {
    pub desired_width: u32,
    pub desired_height: u32,
    /// Hint that can raise the preview frame rate on some devices.
    pub recording_hint: bool,
    pub selector: PreviewSizeSelector,
}

impl PreviewRequest {
    /// Called by the camera with its supported preview sizes.
    pub fn choose(&self, candidates: &[Resolution]) -> Result<Resolution, SelectionError> {
        self.selector
            .select(candidates, self.desired_width, self.desired_height)
    }
}

/// Blocking camera handle. `open` must not be called twice without a
/// `release` in between.
pub trait CameraDevice: Send {
    /// Acquires the camera and configures the preview size chosen through
    /// `request`.
    fn open(&mut self, request: &PreviewRequest) -> Result<Resolution, CameraError>;

    fn start_preview(&mut self) -> Result<(), CameraError>;

    fn stop_preview(&mut self);

    fn release(&mut self);
}

/// Renderer-side passthrough state.
pub trait NativeOverlay: Send {
    fn set_passthrough_active(&mut self, active: bool);

    /// Fraction of the eye view covered by the camera plane.
    fn set_passthrough_size(&mut self, fraction: f32);
}

/// Accelerometer registration, tied to resume/pause.
pub trait SensorSource {
    fn register(&mut self);

    fn unregister(&mut self);
}

/// The rest of the native streaming client.
pub trait HeadsetLink {
    fn pause(&mut self);

    fn resume(&mut self);

    fn send_battery_level(&mut self, level: f32, plugged: bool);

    fn switch_viewer(&mut self);
}
