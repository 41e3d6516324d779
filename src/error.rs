//! Error types shared by the controller and the session dispatcher.

use thiserror::Error;

use crate::passthrough::devices::CameraError;
use crate::passthrough::preview_size::SelectionError;

#[derive(Debug, Error)]
pub enum PassthroughError {
    /// The camera collaborator failed while activating or deactivating passthrough.
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),

    /// No preview resolution could be chosen.
    #[error("preview size selection failed: {0}")]
    Selection(#[from] SelectionError),

    /// An event arrived after the session was destroyed.
    #[error("session already destroyed")]
    SessionFinished,
}
