use thiserror::Error;

use crate::model::DeviceId;

#[derive(Error, Debug)]
pub enum ControlError {
    #[error("No stream credentials configured for camera {0}")]
    MissingCredentials(DeviceId),
    #[error("Camera {device} has no usable address for policy '{policy}'")]
    NoUsableAddress { device: DeviceId, policy: String },
    #[error("Playback error: {0}")]
    Playback(String),
    #[error("Remote command error: {0}")]
    RemoteCommand(String),
}

impl ControlError {
    pub fn playback(message: &str) -> Self {
        ControlError::Playback(message.to_string())
    }

    pub fn remote_command(message: &str) -> Self {
        ControlError::RemoteCommand(message.to_string())
    }
}
