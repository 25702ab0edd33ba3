//! Fire-and-forget camera commands.
//!
//! Pan/tilt nudges and preset recalls have no visible state to keep
//! consistent, so they run on short-lived worker threads and only log their
//! outcome.

use std::sync::Arc;
use std::thread;

use ocuapi::{ApiError, Axis};
use tracing::{debug, info, warn};

use crate::model::DeviceId;
use crate::remote::CameraRemote;

/// Nudges the camera along `axis` by `step` degrees.
pub fn dispatch_move(remote: Arc<dyn CameraRemote>, device: DeviceId, axis: Axis, step: i32) {
    let spawned = thread::Builder::new()
        .name(format!("ptz-{}", axis.as_str()))
        .spawn(move || {
            debug!(device = device.as_str(), axis = axis.as_str(), step, "Moving camera");
            match remote.move_axis(&device, axis, step) {
                Ok(()) => {}
                Err(err) if is_end_of_travel(&err) => {
                    info!(device = device.as_str(), axis = axis.as_str(), "Camera is at end of travel");
                }
                Err(err) => {
                    warn!(device = device.as_str(), error = %err, "Move command failed");
                }
            }
        });
    if let Err(err) = spawned {
        warn!(error = %err, "Cannot spawn move worker");
    }
}

/// Recalls a stored position by preset id.
pub fn dispatch_preset(remote: Arc<dyn CameraRemote>, device: DeviceId, preset_id: String) {
    let spawned = thread::Builder::new()
        .name("ptz-preset".to_string())
        .spawn(move || {
            debug!(device = device.as_str(), preset = preset_id.as_str(), "Recalling preset");
            if let Err(err) = remote.move_to_preset(&device, &preset_id) {
                warn!(device = device.as_str(), error = %err, "Preset recall failed");
            }
        });
    if let Err(err) = spawned {
        warn!(error = %err, "Cannot spawn preset worker");
    }
}

fn is_end_of_travel(err: &anyhow::Error) -> bool {
    matches!(err.downcast_ref::<ApiError>(), Some(ApiError::EndOfTravel))
}
