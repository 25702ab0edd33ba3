use anyhow::Result;
use ocuapi::{Axis, CloudClient};

use crate::model::DeviceId;

/// Cloud-side camera commands the controller needs, abstracted so tests can
/// substitute a scripted remote.
pub trait CameraRemote: Send + Sync {
    fn set_privacy_mode(&self, device: &DeviceId, enabled: bool) -> Result<()>;

    fn move_axis(&self, device: &DeviceId, axis: Axis, step: i32) -> Result<()>;

    fn move_to_preset(&self, device: &DeviceId, preset_id: &str) -> Result<()>;
}

impl CameraRemote for CloudClient {
    fn set_privacy_mode(&self, device: &DeviceId, enabled: bool) -> Result<()> {
        CloudClient::set_privacy_mode(self, device.as_str(), enabled)?;
        Ok(())
    }

    fn move_axis(&self, device: &DeviceId, axis: Axis, step: i32) -> Result<()> {
        CloudClient::move_axis(self, device.as_str(), axis, step)?;
        Ok(())
    }

    fn move_to_preset(&self, device: &DeviceId, preset_id: &str) -> Result<()> {
        CloudClient::move_to_preset(self, device.as_str(), preset_id)?;
        Ok(())
    }
}
