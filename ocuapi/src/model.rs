/// Per-device metadata assembled from the `getDeviceInfo` / `getUpnpStatus`
/// / `getPubIP` passthrough bundle.
///
/// Every field is optional: cameras routinely omit coordinates, and the
/// public address only appears once the device has probed its uplink.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeviceDetails {
    /// User-chosen display name (`device_alias`).
    pub alias: Option<String>,
    /// Hardware model string (`device_name`).
    pub model: Option<String>,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    /// LAN address reported by the device's embedded HTTP daemon.
    pub private_ip: Option<String>,
    /// WAN address as seen by the cloud.
    pub public_ip: Option<String>,
}

/// A stored pan/tilt position on the camera.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Preset {
    pub id: String,
    pub name: String,
}

/// Motor axis for relative moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    Pan,
    Tilt,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Pan => "pan",
            Axis::Tilt => "tilt",
        }
    }

    /// Coordinate key used by the `motorMove` payload.
    pub(crate) fn coord_key(&self) -> &'static str {
        match self {
            Axis::Pan => "x_coord",
            Axis::Tilt => "y_coord",
        }
    }
}
