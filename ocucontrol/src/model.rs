use std::fmt;

use ocuapi::DeviceDetails;

/// Cloud identifier of a camera, as returned by the device order listing.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub String);

impl DeviceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A camera as shown in the catalog, with display fields already defaulted.
#[derive(Clone, Debug, PartialEq)]
pub struct Device {
    pub id: DeviceId,
    pub alias: String,
    pub model: String,
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
}

impl Device {
    pub fn from_details(id: DeviceId, details: DeviceDetails) -> Self {
        Self {
            id,
            alias: details.alias.unwrap_or_else(|| "Unknown Camera".to_string()),
            model: details.model.unwrap_or_else(|| "Unknown Device".to_string()),
            longitude: details.longitude,
            latitude: details.latitude,
            private_ip: details.private_ip,
            public_ip: details.public_ip,
        }
    }
}

/// Lifecycle of the single visible stream session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    NoStream,
    Connecting,
    Playing,
    Ended,
    Error(String),
}

impl SessionStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SessionStatus::NoStream => "no-stream",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Playing => "playing",
            SessionStatus::Ended => "ended",
            SessionStatus::Error(_) => "error",
        }
    }
}

/// Events broadcast by the session controller to interested observers.
#[derive(Clone, Debug)]
pub enum SessionEvent {
    StatusChanged {
        generation: u64,
        status: SessionStatus,
    },
    MuteChanged {
        muted: bool,
    },
    PrivacyChanged {
        device: DeviceId,
        enabled: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_defaults_missing_display_fields() {
        let details = DeviceDetails {
            alias: None,
            model: None,
            longitude: Some(3.5),
            latitude: None,
            private_ip: Some("192.168.1.12".to_string()),
            public_ip: None,
        };
        let device = Device::from_details(DeviceId("abc".to_string()), details);
        assert_eq!(device.alias, "Unknown Camera");
        assert_eq!(device.model, "Unknown Device");
        assert_eq!(device.private_ip.as_deref(), Some("192.168.1.12"));
    }

    #[test]
    fn status_labels() {
        assert_eq!(SessionStatus::NoStream.as_str(), "no-stream");
        assert_eq!(SessionStatus::Error("boom".to_string()).as_str(), "error");
    }
}
