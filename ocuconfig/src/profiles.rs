//! Per-device stream profiles.
//!
//! Each camera needs its own RTSP account (configured on the device) plus a
//! policy choosing which of its addresses the stream is built from. Profiles
//! live in `stream_profiles.json` inside the config directory; a corrupt or
//! absent file simply starts the store empty.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const PROFILES_FILE: &str = "stream_profiles.json";

/// Which address a stream endpoint is built from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressPolicy {
    #[default]
    Private,
    Public,
    Custom,
}

impl<'de> Deserialize<'de> for AddressPolicy {
    /// Unknown policy strings fall back to `private`, like the original
    /// per-device files did.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "public" => AddressPolicy::Public,
            "custom" => AddressPolicy::Custom,
            _ => AddressPolicy::Private,
        })
    }
}

impl AddressPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressPolicy::Private => "private",
            AddressPolicy::Public => "public",
            AddressPolicy::Custom => "custom",
        }
    }
}

impl std::fmt::Display for AddressPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RTSP account and address selection for one camera.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamProfile {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub address_policy: AddressPolicy,
    #[serde(default)]
    pub custom_address: String,
}

/// File-backed map of device id to [`StreamProfile`].
///
/// Mutations save eagerly, so the on-disk file always reflects the last
/// accepted change.
#[derive(Debug)]
pub struct StreamProfileStore {
    path: PathBuf,
    profiles: HashMap<String, StreamProfile>,
}

impl StreamProfileStore {
    /// Open (or initialize) the store under the given config directory.
    pub fn open(config_dir: &Path) -> Self {
        let path = config_dir.join(PROFILES_FILE);

        let profiles = match fs::read_to_string(&path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(profiles) => profiles,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Stream profile file is corrupt, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };

        Self { path, profiles }
    }

    /// Profile for a device; defaults (empty credentials, private policy)
    /// when none is stored.
    pub fn get(&self, device_id: &str) -> StreamProfile {
        self.profiles.get(device_id).cloned().unwrap_or_default()
    }

    pub fn contains(&self, device_id: &str) -> bool {
        self.profiles.contains_key(device_id)
    }

    pub fn set(&mut self, device_id: &str, profile: StreamProfile) -> Result<()> {
        self.profiles.insert(device_id.to_string(), profile);
        self.save()
    }

    /// Remove a device's profile. Returns true when something was removed.
    pub fn delete(&mut self, device_id: &str) -> Result<bool> {
        let removed = self.profiles.remove(device_id).is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }

    /// Drop profiles for devices that are no longer in the catalog.
    pub fn retain(&mut self, valid_device_ids: &[String]) -> Result<()> {
        let before = self.profiles.len();
        self.profiles
            .retain(|id, _| valid_device_ids.iter().any(|valid| valid == id));

        let removed = before - self.profiles.len();
        if removed > 0 {
            info!(removed, "Dropped stream profiles for vanished devices");
            self.save()?;
        }
        Ok(())
    }

    fn save(&self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.profiles)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> StreamProfileStore {
        StreamProfileStore::open(dir)
    }

    fn profile(username: &str) -> StreamProfile {
        StreamProfile {
            username: username.to_string(),
            password: "secret".to_string(),
            address_policy: AddressPolicy::Public,
            custom_address: String::new(),
        }
    }

    #[test]
    fn test_unknown_device_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let p = store.get("nope");
        assert!(p.username.is_empty());
        assert_eq!(p.address_policy, AddressPolicy::Private);
    }

    #[test]
    fn test_set_get_roundtrip_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = store_in(dir.path());
            store.set("cam-1", profile("alice")).unwrap();
        }

        let store = store_in(dir.path());
        let p = store.get("cam-1");
        assert_eq!(p.username, "alice");
        assert_eq!(p.address_policy, AddressPolicy::Public);
    }

    #[test]
    fn test_delete_reports_removal() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        store.set("cam-1", profile("alice")).unwrap();

        assert!(store.delete("cam-1").unwrap());
        assert!(!store.delete("cam-1").unwrap());
    }

    #[test]
    fn test_retain_drops_vanished_devices() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(dir.path());
        store.set("cam-1", profile("a")).unwrap();
        store.set("cam-2", profile("b")).unwrap();

        store.retain(&["cam-2".to_string()]).unwrap();
        assert!(!store.contains("cam-1"));
        assert!(store.contains("cam-2"));
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(PROFILES_FILE), b"{ not json").unwrap();

        let store = store_in(dir.path());
        assert!(!store.contains("cam-1"));
    }

    #[test]
    fn test_unknown_policy_string_falls_back_to_private() {
        let json = r#"{ "username": "u", "password": "p", "address_policy": "magic" }"#;
        let p: StreamProfile = serde_json::from_str(json).unwrap();
        assert_eq!(p.address_policy, AddressPolicy::Private);
    }
}
