//! # OculoDesk configuration
//!
//! Configuration management for the desktop client:
//! - cloud credentials from a YAML file with environment overrides
//! - per-device stream profiles in a JSON store
//!
//! There is deliberately no global singleton here: a [`Config`] is loaded
//! once and passed explicitly to whoever needs it, so its lifecycle (load,
//! refresh, save) stays visible at the call sites.

use anyhow::{anyhow, Result};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::{Path, PathBuf}};
use tracing::info;

pub mod profiles;

pub use profiles::{AddressPolicy, StreamProfile, StreamProfileStore};

const ENV_CONFIG_DIR: &str = "OCUDESK_CONFIG";
const ENV_AUTHORIZATION: &str = "OCUDESK_CONFIG__AUTHORIZATION";
const ENV_TERMINAL_ID: &str = "OCUDESK_CONFIG__TERMINAL_ID";

const CONFIG_FILE: &str = "config.yaml";
const DOT_DIR: &str = ".oculodesk";

/// Cloud account credentials captured from the vendor's mobile app.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CloudCredentials {
    #[serde(default)]
    pub authorization: String,
    #[serde(default)]
    pub terminal_id: String,
}

impl CloudCredentials {
    pub fn is_configured(&self) -> bool {
        !self.authorization.trim().is_empty() && !self.terminal_id.trim().is_empty()
    }
}

/// Configuration for the desktop client.
///
/// Loaded from `config.yaml` in the configuration directory, with
/// environment variables taking precedence over file values.
#[derive(Clone, Debug)]
pub struct Config {
    config_dir: PathBuf,
    path: PathBuf,
    credentials: CloudCredentials,
}

impl Config {
    /// Finds a config directory by trying different locations in order:
    /// 1. The provided `directory` parameter if not empty
    /// 2. The `OCUDESK_CONFIG` environment variable
    /// 3. `.oculodesk` in the current directory
    /// 4. `.oculodesk` in the user's home directory
    fn find_config_dir(directory: &str) -> PathBuf {
        if !directory.is_empty() {
            return PathBuf::from(directory);
        }

        if let Ok(env_path) = env::var(ENV_CONFIG_DIR) {
            info!(env_var = ENV_CONFIG_DIR, path = %env_path, "Trying to load config from env");
            return PathBuf::from(env_path);
        }

        if Path::new(DOT_DIR).exists() {
            return PathBuf::from(DOT_DIR);
        }

        if let Some(home) = home_dir() {
            let home_config = home.join(DOT_DIR);
            if home_config.exists() {
                return home_config;
            }
        }

        PathBuf::from(DOT_DIR)
    }

    /// Validates and prepares a config directory
    fn validate_config_dir(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)?;
        }

        if !path.is_dir() {
            return Err(anyhow!("config path is not a directory"));
        }

        // Test write permission
        let test_file = path.join(".write_test");
        fs::write(&test_file, b"test")?;
        fs::remove_file(&test_file)?;

        Ok(())
    }

    /// Loads the configuration from the specified directory (or the default
    /// search order when `directory` is empty).
    pub fn load(directory: &str) -> Result<Self> {
        let config_dir = Self::find_config_dir(directory);
        Self::validate_config_dir(&config_dir)?;
        info!(config_dir = %config_dir.display(), "Using config directory");

        let path = config_dir.join(CONFIG_FILE);

        let mut credentials = if let Ok(data) = fs::read_to_string(&path) {
            info!(config_file = %path.display(), "Loaded config file");
            serde_yaml::from_str(&data)
                .map_err(|e| anyhow!("cannot parse {}: {e}", path.display()))?
        } else {
            info!(config_file = %path.display(), "Config file not found, starting unconfigured");
            CloudCredentials::default()
        };

        // Environment overrides win over the file.
        if let Ok(value) = env::var(ENV_AUTHORIZATION) {
            credentials.authorization = value;
        }
        if let Ok(value) = env::var(ENV_TERMINAL_ID) {
            credentials.terminal_id = value;
        }

        Ok(Self {
            config_dir,
            path,
            credentials,
        })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn credentials(&self) -> &CloudCredentials {
        &self.credentials
    }

    pub fn set_credentials(&mut self, credentials: CloudCredentials) {
        self.credentials = credentials;
    }

    /// Persist the current credentials back to `config.yaml`.
    pub fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&self.credentials)?;
        fs::write(&self.path, yaml)?;
        info!(config_file = %self.path.display(), "Saved config file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Environment variables are process-global; tests touching them (or
    // loading configs that read them) take this lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_load_from_explicit_dir_roundtrip() {
        let _env = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();

        let mut config = Config::load(dir_str).unwrap();
        assert!(!config.credentials().is_configured());

        config.set_credentials(CloudCredentials {
            authorization: "Bearer xyz".into(),
            terminal_id: "uuid-1".into(),
        });
        config.save().unwrap();

        let reloaded = Config::load(dir_str).unwrap();
        assert!(reloaded.credentials().is_configured());
        assert_eq!(reloaded.credentials().terminal_id, "uuid-1");
    }

    #[test]
    fn test_env_overrides_file_values() {
        let _env = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dir_str = dir.path().to_str().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "authorization: file-auth\nterminal_id: file-term\n",
        )
        .unwrap();

        env::set_var(ENV_AUTHORIZATION, "env-auth");
        let config = Config::load(dir_str).unwrap();
        env::remove_var(ENV_AUTHORIZATION);

        assert_eq!(config.credentials().authorization, "env-auth");
        assert_eq!(config.credentials().terminal_id, "file-term");
    }

    #[test]
    fn test_blank_credentials_are_unconfigured() {
        let creds = CloudCredentials {
            authorization: "  ".into(),
            terminal_id: "uuid".into(),
        };
        assert!(!creds.is_configured());
    }
}
