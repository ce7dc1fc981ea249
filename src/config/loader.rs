//! Configuration Loader
//!
//! Builds a [`ShipperConfig`] from defaults, the JSON file and environment
//! overrides. Loading never fails: an absent or unusable file degrades to
//! defaults and the reason is kept so it can be logged once logging is up.

use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

use super::error::ConfigResult;
use super::ShipperConfig;
use crate::constants::{CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH, ENV_PREFIX};

/// Where the active configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    /// The file was read and merged over defaults
    File(PathBuf),
    /// No file at the path; defaults in use
    MissingFile(PathBuf),
    /// The file exists but could not be parsed or validated; defaults in use
    InvalidFile { path: PathBuf, reason: String },
}

/// Loaded configuration plus its provenance
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: ShipperConfig,
    origin: ConfigOrigin,
    /// Environment overrides that had to be discarded
    rejected_overrides: Option<String>,
}

impl ConfigManager {
    /// Load from `$PIHOLE_SHIPPER_CONFIG` or the default location
    pub fn load() -> Self {
        let path = env::var(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load_from_path(path)
    }

    /// Load from an explicit file path
    pub fn load_from_path(path: impl AsRef<Path>) -> Self {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    /// Load from an explicit file path with a custom environment prefix.
    /// Lets tests exercise overrides without touching the real prefix.
    pub fn load_with_env_prefix(path: impl AsRef<Path>, env_prefix: &str) -> Self {
        let path = path.as_ref().to_path_buf();

        if !path.is_file() {
            let (config, rejected_overrides) = Self::fallback(env_prefix);
            return Self {
                config,
                origin: ConfigOrigin::MissingFile(path),
                rejected_overrides,
            };
        }

        let merged = match Self::build(Some(&path), Some(env_prefix)) {
            Ok(config) => {
                return Self {
                    config,
                    origin: ConfigOrigin::File(path),
                    rejected_overrides: None,
                }
            }
            Err(err) => err,
        };

        // A bad override must not cost the operator a good file.
        match Self::build(Some(&path), None) {
            Ok(config) => Self {
                config,
                origin: ConfigOrigin::File(path),
                rejected_overrides: Some(merged.to_string()),
            },
            Err(err) => {
                let (config, rejected_overrides) = Self::fallback(env_prefix);
                Self {
                    config,
                    origin: ConfigOrigin::InvalidFile {
                        path,
                        reason: err.to_string(),
                    },
                    rejected_overrides,
                }
            }
        }
    }

    pub fn config(&self) -> &ShipperConfig {
        &self.config
    }

    pub fn into_config(self) -> ShipperConfig {
        self.config
    }

    pub fn origin(&self) -> &ConfigOrigin {
        &self.origin
    }

    /// Emit the outcome of loading. Call after logging is initialized.
    pub fn log_summary(&self) {
        match &self.origin {
            ConfigOrigin::File(path) => {
                info!(config_file = %path.display(), "Configuration loaded");
            }
            ConfigOrigin::MissingFile(path) => {
                warn!(
                    config_file = %path.display(),
                    "Configuration file not found. Using default settings."
                );
            }
            ConfigOrigin::InvalidFile { path, reason } => {
                error!(
                    config_file = %path.display(),
                    reason = %reason,
                    "Error decoding configuration file. Using default settings."
                );
            }
        }

        if let Some(reason) = &self.rejected_overrides {
            error!(reason = %reason, "Ignoring invalid environment overrides");
        }

        info!(config = %self.debug_config(), "Effective configuration");
    }

    /// Configuration as JSON with credentials masked
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_config_for_logging(&self.config)
    }

    fn build(path: Option<&Path>, env_prefix: Option<&str>) -> ConfigResult<ShipperConfig> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Json).required(true));
        }
        if let Some(prefix) = env_prefix {
            builder = builder.add_source(Environment::with_prefix(prefix).try_parsing(true));
        }

        let config: ShipperConfig = builder.build()?.try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, or bare defaults if the overrides are unusable
    fn fallback(env_prefix: &str) -> (ShipperConfig, Option<String>) {
        match Self::build(None, Some(env_prefix)) {
            Ok(config) => (config, None),
            Err(err) => (ShipperConfig::default(), Some(err.to_string())),
        }
    }

    fn sanitize_config_for_logging(config: &ShipperConfig) -> serde_json::Value {
        let mut config_json = serde_json::json!(config);
        let sensitive_patterns = ["password", "secret", "token", "credential"];
        Self::sanitize_json_recursive(&mut config_json, &sensitive_patterns);
        config_json
    }

    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.contains(pattern));

                    if is_sensitive {
                        *val = match val {
                            serde_json::Value::String(s) if s.is_empty() => {
                                serde_json::Value::String("[EMPTY]".to_string())
                            }
                            _ => serde_json::Value::String("[MASKED]".to_string()),
                        };
                    } else {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                    }
                }
            }
            serde_json::Value::Array(items) => {
                for item in items.iter_mut() {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }
}
