//! # Shipper Configuration
//!
//! All runtime settings live in one [`ShipperConfig`] value that is loaded once
//! at startup and handed to the components that need it. Nothing reads
//! configuration from process-wide state after that point.
//!
//! ## Sources
//!
//! Values are layered, later sources winning:
//!
//! 1. Built-in defaults ([`crate::constants::defaults`])
//! 2. The JSON configuration file (`/etc/pihole-elasticsearch/config.json`)
//! 3. `PIHOLE_SHIPPER_<KEY>` environment variables
//!
//! A missing or unusable file never stops the shipper; see [`ConfigManager`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use pihole_shipper::config::ConfigManager;
//!
//! let manager = ConfigManager::load();
//! let config = manager.config();
//! println!("shipping to {}:{}", config.host, config.port);
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::defaults;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::{ConfigManager, ConfigOrigin};

/// What to do with a record whose timestamp cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Journal the record, advance past it and keep going
    #[default]
    Skip,
    /// Stop the pass at the record
    Abort,
}

/// Root configuration for the shipper process
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShipperConfig {
    /// Elasticsearch hostname
    pub host: String,
    /// Elasticsearch port
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Seconds to sleep between the end of one pass and the start of the next
    pub sleep_interval: u64,

    /// `https` or `http`
    pub scheme: String,
    /// Validate the destination's TLS certificate
    pub verify_certs: bool,
    pub request_timeout_secs: u64,
    /// Index names are `<index_prefix>-YYYY-MM`
    pub index_prefix: String,

    /// Pi-hole FTL database
    pub database_path: PathBuf,
    /// File holding the last delivered query id
    pub checkpoint_path: PathBuf,
    /// Persist the checkpoint after this many records (always flushed at pass end)
    pub checkpoint_every: u32,
    pub on_malformed: MalformedPolicy,
    /// JSON-lines journal of skipped records
    pub dead_letter_path: Option<PathBuf>,
    /// Single-instance lock file
    pub lock_path: Option<PathBuf>,

    pub log_dir: PathBuf,
    pub log_level: String,
    pub log_max_files: usize,
}

impl Default for ShipperConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            username: defaults::USERNAME.to_string(),
            password: defaults::PASSWORD.to_string(),
            sleep_interval: defaults::SLEEP_INTERVAL_SECS,
            scheme: defaults::SCHEME.to_string(),
            verify_certs: defaults::VERIFY_CERTS,
            request_timeout_secs: defaults::REQUEST_TIMEOUT_SECS,
            index_prefix: defaults::INDEX_PREFIX.to_string(),
            database_path: PathBuf::from(defaults::DATABASE_PATH),
            checkpoint_path: PathBuf::from(defaults::CHECKPOINT_PATH),
            checkpoint_every: defaults::CHECKPOINT_EVERY,
            on_malformed: MalformedPolicy::default(),
            dead_letter_path: None,
            lock_path: None,
            log_dir: PathBuf::from(defaults::LOG_DIR),
            log_level: defaults::LOG_LEVEL.to_string(),
            log_max_files: defaults::LOG_MAX_FILES,
        }
    }
}

impl ShipperConfig {
    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigurationError::invalid_value(
                "host",
                &self.host,
                "host must not be empty",
            ));
        }
        if self.port == 0 {
            return Err(ConfigurationError::invalid_value(
                "port",
                self.port,
                "port must be between 1 and 65535",
            ));
        }
        if !matches!(self.scheme.as_str(), "http" | "https") {
            return Err(ConfigurationError::invalid_value(
                "scheme",
                &self.scheme,
                "scheme must be 'http' or 'https'",
            ));
        }
        if self.sleep_interval == 0 {
            return Err(ConfigurationError::invalid_value(
                "sleep_interval",
                self.sleep_interval,
                "sleep_interval must be at least one second",
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigurationError::invalid_value(
                "request_timeout_secs",
                self.request_timeout_secs,
                "request timeout must be at least one second",
            ));
        }
        if self.checkpoint_every == 0 {
            return Err(ConfigurationError::invalid_value(
                "checkpoint_every",
                self.checkpoint_every,
                "checkpoint_every must be at least 1",
            ));
        }
        let prefix_ok = !self.index_prefix.is_empty()
            && self
                .index_prefix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.'));
        if !prefix_ok {
            return Err(ConfigurationError::invalid_value(
                "index_prefix",
                &self.index_prefix,
                "index prefix must be non-empty lowercase ascii",
            ));
        }
        Ok(())
    }

    pub fn sleep_interval(&self) -> Duration {
        Duration::from_secs(self.sleep_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base URL of the destination cluster, e.g. `https://localhost:9200/`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}/", self.scheme, self.host, self.port)
    }
}
