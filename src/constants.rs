//! # System Constants
//!
//! Default locations and values for a stock Pi-hole host, plus the fixed
//! formats the shipper relies on.

/// Default configuration file location
pub const DEFAULT_CONFIG_PATH: &str = "/etc/pihole-elasticsearch/config.json";

/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`]
pub const CONFIG_PATH_ENV: &str = "PIHOLE_SHIPPER_CONFIG";

/// Prefix for environment variables overriding individual configuration keys
pub const ENV_PREFIX: &str = "PIHOLE_SHIPPER";

/// Timestamp formats
pub mod formats {
    /// Local-time rendering produced by the source query
    pub const SOURCE_LOCAL_TIME: &str = "%Y-%m-%d %H:%M:%S";
    /// ISO-8601 combined date and time without offset
    pub const ISO_DATETIME: &str = "%Y-%m-%dT%H:%M:%S";
}

/// Default values for every recognized configuration key
pub mod defaults {
    pub const HOST: &str = "localhost";
    pub const PORT: u16 = 9200;
    pub const USERNAME: &str = "user";
    pub const PASSWORD: &str = "password";
    pub const SLEEP_INTERVAL_SECS: u64 = 3600;
    pub const SCHEME: &str = "https";
    pub const VERIFY_CERTS: bool = false;
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    pub const INDEX_PREFIX: &str = "pihole-dns-logs";
    pub const DATABASE_PATH: &str = "/etc/pihole/pihole-FTL.db";
    pub const CHECKPOINT_PATH: &str = "/var/lib/pihole-elasticsearch/last_processed_id.txt";
    pub const CHECKPOINT_EVERY: u32 = 1;
    pub const LOG_DIR: &str = "/var/log/pihole-elasticsearch";
    pub const LOG_LEVEL: &str = "info";
    pub const LOG_FILE_PREFIX: &str = "pihole_elasticsearch_service";
    pub const LOG_MAX_FILES: usize = 5;
}
