//! # Structured Logging Module
//!
//! Logging that writes human-readable lines to stdout and JSON lines to a
//! rolling file, so the shipper can run under systemd or in a container and
//! still leave a local trail.
//!
//! `RUST_LOG` takes precedence over the configured level. Chatty dependency
//! targets (`sqlx`, `reqwest`, `hyper`) are held at `warn`.

use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::ShipperConfig;
use crate::constants::defaults;

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Logging settings extracted from [`ShipperConfig`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub log_dir: PathBuf,
    pub log_level: String,
    pub max_files: usize,
}

impl From<&ShipperConfig> for LoggingConfig {
    fn from(config: &ShipperConfig) -> Self {
        Self {
            log_dir: config.log_dir.clone(),
            log_level: config.log_level.clone(),
            max_files: config.log_max_files,
        }
    }
}

/// Keeps the background file writer alive; drop it to flush on shutdown
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize console + rolling-file logging.
///
/// Safe to call more than once; only the first call installs a subscriber.
/// If the log directory cannot be prepared the shipper logs to stdout only.
pub fn init_structured_logging(config: &LoggingConfig) -> LoggingGuard {
    let mut file_guard = None;

    LOGGER_INITIALIZED.get_or_init(|| {
        let (file_writer, file_error) = match open_file_appender(config) {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                file_guard = Some(guard);
                (Some(writer), None)
            }
            Err(reason) => (None, Some(reason)),
        };

        let console_layer = fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(std::io::stdout().is_terminal())
            .with_filter(build_filter(&config.log_level));

        let file_layer = file_writer.map(|writer| {
            fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(build_filter(&config.log_level))
        });

        if tracing_subscriber::registry()
            .with(console_layer)
            .with(file_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        match file_error {
            None => tracing::info!(
                log_dir = %config.log_dir.display(),
                max_files = config.max_files,
                "Structured logging initialized with file output"
            ),
            Some(reason) => tracing::warn!(
                log_dir = %config.log_dir.display(),
                reason = %reason,
                "File logging unavailable, logging to stdout only"
            ),
        }
    });

    LoggingGuard {
        _file_guard: file_guard,
    }
}

fn open_file_appender(config: &LoggingConfig) -> Result<RollingFileAppender, String> {
    fs::create_dir_all(&config.log_dir).map_err(|e| e.to_string())?;

    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(defaults::LOG_FILE_PREFIX)
        .filename_suffix("log")
        .max_log_files(config.max_files.max(1))
        .build(&config.log_dir)
        .map_err(|e| e.to_string())
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

fn default_directives(level: &str) -> String {
    format!("{level},sqlx=warn,reqwest=warn,hyper=warn,hyper_util=warn")
}

/// Log pass-level progress with a consistent `operation` field
#[macro_export]
macro_rules! log_pass {
    ($level:ident, $operation:expr $(,)?) => {
        tracing::$level!(operation = %$operation, "{}", $operation)
    };
    ($level:ident, $operation:expr, $($key:ident: $value:expr),+ $(,)?) => {
        tracing::$level!(
            operation = %$operation,
            $($key = ?$value,)*
            "{}", $operation
        )
    };
}

/// Log a per-record event; `record_id` is always the first field
#[macro_export]
macro_rules! log_record {
    ($level:ident, $operation:expr, record_id: $record_id:expr $(,)?) => {
        tracing::$level!(
            record_id = $record_id,
            operation = %$operation,
            "{}", $operation
        )
    };
    ($level:ident, $operation:expr, record_id: $record_id:expr, $($key:ident: $value:expr),+ $(,)?) => {
        tracing::$level!(
            record_id = $record_id,
            operation = %$operation,
            $($key = ?$value,)*
            "{}", $operation
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_quiet_dependencies() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("sqlx=warn"));
        assert!(directives.contains("reqwest=warn"));
    }

    #[test]
    fn test_logging_config_from_shipper_config() {
        let shipper = ShipperConfig {
            log_level: "debug".to_string(),
            log_max_files: 9,
            ..Default::default()
        };
        let logging = LoggingConfig::from(&shipper);
        assert_eq!(logging.log_level, "debug");
        assert_eq!(logging.max_files, 9);
        assert_eq!(logging.log_dir, PathBuf::from("/var/log/pihole-elasticsearch"));
    }

    #[test]
    fn test_macros_usable_as_match_arm_expressions() {
        for delivered in [0usize, 3] {
            match delivered {
                0 => log_pass!(debug, "Nothing to ship"),
                n => log_pass!(info, "Shipped records", rows: n, checkpoint: Some(7i64)),
            }
            let () = if delivered == 0 {
                log_record!(warn, "Record skipped", record_id: 4i64)
            } else {
                log_record!(debug, "Record delivered", record_id: 5i64, index: "pihole-dns-logs-2024-03")
            };
        }
    }
}
