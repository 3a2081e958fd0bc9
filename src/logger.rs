//! Debug logging support for qrev
//!
//! When debug mode is enabled (config or --debug), operations are logged to
//! a file: /var/log/qrev.log if writable, otherwise ~/.qrev/qrev.log.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*, registry};

/// Initialize file logging
///
/// Returns the log file path when logging was set up, `None` when disabled
/// or when the log file could not be created (a warning is printed and
/// normal operation continues without logging).
pub fn init_debug_logging(debug_enabled: bool) -> Result<Option<PathBuf>> {
    if !debug_enabled {
        return Ok(None);
    }

    let log_path = log_path()?;
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
    }

    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path);

    match file {
        Ok(log_file) => {
            let subscriber = registry()
                .with(
                    fmt::layer()
                        .with_writer(log_file)
                        .with_ansi(false)
                        .with_target(false),
                )
                .with(EnvFilter::new("qrev=debug"));

            tracing::subscriber::set_global_default(subscriber)
                .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))?;

            Ok(Some(log_path))
        }
        Err(e) => {
            // Logging failures must not break the rewrite itself.
            eprintln!("Warning: could not open log file: {e}");
            Ok(None)
        }
    }
}

/// /var/log/qrev.log when writable, ~/.qrev/qrev.log otherwise
fn log_path() -> Result<PathBuf> {
    if var_log_writable() {
        return Ok(PathBuf::from("/var/log/qrev.log"));
    }
    let home = dirs::home_dir().context("Cannot determine home directory")?;
    Ok(home.join(".qrev").join("qrev.log"))
}

fn var_log_writable() -> bool {
    let probe = "/var/log/.qrev_test_write";
    match fs::write(probe, b"") {
        Ok(_) => {
            let _ = fs::remove_file(probe);
            true
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_logging_returns_none() {
        let result = init_debug_logging(false);
        assert!(result.is_ok());
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_log_path_lands_in_known_location() {
        let path = log_path().unwrap();
        let is_var_log = path == PathBuf::from("/var/log/qrev.log");
        assert!(
            is_var_log || path.ends_with(".qrev/qrev.log"),
            "unexpected log path: {}",
            path.display()
        );
    }
}
