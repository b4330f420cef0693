//! Diagnostic logging to a file in the platform state directory.
//!
//! The terminal is owned by the chat screen, so `tracing` output never goes
//! to stdout or stderr. `RUST_LOG` overrides the default filter.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::core::config::Config;

pub const DEFAULT_FILTER: &str = "bankchat=info";
pub const LOG_FILE_NAME: &str = "bankchat.log";

pub fn log_file_path() -> Option<PathBuf> {
    Config::project_dirs().map(|dirs| dirs.data_local_dir().join(LOG_FILE_NAME))
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global subscriber. Returns the log path, or `None` when no
/// data directory could be determined.
pub fn init_tracing() -> Result<Option<PathBuf>, Box<dyn Error>> {
    let Some(path) = log_file_path() else {
        return Ok(None);
    };
    init_tracing_to(&path)?;
    Ok(Some(path))
}

pub fn init_tracing_to(path: &Path) -> Result<(), Box<dyn Error>> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let mut log_file_opts = OpenOptions::new();
    log_file_opts.create(true).append(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        log_file_opts.mode(0o600);
    }

    let log_file = log_file_opts.open(path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| e as Box<dyn Error>)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn log_file_lives_under_project_dirs() {
        if let Some(path) = log_file_path() {
            assert_eq!(path.file_name().unwrap(), LOG_FILE_NAME);
        }
    }

    #[test]
    fn events_are_written_to_the_log_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join(LOG_FILE_NAME);

        // Another test binary may already own the global subscriber.
        if init_tracing_to(&path).is_err() {
            return;
        }
        tracing::warn!("diagnostics smoke test");

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("diagnostics smoke test"));
    }

    #[test]
    fn second_subscriber_install_is_reported_as_an_error() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.log");
        let second = dir.path().join("second.log");

        let _ = init_tracing_to(&first);
        let err = init_tracing_to(&second).unwrap_err();
        assert!(!err.to_string().is_empty());
        assert!(second.exists());
    }
}
