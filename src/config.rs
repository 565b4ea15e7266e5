//! Configuration management for the DAB downloader.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a centralized way to manage the remote
//! endpoint, the download location and the tuning knobs of the download engine.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the local data directory
//! 3. Application defaults

use std::{env, path::PathBuf, str::FromStr, time::Duration};

use tokio_util::sync::CancellationToken;

use crate::engine::{
    DEFAULT_MAX_CONCURRENT, DEFAULT_MAX_PASSES, DelayPolicy, RetryCoordinator, WorkerPool,
};

pub const DEFAULT_ENDPOINT: &str = "https://dabmusic.xyz";
pub const DEFAULT_DELAY_MIN_MS: u64 = 500;
pub const DEFAULT_DELAY_MAX_MS: u64 = 2000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ITEM_TIMEOUT_SECS: u64 = 600;

/// Returns the platform-specific data directory of the application.
///
/// - Linux: `~/.local/share/dabcli`
/// - macOS: `~/Library/Application Support/dabcli`
/// - Windows: `%LOCALAPPDATA%/dabcli`
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("dabcli");
    path
}

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Creates the data directory if it doesn't exist yet. A missing `.env` file
/// is not an error: every setting has a default, and values already present
/// in the process environment always win over the file.
///
/// # Errors
///
/// This function will return an error if:
/// - The data directory cannot be created
/// - The `.env` file exists but cannot be read or parsed
///
/// # Example
///
/// ```
/// use dabcli::config;
///
/// #[tokio::main]
/// async fn main() {
///     if let Err(e) = config::load_env().await {
///         eprintln!("Configuration error: {}", e);
///     }
/// }
/// ```
pub async fn load_env() -> Result<(), String> {
    let dir = data_dir();
    async_fs::create_dir_all(&dir)
        .await
        .map_err(|e| e.to_string())?;

    let path = dir.join(".env");
    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }

    Ok(())
}

/// Returns the base URL of the DAB API.
///
/// Reads `DAB_ENDPOINT`, falling back to [`DEFAULT_ENDPOINT`].
pub fn endpoint() -> String {
    match env::var("DAB_ENDPOINT") {
        Ok(endpoint) if !endpoint.trim().is_empty() => endpoint,
        _ => DEFAULT_ENDPOINT.to_string(),
    }
}

/// Returns the root folder downloads are written to.
///
/// Reads `DOWNLOAD_LOCATION`, falling back to the current directory. The
/// location is not created here; a missing root is reported by
/// [`Library::open`](crate::management::Library::open).
pub fn download_location() -> PathBuf {
    match env::var("DOWNLOAD_LOCATION") {
        Ok(location) if !location.trim().is_empty() => PathBuf::from(location),
        _ => PathBuf::from("."),
    }
}

pub fn request_timeout() -> Duration {
    Duration::from_secs(env_or("DAB_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS))
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
        .unwrap_or(default)
}

/// Tuning of the download engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub max_concurrent: usize,
    pub max_passes: usize,
    pub delay: DelayPolicy,
    pub item_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            max_passes: DEFAULT_MAX_PASSES,
            delay: DelayPolicy::random_millis(DEFAULT_DELAY_MIN_MS, DEFAULT_DELAY_MAX_MS),
            item_timeout: Duration::from_secs(DEFAULT_ITEM_TIMEOUT_SECS),
        }
    }
}

impl EngineConfig {
    /// Reads the engine settings from the environment.
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `DAB_MAX_CONCURRENT` | 3 |
    /// | `DAB_MAX_RETRIES` | 3 |
    /// | `DAB_DELAY_MIN_MS` / `DAB_DELAY_MAX_MS` | 500 / 2000 |
    /// | `DAB_ITEM_TIMEOUT_SECS` | 600 |
    ///
    /// Setting both delay bounds to `0` disables the pause between items.
    pub fn from_env() -> Self {
        let min = env_or("DAB_DELAY_MIN_MS", DEFAULT_DELAY_MIN_MS);
        let max = env_or("DAB_DELAY_MAX_MS", DEFAULT_DELAY_MAX_MS);
        let delay = if min == 0 && max == 0 {
            DelayPolicy::None
        } else {
            DelayPolicy::random_millis(min, max)
        };

        Self {
            max_concurrent: env_or("DAB_MAX_CONCURRENT", DEFAULT_MAX_CONCURRENT),
            max_passes: env_or("DAB_MAX_RETRIES", DEFAULT_MAX_PASSES),
            delay,
            item_timeout: Duration::from_secs(env_or(
                "DAB_ITEM_TIMEOUT_SECS",
                DEFAULT_ITEM_TIMEOUT_SECS,
            )),
        }
    }

    pub fn coordinator(&self, cancel: CancellationToken) -> RetryCoordinator {
        let pool = WorkerPool::new(self.max_concurrent)
            .with_delay(self.delay)
            .with_item_timeout(self.item_timeout);

        RetryCoordinator::new(pool, self.max_passes).with_cancellation(cancel)
    }
}
