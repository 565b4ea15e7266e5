//! DAB Music Downloader Library
//!
//! This library downloads tracks, albums and whole discographies from a DAB
//! music API. Downloads run through a bounded-concurrency engine that retries
//! failed items in whole passes and reports what could not be fetched.
//!
//! # Modules
//!
//! - `cli` - Command-line interface implementations
//! - `config` - Configuration management and environment variables
//! - `dab` - DAB API client (auth, catalog lookups, stream resolution)
//! - `download` - Track fetcher, tagging, batch builders and progress display
//! - `engine` - Generic worker pool and retry coordinator
//! - `error` - Errors that abort a download before it starts
//! - `logging` - `tracing` subscriber setup
//! - `management` - Session cache and on-disk library layout
//! - `types` - Data structures and type definitions
//! - `utils` - Naming, parsing and formatting helpers
//!
//! # Example
//!
//! ```
//! use dabcli::{config, cli};
//!
//! #[tokio::main]
//! async fn main() -> dabcli::Res<()> {
//!     config::load_env().await?;
//!     // Use CLI functions...
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod dab;
pub mod download;
pub mod engine;
pub mod error;
pub mod logging;
pub mod management;
pub mod types;
pub mod utils;

/// A convenient Result type alias for operations that may fail.
///
/// Uses a boxed dynamic error trait object with `Send + Sync` bounds so it
/// can cross task boundaries.
///
/// # Example
///
/// ```
/// use dabcli::Res;
///
/// async fn fetch_data() -> Res<String> {
///     Ok("data".to_string())
/// }
/// ```
pub type Res<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Prints an informational message with a blue bullet point.
///
/// # Example
///
/// ```
/// info!("Starting download for album {}", title);
/// ```
#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
  })
}

/// Prints a success message with a green checkmark.
#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
  })
}

/// Prints an error message with a red exclamation mark and exits the program.
///
/// Terminates the process with exit code 1 right after printing. Only use it
/// for errors the command cannot recover from.
///
/// # Example
///
/// ```
/// error!("Cannot load session. Err: {}", e);
/// // Program exits here - code after this will not execute
/// ```
#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    std::process::exit(1);
  })
}

/// Prints a warning message with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
  ($($arg:tt)*) => ({
    use colored::Colorize;
    println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
  })
}
