//! # CLI Module
//!
//! Command implementations behind the `dabcli` binary. Each command prints
//! user-facing output with the crate's colored macros and terminates through
//! [`error!`](crate::error) on unrecoverable failures.
//!
//! ## Commands
//!
//! - [`login`] - Exchanges credentials for a session cookie and stores it
//! - [`search`] - Lists catalog hits for tracks, albums or artists
//! - [`download_track`], [`download_album`], [`download_artist`] - Run a
//!   download batch and summarize the result
//! - [`watch_interrupts`] - First Ctrl-C stops the batch, the second quits
//!
//! ## Layers
//!
//! ```text
//! CLI Layer (User Interface)
//!     ↓
//! Download Layer (batches, progress, tagging)
//!     ↓
//! Engine (worker pool, retry passes)
//!     ↓
//! DAB Client (HTTP)
//! ```
//!
//! ## Usage
//!
//! ```bash
//! dabcli login me@example.com secret
//! dabcli search "kind of blue" --type album
//! dabcli album 12345 --format mp3
//! ```

mod download;
mod interrupt;
mod login;
mod search;

pub use download::download_album;
pub use download::download_artist;
pub use download::download_track;
pub use interrupt::{ctrl_c_presses, watch_interrupts};
pub use login::login;
pub use search::search;

use crate::{
    config,
    dab::DabClient,
    error,
    management::SessionManager,
    warning,
};

fn anonymous_client() -> DabClient {
    match DabClient::new(&config::endpoint(), config::request_timeout()) {
        Ok(client) => client,
        Err(e) => error!("Cannot create API client. Err: {}", e),
    }
}

/// Client carrying the stored session cookie, or exits when there is none.
async fn session_client() -> DabClient {
    let session = match SessionManager::load().await {
        Ok(session) => session,
        Err(e) => {
            tracing::debug!(error = %e, "no usable session");
            warning!("Not logged in. Run `dabcli login <email> <password>` first.");
            std::process::exit(1);
        }
    };

    tracing::debug!(obtained_at = ?session.current_session().obtained_at, "using stored session");
    anonymous_client().with_session(session.token())
}
