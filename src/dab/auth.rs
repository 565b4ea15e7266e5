use reqwest::StatusCode;

use super::{ApiError, DabClient, client::ensure_success};
use crate::types::LoginRequest;

pub const SESSION_COOKIE: &str = "session";

/// Logs in with email and password and returns the session token.
///
/// The token is the value of the `session` cookie set by the login endpoint.
/// It is also stored in the client's cookie jar, so `client` is logged in
/// once this returns.
///
/// # Errors
///
/// - [`ApiError::InvalidCredentials`] for empty input or a `401` answer
/// - [`ApiError::MissingSession`] when the answer carries no session cookie
/// - transport and status errors for anything else
pub async fn login(client: &DabClient, email: &str, password: &str) -> Result<String, ApiError> {
    if email.trim().is_empty() || password.is_empty() {
        return Err(ApiError::InvalidCredentials);
    }

    let url = client.endpoint("api/auth/login")?;
    let response = client
        .http()
        .post(url.clone())
        .json(&LoginRequest { email, password })
        .timeout(client.request_timeout())
        .send()
        .await
        .map_err(|source| ApiError::Transport {
            url: url.to_string(),
            source,
        })?;

    if response.status() == StatusCode::UNAUTHORIZED {
        return Err(ApiError::InvalidCredentials);
    }

    let response = ensure_success(response)?;
    response
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .ok_or(ApiError::MissingSession)
}
