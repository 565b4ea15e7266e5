use std::{sync::Arc, time::Duration};

use reqwest::{Client, Response, StatusCode, Url, cookie::Jar, tls};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid endpoint {0}")]
    InvalidUrl(String),

    #[error("cannot build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed with status code: {status}")]
    Status { url: String, status: StatusCode },

    #[error("cannot decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("no stream location available for track {0}")]
    NoStreamUrl(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("login succeeded but no session cookie was returned")]
    MissingSession,
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
            || matches!(self, ApiError::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// HTTP client bound to one DAB endpoint.
///
/// Holds the cookie jar carrying the `session` cookie, so every clone of a
/// client shares the same login. Catalog calls are bounded by the request
/// timeout; stream transfers only by the connect timeout since their
/// duration depends on the file size.
#[derive(Debug, Clone)]
pub struct DabClient {
    http: Client,
    base: Url,
    jar: Arc<Jar>,
    request_timeout: Duration,
}

impl DabClient {
    pub fn new(endpoint: &str, request_timeout: Duration) -> Result<Self, ApiError> {
        let base = Url::parse(&format!("{}/", endpoint.trim().trim_end_matches('/')))
            .map_err(|_| ApiError::InvalidUrl(endpoint.to_string()))?;

        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(USER_AGENT)
            .min_tls_version(tls::Version::TLS_1_2)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(ApiError::Client)?;

        Ok(Self {
            http,
            base,
            jar,
            request_timeout,
        })
    }

    /// Attaches an existing session token to every following request.
    pub fn with_session(self, token: &str) -> Self {
        self.jar
            .add_cookie_str(&format!("session={}", token), &self.base);
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|_| ApiError::InvalidUrl(format!("{}{}", self.base, path)))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        let response = self
            .http
            .get(url.clone())
            .query(query)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let response = ensure_success(response)?;
        let url = response.url().to_string();
        response
            .json::<T>()
            .await
            .map_err(|source| ApiError::Decode { url, source })
    }

    /// Downloads a resource outside of the API, e.g. cover art.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        let response = self
            .http
            .get(url)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        let response = ensure_success(response)?;
        let bytes = response
            .bytes()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.to_string(),
                source,
            })?;

        Ok(bytes.to_vec())
    }
}

pub(crate) fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(ApiError::Status {
        url: response.url().to_string(),
        status,
    })
}
