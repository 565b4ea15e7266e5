use reqwest::{Url, header::CONTENT_LENGTH};

use super::{ApiError, DabClient};
use crate::types::{CatalogId, Format, StreamUrlResponse};

/// Resolves the time-limited URL a track can be downloaded from.
///
/// The returned location expires, so callers resolve it again for every
/// attempt instead of keeping it around.
pub async fn resolve_stream_url(
    client: &DabClient,
    track_id: &CatalogId,
    format: Format,
) -> Result<Url, ApiError> {
    let quality = format.quality().to_string();
    let response = client
        .get_json::<StreamUrlResponse>(
            "api/stream",
            &[("trackId", track_id.as_str()), ("quality", quality.as_str())],
        )
        .await?;

    if response.url.trim().is_empty() {
        return Err(ApiError::NoStreamUrl(track_id.to_string()));
    }

    Url::parse(response.url.trim()).map_err(|_| ApiError::InvalidUrl(response.url))
}

/// Asks the stream host for the size of a file without downloading it.
pub async fn probe_size(client: &DabClient, url: &Url) -> Option<u64> {
    let response = client
        .http()
        .head(url.clone())
        .timeout(client.request_timeout())
        .send()
        .await
        .ok()?;

    if !response.status().is_success() {
        return None;
    }

    response
        .headers()
        .get(CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .filter(|size| *size > 0)
}
