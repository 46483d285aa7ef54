use crate::error::ProbeError;
use tracing::debug;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

/// Bodies past this size are truncated before hashing.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

pub async fn fetch(client: &reqwest::Client, url: &Url) -> Result<Page, ProbeError> {
    let mut response = client.get(url.clone()).send().await?;
    let status = response.status().as_u16();

    let mut raw = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        let room = MAX_BODY_BYTES - raw.len();
        raw.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if raw.len() >= MAX_BODY_BYTES {
            debug!(%url, "Body truncated.");
            break;
        }
    }
    let body = String::from_utf8_lossy(&raw).into_owned();
    debug!(%url, status, bytes = body.len(), "Fetched page.");
    Ok(Page { status, body })
}

/// The target URL (scheme, path, query) pointed at another host.
pub fn candidate_url(target: &Url, host: &str) -> Option<Url> {
    let mut url = target.clone();
    url.set_host(Some(host)).ok()?;
    Some(url)
}
