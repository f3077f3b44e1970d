//! Remote model download.  Blocking; only ever called from a loader worker.

use std::time::Duration;

use crate::error::LoadError;

/// Downloaded body plus the server's `Content-Type`, if any.
#[derive(Debug)]
pub struct Fetched {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[cfg(not(target_arch = "wasm32"))]
pub fn fetch_bytes(url: &str, timeout: Duration) -> Result<Fetched, LoadError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LoadError::Network(e.to_string()))?;
    let response = client
        .get(url)
        .send()
        .map_err(|e| LoadError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Network(format!("{url} answered {status}")));
    }
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let bytes = response
        .bytes()
        .map_err(|e| LoadError::Network(e.to_string()))?
        .to_vec();
    log::debug!("fetched {} bytes from {url}", bytes.len());
    Ok(Fetched { bytes, content_type })
}

#[cfg(target_arch = "wasm32")]
pub fn fetch_bytes(url: &str, _timeout: Duration) -> Result<Fetched, LoadError> {
    Err(LoadError::Network(format!(
        "remote models are not available in the browser build ({url})"
    )))
}
