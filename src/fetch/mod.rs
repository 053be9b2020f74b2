//! Feed retrieval: HTTP client seam plus request-generation fencing.

mod client;
pub mod generation;

pub use client::{BasicClient, HttpClient};

use anyhow::Result;

/// Fetches a URL into raw bytes through the injected client.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let req = reqwest::Request::new(reqwest::Method::GET, url.parse()?);

    let resp = client.execute(req).await?;
    Ok(resp.bytes().await?.to_vec())
}

/// Loads feed data from a local file path or fetches it over HTTP.
pub async fn load_source<C: HttpClient>(client: &C, source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http") {
        fetch_bytes(client, source).await?
    } else {
        std::fs::read(source)?
    };
    Ok(bytes)
}
