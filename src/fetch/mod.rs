mod basic;
mod client;
pub mod auth;

pub use basic::BasicClient;
pub use client::HttpClient;

use crate::error::{PipelineError, Result};

/// True when `source` is an `http` or `https` URL rather than a file path.
pub fn is_remote(source: &str) -> bool {
    reqwest::Url::parse(source)
        .map(|url| matches!(url.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Downloads `url` and returns the body.
///
/// A non-success status is reported as `DataUnavailable`.
pub async fn fetch_bytes<C: HttpClient + ?Sized>(client: &C, url: &str) -> Result<Vec<u8>> {
    let parsed = reqwest::Url::parse(url).map_err(|e| PipelineError::DataUnavailable {
        source_name: url.to_string(),
        message: format!("invalid URL: {e}"),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(PipelineError::DataUnavailable {
            source_name: url.to_string(),
            message: format!("HTTP status {status}"),
        });
    }
    Ok(resp.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fetch_bytes_rejects_invalid_url() {
        let client = BasicClient::new();
        let err = fetch_bytes(&client, "not a url").await.unwrap_err();
        assert!(matches!(err, PipelineError::DataUnavailable { .. }));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://www.ers.usda.gov/atlas.csv"));
        assert!(is_remote("http://localhost:8080/food.csv"));
        assert!(!is_remote("http_atlas.csv"));
        assert!(!is_remote("data/https.csv"));
        assert!(!is_remote("/tmp/food_access.csv"));
        assert!(!is_remote("ftp://example.com/food.csv"));
    }
}
