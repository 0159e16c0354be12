//! Single-page fetcher with a browser-like client identity.

use std::time::Duration;

use crate::error::{FetchError, ScoutError};

/// Desktop Chrome identity sent with every page request.
const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Issues one GET per candidate URL through a Chrome-emulating client.
///
/// A non-200 answer, connection error, or timeout is reported as a
/// [`FetchError`]; the caller treats that as "no data for this URL".
pub(crate) struct PageFetcher {
    client: wreq::Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ScoutError> {
        let client = wreq::Client::builder()
            .emulation(wreq_util::Emulation::Chrome131)
            .timeout(timeout)
            .build()
            .map_err(|e| ScoutError::ClientBuild(e.to_string()))?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(url)
            .header("User-Agent", DESKTOP_UA)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if status.as_u16() != 200 {
            return Err(FetchError::Status(status.as_u16()));
        }

        resp.text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}
