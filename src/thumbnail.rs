//! Fetching print preview images from the pre-signed urls the vendor hands
//! out with each print run.

use std::time::Duration;

use bytes::Bytes;

/// Time allowed for a single thumbnail download.
pub const THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(20);

/// A downloaded preview image.
#[derive(Clone, Debug, PartialEq)]
pub struct Thumbnail {
    /// Image bytes, as served.
    pub bytes: Bytes,

    /// Content type reported by the server, if any.
    pub content_type: Option<String>,
}

/// Downloads thumbnails. Signed urls carry their own credentials, so no
/// authentication is added.
#[derive(Clone, Debug, Default)]
pub struct ThumbnailFetcher {
    client: reqwest::Client,
}

impl ThumbnailFetcher {
    /// Create a fetcher sharing the given http client.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Download the image at `url`.
    ///
    /// Anything other than a 200, or any transport error, reads as "no
    /// image". Signed urls expire, so this is expected to happen between a
    /// url going stale and the next refresh.
    pub async fn fetch(&self, url: &str) -> Option<Thumbnail> {
        let response = match self.client.get(url).timeout(THUMBNAIL_TIMEOUT).send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(error = format!("{:?}", error), "thumbnail fetch failed");
                return None;
            }
        };

        if response.status() != reqwest::StatusCode::OK {
            tracing::debug!(status = response.status().as_u16(), "thumbnail not available");
            return None;
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        match response.bytes().await {
            Ok(bytes) => Some(Thumbnail { bytes, content_type }),
            Err(error) => {
                tracing::debug!(error = format!("{:?}", error), "thumbnail body failed");
                None
            }
        }
    }
}
