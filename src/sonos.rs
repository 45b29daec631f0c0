//! HTTP client for `node-sonos-http-api`
//!
//! The API is plain unauthenticated GET: `http://host:5005/<room>/<cmd>`
//! for room-addressed commands and `http://host:5005/<cmd>` for global
//! ones. Room names and spoken phrases go into the path and must be
//! percent-escaped.

use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Control-plane request errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server returned HTTP {status} for {url}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },
}

/// Percent-escape a path segment (room name, phrase).
pub fn escape(segment: &str) -> String {
    utf8_percent_encode(segment, NON_ALPHANUMERIC).to_string()
}

/// Client for a single `node-sonos-http-api` instance
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: reqwest::Client,
}

impl Client {
    /// Create a client for the given base URL, e.g. `http://localhost:5005`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Issue a GET and return the response body.
    pub async fn request(&self, url: &str) -> Result<String, ClientError> {
        debug!(%url, "sonos request");

        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        debug!(%url, %body, "sonos response");
        Ok(body)
    }

    /// Issue a command with no room addressing, e.g. `pauseall`.
    pub async fn global(&self, path: &str) -> Result<String, ClientError> {
        let url = format!("{}/{}", self.base_url, path);
        self.request(&url).await
    }

    /// Issue a command addressed to a room, e.g. `Living Room/playpause`.
    pub async fn room(&self, room: &str, path: &str) -> Result<String, ClientError> {
        let url = format!("{}/{}/{}", self.base_url, escape(room), path);
        self.request(&url).await
    }

    /// Have a room's speaker say a phrase.
    pub async fn speak(&self, room: &str, phrase: &str) -> Result<String, ClientError> {
        debug!(%room, %phrase, "speaking");
        self.room(room, &format!("say/{}", escape(phrase))).await
    }
}
