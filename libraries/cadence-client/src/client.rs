//! Shared HTTP plumbing for the backend API.

use crate::error::{extract_error_message, ClientError, Result};
use crate::types::BackendConfig;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

/// HTTP client bound to one backend base URL.
///
/// Cheap to clone; the queue client and the track resolver each hold one.
///
/// # Example
///
/// ```ignore
/// use cadence_client::{BackendClient, BackendConfig, QueueClient, TrackResolver};
///
/// let backend = BackendClient::new(BackendConfig::new("http://127.0.0.1:5000/api"))?;
/// let queue = QueueClient::new(backend.clone());
/// let resolver = TrackResolver::new(backend);
///
/// queue.fetch_queue().await?;
/// if let Some(entry) = queue.current_entry() {
///     let track = resolver.resolve(&entry.title).await?;
///     println!("{} by {}", track.title, track.artist);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base: Url,
}

impl BackendClient {
    /// Create a new client with the given configuration.
    pub fn new(config: BackendConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(ClientError::InvalidUrl("URL cannot be empty".into()));
        }

        let url = config.url.trim().trim_end_matches('/');
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".into(),
            ));
        }

        let base = Url::parse(url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!("{} cannot be a base URL", url)));
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(format!("Cadence/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::Request)?;

        Ok(Self { http, base })
    }

    /// Normalized base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Underlying HTTP client, for fetching media bytes.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Build `{base}/{segments...}`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ClientError::InvalidUrl(self.base.to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// GET a JSON document.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = %url, "GET");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(e.to_string()))
    }

    /// Send a mutation with a JSON body; only the status matters.
    pub(crate) async fn send_json<B: serde::Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        url: Url,
        body: &B,
    ) -> Result<()> {
        debug!(method = %method, url = %url, "Sending request");

        let response = self
            .http
            .request(method, url)
            .json(body)
            .send()
            .await
            .map_err(ClientError::from_send)?;

        check_status(response).await?;
        Ok(())
    }
}

/// Turn a non-success response into `ServerError`.
pub(crate) async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ClientError::ServerError {
        status: status.as_u16(),
        message: extract_error_message(&body),
    })
}

/// Whether an error is the backend's "no such resource" answer.
pub(crate) fn is_not_found_status(err: &ClientError) -> bool {
    matches!(err, ClientError::ServerError { status, .. } if *status == StatusCode::NOT_FOUND.as_u16())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_keeps_api_prefix() {
        let client = BackendClient::new(BackendConfig::new("http://127.0.0.1:5000/api/")).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:5000/api");

        let url = client.endpoint(&["queue", "move"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:5000/api/queue/move");
    }

    #[test]
    fn endpoint_encodes_segments() {
        let client = BackendClient::new(BackendConfig::new("http://localhost:5000")).unwrap();

        let url = client.endpoint(&["song", "So What / Live"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/song/So%20What%20%2F%20Live");
    }

    #[test]
    fn not_found_status_detection() {
        let err = ClientError::ServerError {
            status: 404,
            message: "No song found".into(),
        };
        assert!(is_not_found_status(&err));

        let err = ClientError::ServerError {
            status: 500,
            message: String::new(),
        };
        assert!(!is_not_found_status(&err));
    }
}
