use crate::config::ClientConfig;
use crate::Result;
use reqwest::Response;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Correlation header attached to every outgoing request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.http_timeout())
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()
            .map_err(|e| crate::Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// `GET <base>/<path>` expecting a JSON reply.
    pub async fn get_json(&self, path: &str) -> std::result::Result<Response, TransportError> {
        let url = self.url(path);
        let request_id = Uuid::new_v4().to_string();
        debug!(%url, %request_id, "GET");
        self.client
            .get(&url)
            .header("accept", "application/json")
            .header(REQUEST_ID_HEADER, request_id)
            .send()
            .await
            .map_err(TransportError::Http)
    }

    /// `POST <base>/<path>` with a JSON body. The caller inspects the status.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> std::result::Result<Response, TransportError> {
        let url = self.url(path);
        let request_id = Uuid::new_v4().to_string();
        debug!(%url, %request_id, "POST");
        self.client
            .post(&url)
            .header(REQUEST_ID_HEADER, request_id)
            .json(body)
            .send()
            .await
            .map_err(TransportError::Http)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Transport error: {0}")]
    Other(String),
}

impl TransportError {
    /// One-line description that never exposes the underlying error chain.
    pub fn short_message(&self) -> String {
        match self {
            TransportError::Http(e) if e.is_timeout() => "Request timed out".to_string(),
            TransportError::Http(e) if e.is_connect() => {
                "Could not reach the TTS service".to_string()
            }
            TransportError::Http(e) if e.is_decode() || e.is_body() => {
                "Failed to read the service response".to_string()
            }
            TransportError::Http(_) => "Network request failed".to_string(),
            TransportError::Timeout(d) => format!("Request timed out after {}ms", d.as_millis()),
            TransportError::Other(_) => "Network request failed".to_string(),
        }
    }
}
