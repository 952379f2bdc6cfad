//! The service seam: everything the session controller needs from the network.
//!
//! [`HttpBackend`] talks to the real service; tests and embedders can supply
//! their own [`TtsBackend`].

use crate::catalog::{CatalogClient, VoiceCatalog};
use crate::config::ClientConfig;
use crate::synthesis::{SynthesisClient, SynthesisRequest, SynthesisResult};
use crate::transport::HttpTransport;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub languages_supported: Option<u32>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy") || self.status.eq_ignore_ascii_case("ok")
    }
}

#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// `GET /languages`
    async fn fetch_catalog(&self) -> Result<VoiceCatalog>;

    /// `POST /synthesize`, exactly once.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisResult>;

    /// `GET /health`
    async fn health(&self) -> Result<HealthStatus>;
}

pub struct HttpBackend {
    transport: Arc<HttpTransport>,
    catalog: CatalogClient,
    synthesis: SynthesisClient,
}

impl HttpBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = Arc::new(HttpTransport::new(config)?);
        Ok(Self {
            catalog: CatalogClient::new(transport.clone()),
            synthesis: SynthesisClient::new(transport.clone()),
            transport,
        })
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }
}

#[async_trait]
impl TtsBackend for HttpBackend {
    async fn fetch_catalog(&self) -> Result<VoiceCatalog> {
        self.catalog.fetch().await
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisResult> {
        self.synthesis.synthesize(request).await
    }

    async fn health(&self) -> Result<HealthStatus> {
        let response = self.transport.get_json("/health").await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(crate::transport::TransportError::Other(
                format!("health check returned HTTP {}", status.as_u16()),
            )));
        }
        let body = response
            .bytes()
            .await
            .map_err(crate::transport::TransportError::Http)?;
        Ok(serde_json::from_slice(&body)?)
    }
}
