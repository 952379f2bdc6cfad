//! Catalog Service client.

use super::types::{parse_catalog, VoiceCatalog};
use crate::transport::HttpTransport;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Client for `GET /languages`.
pub struct CatalogClient {
    transport: Arc<HttpTransport>,
}

impl CatalogClient {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    pub async fn fetch(&self) -> Result<VoiceCatalog> {
        let response = self.transport.get_json("/languages").await.map_err(|e| {
            warn!(error = %e, "catalog request failed");
            Error::catalog_load(e.short_message())
        })?;

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("");
            return Err(Error::catalog_load(
                format!("API Error: {} {}", status.as_u16(), reason)
                    .trim_end()
                    .to_string(),
            ));
        }

        let body = response.bytes().await.map_err(|e| {
            Error::catalog_load(crate::transport::TransportError::Http(e).short_message())
        })?;
        let catalog = parse_catalog(&body)?;
        info!(languages = catalog.len(), "catalog loaded");
        Ok(catalog)
    }
}
