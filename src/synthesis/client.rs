//! Synthesis Service client.

use super::types::{unix_millis, SynthesisRequest, SynthesisResult};
use crate::error::GENERIC_SYNTHESIS_FAILURE;
use crate::transport::{HttpTransport, TransportError};
use crate::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use tracing::{debug, warn};

/// Client for `POST /synthesize`. One attempt per call.
pub struct SynthesisClient {
    transport: Arc<HttpTransport>,
}

impl SynthesisClient {
    pub fn new(transport: Arc<HttpTransport>) -> Self {
        Self { transport }
    }

    pub async fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesisResult> {
        let requested_at_ms = unix_millis();
        debug!(
            language = %request.language_code,
            voice = %request.voice_name,
            speed = request.speed_percent,
            quality = request.quality.as_str(),
            format = %request.format,
            "synthesis request"
        );

        let response = self
            .transport
            .post_json("/synthesize", request)
            .await
            .map_err(|e| {
                warn!(error = %e, "synthesis request failed");
                Error::synthesis(e.short_message(), None)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            let message =
                error_detail(&body).unwrap_or_else(|| GENERIC_SYNTHESIS_FAILURE.to_string());
            warn!(status = status.as_u16(), %message, "synthesis rejected");
            return Err(Error::synthesis(message, Some(status.as_u16())));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_else(|| request.format.mime_type().to_string());

        let data = response
            .bytes()
            .await
            .map_err(|e| Error::synthesis(TransportError::Http(e).short_message(), None))?;

        Ok(SynthesisResult {
            data,
            content_type,
            format: request.format,
            requested_at_ms,
        })
    }
}

/// The `detail` string of an error body, if the body is JSON and carries one.
pub(crate) fn error_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    value
        .get("detail")?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_detail() {
        assert_eq!(
            error_detail(br#"{"detail":"TTS engine overloaded"}"#).as_deref(),
            Some("TTS engine overloaded")
        );
        // Validation failures from the service carry a list, not a message.
        assert_eq!(error_detail(br#"{"detail":[{"loc":["body","text"]}]}"#), None);
        assert_eq!(error_detail(br#"{"error":"x"}"#), None);
        assert_eq!(error_detail(b"<html>502</html>"), None);
        assert_eq!(error_detail(br#"{"detail":""}"#), None);
        assert_eq!(
            error_detail(br#"{"detail":"  Text too long \n"}"#).as_deref(),
            Some("  Text too long \n")
        );
    }
}
