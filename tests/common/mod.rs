//! Shared fixtures: a mock HTTP server speaking the service API, and a
//! scriptable in-process backend.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tts_session::catalog::parse_catalog;
use tts_session::session::{AudioPlayer, InMemoryObserver};
use tts_session::{
    AudioFormat, ClientConfig, HealthStatus, SessionController, SynthesisRequest,
    SynthesisResult, TtsBackend, VoiceCatalog,
};

pub const UK_CATALOG: &str = r#"{
    "languages": {
        "en-GB": {"name": "English (UK)", "voices": {"Ryan (Male)": {}}}
    }
}"#;

pub const MULTI_CATALOG: &str = r#"{
    "languages": {
        "en-GB": {"name": "English (British)", "voices": {"Ryan (Male)": "en-GB-RyanNeural", "Sonia (Female)": "en-GB-SoniaNeural"}},
        "de": {"name": "Deutsch", "voices": {"Stefan (Male)": "de-DE-StefanNeural", "Katja (Female)": "de-DE-KatjaNeural"}},
        "pl": {"name": "Polski", "voices": {"Jakub (Male)": "pl-PL-JakubNeural"}}
    }
}"#;

pub const FAKE_MP3: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00fake-mp3-frames";

pub fn uk_request(text: &str) -> SynthesisRequest {
    SynthesisRequest::new(text, "en-GB", "Ryan (Male)")
}

pub fn catalog(body: &str) -> VoiceCatalog {
    parse_catalog(body.as_bytes()).expect("fixture catalog parses")
}

/// Mock server for the catalog, synthesis and health endpoints.
pub struct MockServerFixture {
    pub server: ServerGuard,
    pub base_url: String,
}

impl MockServerFixture {
    pub async fn new() -> Self {
        let server = Server::new_async().await;
        let base_url = server.url();
        Self { server, base_url }
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_base_url(&self.base_url)
            .with_http_timeout_secs(5)
            .with_request_timeout(Duration::from_secs(5))
    }

    pub fn controller(&self, observer: Arc<InMemoryObserver>) -> SessionController {
        SessionController::builder()
            .config(self.config())
            .observer(observer)
            .build()
            .expect("controller builds")
    }

    pub async fn mock_catalog(&mut self, status: usize, body: &str) -> Mock {
        self.server
            .mock("GET", "/languages")
            .match_header("accept", "application/json")
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// Successful synthesis for requests whose body contains `text`.
    pub async fn mock_audio(&mut self, text: &str, content_type: &str, audio: &[u8]) -> Mock {
        self.server
            .mock("POST", "/synthesize")
            .match_body(Matcher::PartialJson(serde_json::json!({ "text": text })))
            .with_status(200)
            .with_header("content-type", content_type)
            .with_body(audio)
            .create_async()
            .await
    }

    /// Failed synthesis for requests whose body contains `text`.
    pub async fn mock_synthesis_error(&mut self, text: &str, status: usize, body: &str) -> Mock {
        self.server
            .mock("POST", "/synthesize")
            .match_body(Matcher::PartialJson(serde_json::json!({ "text": text })))
            .with_status(status)
            .with_header("content-type", "application/json")
            .with_body(body)
            .create_async()
            .await
    }

    /// A synthesis endpoint that must never be called.
    pub async fn forbid_synthesis(&mut self) -> Mock {
        self.server
            .mock("POST", "/synthesize")
            .expect(0)
            .create_async()
            .await
    }
}

/// In-process backend with call counting and optional gates that hold
/// synthesis or catalog calls until released.
pub struct StubBackend {
    catalog: VoiceCatalog,
    gate: Option<Arc<Notify>>,
    catalog_gate: Option<Arc<Notify>>,
    hang: bool,
    pub synth_calls: AtomicUsize,
    pub catalog_calls: AtomicUsize,
}

impl StubBackend {
    pub fn new(catalog_body: &str) -> Self {
        Self {
            catalog: catalog(catalog_body),
            gate: None,
            catalog_gate: None,
            hang: false,
            synth_calls: AtomicUsize::new(0),
            catalog_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_gate(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Hold every catalog fetch until the gate is notified.
    pub fn with_catalog_gate(mut self, gate: Arc<Notify>) -> Self {
        self.catalog_gate = Some(gate);
        self
    }

    /// Synthesis never completes.
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn synth_count(&self) -> usize {
        self.synth_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TtsBackend for StubBackend {
    async fn fetch_catalog(&self) -> tts_session::Result<VoiceCatalog> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.catalog_gate {
            gate.notified().await;
        }
        Ok(self.catalog.clone())
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> tts_session::Result<SynthesisResult> {
        self.synth_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.hang {
            std::future::pending::<()>().await;
        }
        Ok(SynthesisResult {
            data: Bytes::from_static(FAKE_MP3),
            content_type: request.format.mime_type().to_string(),
            format: request.format,
            requested_at_ms: 0,
        })
    }

    async fn health(&self) -> tts_session::Result<HealthStatus> {
        Ok(serde_json::from_str(r#"{"status":"healthy","languages_supported":1}"#)?)
    }
}

pub fn stub_controller(
    backend: Arc<StubBackend>,
    player: Arc<dyn AudioPlayer>,
    config: ClientConfig,
    observer: Arc<InMemoryObserver>,
) -> SessionController {
    SessionController::builder()
        .config(config)
        .backend(backend)
        .player(player)
        .observer(observer)
        .build()
        .expect("controller builds")
}

pub fn format_result(format: AudioFormat) -> SynthesisResult {
    SynthesisResult {
        data: Bytes::from_static(FAKE_MP3),
        content_type: format.mime_type().to_string(),
        format,
        requested_at_ms: 0,
    }
}
