//! # tts-session-rust
//!
//! 文字转语音 Web 服务的会话控制器与 HTTP 客户端。
//!
//! Session controller and HTTP client for a text-to-speech web service.
//!
//! ## Overview
//!
//! The service exposes a voice catalog (`GET /languages`) and a synthesis
//! endpoint (`POST /synthesize`). This crate wraps both behind a single
//! [`SessionController`] that validates the user's selection, issues one
//! request per synthesis, and hands the resulting audio to a player or writes
//! it to disk, reporting progress through observable state.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tts_session::{ClientConfig, SessionController, SynthesisRequest};
//!
//! #[tokio::main]
//! async fn main() -> tts_session::Result<()> {
//!     let session = SessionController::connect(ClientConfig::from_env())?;
//!     session.load_catalog().await?;
//!
//!     let request = SynthesisRequest::new("Hello there", "en-GB", "Ryan (Male)");
//!     let audio = session.request_synthesis(&request).await?;
//!     let saved = session.consume_for_download(&audio, request.quality).await?;
//!     println!("saved {}", saved.path.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | Session state machine, observers, playback and downloads |
//! | [`catalog`] | Voice catalog types and the catalog client |
//! | [`synthesis`] | Synthesis request/result types and the synthesis client |
//! | [`backend`] | The service seam ([`TtsBackend`]) and its HTTP implementation |
//! | [`config`] | Base URL resolution, timeouts and defaults |
//! | [`transport`] | Shared `reqwest` transport |
//! | [`text`] | Pause-tag aware character counting |

pub mod backend;
pub mod catalog;
pub mod config;
pub mod session;
pub mod synthesis;
pub mod text;
pub mod transport;

pub use backend::{HealthStatus, HttpBackend, TtsBackend};
pub use catalog::{LanguageEntry, VoiceCatalog};
pub use config::ClientConfig;
pub use session::{
    PlaybackOutcome, SessionController, SessionEvent, SessionObserver, SessionState,
    StatusMessage,
};
pub use synthesis::{AudioFormat, Quality, SynthesisRequest, SynthesisResult};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
