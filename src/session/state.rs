//! Session state, status lines and events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The controller's single active state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Idle,
    LoadingCatalog,
    Ready,
    Synthesizing,
    /// Sub-state of `Ready`: an MP3 artifact is being played.
    Playing,
    Error {
        message: String,
    },
}

impl SessionState {
    pub fn is_error(&self) -> bool {
        matches!(self, SessionState::Error { .. })
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SessionState::Error { message } => Some(message),
            _ => None,
        }
    }

    /// Whether play/download actions should be enabled.
    pub fn accepts_synthesis(&self) -> bool {
        !matches!(
            self,
            SessionState::Synthesizing | SessionState::LoadingCatalog
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::LoadingCatalog => f.write_str("loading_catalog"),
            SessionState::Ready => f.write_str("ready"),
            SessionState::Synthesizing => f.write_str("synthesizing"),
            SessionState::Playing => f.write_str("playing"),
            SessionState::Error { message } => write!(f, "error: {}", message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusKind {
    Info,
    Loading,
    Success,
    Error,
}

/// A one-line, human-readable status for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn new(kind: StatusKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn info(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Info, text)
    }

    pub fn loading(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Loading, text)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Success, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(StatusKind::Error, text)
    }
}

/// Notifications emitted by the controller, in the order things happen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    Status(StatusMessage),
    CatalogLoaded {
        languages: usize,
    },
    VoicesChanged {
        language: Option<String>,
        voices: Vec<String>,
    },
    SelectionChanged {
        language: Option<String>,
        voice: Option<String>,
    },
}
