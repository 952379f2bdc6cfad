use thiserror::Error;

/// Generic message used when the synthesis service fails without a `detail` field.
pub const GENERIC_SYNTHESIS_FAILURE: &str = "Failed to synthesize audio";

/// Structured error context for validation and configuration failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Field that caused the error (e.g., "request.voice", "config.base_url")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., the rejected value)
    pub details: Option<String>,
    /// Source of the error (e.g., "request_validator", "config_loader")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the session controller and its service clients.
///
/// Every variant renders a short message through [`Error::user_message`];
/// the `Display` form adds a category prefix for logs.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Validation error: {message}{}", format_context(.context))]
    Validation {
        message: String,
        context: ErrorContext,
    },

    #[error("Catalog load error: {message}")]
    CatalogLoad { message: String },

    #[error("Synthesis error: {message}")]
    Synthesis {
        message: String,
        status: Option<u16>,
    },

    #[error("A synthesis request is already in progress")]
    Busy,

    #[error("Playback error: {message}")]
    Playback { message: String },

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Network transport error: {0}")]
    Transport(#[from] crate::transport::TransportError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn validation_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Validation {
            message: msg.into(),
            context,
        }
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    pub fn catalog_load(msg: impl Into<String>) -> Self {
        Error::CatalogLoad {
            message: msg.into(),
        }
    }

    pub fn synthesis(msg: impl Into<String>, status: Option<u16>) -> Self {
        Error::Synthesis {
            message: msg.into(),
            status,
        }
    }

    pub fn playback(msg: impl Into<String>) -> Self {
        Error::Playback {
            message: msg.into(),
        }
    }

    /// Short, human-readable text suitable for a status line.
    ///
    /// Service-supplied messages come back verbatim; transport failures are
    /// reduced to a one-line description without the underlying error chain.
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { message, .. }
            | Error::CatalogLoad { message }
            | Error::Synthesis { message, .. }
            | Error::Playback { message }
            | Error::Configuration { message, .. } => message.clone(),
            Error::Busy => "A synthesis request is already in progress".to_string(),
            Error::Transport(e) => e.short_message(),
            Error::Io(e) => format!("File error: {}", e.kind()),
            Error::Serialization(_) | Error::Yaml(_) => "Malformed data".to_string(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Validation { context, .. } => {
                Some(context)
            }
            _ => None,
        }
    }
}
