//! Synthesis request/response types.

use crate::catalog::VoiceCatalog;
use crate::{Error, ErrorContext, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Speed adjustment accepted by the service, in percent.
pub const SPEED_RANGE: RangeInclusive<i32> = -50..=50;

pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Output quality. `High` raises the encoder bitrate on the service side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    #[default]
    Standard,
    High,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::High => "high",
        }
    }
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "normal" => Ok(Self::Standard),
            "high" | "hq" => Ok(Self::High),
            other => Err(Error::validation_with_context(
                format!("Unknown quality '{}'", other),
                ErrorContext::new().with_field_path("request.quality"),
            )),
        }
    }
}

/// Supported audio formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
}

impl AudioFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
        }
    }

    /// Only MP3 is handed to a player; WAV is download-only.
    pub fn is_playable(&self) -> bool {
        matches!(self, Self::Mp3)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            "wav" => Ok(Self::Wav),
            other => Err(Error::validation_with_context(
                format!("Unknown format '{}'", other),
                ErrorContext::new().with_field_path("request.format"),
            )),
        }
    }
}

/// Payload of `POST /synthesize`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    #[serde(rename = "language")]
    pub language_code: String,
    #[serde(rename = "voice")]
    pub voice_name: String,
    #[serde(rename = "speed")]
    pub speed_percent: i32,
    pub quality: Quality,
    pub format: AudioFormat,
}

impl SynthesisRequest {
    pub fn new(
        text: impl Into<String>,
        language_code: impl Into<String>,
        voice_name: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            language_code: language_code.into(),
            voice_name: voice_name.into(),
            speed_percent: 0,
            quality: Quality::Standard,
            format: AudioFormat::Mp3,
        }
    }

    pub fn with_speed(mut self, percent: i32) -> Self {
        self.speed_percent = percent;
        self
    }

    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_format(mut self, format: AudioFormat) -> Self {
        self.format = format;
        self
    }

    /// Check that every field is present and that the selection resolves in `catalog`.
    pub fn validate(&self, catalog: &VoiceCatalog) -> Result<()> {
        if self.text.trim().is_empty() {
            return Err(invalid("Please enter some text", "request.text"));
        }
        if self.language_code.is_empty() {
            return Err(invalid("Please select a language", "request.language"));
        }
        if self.voice_name.is_empty() {
            return Err(invalid("Please select a voice", "request.voice"));
        }
        if !catalog.contains_language(&self.language_code) {
            return Err(invalid(
                format!("Language '{}' not supported", self.language_code),
                "request.language",
            ));
        }
        if !catalog.contains_voice(&self.language_code, &self.voice_name) {
            return Err(invalid(
                format!(
                    "Voice '{}' not found for language '{}'",
                    self.voice_name, self.language_code
                ),
                "request.voice",
            ));
        }
        if !SPEED_RANGE.contains(&self.speed_percent) {
            return Err(invalid(
                format!(
                    "Speed must be between {} and {}",
                    SPEED_RANGE.start(),
                    SPEED_RANGE.end()
                ),
                "request.speed",
            ));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>, field: &str) -> Error {
    Error::validation_with_context(
        message,
        ErrorContext::new()
            .with_field_path(field)
            .with_source("request_validator"),
    )
}

/// Audio returned by a successful synthesis call.
#[derive(Debug, Clone)]
pub struct SynthesisResult {
    pub data: Bytes,
    /// Content type declared by the service, or the format's MIME type if none was sent.
    pub content_type: String,
    pub format: AudioFormat,
    /// Unix time in milliseconds at which the request was issued.
    pub requested_at_ms: u64,
}

impl SynthesisResult {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn size_kb(&self) -> f64 {
        self.data.len() as f64 / 1024.0
    }

    pub fn is_playable(&self) -> bool {
        self.format.is_playable()
    }
}
