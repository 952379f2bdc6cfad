//! Catalog types.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// Message reported when a catalog body does not have the expected shape.
pub const MALFORMED_CATALOG: &str = "Malformed catalog response";

/// One language offered by the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageEntry {
    /// Display name, e.g. "English (British)".
    pub name: String,
    /// Voice name → opaque voice metadata.
    #[serde(default)]
    pub voices: BTreeMap<String, serde_json::Value>,
}

/// Language code → [`LanguageEntry`]. Ordered by code so that iteration is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceCatalog {
    languages: BTreeMap<String, LanguageEntry>,
}

impl VoiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_languages(languages: BTreeMap<String, LanguageEntry>) -> Self {
        Self { languages }
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.languages.len()
    }

    pub fn language(&self, code: &str) -> Option<&LanguageEntry> {
        self.languages.get(code)
    }

    pub fn contains_language(&self, code: &str) -> bool {
        self.languages.contains_key(code)
    }

    pub fn contains_voice(&self, code: &str, voice: &str) -> bool {
        self.languages
            .get(code)
            .map(|entry| entry.voices.contains_key(voice))
            .unwrap_or(false)
    }

    /// Voice names under `code`; empty for an unknown or empty code.
    pub fn voices_for(&self, code: &str) -> Vec<String> {
        self.languages
            .get(code)
            .map(|entry| entry.voices.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn languages(&self) -> impl Iterator<Item = (&str, &LanguageEntry)> {
        self.languages.iter().map(|(code, entry)| (code.as_str(), entry))
    }

    /// Every (language code, voice name) pair in the catalog.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.languages.iter().flat_map(|(code, entry)| {
            entry
                .voices
                .keys()
                .map(move |voice| (code.as_str(), voice.as_str()))
        })
    }
}

/// Body of `GET /languages`.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguagesResponse {
    pub languages: VoiceCatalog,
}

/// Parse a `GET /languages` body. Anything that is not the expected shape is a load failure.
pub fn parse_catalog(body: &[u8]) -> Result<VoiceCatalog> {
    serde_json::from_slice::<LanguagesResponse>(body)
        .map(|resp| resp.languages)
        .map_err(|e| {
            warn!(error = %e, "malformed catalog response");
            Error::catalog_load(MALFORMED_CATALOG)
        })
}
