//! Download naming and labels.

use crate::synthesis::{AudioFormat, Quality};
use std::path::PathBuf;

/// `tts-<unix-ms>[-hq].<format>`
pub fn download_filename(timestamp_ms: u64, format: AudioFormat, quality: Quality) -> String {
    let marker = match quality {
        Quality::High => "-hq",
        Quality::Standard => "",
    };
    format!("tts-{}{}.{}", timestamp_ms, marker, format.extension())
}

/// Button label for the current format/quality, e.g. "Download WAV (HQ)".
pub fn download_label(format: AudioFormat, quality: Quality) -> String {
    let suffix = match quality {
        Quality::High => " (HQ)",
        Quality::Standard => "",
    };
    format!("Download {}{}", format.extension().to_uppercase(), suffix)
}

/// A saved download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: usize,
    pub format: AudioFormat,
}
