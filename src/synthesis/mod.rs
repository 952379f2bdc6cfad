//! TTS（文字转语音）合成模块：将文本与参数发送到 Synthesis Service 并返回音频。

mod client;
mod types;

pub use client::SynthesisClient;
pub use types::{AudioFormat, Quality, SynthesisRequest, SynthesisResult, SPEED_RANGE};

pub(crate) use types::unix_millis;
