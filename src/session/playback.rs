//! Local audio playback.
//!
//! Players receive a [`CancellationToken`] for every play. Cancelling it halts
//! output and rewinds, so the next play starts from the beginning.

use crate::synthesis::SynthesisResult;
use crate::{Error, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// How a playback ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    Completed,
    Stopped,
}

#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Play `audio` until it finishes or `stop` is cancelled.
    async fn play(&self, audio: &SynthesisResult, stop: CancellationToken) -> Result<PlaybackEnd>;
}

/// Result of handing an artifact to the controller for playback.
#[derive(Debug)]
pub enum PlaybackOutcome {
    Started(PlaybackHandle),
    /// The format cannot be played; the note tells the user to download instead.
    UseDownload { note: String },
}

impl PlaybackOutcome {
    pub fn is_started(&self) -> bool {
        matches!(self, PlaybackOutcome::Started(_))
    }

    pub fn into_handle(self) -> Option<PlaybackHandle> {
        match self {
            PlaybackOutcome::Started(handle) => Some(handle),
            PlaybackOutcome::UseDownload { .. } => None,
        }
    }
}

/// A running playback.
#[derive(Debug)]
pub struct PlaybackHandle {
    pub(crate) id: u64,
    pub(crate) task: JoinHandle<Result<PlaybackEnd>>,
}

impl PlaybackHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the playback to complete or be stopped.
    pub async fn finished(self) -> Result<PlaybackEnd> {
        self.task
            .await
            .map_err(|e| Error::playback(format!("Playback task failed: {}", e)))?
    }
}

/// Completes immediately without producing sound.
pub struct NullPlayer;

#[async_trait]
impl AudioPlayer for NullPlayer {
    async fn play(&self, _audio: &SynthesisResult, stop: CancellationToken) -> Result<PlaybackEnd> {
        if stop.is_cancelled() {
            return Ok(PlaybackEnd::Stopped);
        }
        Ok(PlaybackEnd::Completed)
    }
}

/// Plays silently for a fixed duration while tracking the playback position.
pub struct SimulatedPlayer {
    duration: Duration,
    tick: Duration,
    position_ms: Arc<AtomicU64>,
    plays: AtomicUsize,
}

impl SimulatedPlayer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            tick: Duration::from_millis(10),
            position_ms: Arc::new(AtomicU64::new(0)),
            plays: AtomicUsize::new(0),
        }
    }

    pub fn position(&self) -> Duration {
        Duration::from_millis(self.position_ms.load(Ordering::SeqCst))
    }

    pub fn play_count(&self) -> usize {
        self.plays.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioPlayer for SimulatedPlayer {
    async fn play(&self, _audio: &SynthesisResult, stop: CancellationToken) -> Result<PlaybackEnd> {
        self.plays.fetch_add(1, Ordering::SeqCst);
        self.position_ms.store(0, Ordering::SeqCst);
        let total = self.duration.as_millis() as u64;
        let step = self.tick.as_millis().max(1) as u64;

        while self.position_ms.load(Ordering::SeqCst) < total {
            tokio::select! {
                _ = stop.cancelled() => {
                    self.position_ms.store(0, Ordering::SeqCst);
                    return Ok(PlaybackEnd::Stopped);
                }
                _ = tokio::time::sleep(self.tick) => {
                    let next = (self.position_ms.load(Ordering::SeqCst) + step).min(total);
                    self.position_ms.store(next, Ordering::SeqCst);
                }
            }
        }
        Ok(PlaybackEnd::Completed)
    }
}

/// Pipes the audio into an external program's stdin, e.g. `ffplay`.
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ffplay() -> Self {
        Self::new(
            "ffplay",
            ["-nodisp", "-autoexit", "-loglevel", "quiet", "-i", "-"],
        )
    }
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    async fn play(&self, audio: &SynthesisResult, stop: CancellationToken) -> Result<PlaybackEnd> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::playback(format!("Failed to start {}: {}", self.program, e)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::playback("Player stdin unavailable"))?;
        let data = audio.data.clone();
        let feed = async move {
            stdin.write_all(&data).await?;
            stdin.shutdown().await
        };

        let finished = {
            let run = async {
                feed.await?;
                let status = child.wait().await?;
                Ok::<_, std::io::Error>(status)
            };
            tokio::select! {
                _ = stop.cancelled() => None,
                status = run => Some(status),
            }
        };

        match finished {
            Some(Ok(status)) if status.success() => Ok(PlaybackEnd::Completed),
            Some(Ok(status)) => Err(Error::playback(format!(
                "{} exited with {}",
                self.program, status
            ))),
            Some(Err(e)) => Err(Error::playback(format!("{}: {}", self.program, e))),
            None => {
                let _ = child.kill().await;
                Ok(PlaybackEnd::Stopped)
            }
        }
    }
}
