use super::download::{download_filename, download_label, DownloadArtifact};
use super::observer::SessionObserver;
use super::playback::{AudioPlayer, NullPlayer, PlaybackEnd, PlaybackHandle, PlaybackOutcome};
use super::state::{SessionEvent, SessionState, StatusMessage};
use crate::backend::{HealthStatus, HttpBackend, TtsBackend};
use crate::catalog::VoiceCatalog;
use crate::config::ClientConfig;
use crate::synthesis::{unix_millis, AudioFormat, Quality, SynthesisRequest, SynthesisResult};
use crate::transport::TransportError;
use crate::{Error, ErrorContext, Result};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

struct ActivePlayback {
    id: u64,
    stop: CancellationToken,
}

/// Mutable session data. Only touched under `Inner::core`, never across an `.await`.
#[derive(Default)]
struct Core {
    state: SessionState,
    catalog: VoiceCatalog,
    language: Option<String>,
    voice: Option<String>,
    voices: Vec<String>,
    text: String,
    playback: Option<ActivePlayback>,
    /// Set while a catalog fetch is outstanding.
    loading_catalog: bool,
    /// Set while a synthesis call is outstanding.
    synthesizing: bool,
    next_playback_id: u64,
    last_download_ms: u64,
}

impl Core {
    fn transition(
        &mut self,
        to: SessionState,
        tx: &watch::Sender<SessionState>,
    ) -> Option<SessionEvent> {
        if self.state == to {
            return None;
        }
        let from = std::mem::replace(&mut self.state, to.clone());
        tx.send_replace(to.clone());
        Some(SessionEvent::StateChanged { from, to })
    }

    fn busy(&self) -> bool {
        self.loading_catalog || self.synthesizing
    }

    fn clear_selection(&mut self) {
        self.language = None;
        self.voice = None;
        self.voices.clear();
    }

    fn cancel_playback(&mut self) {
        if let Some(active) = self.playback.take() {
            active.stop.cancel();
        }
    }

    fn selection_events(&self) -> [SessionEvent; 2] {
        [
            SessionEvent::VoicesChanged {
                language: self.language.clone(),
                voices: self.voices.clone(),
            },
            SessionEvent::SelectionChanged {
                language: self.language.clone(),
                voice: self.voice.clone(),
            },
        ]
    }
}

struct Inner {
    backend: Arc<dyn TtsBackend>,
    player: Arc<dyn AudioPlayer>,
    config: ClientConfig,
    observers: Vec<Arc<dyn SessionObserver>>,
    state_tx: watch::Sender<SessionState>,
    core: Mutex<Core>,
}

/// Owns the session state, the voice catalog and the current selection, and
/// mediates every call to the catalog and synthesis services.
///
/// Cloning is cheap; clones share the same session. At most one synthesis is
/// in flight at a time: a second `request_synthesis` while one is pending is
/// rejected with [`Error::Busy`] rather than queued or cancelling the first,
/// and the same holds while a catalog load is outstanding.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    pub fn builder() -> SessionControllerBuilder {
        SessionControllerBuilder::new()
    }

    /// Controller over the HTTP backend described by `config`, without audio output.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    fn core(&self) -> MutexGuard<'_, Core> {
        self.inner
            .core
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn emit<I>(&self, events: I)
    where
        I: IntoIterator<Item = SessionEvent>,
    {
        for event in events {
            for observer in &self.inner.observers {
                observer.on_event(&event);
            }
        }
    }

    fn status(&self, message: StatusMessage) {
        self.emit([SessionEvent::Status(message)]);
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let limit = self.inner.config.request_timeout();
        match tokio::time::timeout(limit, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Transport(TransportError::Timeout(limit))),
        }
    }

    pub fn state(&self) -> SessionState {
        self.core().state.clone()
    }

    /// Receiver that always holds the latest state.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state_tx.subscribe()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn catalog(&self) -> VoiceCatalog {
        self.core().catalog.clone()
    }

    pub fn selected_language(&self) -> Option<String> {
        self.core().language.clone()
    }

    pub fn selected_voice(&self) -> Option<String> {
        self.core().voice.clone()
    }

    /// Voices under the selected language.
    pub fn eligible_voices(&self) -> Vec<String> {
        self.core().voices.clone()
    }

    pub fn is_playing(&self) -> bool {
        self.core().state == SessionState::Playing
    }

    /// Fetch the catalog and replace the current one.
    ///
    /// On success the configured default language/voice is selected when the
    /// catalog offers it. On failure the catalog and selection are cleared and
    /// the session moves to `Error`. Never retries. Returns [`Error::Busy`]
    /// while another load or a synthesis is outstanding.
    pub async fn load_catalog(&self) -> Result<usize> {
        let mut events = Vec::new();
        {
            let mut core = self.core();
            if core.busy() {
                return Err(Error::Busy);
            }
            core.loading_catalog = true;
            core.cancel_playback();
            events.extend(core.transition(SessionState::LoadingCatalog, &self.inner.state_tx));
        }
        events.push(SessionEvent::Status(StatusMessage::loading(
            "Loading languages...",
        )));
        self.emit(events);

        let mut in_flight = InFlight {
            controller: self,
            activity: Activity::LoadingCatalog,
            armed: true,
        };
        let fetched = self.bounded(self.inner.backend.fetch_catalog()).await;
        in_flight.armed = false;

        let mut events = Vec::new();
        let result = {
            let mut core = self.core();
            core.loading_catalog = false;
            core.clear_selection();
            match fetched {
                Ok(catalog) => {
                    let count = catalog.len();
                    core.catalog = catalog;

                    let config = &self.inner.config;
                    if core.catalog.contains_language(&config.default_language) {
                        core.voices = core.catalog.voices_for(&config.default_language);
                        core.language = Some(config.default_language.clone());
                        if core.voices.contains(&config.default_voice) {
                            core.voice = Some(config.default_voice.clone());
                        }
                    }

                    events.extend(core.transition(SessionState::Ready, &self.inner.state_tx));
                    events.push(SessionEvent::CatalogLoaded { languages: count });
                    events.extend(core.selection_events());
                    events.push(SessionEvent::Status(StatusMessage::success(
                        "Ready! Select a language to start",
                    )));
                    info!(languages = count, language = ?core.language, voice = ?core.voice, "catalog ready");
                    Ok(count)
                }
                Err(e) => {
                    let reason = e.user_message();
                    let message = format!("Failed to load languages: {}", reason);
                    core.catalog = VoiceCatalog::new();

                    events.extend(core.transition(
                        SessionState::Error {
                            message: message.clone(),
                        },
                        &self.inner.state_tx,
                    ));
                    events.extend(core.selection_events());
                    events.push(SessionEvent::Status(StatusMessage::error(message)));
                    warn!(error = %e, "catalog load failed");
                    Err(match e {
                        Error::CatalogLoad { .. } => e,
                        _ => Error::catalog_load(reason),
                    })
                }
            }
        };
        self.emit(events);
        result
    }

    /// Select a language (or clear it with `""`). Clears the voice and returns the eligible voices.
    pub fn select_language(&self, code: &str) -> Result<Vec<String>> {
        let (voices, events) = {
            let mut core = self.core();
            if !code.is_empty() && !core.catalog.contains_language(code) {
                return Err(Error::validation_with_context(
                    format!("Language '{}' not supported", code),
                    ErrorContext::new()
                        .with_field_path("selection.language")
                        .with_source("session"),
                ));
            }
            core.voice = None;
            if code.is_empty() {
                core.language = None;
                core.voices.clear();
            } else {
                core.voices = core.catalog.voices_for(code);
                core.language = Some(code.to_string());
            }
            (core.voices.clone(), core.selection_events())
        };
        debug!(language = code, voices = voices.len(), "language selected");
        self.emit(events);
        Ok(voices)
    }

    /// Select a voice from the eligible set (or clear it with `""`).
    pub fn select_voice(&self, name: &str) -> Result<()> {
        let event = {
            let mut core = self.core();
            if name.is_empty() {
                core.voice = None;
            } else if core.voices.iter().any(|v| v == name) {
                core.voice = Some(name.to_string());
            } else {
                return Err(Error::validation_with_context(
                    format!("Voice '{}' is not available for the selected language", name),
                    ErrorContext::new()
                        .with_field_path("selection.voice")
                        .with_source("session"),
                ));
            }
            SessionEvent::SelectionChanged {
                language: core.language.clone(),
                voice: core.voice.clone(),
            }
        };
        self.emit([event]);
        Ok(())
    }

    pub fn set_text(&self, text: impl Into<String>) {
        self.core().text = text.into();
    }

    pub fn clear_text(&self) {
        self.core().text.clear();
        self.status(StatusMessage::info("Text cleared"));
    }

    pub fn text(&self) -> String {
        self.core().text.clone()
    }

    /// Characters in the draft text, not counting pause tags.
    pub fn visible_char_count(&self) -> usize {
        crate::text::visible_char_count(&self.core().text)
    }

    /// Build a request from the draft text and the current selection.
    pub fn compose_request(
        &self,
        speed_percent: i32,
        quality: Quality,
        format: AudioFormat,
    ) -> Result<SynthesisRequest> {
        let core = self.core();
        let request = SynthesisRequest {
            text: core.text.clone(),
            language_code: core.language.clone().unwrap_or_default(),
            voice_name: core.voice.clone().unwrap_or_default(),
            speed_percent,
            quality,
            format,
        };
        request.validate(&core.catalog)?;
        Ok(request)
    }

    /// Issue one synthesis call.
    ///
    /// Invalid requests fail locally without touching the network or the
    /// session state. Service and transport failures move the session to
    /// `Error` with the service's own message when it sent one.
    pub async fn request_synthesis(&self, request: &SynthesisRequest) -> Result<SynthesisResult> {
        let validation = {
            let core = self.core();
            request.validate(&core.catalog)
        };
        if let Err(e) = validation {
            debug!(error = %e, "synthesis request rejected");
            self.status(StatusMessage::error(e.user_message()));
            return Err(e);
        }

        let mut events = Vec::new();
        {
            let mut core = self.core();
            if core.busy() {
                return Err(Error::Busy);
            }
            core.synthesizing = true;
            core.cancel_playback();
            events.extend(core.transition(SessionState::Synthesizing, &self.inner.state_tx));
        }
        events.push(SessionEvent::Status(StatusMessage::loading(
            "Generating audio...",
        )));
        self.emit(events);

        let mut in_flight = InFlight {
            controller: self,
            activity: Activity::Synthesizing,
            armed: true,
        };
        let outcome = self.bounded(self.inner.backend.synthesize(request)).await;
        in_flight.armed = false;

        match outcome {
            Ok(result) => {
                self.finish_synthesis(SessionState::Ready);
                self.status(StatusMessage::success("Audio generated successfully!"));
                info!(
                    bytes = result.size(),
                    content_type = %result.content_type,
                    "audio generated"
                );
                Ok(result)
            }
            Err(e) => {
                let (message, status) = match &e {
                    Error::Synthesis { message, status } => (message.clone(), *status),
                    other => (other.user_message(), None),
                };
                warn!(error = %e, "synthesis failed");
                self.finish_synthesis(SessionState::Error {
                    message: message.clone(),
                });
                self.status(StatusMessage::error(format!("Error: {}", message)));
                Err(Error::synthesis(message, status))
            }
        }
    }

    fn finish_synthesis(&self, to: SessionState) {
        let event = {
            let mut core = self.core();
            core.synthesizing = false;
            core.transition(to, &self.inner.state_tx)
        };
        self.emit(event);
    }

    fn abandon(&self, activity: Activity) {
        let event = {
            let mut core = self.core();
            match activity {
                Activity::Synthesizing => {
                    core.synthesizing = false;
                    if core.state == SessionState::Synthesizing {
                        core.transition(SessionState::Ready, &self.inner.state_tx)
                    } else {
                        None
                    }
                }
                Activity::LoadingCatalog => {
                    core.loading_catalog = false;
                    if core.state == SessionState::LoadingCatalog {
                        let to = if core.catalog.is_empty() {
                            SessionState::Idle
                        } else {
                            SessionState::Ready
                        };
                        core.transition(to, &self.inner.state_tx)
                    } else {
                        None
                    }
                }
            }
        };
        debug!(?activity, "in-flight call dropped");
        self.emit(event);
    }

    /// Start playing an MP3 artifact. Other formats only produce a note pointing at download.
    pub fn consume_for_playback(&self, result: &SynthesisResult) -> Result<PlaybackOutcome> {
        if !result.format.is_playable() {
            let note = format!(
                "Use the \"{}\" button to save the audio file",
                download_label(result.format, Quality::Standard)
            );
            self.status(StatusMessage::info(note.clone()));
            return Ok(PlaybackOutcome::UseDownload { note });
        }

        let (id, stop, event) = {
            let mut core = self.core();
            if !matches!(core.state, SessionState::Ready | SessionState::Playing) {
                return Err(Error::playback(format!(
                    "Cannot start playback while {}",
                    core.state
                )));
            }
            core.cancel_playback();
            core.next_playback_id += 1;
            let id = core.next_playback_id;
            let stop = CancellationToken::new();
            core.playback = Some(ActivePlayback {
                id,
                stop: stop.clone(),
            });
            (id, stop, core.transition(SessionState::Playing, &self.inner.state_tx))
        };
        self.emit(event);
        self.status(StatusMessage::success("Now playing..."));

        let controller = self.clone();
        let player = self.inner.player.clone();
        let audio = result.clone();
        let task = tokio::spawn(async move {
            let outcome = player.play(&audio, stop).await;
            controller.finish_playback(id, &outcome);
            outcome
        });
        Ok(PlaybackOutcome::Started(PlaybackHandle { id, task }))
    }

    fn finish_playback(&self, id: u64, outcome: &Result<PlaybackEnd>) {
        let mut events = Vec::new();
        {
            let mut core = self.core();
            if core.playback.as_ref().map(|p| p.id) != Some(id) {
                return;
            }
            core.playback = None;
            match outcome {
                Ok(end) => {
                    events.extend(core.transition(SessionState::Ready, &self.inner.state_tx));
                    let text = match end {
                        PlaybackEnd::Completed => "Playback completed",
                        PlaybackEnd::Stopped => "Playback stopped",
                    };
                    events.push(SessionEvent::Status(StatusMessage::success(text)));
                }
                Err(e) => {
                    let message = e.user_message();
                    warn!(error = %e, "playback failed");
                    events.extend(core.transition(
                        SessionState::Error {
                            message: message.clone(),
                        },
                        &self.inner.state_tx,
                    ));
                    events.push(SessionEvent::Status(StatusMessage::error(message)));
                }
            }
        }
        self.emit(events);
    }

    /// Halt playback and rewind. Returns `false` when nothing was playing.
    pub fn stop_playback(&self) -> bool {
        let event = {
            let mut core = self.core();
            if core.state != SessionState::Playing {
                return false;
            }
            core.cancel_playback();
            core.transition(SessionState::Ready, &self.inner.state_tx)
        };
        self.emit(event);
        self.status(StatusMessage::info("Playback stopped"));
        true
    }

    /// Save the artifact into the download directory. Works for every format.
    ///
    /// The file name is stamped with the time of the download, not
    /// `requested_at_ms`, and stamps from one controller strictly increase.
    pub async fn consume_for_download(
        &self,
        result: &SynthesisResult,
        quality: Quality,
    ) -> Result<DownloadArtifact> {
        let timestamp = {
            let mut core = self.core();
            let ts = unix_millis().max(core.last_download_ms + 1);
            core.last_download_ms = ts;
            ts
        };
        let file_name = download_filename(timestamp, result.format, quality);
        let dir = self.inner.config.download_dir.clone();
        let path = dir.join(&file_name);

        let written = async {
            tokio::fs::create_dir_all(&dir).await?;
            tokio::fs::write(&path, &result.data).await
        };
        if let Err(e) = written.await {
            let err = Error::Io(e);
            warn!(path = %path.display(), error = %err, "download failed");
            self.status(StatusMessage::error(format!(
                "Download failed: {}",
                err.user_message()
            )));
            return Err(err);
        }

        info!(
            path = %path.display(),
            bytes = result.size(),
            content_type = %result.content_type,
            "audio downloaded"
        );
        self.status(StatusMessage::success(format!(
            "{} downloaded! ({:.1}KB)",
            result.format.extension().to_uppercase(),
            result.size_kb()
        )));

        Ok(DownloadArtifact {
            path,
            file_name,
            size_bytes: result.size(),
            format: result.format,
        })
    }

    /// Check that the service is up. Does not change the session state.
    pub async fn check_health(&self) -> Result<HealthStatus> {
        self.bounded(self.inner.backend.health()).await
    }
}

#[derive(Debug, Clone, Copy)]
enum Activity {
    LoadingCatalog,
    Synthesizing,
}

/// Clears the in-flight flag and leaves the transient state if a catalog or
/// synthesis future is dropped before it completes.
struct InFlight<'a> {
    controller: &'a SessionController,
    activity: Activity,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.controller.abandon(self.activity);
        }
    }
}

pub struct SessionControllerBuilder {
    backend: Option<Arc<dyn TtsBackend>>,
    player: Arc<dyn AudioPlayer>,
    config: ClientConfig,
    observers: Vec<Arc<dyn SessionObserver>>,
}

impl SessionControllerBuilder {
    pub fn new() -> Self {
        Self {
            backend: None,
            player: Arc::new(NullPlayer),
            config: ClientConfig::default(),
            observers: Vec::new(),
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Use a custom backend instead of HTTP against `config.base_url`.
    pub fn backend(mut self, backend: Arc<dyn TtsBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn player(mut self, player: Arc<dyn AudioPlayer>) -> Self {
        self.player = player;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn build(self) -> Result<SessionController> {
        self.config.validate()?;
        let backend = match self.backend {
            Some(backend) => backend,
            None => Arc::new(HttpBackend::new(&self.config)?),
        };
        let (state_tx, _) = watch::channel(SessionState::Idle);

        Ok(SessionController {
            inner: Arc::new(Inner {
                backend,
                player: self.player,
                config: self.config,
                observers: self.observers,
                state_tx,
                core: Mutex::new(Core::default()),
            }),
        })
    }
}

impl Default for SessionControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
