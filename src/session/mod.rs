//! 会话控制模块：管理合成会话的状态机、目录、选择与播放/下载。
//!
//! # Synthesis Session
//!
//! [`SessionController`] turns the user's selection into one synthesis call
//! and the returned audio into playback or a downloaded file, publishing every
//! step as a [`SessionEvent`].
//!
//! ```text
//! Idle --load_catalog--> LoadingCatalog --ok--> Ready --request_synthesis--> Synthesizing
//!                                      \--err--> Error                      |-- ok --> Ready
//! Ready --consume_for_playback(mp3)--> Playing --complete|stop--> Ready      \-- err -> Error
//! ```
//!
//! `Error` is not terminal: a new `load_catalog` or `request_synthesis` leaves it.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`SessionController`] | State owner and service mediator |
//! | [`SessionState`] / [`SessionEvent`] | Observable state and notifications |
//! | [`SessionObserver`] | Presentation-layer hook |
//! | [`AudioPlayer`] | Local playback seam |

mod controller;
pub mod download;
pub mod observer;
pub mod playback;
mod state;

pub use controller::{SessionController, SessionControllerBuilder};
pub use download::{download_filename, download_label, DownloadArtifact};
pub use observer::{InMemoryObserver, NoopObserver, SessionObserver, TracingObserver};
pub use playback::{
    AudioPlayer, CommandPlayer, NullPlayer, PlaybackEnd, PlaybackHandle, PlaybackOutcome,
    SimulatedPlayer,
};
pub use state::{SessionEvent, SessionState, StatusKind, StatusMessage};
