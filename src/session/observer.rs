//! Session observers.
//!
//! | Observer | Description |
//! |----------|-------------|
//! | [`NoopObserver`] | Discards events |
//! | [`InMemoryObserver`] | Records events, for tests and headless use |
//! | [`TracingObserver`] | Forwards events to `tracing` |

use super::state::{SessionEvent, StatusKind};
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Receives every [`SessionEvent`]. Called outside the controller's lock,
/// so implementations may call back into the controller.
pub trait SessionObserver: Send + Sync {
    fn on_event(&self, event: &SessionEvent);
}

pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_event(&self, _event: &SessionEvent) {}
}

/// Bounded in-memory event log.
pub struct InMemoryObserver {
    events: RwLock<Vec<SessionEvent>>,
    max_events: usize,
}

impl InMemoryObserver {
    pub fn new(max: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events: max.max(1),
        }
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events
            .read()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Text of every status line seen so far.
    pub fn status_texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SessionEvent::Status(status) => Some(status.text),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<String> {
        self.status_texts().pop()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryObserver {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl SessionObserver for InMemoryObserver {
    fn on_event(&self, event: &SessionEvent) {
        if let Ok(mut events) = self.events.write() {
            events.push(event.clone());
            if events.len() > self.max_events {
                events.remove(0);
            }
        }
    }
}

pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn on_event(&self, event: &SessionEvent) {
        match event {
            SessionEvent::StateChanged { from, to } => info!(%from, %to, "session state"),
            SessionEvent::Status(status) => match status.kind {
                StatusKind::Error => warn!(status = %status.text),
                _ => info!(status = %status.text),
            },
            other => debug!(event = ?other, "session event"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::state::StatusMessage;

    #[test]
    fn test_in_memory_observer_is_bounded() {
        let observer = InMemoryObserver::new(2);
        for text in ["a", "b", "c"] {
            observer.on_event(&SessionEvent::Status(StatusMessage::info(text)));
        }
        assert_eq!(observer.status_texts(), vec!["b", "c"]);
        assert_eq!(observer.last_status().as_deref(), Some("c"));
        observer.clear();
        assert!(observer.is_empty());
    }
}
