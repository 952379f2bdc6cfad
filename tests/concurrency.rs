//! In-flight guard, timeouts and cancellation.

mod common;

use common::{stub_controller, uk_request, StubBackend, UK_CATALOG};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tts_session::session::{InMemoryObserver, NullPlayer};
use tts_session::{ClientConfig, Error, SessionState};

fn config() -> ClientConfig {
    ClientConfig::default().with_request_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_second_request_while_synthesizing_is_rejected() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(StubBackend::new(UK_CATALOG).with_gate(gate.clone()));
    let session = stub_controller(
        backend.clone(),
        Arc::new(NullPlayer),
        config(),
        Arc::new(InMemoryObserver::default()),
    );
    session.load_catalog().await.unwrap();

    let mut states = session.subscribe();
    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.request_synthesis(&uk_request("one")).await })
    };
    states
        .wait_for(|s| *s == SessionState::Synthesizing)
        .await
        .unwrap();

    let err = session.request_synthesis(&uk_request("two")).await.unwrap_err();
    assert!(matches!(err, Error::Busy));
    assert_eq!(session.state(), SessionState::Synthesizing);

    gate.notify_one();
    first.await.unwrap().unwrap();
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(backend.synth_count(), 1);
}

#[tokio::test]
async fn test_timeout_moves_session_to_error() {
    let backend = Arc::new(StubBackend::new(UK_CATALOG).hanging());
    let session = stub_controller(
        backend.clone(),
        Arc::new(NullPlayer),
        config().with_request_timeout(Duration::from_millis(50)),
        Arc::new(InMemoryObserver::default()),
    );
    session.load_catalog().await.unwrap();

    let err = session.request_synthesis(&uk_request("slow")).await.unwrap_err();
    assert!(matches!(err, Error::Synthesis { status: None, .. }));
    assert_eq!(err.user_message(), "Request timed out after 50ms");
    assert_eq!(
        session.state().error_message(),
        Some("Request timed out after 50ms")
    );
    assert_eq!(backend.synth_count(), 1);
}

#[tokio::test]
async fn test_dropped_request_does_not_leave_session_stuck() {
    let backend = Arc::new(StubBackend::new(UK_CATALOG).hanging());
    let session = stub_controller(
        backend,
        Arc::new(NullPlayer),
        config(),
        Arc::new(InMemoryObserver::default()),
    );
    session.load_catalog().await.unwrap();

    let pending = tokio::time::timeout(
        Duration::from_millis(30),
        session.request_synthesis(&uk_request("abandoned")),
    )
    .await;
    assert!(pending.is_err());
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_catalog_reload_is_refused_while_synthesizing() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(StubBackend::new(UK_CATALOG).with_gate(gate.clone()));
    let session = stub_controller(
        backend.clone(),
        Arc::new(NullPlayer),
        config(),
        Arc::new(InMemoryObserver::default()),
    );
    session.load_catalog().await.unwrap();

    let mut states = session.subscribe();
    let pending = {
        let session = session.clone();
        tokio::spawn(async move { session.request_synthesis(&uk_request("one")).await })
    };
    states
        .wait_for(|s| *s == SessionState::Synthesizing)
        .await
        .unwrap();

    assert!(matches!(session.load_catalog().await, Err(Error::Busy)));
    gate.notify_one();
    pending.await.unwrap().unwrap();
    assert_eq!(backend.catalog_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_overlapping_catalog_loads_are_rejected() {
    let catalog_gate = Arc::new(Notify::new());
    let backend = Arc::new(StubBackend::new(UK_CATALOG).with_catalog_gate(catalog_gate.clone()));
    let session = stub_controller(
        backend.clone(),
        Arc::new(NullPlayer),
        config(),
        Arc::new(InMemoryObserver::default()),
    );
    catalog_gate.notify_one();
    session.load_catalog().await.unwrap();

    let mut states = session.subscribe();
    let reload = {
        let session = session.clone();
        tokio::spawn(async move { session.load_catalog().await })
    };
    states
        .wait_for(|s| *s == SessionState::LoadingCatalog)
        .await
        .unwrap();

    // Neither a second reload nor a synthesis may start while the first is outstanding.
    assert!(matches!(session.load_catalog().await, Err(Error::Busy)));
    assert!(matches!(
        session.request_synthesis(&uk_request("early")).await,
        Err(Error::Busy)
    ));

    catalog_gate.notify_one();
    assert_eq!(reload.await.unwrap().unwrap(), 1);
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(backend.catalog_calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(backend.synth_count(), 0);
}

#[tokio::test]
async fn test_synthesis_state_survives_reload_attempts() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(StubBackend::new(UK_CATALOG).with_gate(gate.clone()));
    let session = stub_controller(
        backend.clone(),
        Arc::new(NullPlayer),
        config(),
        Arc::new(InMemoryObserver::default()),
    );
    session.load_catalog().await.unwrap();

    let mut states = session.subscribe();
    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.request_synthesis(&uk_request("one")).await })
    };
    states
        .wait_for(|s| *s == SessionState::Synthesizing)
        .await
        .unwrap();

    for _ in 0..3 {
        assert!(matches!(session.load_catalog().await, Err(Error::Busy)));
        assert!(matches!(
            session.request_synthesis(&uk_request("two")).await,
            Err(Error::Busy)
        ));
        assert_eq!(session.state(), SessionState::Synthesizing);
    }

    gate.notify_one();
    first.await.unwrap().unwrap();
    assert_eq!(backend.synth_count(), 1);
    assert_eq!(session.state(), SessionState::Ready);
}

#[tokio::test]
async fn test_dropped_catalog_load_releases_the_guard() {
    let catalog_gate = Arc::new(Notify::new());
    let backend = Arc::new(StubBackend::new(UK_CATALOG).with_catalog_gate(catalog_gate.clone()));
    let session = stub_controller(
        backend,
        Arc::new(NullPlayer),
        config(),
        Arc::new(InMemoryObserver::default()),
    );

    let pending = tokio::time::timeout(Duration::from_millis(30), session.load_catalog()).await;
    assert!(pending.is_err());
    assert_eq!(session.state(), SessionState::Idle);

    catalog_gate.notify_one();
    assert_eq!(session.load_catalog().await.unwrap(), 1);
    assert_eq!(session.state(), SessionState::Ready);
}
