mod common;

use std::sync::Arc;

use lostfound::error::AppError;
use lostfound::identity::{
    LoginRequest, RegisterRequest, Role, SessionManager, DEFAULT_LOGIN_ROUTE, KEY_REFRESH_TOKEN, KEY_TOKEN, KEY_USER,
};
use lostfound::storage::{FileStore, KeyValueStore, MemoryStore};

use common::*;

fn manager(store: Arc<MemoryStore>) -> (Arc<SessionManager>, Arc<MockAuthApi>, Arc<RecordingNavigator>) {
    let auth = MockAuthApi::new(user("u1"));
    let nav = RecordingNavigator::new();
    let session = Arc::new(SessionManager::new(auth.clone(), store, nav.clone()));
    (session, auth, nav)
}

fn registration() -> RegisterRequest {
    RegisterRequest {
        name: "Ana".into(),
        email: "ana@students.example.ac.id".into(),
        password: "secret1".into(),
        phone: "0812".into(),
        role: Role::Student,
        identity_number: "20523001".into(),
        faculty: Some("FTI".into()),
    }
}

#[tokio::test]
async fn login_persists_and_publishes() {
    let store = Arc::new(MemoryStore::new());
    let (session, auth, _) = manager(store.clone());
    assert!(!session.is_logged_in());

    let resp = session.login(&LoginRequest::new("u1@example.ac.id", "secret1")).await.unwrap();
    assert_eq!(resp.token, "T1");
    assert_eq!(auth.login_calls(), 1);

    assert_eq!(session.token().as_deref(), Some("T1"));
    assert_eq!(session.current_user().map(|u| u.id), Some("u1".to_string()));
    assert_eq!(store.get(KEY_TOKEN).unwrap().as_deref(), Some("T1"));
    assert_eq!(store.get(KEY_REFRESH_TOKEN).unwrap().as_deref(), Some("R1"));
    let persisted: serde_json::Value = serde_json::from_str(&store.get(KEY_USER).unwrap().unwrap()).unwrap();
    assert_eq!(persisted["id"], "u1");
    assert_eq!(persisted["role"], "MAHASISWA");
}

#[tokio::test]
async fn restores_persisted_session_on_start() {
    let (session, auth, _) = manager(seeded_store("T9", "R9", &user("u7")));
    assert!(session.is_logged_in());
    assert_eq!(session.token().as_deref(), Some("T9"));
    assert_eq!(session.current_user().unwrap().id, "u7");
    assert_eq!(session.snapshot().refresh_token(), Some("R9"));
    assert_eq!(auth.login_calls() + auth.refresh_calls(), 0);
}

#[test]
fn incomplete_or_corrupt_store_means_no_session() {
    let partial = Arc::new(MemoryStore::new());
    partial.set(KEY_TOKEN, "T1").unwrap();
    partial.set(KEY_REFRESH_TOKEN, "R1").unwrap();
    let (session, _, _) = manager(partial);
    assert!(!session.is_logged_in());
    assert_eq!(session.token(), None);

    let corrupt = seeded_store("T1", "R1", &user("u1"));
    corrupt.set(KEY_USER, "{not json").unwrap();
    let (session, _, _) = manager(corrupt);
    assert!(!session.is_logged_in());
    assert_eq!(session.current_user(), None);
}

#[tokio::test]
async fn logout_clears_everything_and_navigates_once() {
    let store = seeded_store("T1", "R1", &user("u1"));
    let (session, _, nav) = manager(store.clone());
    let mut rx = session.subscribe();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_some());

    session.logout();

    assert!(store.is_empty());
    let snap = session.snapshot();
    assert_eq!(snap.access_token(), None);
    assert_eq!(snap.refresh_token(), None);
    assert_eq!(snap.current_user(), None);
    assert_eq!(nav.routes(), vec![DEFAULT_LOGIN_ROUTE.to_string()]);
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_none());
}

#[tokio::test]
async fn custom_login_route_is_used_on_logout() {
    let auth = MockAuthApi::new(user("u1"));
    let nav = RecordingNavigator::new();
    let session = SessionManager::new(auth, seeded_store("T1", "R1", &user("u1")), nav.clone())
        .with_login_route("/signin");
    session.logout();
    assert_eq!(nav.routes(), vec!["/signin".to_string()]);
}

#[tokio::test]
async fn refresh_without_stored_token_makes_no_call() {
    let (session, auth, nav) = manager(Arc::new(MemoryStore::new()));
    let err = session.refresh().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.code_str(), "no_refresh_token");
    assert_eq!(auth.refresh_calls(), 0);
    assert!(nav.routes().is_empty());
}

#[tokio::test]
async fn refresh_rotates_tokens() {
    let store = seeded_store("T1", "R1", &user("u1"));
    let (session, auth, _) = manager(store.clone());
    let resp = session.refresh().await.unwrap();
    assert_eq!(resp.token, "T2");
    assert_eq!(auth.refresh_args(), vec!["R1".to_string()]);
    assert_eq!(session.token().as_deref(), Some("T2"));
    assert_eq!(store.get(KEY_REFRESH_TOKEN).unwrap().as_deref(), Some("R2"));
}

#[tokio::test]
async fn failed_refresh_leaves_session_untouched() {
    let store = seeded_store("T1", "R1", &user("u1"));
    let (session, auth, nav) = manager(store.clone());
    auth.set_fail_refresh(true);

    assert!(session.refresh().await.is_err());
    assert_eq!(session.token().as_deref(), Some("T1"));
    assert_eq!(store.get(KEY_TOKEN).unwrap().as_deref(), Some("T1"));
    assert!(nav.routes().is_empty());
}

#[tokio::test]
async fn register_validates_before_network() {
    let (session, auth, _) = manager(Arc::new(MemoryStore::new()));

    let mut bad = registration();
    bad.faculty = None;
    let err = session.register(&bad).await.unwrap_err();
    assert_eq!(err.code_str(), "missing_field");
    assert_eq!(auth.register_calls(), 0);
    assert!(!session.is_logged_in());

    session.register(&registration()).await.unwrap();
    assert_eq!(auth.register_calls(), 1);
    assert!(session.is_logged_in());
}

#[tokio::test]
async fn subscribers_get_latest_value_then_updates() {
    let (session, _, _) = manager(Arc::new(MemoryStore::new()));
    session.login(&LoginRequest::new("u1@example.ac.id", "secret1")).await.unwrap();

    // Late subscriber still sees the current user straight away.
    let mut rx = session.subscribe();
    rx.changed().await.unwrap();
    assert_eq!(rx.borrow_and_update().as_ref().map(|u| u.id.clone()), Some("u1".to_string()));
    assert_eq!(session.subscriber_count(), 1);

    session.logout();
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().is_none());

    drop(rx);
    assert_eq!(session.subscriber_count(), 0);
}

#[tokio::test]
async fn session_survives_restart_through_file_store() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("state").join("session.json");

    {
        let auth = MockAuthApi::new(user("u3"));
        let session = SessionManager::new(auth, Arc::new(FileStore::open(&path)), RecordingNavigator::new());
        session.login(&LoginRequest::new("u3@example.ac.id", "secret1")).await.unwrap();
    }

    let auth = MockAuthApi::new(user("u3"));
    let nav = RecordingNavigator::new();
    let session = SessionManager::new(auth, Arc::new(FileStore::open(&path)), nav.clone());
    assert_eq!(session.current_user().unwrap().id, "u3");
    assert_eq!(session.token().as_deref(), Some("T1"));

    session.logout();
    let reopened = FileStore::open(&path);
    assert_eq!(reopened.get(KEY_TOKEN).unwrap(), None);
    assert_eq!(nav.routes().len(), 1);
}

#[tokio::test]
async fn failed_persist_keeps_previous_session() {
    let store = FailingStore::seeded("T9", "R9", &user("u7"));
    let auth = MockAuthApi::new(user("u1"));
    let nav = RecordingNavigator::new();
    let session = SessionManager::new(auth.clone(), store.clone(), nav.clone());
    let mut rx = session.subscribe();
    rx.changed().await.unwrap();
    let _ = rx.borrow_and_update();
    store.set_fail_writes(true);

    let err = session.login(&LoginRequest::new("u1@example.ac.id", "secret1")).await.unwrap_err();

    assert!(matches!(err, AppError::Storage { .. }), "unexpected error: {:?}", err);
    assert_eq!(auth.login_calls(), 1);
    assert_eq!(session.token().as_deref(), Some("T9"));
    assert_eq!(session.current_user().map(|u| u.id), Some("u7".to_string()));
    assert_eq!(store.get(KEY_TOKEN).unwrap().as_deref(), Some("T9"));
    assert!(!rx.has_changed().unwrap());

    // refresh goes through the same apply path
    assert!(matches!(session.refresh().await, Err(AppError::Storage { .. })));
    assert_eq!(session.snapshot().refresh_token(), Some("R9"));
    assert!(nav.routes().is_empty());
}

#[tokio::test]
async fn failed_persist_on_fresh_start_leaves_no_session() {
    let store = FailingStore::new();
    store.set_fail_writes(true);
    let auth = MockAuthApi::new(user("u1"));
    let session = SessionManager::new(auth, store, RecordingNavigator::new());

    assert!(session.login(&LoginRequest::new("u1@example.ac.id", "secret1")).await.is_err());
    assert_eq!(session.token(), None);
    assert_eq!(session.current_user(), None);
}

#[tokio::test]
async fn logout_clears_memory_even_when_store_cannot_be_cleared() {
    let store = FailingStore::seeded("T1", "R1", &user("u1"));
    store.set_fail_removes(true);
    let auth = MockAuthApi::new(user("u1"));
    let nav = RecordingNavigator::new();
    let session = SessionManager::new(auth, store.clone(), nav.clone());
    assert!(session.is_logged_in());
    let mut rx = session.subscribe();
    rx.changed().await.unwrap();
    let _ = rx.borrow_and_update();

    session.logout();

    let snap = session.snapshot();
    assert_eq!(snap.access_token(), None);
    assert_eq!(snap.refresh_token(), None);
    assert_eq!(snap.current_user(), None);
    assert_eq!(nav.routes(), vec![DEFAULT_LOGIN_ROUTE.to_string()]);
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_none());
    // the persisted copy could not be removed
    assert_eq!(store.len(), 3);
}
