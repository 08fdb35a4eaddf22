//! Test doubles shared by the integration suites.
//!
//! - `ScriptedTransport`: answers from a closure and records every request it saw
//! - `MockAuthApi`: counts credential calls and rotates tokens on refresh
//! - `RecordingNotifier` / `RecordingNavigator`: capture user-facing side effects
//! - `FailingStore`: memory store with switchable write and remove failures
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};

use lostfound::client::{ApiClient, Navigator, Notifier, Transport};
use lostfound::config::RefreshMode;
use lostfound::error::{AppError, AppResult};
use lostfound::identity::{
    ApiResponse, AuthApi, AuthResponse, LoginRequest, RegisterRequest, RequestContext, Role, SessionManager,
    UserIdentity, KEY_REFRESH_TOKEN, KEY_TOKEN, KEY_USER,
};
use lostfound::storage::{KeyValueStore, MemoryStore};

pub const API: &str = "http://api.test/api/v1";

// =============================================================================
// Fixtures
// =============================================================================

pub fn user(id: &str) -> UserIdentity {
    UserIdentity {
        id: id.to_string(),
        name: format!("User {}", id),
        email: format!("{}@example.ac.id", id),
        role: Role::Student,
        identity_number: "20523001".to_string(),
        faculty: Some("FTI".to_string()),
        phone: None,
    }
}

pub fn auth(token: &str, refresh_token: &str, user: UserIdentity) -> AuthResponse {
    AuthResponse { token: token.to_string(), refresh_token: refresh_token.to_string(), user }
}

pub fn url(path: &str) -> String {
    format!("{}/{}", API, path)
}

pub fn ok(body: Value) -> AppResult<ApiResponse> {
    Ok(ApiResponse::ok(body))
}

pub fn unauthorized() -> AppResult<ApiResponse> {
    Err(AppError::http(401, "Unauthorized", Some("jwt expired".to_string())))
}

/// Store pre-populated the way a previous run would have left it.
pub fn seeded_store(token: &str, refresh_token: &str, user: &UserIdentity) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let user_json = serde_json::to_string(user).unwrap();
    store
        .set_many(&[(KEY_TOKEN, token), (KEY_REFRESH_TOKEN, refresh_token), (KEY_USER, user_json.as_str())])
        .unwrap();
    store
}

// =============================================================================
// Failing store
// =============================================================================

/// Memory store whose writes and removals can be switched to fail with a storage error.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    fail_removes: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }

    /// Starts out holding a persisted session; failures are off until switched on.
    pub fn seeded(token: &str, refresh_token: &str, user: &UserIdentity) -> Arc<Self> {
        let store = Self::new();
        let user_json = serde_json::to_string(user).unwrap();
        store
            .inner
            .set_many(&[(KEY_TOKEN, token), (KEY_REFRESH_TOKEN, refresh_token), (KEY_USER, user_json.as_str())])
            .unwrap();
        store
    }

    pub fn set_fail_writes(&self, fail: bool) { self.fail_writes.store(fail, Ordering::SeqCst); }
    pub fn set_fail_removes(&self, fail: bool) { self.fail_removes.store(fail, Ordering::SeqCst); }
    pub fn len(&self) -> usize { self.inner.len() }

    fn check(flag: &AtomicBool) -> AppResult<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(AppError::storage("store_write", "disk full"));
        }
        Ok(())
    }
}

impl KeyValueStore for FailingStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        Self::check(&self.fail_writes)?;
        self.inner.set(key, value)
    }

    fn remove_all(&self, keys: &[&str]) -> AppResult<()> {
        Self::check(&self.fail_removes)?;
        self.inner.remove_all(keys)
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> AppResult<()> {
        Self::check(&self.fail_writes)?;
        self.inner.set_many(entries)
    }
}

// =============================================================================
// Scripted transport
// =============================================================================

type Responder = Box<dyn Fn(&RequestContext) -> AppResult<ApiResponse> + Send + Sync>;

pub struct ScriptedTransport {
    responder: Responder,
    requests: Mutex<Vec<RequestContext>>,
}

impl ScriptedTransport {
    pub fn new(f: impl Fn(&RequestContext) -> AppResult<ApiResponse> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self { responder: Box::new(f), requests: Mutex::new(Vec::new()) })
    }

    /// Replies in order; errors once the script runs out.
    pub fn queue(replies: Vec<AppResult<ApiResponse>>) -> Arc<Self> {
        let q = Mutex::new(VecDeque::from(replies));
        Self::new(move |_| {
            q.lock().pop_front().unwrap_or_else(|| Err(AppError::internal("script_exhausted", "no reply queued")))
        })
    }

    /// 401 unless the request carries `Bearer <good>`.
    pub fn requiring_token(good: &'static str) -> Arc<Self> {
        Self::new(move |req| if req.bearer() == Some(good) { ok(json!({"ok": true})) } else { unauthorized() })
    }

    pub fn requests(&self) -> Vec<RequestContext> {
        self.requests.lock().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn bearers(&self) -> Vec<Option<String>> {
        self.requests.lock().iter().map(|r| r.bearer().map(str::to_string)).collect()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, req: &RequestContext) -> AppResult<ApiResponse> {
        self.requests.lock().push(req.clone());
        (self.responder)(req)
    }
}

// =============================================================================
// Mock auth api
// =============================================================================

/// Login and register always succeed with `T1`/`R1`; the n-th refresh issues
/// `T{n+1}`/`R{n+1}` unless refresh failure is switched on.
pub struct MockAuthApi {
    user: UserIdentity,
    login_calls: AtomicUsize,
    register_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    refresh_args: Mutex<Vec<String>>,
    fail_refresh: AtomicBool,
    refresh_delay: Mutex<Duration>,
}

impl MockAuthApi {
    pub fn new(user: UserIdentity) -> Arc<Self> {
        Arc::new(Self {
            user,
            login_calls: AtomicUsize::new(0),
            register_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            refresh_args: Mutex::new(Vec::new()),
            fail_refresh: AtomicBool::new(false),
            refresh_delay: Mutex::new(Duration::ZERO),
        })
    }

    pub fn set_fail_refresh(&self, fail: bool) {
        self.fail_refresh.store(fail, Ordering::SeqCst);
    }

    pub fn set_refresh_delay(&self, d: Duration) {
        *self.refresh_delay.lock() = d;
    }

    pub fn login_calls(&self) -> usize { self.login_calls.load(Ordering::SeqCst) }
    pub fn register_calls(&self) -> usize { self.register_calls.load(Ordering::SeqCst) }
    pub fn refresh_calls(&self) -> usize { self.refresh_calls.load(Ordering::SeqCst) }
    pub fn refresh_args(&self) -> Vec<String> { self.refresh_args.lock().clone() }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, _req: &LoginRequest) -> AppResult<AuthResponse> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        Ok(auth("T1", "R1", self.user.clone()))
    }

    async fn register(&self, _req: &RegisterRequest) -> AppResult<AuthResponse> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        Ok(auth("T1", "R1", self.user.clone()))
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let n = self.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.refresh_args.lock().push(refresh_token.to_string());
        let delay = *self.refresh_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_refresh.load(Ordering::SeqCst) {
            return Err(AppError::http(401, "Unauthorized", Some("refresh token expired".to_string())));
        }
        Ok(auth(&format!("T{}", n + 1), &format!("R{}", n + 1), self.user.clone()))
    }
}

// =============================================================================
// Recording collaborators
// =============================================================================

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }
    pub fn messages(&self) -> Vec<String> { self.messages.lock().clone() }
}

impl Notifier for RecordingNotifier {
    fn notify_error(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn new() -> Arc<Self> { Arc::new(Self::default()) }
    pub fn routes(&self) -> Vec<String> { self.routes.lock().clone() }
}

impl Navigator for RecordingNavigator {
    fn go_to(&self, route: &str) {
        self.routes.lock().push(route.to_string());
    }
}

// =============================================================================
// Harness
// =============================================================================

pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub auth: Arc<MockAuthApi>,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
    pub session: Arc<SessionManager>,
    pub client: ApiClient,
}

/// Full pipeline over `transport`, with `store` restored into the session on start.
pub fn harness_with_store(transport: Arc<ScriptedTransport>, store: Arc<MemoryStore>, mode: RefreshMode) -> Harness {
    let auth = MockAuthApi::new(user("u1"));
    let notifier = RecordingNotifier::new();
    let navigator = RecordingNavigator::new();
    let session = Arc::new(SessionManager::new(auth.clone(), store.clone(), navigator.clone()));
    let client = ApiClient::with_session(transport.clone(), session.clone(), notifier.clone(), mode);
    Harness { transport, auth, store, notifier, navigator, session, client }
}

/// Full pipeline with a persisted `T1`/`R1` session for user `u1`.
pub fn logged_in(transport: Arc<ScriptedTransport>, mode: RefreshMode) -> Harness {
    harness_with_store(transport, seeded_store("T1", "R1", &user("u1")), mode)
}
