use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::client::Navigator;
use crate::error::{AppError, AppResult};
use crate::storage::KeyValueStore;
use crate::tprintln;

use super::principal::UserIdentity;
use super::provider::{AuthApi, AuthResponse, LoginRequest, RegisterRequest};

pub const KEY_TOKEN: &str = "token";
pub const KEY_REFRESH_TOKEN: &str = "refresh_token";
pub const KEY_USER: &str = "user";
pub const SESSION_KEYS: [&str; 3] = [KEY_TOKEN, KEY_REFRESH_TOKEN, KEY_USER];

pub const DEFAULT_LOGIN_ROUTE: &str = "/auth/login";

/// Token pair plus the identity it was issued for. Always set and cleared as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserIdentity,
}

impl From<&AuthResponse> for Credentials {
    fn from(r: &AuthResponse) -> Self {
        Self { access_token: r.token.clone(), refresh_token: r.refresh_token.clone(), user: r.user.clone() }
    }
}

/// Current authentication state. Either fully populated or fully empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    credentials: Option<Credentials>,
}

impl Session {
    pub fn active(credentials: Credentials) -> Self { Self { credentials: Some(credentials) } }

    pub fn access_token(&self) -> Option<&str> { self.credentials.as_ref().map(|c| c.access_token.as_str()) }
    pub fn refresh_token(&self) -> Option<&str> { self.credentials.as_ref().map(|c| c.refresh_token.as_str()) }
    pub fn current_user(&self) -> Option<&UserIdentity> { self.credentials.as_ref().map(|c| &c.user) }
    pub fn credentials(&self) -> Option<&Credentials> { self.credentials.as_ref() }
    pub fn is_active(&self) -> bool { self.credentials.is_some() }
}

/// Owns the client session: credential calls, persistence and the current-user feed.
///
/// Every mutation runs its persist/replace/publish sequence under one write lock, so
/// readers never observe a half-applied session.
pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn KeyValueStore>,
    navigator: Arc<dyn Navigator>,
    login_route: String,
    state: RwLock<Session>,
    user_tx: watch::Sender<Option<UserIdentity>>,
}

impl SessionManager {
    /// Build the manager and restore any session persisted by a previous run. The restored
    /// token is not validated; a stale one surfaces as a 401 on first use.
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn KeyValueStore>, navigator: Arc<dyn Navigator>) -> Self {
        let session = restore(store.as_ref());
        let (user_tx, _) = watch::channel(session.current_user().cloned());
        if let Some(u) = session.current_user() {
            info!(target: "lostfound::session", "restored session user={}", u.id);
        }
        Self {
            api,
            store,
            navigator,
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            state: RwLock::new(session),
            user_tx,
        }
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn login_route(&self) -> &str { &self.login_route }

    pub async fn login(&self, req: &LoginRequest) -> AppResult<AuthResponse> {
        let resp = self.api.login(req).await?;
        self.apply_auth_response(&resp)?;
        info!(target: "lostfound::session", "login ok user={}", resp.user.id);
        Ok(resp)
    }

    pub async fn register(&self, req: &RegisterRequest) -> AppResult<AuthResponse> {
        req.validate()?;
        let resp = self.api.register(req).await?;
        self.apply_auth_response(&resp)?;
        info!(target: "lostfound::session", "register ok user={} role={}", resp.user.id, resp.user.role);
        Ok(resp)
    }

    /// Exchange the stored refresh token for a new pair. Failure leaves the session as it
    /// was; deciding to log out is the caller's job.
    pub async fn refresh(&self) -> AppResult<AuthResponse> {
        let Some(refresh_token) = self.stored_refresh_token() else {
            return Err(AppError::unauthorized("no_refresh_token", "no refresh token stored"));
        };
        let resp = match self.api.refresh(&refresh_token).await {
            Ok(r) => r,
            Err(e) => {
                warn!(target: "lostfound::session", "refresh failed: {}", e);
                return Err(e);
            }
        };
        self.apply_auth_response(&resp)?;
        debug!(target: "lostfound::session", "token refreshed user={}", resp.user.id);
        Ok(resp)
    }

    /// Drop the session everywhere and send the user to the login screen.
    pub fn logout(&self) {
        {
            let mut state = self.state.write();
            if let Err(e) = self.store.remove_all(&SESSION_KEYS) {
                warn!(target: "lostfound::session", "could not clear persisted session: {}", e);
            }
            *state = Session::default();
            self.user_tx.send_replace(None);
        }
        info!(target: "lostfound::session", "logged out");
        self.navigator.go_to(&self.login_route);
    }

    fn stored_refresh_token(&self) -> Option<String> {
        self.state.read().refresh_token().map(str::to_string)
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().access_token().map(str::to_string)
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.state.read().current_user().cloned()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.read().is_active()
    }

    pub fn snapshot(&self) -> Session {
        self.state.read().clone()
    }

    /// Feed of the current user. The receiver starts out flagged as changed, so the first
    /// `changed().await` yields the latest value immediately; dropping it unsubscribes.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserIdentity>> {
        let mut rx = self.user_tx.subscribe();
        rx.mark_changed();
        rx
    }

    pub fn subscriber_count(&self) -> usize {
        self.user_tx.receiver_count()
    }

    fn apply_auth_response(&self, resp: &AuthResponse) -> AppResult<()> {
        let user_json = serde_json::to_string(&resp.user)?;
        let mut state = self.state.write();
        self.store.set_many(&[
            (KEY_TOKEN, resp.token.as_str()),
            (KEY_REFRESH_TOKEN, resp.refresh_token.as_str()),
            (KEY_USER, user_json.as_str()),
        ])?;
        *state = Session::active(Credentials::from(resp));
        self.user_tx.send_replace(Some(resp.user.clone()));
        tprintln!("session.apply user={}", resp.user.id);
        Ok(())
    }
}

fn restore(store: &dyn KeyValueStore) -> Session {
    let read = |key: &str| match store.get(key) {
        Ok(v) => v,
        Err(e) => {
            warn!(target: "lostfound::session", "cannot read '{}' from store: {}", key, e);
            None
        }
    };
    let (Some(access_token), Some(refresh_token), Some(user_json)) =
        (read(KEY_TOKEN), read(KEY_REFRESH_TOKEN), read(KEY_USER))
    else {
        return Session::default();
    };
    match serde_json::from_str::<UserIdentity>(&user_json) {
        Ok(user) => Session::active(Credentials { access_token, refresh_token, user }),
        Err(e) => {
            warn!(target: "lostfound::session", "ignoring persisted user that does not decode: {}", e);
            Session::default()
        }
    }
}
