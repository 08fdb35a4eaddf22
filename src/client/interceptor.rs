//! Request pipeline stages.
//!
//! A chain is an ordered slice of interceptors (outermost first) in front of a transport.
//! Each interceptor receives the request plus a [`Next`] cursor over the rest of the chain
//! and may call it zero, one or several times.
//!
//! Stock stages:
//! - [`AuthInterceptor`]: attaches the bearer token and, on a 401, refreshes the session
//!   once and resends the original request once. A failed refresh logs the user out and
//!   the caller gets the original 401.
//! - [`ErrorInterceptor`]: turns any failure into a user-facing message for the
//!   [`Notifier`] (401s excepted, the auth stage owns those) and re-raises it unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::RefreshMode;
use crate::error::{AppError, AppResult, STATUS_NO_RESPONSE};
use crate::identity::{ApiResponse, RequestContext, SessionManager};

use super::notify::Notifier;
use super::transport::Transport;

pub const MSG_GENERIC: &str = "An error occurred";
pub const MSG_NETWORK: &str = "Network error - please check connection";

#[async_trait]
pub trait Interceptor: Send + Sync {
    async fn intercept(&self, req: RequestContext, next: Next<'_>) -> AppResult<ApiResponse>;
}

/// Cursor over the remaining stages of a chain.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Interceptor>],
    transport: &'a dyn Transport,
}

impl<'a> Next<'a> {
    pub fn new(chain: &'a [Arc<dyn Interceptor>], transport: &'a dyn Transport) -> Self {
        Self { chain, transport }
    }

    pub async fn run(self, req: RequestContext) -> AppResult<ApiResponse> {
        match self.chain.split_first() {
            Some((head, rest)) => head.intercept(req, Next { chain: rest, transport: self.transport }).await,
            None => self.transport.send(&req).await,
        }
    }
}

pub struct AuthInterceptor {
    session: Arc<SessionManager>,
    mode: RefreshMode,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl AuthInterceptor {
    pub fn new(session: Arc<SessionManager>, mode: RefreshMode) -> Self {
        Self { session, mode, refresh_gate: tokio::sync::Mutex::new(()) }
    }

    /// Obtain a token to retry with, or `None` when the session could not be renewed.
    /// `stale` is the token the failed request carried.
    async fn renew(&self, stale: Option<&str>) -> Option<String> {
        match self.mode {
            RefreshMode::PerRequest => self.refresh_or_logout().await,
            RefreshMode::SingleFlight => {
                let _guard = self.refresh_gate.lock().await;
                match self.session.token() {
                    Some(current) if Some(current.as_str()) != stale => {
                        debug!(target: "lostfound::client", "token rotated by a concurrent refresh; reusing it");
                        Some(current)
                    }
                    // Session was dropped while we waited: a concurrent refresh failed.
                    None if stale.is_some() => None,
                    _ => self.refresh_or_logout().await,
                }
            }
        }
    }

    async fn refresh_or_logout(&self) -> Option<String> {
        match self.session.refresh().await {
            Ok(resp) => Some(resp.token),
            Err(e) => {
                warn!(target: "lostfound::client", "session refresh rejected ({}); logging out", e.code_str());
                self.session.logout();
                None
            }
        }
    }
}

#[async_trait]
impl Interceptor for AuthInterceptor {
    async fn intercept(&self, req: RequestContext, next: Next<'_>) -> AppResult<ApiResponse> {
        let sent_token = self.session.token();
        let attempt = match sent_token.as_deref() {
            Some(t) => req.clone().with_bearer(t)?,
            None => req.clone(),
        };
        let err = match next.run(attempt).await {
            Ok(resp) => return Ok(resp),
            Err(e) => e,
        };
        if !err.is_unauthorized() || req.is_refresh_endpoint() {
            return Err(err);
        }
        debug!(target: "lostfound::client", "401 from {} {}; refreshing session", req.method, req.url);
        let Some(token) = self.renew(sent_token.as_deref()).await else {
            return Err(err);
        };
        // Exactly one retry; a second 401 goes back to the caller as is.
        next.run(req.with_bearer(&token)?).await
    }
}

/// Message shown to the user for a failed call.
pub fn user_message(err: &AppError) -> String {
    if let Some(m) = err.server_message().map(str::trim).filter(|m| !m.is_empty()) {
        return m.to_string();
    }
    if err.status() == Some(STATUS_NO_RESPONSE) {
        MSG_NETWORK.to_string()
    } else {
        MSG_GENERIC.to_string()
    }
}

pub struct ErrorInterceptor {
    notifier: Arc<dyn Notifier>,
}

impl ErrorInterceptor {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self { Self { notifier } }
}

#[async_trait]
impl Interceptor for ErrorInterceptor {
    async fn intercept(&self, req: RequestContext, next: Next<'_>) -> AppResult<ApiResponse> {
        match next.run(req).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                if !e.is_unauthorized() {
                    self.notifier.notify_error(&user_message(&e));
                }
                Err(e)
            }
        }
    }
}
