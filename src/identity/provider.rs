use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::client::{ApiClient, ErrorInterceptor, Interceptor, Notifier, Transport};
use crate::error::{AppError, AppResult};
use crate::identity::request_context::{RequestContext, REFRESH_PATH};
use crate::tprintln;

use super::principal::{Role, UserIdentity};

#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self { email: email.into(), password: password.into() }
    }
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest").field("email", &self.email).field("password", &"***").finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub role: Role,
    pub identity_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faculty: Option<String>,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"***")
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

pub const MIN_PASSWORD_LEN: usize = 6;

impl RegisterRequest {
    /// Local checks the remote API would reject anyway; run before any network call.
    pub fn validate(&self) -> AppResult<()> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("password", &self.password),
            ("phone", &self.phone),
            ("identity_number", &self.identity_number),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(AppError::user("missing_field", format!("{} is required", field)));
            }
        }
        if !self.email.contains('@') {
            return Err(AppError::user("invalid_email", format!("'{}' is not an email address", self.email)));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::user(
                "weak_password",
                format!("password must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        if self.role == Role::Student && self.faculty.as_deref().map(str::trim).unwrap_or("").is_empty() {
            return Err(AppError::user("missing_field", "faculty is required for students"));
        }
        Ok(())
    }
}

/// Body returned by login, register and refresh alike.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub user: UserIdentity,
}

/// Credential exchange with the remote API.
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, req: &LoginRequest) -> AppResult<AuthResponse>;
    async fn register(&self, req: &RegisterRequest) -> AppResult<AuthResponse>;
    async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse>;
}

/// `AuthApi` over HTTP. Calls go through an error-surfacing pipeline only: credential
/// calls carry no bearer token and a rejected login must not trigger a token refresh.
pub struct RemoteAuthApi {
    base_url: String,
    client: ApiClient,
}

impl RemoteAuthApi {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>, notifier: Arc<dyn Notifier>) -> Self {
        let chain: Vec<Arc<dyn Interceptor>> = vec![Arc::new(ErrorInterceptor::new(notifier))];
        Self { base_url: base_url.into(), client: ApiClient::new(transport, chain) }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    async fn post_auth(&self, path: &str, body: serde_json::Value) -> AppResult<AuthResponse> {
        let resp = self.client.send(RequestContext::post(self.url(path)).with_json(body)).await?;
        resp.json::<AuthResponse>()
    }
}

#[async_trait]
impl AuthApi for RemoteAuthApi {
    async fn login(&self, req: &LoginRequest) -> AppResult<AuthResponse> {
        let resp = self.post_auth("auth/login", serde_json::to_value(req)?).await?;
        tprintln!("auth.login user={}", resp.user.id);
        Ok(resp)
    }

    async fn register(&self, req: &RegisterRequest) -> AppResult<AuthResponse> {
        let resp = self.post_auth("auth/register", serde_json::to_value(req)?).await?;
        tprintln!("auth.register user={} role={}", resp.user.id, resp.user.role);
        Ok(resp)
    }

    async fn refresh(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        self.post_auth(REFRESH_PATH, json!({ "refresh_token": refresh_token })).await
    }
}
