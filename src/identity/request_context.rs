use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{AppError, AppResult};

/// Path fragment identifying the token refresh endpoint.
pub const REFRESH_PATH: &str = "auth/refresh";

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Single-file multipart upload. Kept as raw bytes so the request can be resent.
    Multipart { field: String, file_name: String, content_type: Option<String>, bytes: Vec<u8> },
}

/// One outbound call, alive for a single pass through the interceptor chain.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl RequestContext {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: HeaderMap::new(), body: RequestBody::Empty }
    }

    pub fn get(url: impl Into<String>) -> Self { Self::new(Method::GET, url) }
    pub fn post(url: impl Into<String>) -> Self { Self::new(Method::POST, url) }
    pub fn put(url: impl Into<String>) -> Self { Self::new(Method::PUT, url) }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Replace any existing Authorization header with `Bearer <token>`.
    pub fn with_bearer(mut self, token: &str) -> AppResult<Self> {
        let v = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| AppError::internal("bad_token", "access token is not a valid header value"))?;
        self.headers.insert(AUTHORIZATION, v);
        Ok(self)
    }

    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.strip_prefix("Bearer "))
    }

    /// True for the token refresh call itself; such a request must never trigger a refresh.
    pub fn is_refresh_endpoint(&self) -> bool {
        let path = self.url.split(['?', '#']).next().unwrap_or("");
        path.contains(REFRESH_PATH)
    }
}

/// Successful response. Non-2xx statuses never reach here; transports turn them into `AppError::Http`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn new(status: u16, body: Value) -> Self { Self { status, body } }

    pub fn ok(body: Value) -> Self { Self::new(200, body) }

    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_value(self.body.clone())
            .map_err(|e| AppError::decode("response_decode", format!("unexpected response shape: {}", e)))
    }
}
