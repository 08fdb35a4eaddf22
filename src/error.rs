//! Unified client error model.
//! Every failure the pipeline can observe is folded into one enum so the interceptors,
//! the session manager and the CLI can reason about it the same way: a stable `code`,
//! a human `message`, and for HTTP failures the status plus any server-supplied message.

use thiserror::Error;

/// Status the pipeline reports for failures where no response was obtained.
pub const STATUS_NO_RESPONSE: u16 = 0;
/// Status the remote API uses for a missing, invalid or expired access token.
pub const STATUS_UNAUTHORIZED: u16 = 401;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AppError {
    /// No response was obtained (connect refused, DNS, TLS, timeout).
    #[error("{code}: {message}")]
    Network { code: String, message: String },
    /// The server answered with a non-success status.
    #[error("{code}: HTTP {status}: {message}")]
    Http { code: String, status: u16, message: String, server_message: Option<String> },
    #[error("{code}: {message}")]
    UserInput { code: String, message: String },
    #[error("{code}: {message}")]
    Storage { code: String, message: String },
    #[error("{code}: {message}")]
    Decode { code: String, message: String },
    #[error("{code}: {message}")]
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Network { code, .. }
            | AppError::Http { code, .. }
            | AppError::UserInput { code, .. }
            | AppError::Storage { code, .. }
            | AppError::Decode { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Network { message, .. }
            | AppError::Http { message, .. }
            | AppError::UserInput { message, .. }
            | AppError::Storage { message, .. }
            | AppError::Decode { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn network(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Network { code: code.into(), message: msg.into() } }
    pub fn user(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn storage(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Storage { code: code.into(), message: msg.into() } }
    pub fn decode(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Decode { code: code.into(), message: msg.into() } }
    pub fn internal(code: impl Into<String>, msg: impl Into<String>) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    pub fn http(status: u16, msg: impl Into<String>, server_message: Option<String>) -> Self {
        AppError::Http { code: "http_error".into(), status, message: msg.into(), server_message }
    }

    pub fn unauthorized(code: impl Into<String>, msg: impl Into<String>) -> Self {
        AppError::Http { code: code.into(), status: STATUS_UNAUTHORIZED, message: msg.into(), server_message: None }
    }

    /// HTTP status of the failure: the response status for `Http`, `0` when no
    /// response was obtained, `None` for failures that never reached the wire.
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Http { status, .. } => Some(*status),
            AppError::Network { .. } => Some(STATUS_NO_RESPONSE),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(STATUS_UNAUTHORIZED)
    }

    pub fn is_network(&self) -> bool {
        matches!(self, AppError::Network { .. })
    }

    /// Message field from the server's error body, if it sent one.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            AppError::Http { server_message, .. } => server_message.as_deref(),
            _ => None,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal_error".into(), message: err.to_string() }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Decode { code: "decode_error".into(), message: err.to_string() }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage { code: "io_error".into(), message: err.to_string() }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
