use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::identity::{ApiResponse, RequestBody, RequestContext};

/// Sends one request and classifies the outcome: 2xx is `Ok`, any other status is
/// `AppError::Http`, and no response at all is `AppError::Network`.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, req: &RequestContext) -> AppResult<ApiResponse>;
}

/// The `message` field of an error body. Blank strings count as absent; a list of
/// strings (validation errors) is joined with `", "`.
pub fn server_message_from(body: &Value) -> Option<String> {
    let text = match body.get("message")? {
        Value::String(s) => s.trim().to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => return None,
    };
    if text.is_empty() { None } else { Some(text) }
}

/// Build the error for a non-success response, lifting the `message` field of a JSON
/// error body when the server sent one.
pub fn error_from_response(status: u16, body: &Value) -> AppError {
    let server_message = server_message_from(body);
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("unexpected status");
    let message = server_message.clone().unwrap_or_else(|| reason.to_string());
    AppError::http(status, message, server_message)
}

fn map_send_error(e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        AppError::network("timeout", e.to_string())
    } else if e.is_connect() {
        AppError::network("connect", e.to_string())
    } else if e.is_builder() {
        AppError::user("bad_request", e.to_string())
    } else {
        AppError::network("transport", e.to_string())
    }
}

fn decode_body(bytes: &[u8]) -> Value {
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
}

/// `Transport` over a reqwest client.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Option<Duration>) -> AppResult<Self> {
        let mut builder = reqwest::Client::builder().cookie_store(true);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build().map_err(|e| AppError::internal("http_client", e.to_string()))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self { Self { client } }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, req: &RequestContext) -> AppResult<ApiResponse> {
        let mut rb = self.client.request(req.method.clone(), req.url.as_str()).headers(req.headers.clone());
        rb = match &req.body {
            RequestBody::Empty => rb,
            RequestBody::Json(v) => rb.json(v),
            RequestBody::Multipart { field, file_name, content_type, bytes } => {
                let mut part = reqwest::multipart::Part::bytes(bytes.clone()).file_name(file_name.clone());
                if let Some(ct) = content_type {
                    part = part.mime_str(ct).map_err(|e| AppError::user("bad_content_type", e.to_string()))?;
                }
                rb.multipart(reqwest::multipart::Form::new().part(field.clone(), part))
            }
        };
        let resp = rb.send().await.map_err(map_send_error)?;
        let status = resp.status().as_u16();
        let body = resp.bytes().await.map(|b| decode_body(&b)).map_err(map_send_error);
        debug!(target: "lostfound::client", "{} {} -> {}", req.method, req.url, status);
        classify(status, body)
    }
}

/// Outcome of a call whose status line arrived. A non-2xx status stays an HTTP error
/// even when its body could not be read, so a 401 still reaches the refresh path.
fn classify(status: u16, body: AppResult<Value>) -> AppResult<ApiResponse> {
    let success = (200..300).contains(&status);
    match body {
        Ok(body) if success => Ok(ApiResponse::new(status, body)),
        Ok(body) => Err(error_from_response(status, &body)),
        Err(e) if success => Err(e),
        Err(e) => {
            debug!(target: "lostfound::client", "unreadable body for status {}: {}", status, e);
            Err(error_from_response(status, &Value::Null))
        }
    }
}
