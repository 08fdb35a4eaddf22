//! HTTP plumbing between callers and the remote API: a transport, an ordered
//! interceptor chain around it, and the collaborators the chain reports to.

mod interceptor;
mod notify;
mod transport;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::RefreshMode;
use crate::error::AppResult;
use crate::identity::{ApiResponse, RequestBody, RequestContext, SessionManager};

pub use interceptor::{
    user_message, AuthInterceptor, ErrorInterceptor, Interceptor, Next, MSG_GENERIC, MSG_NETWORK,
};
pub use notify::{LogNavigator, LogNotifier, Navigator, Notifier, StderrNotifier};
pub use transport::{error_from_response, server_message_from, HttpTransport, Transport};

/// Facade every call site goes through: runs each request through the chain
/// (outermost stage first) and finally the transport.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    chain: Arc<[Arc<dyn Interceptor>]>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>, chain: Vec<Arc<dyn Interceptor>>) -> Self {
        Self { transport, chain: chain.into() }
    }

    /// The standard pipeline: error surfacing wrapped around auth attach/refresh.
    pub fn with_session(
        transport: Arc<dyn Transport>,
        session: Arc<SessionManager>,
        notifier: Arc<dyn Notifier>,
        mode: RefreshMode,
    ) -> Self {
        let chain: Vec<Arc<dyn Interceptor>> = vec![
            Arc::new(ErrorInterceptor::new(notifier)),
            Arc::new(AuthInterceptor::new(session, mode)),
        ];
        Self::new(transport, chain)
    }

    pub fn chain_len(&self) -> usize { self.chain.len() }

    pub async fn send(&self, req: RequestContext) -> AppResult<ApiResponse> {
        debug!(target: "lostfound::client", "{} {}", req.method, req.url);
        Next::new(&self.chain, self.transport.as_ref()).run(req).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> AppResult<T> {
        self.send(RequestContext::get(url)).await?.json()
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, url: &str, body: &B) -> AppResult<T> {
        let req = RequestContext::post(url).with_json(serde_json::to_value(body)?);
        self.send(req).await?.json()
    }

    pub async fn put_json<B: Serialize + ?Sized, T: DeserializeOwned>(&self, url: &str, body: &B) -> AppResult<T> {
        let req = RequestContext::put(url).with_json(serde_json::to_value(body)?);
        self.send(req).await?.json()
    }

    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: &str,
        field: &str,
        file_name: &str,
        content_type: Option<&str>,
        bytes: Vec<u8>,
    ) -> AppResult<T> {
        let body = RequestBody::Multipart {
            field: field.to_string(),
            file_name: file_name.to_string(),
            content_type: content_type.map(str::to_string),
            bytes,
        };
        self.send(RequestContext::post(url).with_body(body)).await?.json()
    }
}
