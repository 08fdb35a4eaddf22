//! Client-side identity: who is logged in, with which credentials, and how the
//! session is obtained, renewed and dropped.

mod principal;
mod session;
mod provider;
mod request_context;

pub use principal::{Role, UserIdentity};
pub use session::{
    Credentials, Session, SessionManager, DEFAULT_LOGIN_ROUTE, KEY_REFRESH_TOKEN, KEY_TOKEN, KEY_USER,
    SESSION_KEYS,
};
pub use provider::{AuthApi, AuthResponse, LoginRequest, RegisterRequest, RemoteAuthApi, MIN_PASSWORD_LEN};
pub use request_context::{ApiResponse, RequestBody, RequestContext, REFRESH_PATH};
