//!
//! lostfound client configuration
//! ------------------------------
//! Resolution order, lowest to highest: built-in defaults, an optional JSON config
//! file, `LOSTFOUND_*` environment variables, then command-line flags (applied by the
//! binary through [`ClientConfig::apply_args`]).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::identity::DEFAULT_LOGIN_ROUTE;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000/api/v1";
pub const DEFAULT_STORE_PATH: &str = ".lostfound/session.json";

pub const ENV_API_URL: &str = "LOSTFOUND_API_URL";
pub const ENV_ASSET_URL: &str = "LOSTFOUND_ASSET_URL";
pub const ENV_STORE: &str = "LOSTFOUND_STORE";
pub const ENV_REFRESH_MODE: &str = "LOSTFOUND_REFRESH_MODE";
pub const ENV_TIMEOUT_SECS: &str = "LOSTFOUND_TIMEOUT_SECS";

/// How concurrent 401s are turned into refresh calls.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefreshMode {
    /// Every failing request runs its own refresh.
    #[default]
    PerRequest,
    /// One refresh at a time; requests that were waiting reuse its outcome.
    SingleFlight,
}

impl RefreshMode {
    pub fn parse(s: &str) -> AppResult<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "per_request" => Ok(RefreshMode::PerRequest),
            "single_flight" => Ok(RefreshMode::SingleFlight),
            other => Err(AppError::user(
                "bad_refresh_mode",
                format!("unknown refresh mode '{}' (expected per_request or single_flight)", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ClientConfig {
    pub api_base_url: String,
    /// Origin that relative image paths are resolved against. Derived from the api url when unset.
    pub asset_base_url: Option<String>,
    pub store_path: PathBuf,
    pub login_route: String,
    pub refresh_mode: RefreshMode,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            asset_base_url: None,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            refresh_mode: RefreshMode::PerRequest,
            request_timeout_secs: None,
        }
    }
}

fn parse_u64_env(name: &str) -> AppResult<Option<u64>> {
    match std::env::var(name) {
        Ok(v) => v
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| AppError::user("bad_env", format!("{} must be a whole number of seconds, got '{}'", name, v))),
        Err(_) => Ok(None),
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Value following `flag` in `args`, if present.
pub fn parse_flag_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

impl ClientConfig {
    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| AppError::user("config_read", format!("{}: {}", path.display(), e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| AppError::user("config_parse", format!("{}: {}", path.display(), e)))
    }

    /// Defaults, then `file` when given, then environment overrides.
    pub fn load(file: Option<&Path>) -> AppResult<Self> {
        let mut cfg = match file {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn apply_env(&mut self) -> AppResult<()> {
        if let Some(v) = non_empty_env(ENV_API_URL) { self.api_base_url = v; }
        if let Some(v) = non_empty_env(ENV_ASSET_URL) { self.asset_base_url = Some(v); }
        if let Some(v) = non_empty_env(ENV_STORE) { self.store_path = PathBuf::from(v); }
        if let Some(v) = non_empty_env(ENV_REFRESH_MODE) { self.refresh_mode = RefreshMode::parse(&v)?; }
        if let Some(v) = parse_u64_env(ENV_TIMEOUT_SECS)? { self.request_timeout_secs = Some(v); }
        Ok(())
    }

    /// Command-line overrides: `--api`, `--asset-url`, `--store`, `--refresh-mode`, `--timeout`.
    pub fn apply_args(&mut self, args: &[String]) -> AppResult<()> {
        if let Some(v) = parse_flag_value(args, "--api") { self.api_base_url = v; }
        if let Some(v) = parse_flag_value(args, "--asset-url") { self.asset_base_url = Some(v); }
        if let Some(v) = parse_flag_value(args, "--store") { self.store_path = PathBuf::from(v); }
        if let Some(v) = parse_flag_value(args, "--refresh-mode") { self.refresh_mode = RefreshMode::parse(&v)?; }
        if let Some(v) = parse_flag_value(args, "--timeout") {
            let secs = v
                .parse::<u64>()
                .map_err(|_| AppError::user("bad_flag", format!("--timeout expects seconds, got '{}'", v)))?;
            self.request_timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }

    /// `api_base_url` joined with `path`, with exactly one slash between them.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url.trim_end_matches('/'), path.trim_start_matches('/'))
    }

    /// Scheme and authority of the api url (`http://host:port`), used for asset links.
    pub fn asset_origin(&self) -> String {
        if let Some(a) = &self.asset_base_url {
            return a.trim_end_matches('/').to_string();
        }
        match reqwest::Url::parse(&self.api_base_url) {
            Ok(u) => u.origin().ascii_serialization(),
            Err(_) => self.api_base_url.trim_end_matches('/').to_string(),
        }
    }
}
