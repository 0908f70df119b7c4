//! Configuration for the authorization store

use std::time::Duration;
use tracing::warn;

/// Fallback backend used when `SERVER_URL` is not set
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3000";

/// Path of the session introspection endpoint
pub const DEFAULT_ENDPOINT_PATH: &str = "/api/me";

/// Environment variable names read by [`StoreConfig::from_env`]
pub const ENV_SERVER_URL: &str = "SERVER_URL";
pub const ENV_REFRESH_SECS: &str = "AUTHSYNC_REFRESH_SECS";
pub const ENV_TIMEOUT_SECS: &str = "AUTHSYNC_TIMEOUT_SECS";
pub const ENV_SESSION_COOKIE: &str = "SESSION_COOKIE";

/// Configuration for an [`AuthorizationStore`](crate::AuthorizationStore)
/// and its HTTP source
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backend base URL (e.g., "http://localhost:3000")
    pub server_url: String,

    /// Path of the authorization endpoint, joined onto `server_url`
    pub endpoint_path: String,

    /// Interval between scheduled refreshes
    pub refresh_interval: Duration,

    /// Timeout for a single fetch
    pub request_timeout: Duration,

    /// Session cookie sent with every fetch, in `Cookie` header form
    /// (e.g., "sid=abc123")
    pub session_cookie: Option<String>,
}

impl StoreConfig {
    /// Create a configuration for the given backend with default timings
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            refresh_interval: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            session_cookie: None,
        }
    }

    /// Build a configuration from the process environment.
    ///
    /// Missing or unparsable values never fail: they are logged and the
    /// default is used instead.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit lookup, so
    /// callers can layer their own sources over the environment
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_url = match lookup(ENV_SERVER_URL).filter(|v| !v.trim().is_empty()) {
            Some(url) => url,
            None => {
                warn!(
                    fallback = DEFAULT_SERVER_URL,
                    "{} is not set, using fallback", ENV_SERVER_URL
                );
                DEFAULT_SERVER_URL.to_string()
            }
        };

        let mut config = Self::new(server_url);

        if let Some(secs) = parse_secs(&lookup, ENV_REFRESH_SECS) {
            config.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_secs(&lookup, ENV_TIMEOUT_SECS) {
            config.request_timeout = Duration::from_secs(secs);
        }
        config.session_cookie = lookup(ENV_SESSION_COOKIE).filter(|v| !v.is_empty());

        config
    }

    /// Set the refresh interval
    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    /// Set the per-request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the endpoint path
    pub fn endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.endpoint_path = path.into();
        self
    }

    /// Attach a session cookie to every fetch
    pub fn session_cookie(mut self, cookie: impl Into<String>) -> Self {
        self.session_cookie = Some(cookie.into());
        self
    }

    /// Full URL of the authorization endpoint
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}/{}",
            self.server_url.trim_end_matches('/'),
            self.endpoint_path.trim_start_matches('/')
        )
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

fn parse_secs<F>(lookup: &F, key: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<u64>() {
        Ok(0) => {
            warn!(key, "zero is not a valid duration, using default");
            None
        }
        Ok(secs) => Some(secs),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "invalid duration, using default");
            None
        }
    }
}
