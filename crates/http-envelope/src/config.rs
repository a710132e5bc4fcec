//! Client configuration

use std::collections::BTreeMap;
use std::path::Path;

use config::{Config, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::Response;

/// Base URL env override
pub const ENV_HTTP_ENVELOPE_BASE_URL: &str = "HTTP_ENVELOPE_BASE_URL";
/// Timeout env override, in seconds
pub const ENV_HTTP_ENVELOPE_TIMEOUT_SECS: &str = "HTTP_ENVELOPE_TIMEOUT_SECS";
/// User agent env override
pub const ENV_HTTP_ENVELOPE_USER_AGENT: &str = "HTTP_ENVELOPE_USER_AGENT";
/// Invalid certificate acceptance env override
pub const ENV_HTTP_ENVELOPE_ACCEPT_INVALID_CERTS: &str = "HTTP_ENVELOPE_ACCEPT_INVALID_CERTS";
/// Proxy URL env override
pub const ENV_HTTP_ENVELOPE_PROXY_URL: &str = "HTTP_ENVELOPE_PROXY_URL";
/// Proxy host pattern env override
pub const ENV_HTTP_ENVELOPE_PROXY_MATCHER: &str = "HTTP_ENVELOPE_PROXY_MATCHER";

/// Proxy settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    /// Proxy URL
    pub url: String,
    /// Only proxy hosts matching this regex
    pub matcher: Option<String>,
}

/// Client configuration
///
/// ```toml
/// base_url = "https://api.example.com/v1"
/// timeout_secs = 30
///
/// [headers]
/// accept = "application/json"
///
/// [proxy]
/// url = "socks5://127.0.0.1:9050"
/// matcher = ".*\\.onion$"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// URL request templates are resolved against
    pub base_url: Option<String>,
    /// Overall request timeout
    pub timeout_secs: Option<u64>,
    /// `User-Agent` header value
    pub user_agent: Option<String>,
    /// Accept invalid TLS certificates
    pub accept_invalid_certs: bool,
    /// Proxy
    pub proxy: Option<ProxySettings>,
    /// Headers sent with every request
    pub headers: BTreeMap<String, String>,
}

impl ClientConfig {
    /// Defaults overridden by a config file
    pub fn from_file(path: impl AsRef<Path>) -> Response<Self> {
        Self::load(File::from(path.as_ref()))
    }

    /// Defaults overridden by TOML content
    pub fn from_toml_str(content: &str) -> Response<Self> {
        Self::load(File::from_str(content, FileFormat::Toml))
    }

    fn load<S>(source: S) -> Response<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .add_source(Config::try_from(&Self::default())?)
            .add_source(source)
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Config from env
    pub fn from_env(mut self) -> Self {
        use std::env;

        if let Ok(base_url) = env::var(ENV_HTTP_ENVELOPE_BASE_URL) {
            self.base_url = Some(base_url);
        }

        if let Ok(timeout_str) = env::var(ENV_HTTP_ENVELOPE_TIMEOUT_SECS) {
            if let Ok(timeout) = timeout_str.parse() {
                self.timeout_secs = Some(timeout);
            }
        }

        if let Ok(user_agent) = env::var(ENV_HTTP_ENVELOPE_USER_AGENT) {
            self.user_agent = Some(user_agent);
        }

        if let Ok(accept_str) = env::var(ENV_HTTP_ENVELOPE_ACCEPT_INVALID_CERTS) {
            if let Ok(accept) = accept_str.parse() {
                self.accept_invalid_certs = accept;
            }
        }

        if let Ok(url) = env::var(ENV_HTTP_ENVELOPE_PROXY_URL) {
            self.proxy = Some(ProxySettings {
                url,
                matcher: env::var(ENV_HTTP_ENVELOPE_PROXY_MATCHER).ok(),
            });
        }

        self
    }
}
