use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::dispatch::{
    HeaderMap, API_KEY_HEADER, API_SECRET_HEADER, DEFAULT_BASE_URL, DEFAULT_TICKET_PATH,
};
use crate::validation::{FieldRule, Record};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub client: ClientConfig,
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Ticketing endpoint client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Ticketing host (e.g., "https://osticket.com/")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// API key, sent as `x-api-key`
    pub api_key: String,
    /// Optional API secret, sent as `x-api-auth`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<String>,
    /// Echo tickets instead of sending them
    #[serde(default)]
    pub debug_mode: bool,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            api_key: api_key.into(),
            api_secret: None,
            debug_mode: false,
            timeout_secs: default_timeout(),
        }
    }

    /// Default request headers derived from the credentials.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER.to_string(), self.api_key.clone());
        if let Some(secret) = self.api_secret.as_ref().filter(|s| !s.is_empty()) {
            headers.insert(API_SECRET_HEADER.to_string(), secret.clone());
        }
        headers
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.timeout_secs))
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Idempotency lock store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LockConfig {
    #[serde(default)]
    pub backend: LockBackend,
    /// TTL applied when a call does not pass `expires`
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
    /// Database file (backend = "sqlite")
    #[serde(default = "default_lock_path")]
    pub sqlite_path: PathBuf,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            backend: LockBackend::default(),
            default_ttl_secs: default_ttl_secs(),
            sqlite_path: default_lock_path(),
        }
    }
}

impl LockConfig {
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

fn default_ttl_secs() -> u64 {
    60
}

fn default_lock_path() -> PathBuf {
    PathBuf::from("ticketgate-locks.db")
}

/// Available lock store backends
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LockBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Submission profile: extra rules and payload shaping for one ticketing flavor
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileConfig {
    #[serde(default = "default_profile_name")]
    pub name: String,
    /// Ticket creation path
    #[serde(default = "default_path")]
    pub path: String,
    /// Rules appended after the base rules on every call
    #[serde(default)]
    pub extra_fields: Vec<FieldRule>,
    /// Fields added to the outbound body when the record lacks them
    #[serde(default)]
    pub payload_defaults: Record,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            name: default_profile_name(),
            path: default_path(),
            extra_fields: Vec::new(),
            payload_defaults: Record::new(),
        }
    }
}

fn default_profile_name() -> String {
    "osticket".to_string()
}

fn default_path() -> String {
    DEFAULT_TICKET_PATH.to_string()
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub client: SanitizedClientConfig,
    pub lock: LockConfig,
    pub profile: ProfileConfig,
    pub server: ServerConfig,
}

/// Sanitized client config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedClientConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub api_secret_configured: bool,
    pub debug_mode: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            client: SanitizedClientConfig {
                base_url: config.client.base_url.clone(),
                api_key_configured: !config.client.api_key.is_empty(),
                api_secret_configured: config
                    .client
                    .api_secret
                    .as_ref()
                    .is_some_and(|s| !s.is_empty()),
                debug_mode: config.client.debug_mode,
                timeout_secs: config.client.timeout_secs,
            },
            lock: config.lock.clone(),
            profile: config.profile.clone(),
            server: config.server.clone(),
        }
    }
}
