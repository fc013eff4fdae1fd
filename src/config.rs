// Connection settings. `from_env` mirrors how the CLI is usually launched:
// endpoint and credentials come from environment variables with the
// placeholder values of a fresh Magento install as fallback.

use crate::error::{MagentoError, Result};
use std::time::Duration;

pub const DEFAULT_URL: &str = "http://www.yourmagento.com/index.php/api/xmlrpc/";

/// Endpoint and credentials for a Magento XML-RPC API user.
#[derive(Clone)]
pub struct MagentoConfig {
    pub url: String,
    pub username: String,
    pub api_key: String,
    /// Per-request HTTP timeout; `None` leaves reqwest's default in place.
    pub timeout: Option<Duration>,
}

impl MagentoConfig {
    pub fn new(url: impl Into<String>, username: impl Into<String>, api_key: impl Into<String>) -> Self {
        MagentoConfig {
            url: url.into(),
            username: username.into(),
            api_key: api_key.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reads `MAGENTO_XMLRPC_URL`, `MAGENTO_USERNAME`, `MAGENTO_API_KEY`
    /// and the optional `MAGENTO_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let url = lookup("MAGENTO_XMLRPC_URL").unwrap_or_else(|| DEFAULT_URL.into());
        let username = lookup("MAGENTO_USERNAME").unwrap_or_else(|| "username".into());
        let api_key = lookup("MAGENTO_API_KEY").unwrap_or_else(|| "apikey".into());
        let mut config = MagentoConfig::new(url, username, api_key);

        if let Some(raw) = lookup("MAGENTO_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    MagentoError::Config(format!(
                        "MAGENTO_TIMEOUT_SECS must be a positive number of seconds, got {raw:?}"
                    ))
                })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        Ok(config)
    }
}

// Hand-written so the API key never ends up in logs.
impl std::fmt::Debug for MagentoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagentoConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}
