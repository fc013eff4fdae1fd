// Connection layer: holds the blocking HTTP client, the credentials and the
// session token handed out by Magento's `login`. Every remote procedure goes
// through `MagentoConnection::call`, which refuses to talk to the server
// until a token is present.

use crate::config::MagentoConfig;
use crate::error::{MagentoError, Result};
use crate::xmlrpc::{self, MethodResponse};
use log::{debug, warn};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

/// Authenticated XML-RPC session against one Magento endpoint.
pub struct MagentoConnection {
    client: Client,
    config: MagentoConfig,
    token: Option<String>,
}

impl MagentoConnection {
    /// Builds a disconnected connection. No request is sent.
    pub fn new(config: MagentoConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;
        Ok(MagentoConnection {
            client,
            config,
            token: None,
        })
    }

    /// Builds a connection and logs in straight away.
    pub fn open(config: MagentoConfig) -> Result<Self> {
        let mut conn = Self::new(config)?;
        conn.connect()?;
        Ok(conn)
    }

    pub fn open_with(url: &str, username: &str, api_key: &str) -> Result<Self> {
        Self::open(MagentoConfig::new(url, username, api_key))
    }

    /// Issues `login(username, api_key)` and keeps the returned session token.
    /// Once connected the connection stays connected; a second call is a no-op.
    pub fn connect(&mut self) -> Result<()> {
        if self.is_connected() {
            debug!("already connected to {}, skipping login", self.config.url);
            return Ok(());
        }

        let params = [
            Value::String(self.config.username.clone()),
            Value::String(self.config.api_key.clone()),
        ];
        let token = match self.send("login", &params)? {
            MethodResponse::Success(Value::String(token)) if !token.is_empty() => token,
            MethodResponse::Success(other) => {
                warn!("login to {} returned no usable session token", self.config.url);
                return Err(MagentoError::Authentication {
                    code: None,
                    message: format!("login returned no session token: {other}"),
                });
            }
            MethodResponse::Fault { code, message } => {
                warn!("login to {} rejected: {} {}", self.config.url, code, message);
                return Err(MagentoError::Authentication {
                    code: Some(code),
                    message,
                });
            }
        };

        debug!("logged in to {} as {}", self.config.url, self.config.username);
        self.token = Some(token);
        Ok(())
    }

    pub fn is_connected(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub fn config(&self) -> &MagentoConfig {
        &self.config
    }

    /// Calls `procedure` with positional `args` as `call(token, procedure, args)`
    /// and returns the remote result untouched.
    pub fn call(&self, procedure: &str, args: Vec<Value>) -> Result<Value> {
        let token = match self.token.as_deref() {
            Some(token) if !token.is_empty() => token,
            _ => return Err(MagentoError::NotConnected),
        };

        debug!("call {} with {} argument(s)", procedure, args.len());
        let params = [
            Value::String(token.to_string()),
            Value::String(procedure.to_string()),
            Value::Array(args),
        ];
        let response = self.send("call", &params)?;
        if let MethodResponse::Fault { code, message } = &response {
            warn!("{} failed with remote fault {}: {}", procedure, code, message);
        }
        response.into_result()
    }

    /// POSTs one `methodCall` document and decodes the reply.
    fn send(&self, method: &str, params: &[Value]) -> Result<MethodResponse> {
        let body = xmlrpc::encode_call(method, params);
        let res = self
            .client
            .post(&self.config.url)
            .header(CONTENT_TYPE, "text/xml")
            .body(body)
            .send()?;

        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            warn!("{} on {} answered HTTP {}", method, self.config.url, status);
            return Err(MagentoError::Http {
                status: status.as_u16(),
                body: txt,
            });
        }

        let text = res.text()?;
        xmlrpc::decode_response(&text)
    }
}

impl std::fmt::Debug for MagentoConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MagentoConnection")
            .field("config", &self.config)
            .field("connected", &self.is_connected())
            .finish()
    }
}
