// Error type shared by the connection and the catalog client.
// Remote faults are carried with their original code and message; the
// library never retries or translates them.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, MagentoError>;

#[derive(Debug, Error)]
pub enum MagentoError {
    /// A call was attempted before a session token was obtained.
    #[error("not connected: no session token, call connect() first")]
    NotConnected,

    /// The remote rejected `login` with a fault (`code` is set), or
    /// returned an unusable token (`code` is `None`).
    #[error("authentication failed: {message}")]
    Authentication { code: Option<i64>, message: String },

    /// XML-RPC fault returned by the remote procedure.
    #[error("remote fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("endpoint answered with HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body was not a usable `methodResponse` document.
    #[error("malformed XML-RPC response: {0}")]
    Protocol(String),

    #[error("cannot read image file {}: {source}", .path.display())]
    FileAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl MagentoError {
    pub(crate) fn protocol(message: impl Into<String>) -> Self {
        MagentoError::Protocol(message.into())
    }

    /// Returns the remote fault code when this error came from the server.
    pub fn fault_code(&self) -> Option<i64> {
        match self {
            MagentoError::Fault { code, .. } => Some(*code),
            MagentoError::Authentication { code, .. } => *code,
            _ => None,
        }
    }
}
