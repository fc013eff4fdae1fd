// Library root
// -----------
// Blocking client for Magento's XML-RPC API. The binary (`main.rs`) uses
// these modules to drive the catalog from an interactive menu.
//
// Module responsibilities:
// - `xmlrpc`: encodes `methodCall` documents and decodes `methodResponse`.
// - `connection`: login and the authenticated `call` every operation uses.
// - `magento`: product, image and category operations.
// - `config`: endpoint/credential settings, optionally from the environment.
// - `ui`: terminal menu flows that delegate to `magento`.
pub mod config;
pub mod connection;
pub mod error;
pub mod magento;
pub mod ui;
pub mod xmlrpc;

pub use config::MagentoConfig;
pub use connection::MagentoConnection;
pub use error::{MagentoError, Result};
pub use magento::{ImageOptions, Magento};
