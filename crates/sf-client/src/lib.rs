//! # sfdesk-client
//!
//! HTTP plumbing shared by the sfdesk crates.
//!
//! - One request per call: nothing is retried, a failure surfaces as an [`Error`]
//! - Salesforce error bodies are parsed into [`ErrorKind::SalesforceApi`]
//! - Error messages are sanitized before they reach a log or a terminal
//! - Escaping helpers for SOQL, SOSL, URLs and XML live in [`security`]
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │          sfdesk-rest / sfdesk-auth / sfdesk (CLI)           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SalesforceClient                          │
//! │  - instance URL + access token + API version                │
//! │  - typed JSON methods (rest_get, rest_post, query_all, ...) │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - reqwest with timeouts, compression, tracing              │
//! │  - Salesforce error mapping                                 │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfdesk_client::SalesforceClient;
//!
//! let client = SalesforceClient::new("https://na1.salesforce.com", token)?;
//! let accounts: Vec<serde_json::Value> = client
//!     .query_all("SELECT Id, Name FROM Account LIMIT 10")
//!     .await?;
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod salesforce_client;
pub mod security;

pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{RequestBuilder, RequestMethod};
pub use response::{sanitize_error_message, Response};
pub use salesforce_client::{QueryResult, SalesforceClient};

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "62.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("sfdesk/", env!("CARGO_PKG_VERSION"));
