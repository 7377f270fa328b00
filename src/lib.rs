//! # sfdesk
//!
//! Salesforce administration toolkit.
//!
//! ## Crates
//!
//! - **sfdesk-client** - HTTP plumbing, error mapping, escaping helpers
//! - **sfdesk-auth** - Local credential store, SOAP/OAuth login, session context
//! - **sfdesk-rest** - REST facade, `SalesforceApi` trait, SOQL/SOSL builders
//! - **sfdesk-report** - Tables, charts and CSV/Excel/PDF/PPTX export
//!
//! This crate adds the fixed-query admin viewers, record actions, the record
//! hierarchy walk, configuration and the `sfdesk` command line.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sfdesk::{admin, login, AppConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfdesk::Error> {
//!     let config = AppConfig::from_env()?;
//!     let store = config.open_store()?;
//!     let mut context = config.session_context()?;
//!
//!     let factory = config.session_factory()?;
//!     login::login(&*store, &factory, &mut context, "ada@example.com", "pw", "123456").await?;
//!     let client = login::connect(&mut context, &config.client)?;
//!
//!     let jobs = admin::scheduled_jobs(&client).await?;
//!     println!("{}", sfdesk_report::render_text(&jobs));
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod admin;
pub mod cli;
mod config;
mod error;
pub mod hierarchy;
pub mod login;
mod outcome;
pub mod export;

pub use config::{AppConfig, StoreBackend, API_VERSION_VAR, HOME_VAR, LOGIN_URL_VAR, STORE_VAR};
pub use error::{Error, ErrorKind, Result};
pub use outcome::ActionOutcome;

// Re-export the member crates for convenient access
pub use sfdesk_auth as auth;
pub use sfdesk_client as client;
pub use sfdesk_report as report;
pub use sfdesk_rest as rest;
