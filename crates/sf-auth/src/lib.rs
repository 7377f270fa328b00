//! # sfdesk-auth
//!
//! Local user accounts and Salesforce login for sfdesk.
//!
//! ## Security
//!
//! - Passwords and PINs are stored as argon2id hashes, never in plaintext
//! - Security tokens and client secrets are encrypted at rest with ChaCha20-Poly1305
//! - Sensitive data (tokens, secrets, PINs) is redacted in Debug output
//! - Tracing skips credential parameters
//!
//! ## Login
//!
//! [`SessionFactory::authenticate`] tries the partner SOAP `login` first and
//! falls back to the OAuth 2.0 username-password grant. The resulting
//! [`SalesforceSession`] is held by a [`SessionContext`], which expires it
//! after 30 minutes without activity.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfdesk_auth::{CredentialStore, SecretCipher, SessionFactory, SqliteCredentialStore};
//!
//! let cipher = SecretCipher::load_key_file(&key_path)?;
//! let store = SqliteCredentialStore::open(&db_path, cipher)?;
//!
//! if store.verify(username, password, pin)? {
//!     let mut creds = store.get(username)?.expect("verified user exists");
//!     creds.password = password.to_string();
//!     let session = SessionFactory::new(Default::default())?.authenticate(&creds).await?;
//! }
//! ```

mod context;
mod credentials;
mod crypto;
mod error;
mod oauth;
mod session;
mod soap;
mod sqlite;
mod store;

pub use context::{SessionContext, IDLE_TIMEOUT_MINUTES};
pub use credentials::{validate_pin, LoginDomain, ProfileUpdate, StoredOrg, UserCredentials};
pub use crypto::{hash_secret, verify_secret, SecretCipher};
pub use error::{Error, ErrorKind, Result};
pub use oauth::{password_grant, TokenResponse};
pub use session::{LoginMethod, SalesforceSession, SessionFactory};
pub use soap::{soap_login, SoapLoginResult};
pub use sqlite::SqliteCredentialStore;
pub use store::{CredentialStore, FileCredentialStore};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
