//! Where sfdesk keeps its files and how it reaches Salesforce.
//!
//! Values come from the environment and may be overridden by CLI flags:
//!
//! | Variable             | Meaning                         | Default                     |
//! |----------------------|---------------------------------|-----------------------------|
//! | `SFDESK_HOME`        | data directory                  | `<data dir>/sfdesk`         |
//! | `SFDESK_STORE`       | `sqlite` or `file`              | `sqlite`                    |
//! | `SFDESK_API_VERSION` | REST API version                | `62.0`                      |
//! | `SFDESK_LOGIN_URL`   | login host override (My Domain) | derived from the user's domain |

use std::path::PathBuf;
use std::str::FromStr;

use tracing::debug;

use sfdesk_auth::{
    CredentialStore, FileCredentialStore, SecretCipher, SessionContext, SessionFactory,
    SqliteCredentialStore,
};
use sfdesk_client::{ClientConfig, DEFAULT_API_VERSION};

use crate::error::{Error, ErrorKind, Result};

pub const HOME_VAR: &str = "SFDESK_HOME";
pub const STORE_VAR: &str = "SFDESK_STORE";
pub const API_VERSION_VAR: &str = "SFDESK_API_VERSION";
pub const LOGIN_URL_VAR: &str = "SFDESK_LOGIN_URL";

const KEY_FILE: &str = "secret.key";
const SESSION_FILE: &str = "session.json";
const SQLITE_FILE: &str = "users.db";
const JSON_FILE: &str = "users.json";

/// Credential store backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Sqlite,
    File,
}

impl FromStr for StoreBackend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(StoreBackend::Sqlite),
            "file" | "json" => Ok(StoreBackend::File),
            other => Err(Error::new(ErrorKind::Config(format!(
                "unknown store backend '{other}' (expected sqlite or file)"
            )))),
        }
    }
}

/// Resolved application settings.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub home: PathBuf,
    pub store: StoreBackend,
    pub api_version: String,
    pub login_url: Option<String>,
    pub client: ClientConfig,
}

impl AppConfig {
    /// Settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Settings from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let home = match non_empty(HOME_VAR) {
            Some(home) => PathBuf::from(home),
            None => default_home()?,
        };
        let store = non_empty(STORE_VAR)
            .map(|v| v.parse())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            home,
            store,
            api_version: non_empty(API_VERSION_VAR)
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            login_url: non_empty(LOGIN_URL_VAR),
            client: ClientConfig::default(),
        })
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    pub fn with_store(mut self, store: StoreBackend) -> Self {
        self.store = store;
        self
    }

    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = Some(url.into());
        self
    }

    pub fn key_path(&self) -> PathBuf {
        self.home.join(KEY_FILE)
    }

    pub fn session_path(&self) -> PathBuf {
        self.home.join(SESSION_FILE)
    }

    pub fn store_path(&self) -> PathBuf {
        match self.store {
            StoreBackend::Sqlite => self.home.join(SQLITE_FILE),
            StoreBackend::File => self.home.join(JSON_FILE),
        }
    }

    /// Create the data directory and the encryption key. Returns false when
    /// the key already existed.
    pub fn init(&self) -> Result<bool> {
        std::fs::create_dir_all(&self.home)?;
        let key = self.key_path();
        if key.exists() {
            return Ok(false);
        }
        SecretCipher::create_key_file(&key)?;
        debug!(home = %self.home.display(), "Initialized data directory");
        Ok(true)
    }

    /// Load the encryption key. A missing key is a configuration error.
    pub fn cipher(&self) -> Result<SecretCipher> {
        Ok(SecretCipher::load_key_file(&self.key_path())?)
    }

    /// Open the configured credential store.
    pub fn open_store(&self) -> Result<Box<dyn CredentialStore>> {
        let cipher = self.cipher()?;
        let path = self.store_path();
        debug!(path = %path.display(), backend = ?self.store, "Opening credential store");
        Ok(match self.store {
            StoreBackend::Sqlite => Box::new(SqliteCredentialStore::open(&path, cipher)?),
            StoreBackend::File => Box::new(FileCredentialStore::new(&path, cipher)),
        })
    }

    /// Session context persisted in the data directory.
    pub fn session_context(&self) -> Result<SessionContext> {
        Ok(SessionContext::load(self.session_path())?)
    }

    /// Session factory honouring the API version and login URL override.
    pub fn session_factory(&self) -> Result<SessionFactory> {
        let factory =
            SessionFactory::new(self.client.clone())?.with_api_version(&self.api_version);
        Ok(match &self.login_url {
            Some(url) => factory.with_login_url(url),
            None => factory,
        })
    }
}

fn default_home() -> Result<PathBuf> {
    dirs::data_dir()
        .map(|dir| dir.join("sfdesk"))
        .ok_or_else(|| {
            Error::new(ErrorKind::Config(format!(
                "cannot determine a data directory, set {HOME_VAR}"
            )))
        })
}
