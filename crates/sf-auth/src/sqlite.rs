//! SQLite-backed credential store.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, instrument};

use crate::credentials::{LoginDomain, ProfileUpdate, StoredOrg, UserCredentials};
use crate::crypto::SecretCipher;
use crate::error::{Error, ErrorKind, Result};
use crate::store::{username_key, CredentialStore, StoredUser};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    pin_hash TEXT NOT NULL,
    security_token TEXT NOT NULL DEFAULT '',
    client_id TEXT NOT NULL DEFAULT '',
    client_secret TEXT NOT NULL DEFAULT '',
    domain TEXT NOT NULL,
    name TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL
)";

const SELECT_USER: &str = "SELECT username, password_hash, pin_hash, security_token, client_id,
        client_secret, domain, name, email, created_at
     FROM users";

/// Credential store in a SQLite database, table `users`.
pub struct SqliteCredentialStore {
    conn: Mutex<Connection>,
    path: Option<PathBuf>,
    cipher: SecretCipher,
}

impl std::fmt::Debug for SqliteCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteCredentialStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl SqliteCredentialStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: impl AsRef<Path>, cipher: SecretCipher) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::init(conn, Some(path.to_path_buf()), cipher)
    }

    /// An in-memory database, gone when the store is dropped.
    pub fn open_in_memory(cipher: SecretCipher) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, None, cipher)
    }

    fn init(conn: Connection, path: Option<PathBuf>, cipher: SecretCipher) -> Result<Self> {
        conn.execute(SCHEMA, [])?;
        Ok(Self {
            conn: Mutex::new(conn),
            path,
            cipher,
        })
    }

    /// The database file, if not in memory.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::new(ErrorKind::Database("connection lock poisoned".to_string())))
    }

    fn find(&self, conn: &Connection, username: &str) -> Result<Option<StoredUser>> {
        let sql = format!("{SELECT_USER} WHERE username = ?1");
        Ok(conn
            .query_row(&sql, rusqlite::params![username_key(username)], row_to_user)
            .optional()?)
    }

    fn write(&self, conn: &Connection, user: &StoredUser) -> Result<()> {
        conn.execute(
            "UPDATE users SET pin_hash = ?2, security_token = ?3, client_id = ?4,
                 client_secret = ?5, domain = ?6, name = ?7, email = ?8
             WHERE username = ?1",
            rusqlite::params![
                user.username,
                user.pin_hash,
                user.security_token,
                user.client_id,
                user.client_secret,
                user.domain.as_str(),
                user.name,
                user.email,
            ],
        )?;
        Ok(())
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredUser> {
    let domain: String = row.get("domain")?;
    let domain = domain.parse::<LoginDomain>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(StoredUser {
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        pin_hash: row.get("pin_hash")?,
        security_token: row.get("security_token")?,
        client_id: row.get("client_id")?,
        client_secret: row.get("client_secret")?,
        domain,
        name: row.get("name")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
    })
}

impl CredentialStore for SqliteCredentialStore {
    #[instrument(skip_all, fields(username = %creds.username))]
    fn register(&self, creds: &UserCredentials) -> Result<bool> {
        creds.validate()?;
        let user = StoredUser::seal(creds, &self.cipher)?;

        let conn = self.conn()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users (username, password_hash, pin_hash, security_token,
                 client_id, client_secret, domain, name, email, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                user.username,
                user.password_hash,
                user.pin_hash,
                user.security_token,
                user.client_id,
                user.client_secret,
                user.domain.as_str(),
                user.name,
                user.email,
                user.created_at,
            ],
        )?;

        if inserted == 0 {
            debug!("Username already registered");
        }
        Ok(inserted == 1)
    }

    #[instrument(skip(self, password, pin))]
    fn verify(&self, username: &str, password: &str, pin: &str) -> Result<bool> {
        let conn = self.conn()?;
        Ok(self
            .find(&conn, username)?
            .is_some_and(|u| u.verify(password, pin)))
    }

    fn get(&self, username: &str) -> Result<Option<UserCredentials>> {
        let conn = self.conn()?;
        self.find(&conn, username)?
            .map(|u| u.open(&self.cipher))
            .transpose()
    }

    fn list_by_email(&self, email: &str) -> Result<Vec<StoredOrg>> {
        let conn = self.conn()?;
        let sql = format!("{SELECT_USER} WHERE lower(email) = lower(?1) ORDER BY username");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params![email.trim()], row_to_user)?;

        let mut orgs = Vec::new();
        for row in rows {
            orgs.push(row?.org());
        }
        Ok(orgs)
    }

    #[instrument(skip(self, update))]
    fn update_profile(&self, username: &str, update: &ProfileUpdate) -> Result<bool> {
        update.validate()?;

        let conn = self.conn()?;
        let Some(mut user) = self.find(&conn, username)? else {
            return Ok(false);
        };
        user.apply(update, &self.cipher)?;
        self.write(&conn, &user)?;
        Ok(true)
    }

    #[instrument(skip(self))]
    fn delete(&self, username: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM users WHERE username = ?1",
            rusqlite::params![username_key(username)],
        )?;
        Ok(deleted > 0)
    }
}
