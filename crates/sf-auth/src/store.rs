//! Local credential store.
//!
//! Two backends share one record shape: [`SqliteCredentialStore`](crate::SqliteCredentialStore)
//! and [`FileCredentialStore`], a single JSON document. Both hash the password
//! and PIN and encrypt the security token and client secret with a
//! [`SecretCipher`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::credentials::{LoginDomain, ProfileUpdate, StoredOrg, UserCredentials};
use crate::crypto::{hash_secret, verify_secret, SecretCipher};
use crate::error::Result;

/// Storage for locally registered users.
pub trait CredentialStore: Send + Sync {
    /// Register a new user.
    ///
    /// Input is validated before anything is written. Returns `Ok(false)` if
    /// the username is already taken.
    fn register(&self, creds: &UserCredentials) -> Result<bool>;

    /// Returns true iff the user exists and both the password and the PIN match.
    fn verify(&self, username: &str, password: &str, pin: &str) -> Result<bool>;

    /// Look up a user. The password cannot be recovered and comes back empty.
    fn get(&self, username: &str) -> Result<Option<UserCredentials>>;

    /// All orgs registered under an email address.
    fn list_by_email(&self, email: &str) -> Result<Vec<StoredOrg>>;

    /// Apply a profile edit. Returns `Ok(false)` for an unknown username.
    fn update_profile(&self, username: &str, update: &ProfileUpdate) -> Result<bool>;

    /// Remove a user. Returns `Ok(false)` for an unknown username.
    fn delete(&self, username: &str) -> Result<bool>;
}

/// The form a username is stored and looked up in. Every store operation
/// goes through this, so `" ada@acme.com "` and `"ada@acme.com"` name the
/// same user.
pub(crate) fn username_key(username: &str) -> &str {
    username.trim()
}

/// A user as persisted: hashes and ciphertexts, never plaintext secrets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredUser {
    pub username: String,
    pub password_hash: String,
    pub pin_hash: String,
    pub security_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub domain: LoginDomain,
    pub name: String,
    pub email: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl StoredUser {
    /// Hash and encrypt a validated registration.
    pub fn seal(creds: &UserCredentials, cipher: &SecretCipher) -> Result<Self> {
        Ok(Self {
            username: username_key(&creds.username).to_string(),
            password_hash: hash_secret(&creds.password)?,
            pin_hash: hash_secret(&creds.pin)?,
            security_token: cipher.encrypt(&creds.security_token)?,
            client_id: creds.client_id.clone(),
            client_secret: cipher.encrypt(&creds.client_secret)?,
            domain: creds.domain,
            name: creds.name.clone(),
            email: creds.email.clone(),
            created_at: chrono::Utc::now(),
        })
    }

    /// Decrypt into credentials. The password is left empty.
    pub fn open(&self, cipher: &SecretCipher) -> Result<UserCredentials> {
        Ok(UserCredentials {
            username: self.username.clone(),
            password: String::new(),
            security_token: cipher.decrypt(&self.security_token)?,
            client_id: self.client_id.clone(),
            client_secret: cipher.decrypt(&self.client_secret)?,
            domain: self.domain,
            pin: String::new(),
            name: self.name.clone(),
            email: self.email.clone(),
        })
    }

    /// Both hashes must match.
    pub fn verify(&self, password: &str, pin: &str) -> bool {
        // Evaluate both so the time taken does not reveal which one failed.
        let password_ok = verify_secret(password, &self.password_hash);
        let pin_ok = verify_secret(pin, &self.pin_hash);
        password_ok && pin_ok
    }

    pub fn apply(&mut self, update: &ProfileUpdate, cipher: &SecretCipher) -> Result<()> {
        if let Some(ref name) = update.name {
            self.name = name.clone();
        }
        if let Some(ref email) = update.email {
            self.email = email.clone();
        }
        if let Some(ref token) = update.security_token {
            self.security_token = cipher.encrypt(token)?;
        }
        if let Some(ref client_id) = update.client_id {
            self.client_id = client_id.clone();
        }
        if let Some(ref secret) = update.client_secret {
            self.client_secret = cipher.encrypt(secret)?;
        }
        if let Some(domain) = update.domain {
            self.domain = domain;
        }
        if let Some(ref pin) = update.pin {
            self.pin_hash = hash_secret(pin)?;
        }
        Ok(())
    }

    pub fn org(&self) -> StoredOrg {
        StoredOrg {
            username: self.username.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            domain: self.domain,
        }
    }
}

/// On-disk layout of the JSON store.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    users: Vec<StoredUser>,
}

/// Credential store backed by one JSON file.
///
/// The whole document is read and rewritten on every change; the last writer wins.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
    cipher: SecretCipher,
}

impl FileCredentialStore {
    /// Create a store at `path`. The file is created on first write.
    pub fn new(path: impl AsRef<Path>, cipher: SecretCipher) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cipher,
        }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoreDocument> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let json = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&json)?)
    }

    fn save(&self, doc: &StoreDocument) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(doc)?;
        std::fs::write(&self.path, json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }
}

impl CredentialStore for FileCredentialStore {
    #[instrument(skip_all, fields(username = %creds.username))]
    fn register(&self, creds: &UserCredentials) -> Result<bool> {
        creds.validate()?;

        let mut doc = self.load()?;
        let username = username_key(&creds.username);
        if doc.users.iter().any(|u| u.username == username) {
            debug!("Username already registered");
            return Ok(false);
        }

        doc.users.push(StoredUser::seal(creds, &self.cipher)?);
        self.save(&doc)?;
        Ok(true)
    }

    #[instrument(skip(self, password, pin))]
    fn verify(&self, username: &str, password: &str, pin: &str) -> Result<bool> {
        let username = username_key(username);
        let doc = self.load()?;
        Ok(doc
            .users
            .iter()
            .find(|u| u.username == username)
            .is_some_and(|u| u.verify(password, pin)))
    }

    fn get(&self, username: &str) -> Result<Option<UserCredentials>> {
        let username = username_key(username);
        let doc = self.load()?;
        doc.users
            .iter()
            .find(|u| u.username == username)
            .map(|u| u.open(&self.cipher))
            .transpose()
    }

    fn list_by_email(&self, email: &str) -> Result<Vec<StoredOrg>> {
        let doc = self.load()?;
        Ok(doc
            .users
            .iter()
            .filter(|u| u.email.eq_ignore_ascii_case(email.trim()))
            .map(StoredUser::org)
            .collect())
    }

    #[instrument(skip(self, update))]
    fn update_profile(&self, username: &str, update: &ProfileUpdate) -> Result<bool> {
        update.validate()?;

        let username = username_key(username);
        let mut doc = self.load()?;
        let Some(user) = doc.users.iter_mut().find(|u| u.username == username) else {
            return Ok(false);
        };
        user.apply(update, &self.cipher)?;
        self.save(&doc)?;
        Ok(true)
    }

    #[instrument(skip(self))]
    fn delete(&self, username: &str) -> Result<bool> {
        let username = username_key(username);
        let mut doc = self.load()?;
        let before = doc.users.len();
        doc.users.retain(|u| u.username != username);
        if doc.users.len() == before {
            return Ok(false);
        }
        self.save(&doc)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KEY_SIZE;
    use tempfile::TempDir;

    fn store(dir: &TempDir) -> FileCredentialStore {
        let cipher = SecretCipher::from_key(&[9u8; KEY_SIZE]).unwrap();
        FileCredentialStore::new(dir.path().join("users.json"), cipher)
    }

    fn alice() -> UserCredentials {
        UserCredentials::new("alice@acme.com", "Passw0rd!", "123456")
            .with_security_token("TOKEN123")
            .with_connected_app("3MVG9abc", "client-secret")
            .with_profile("Alice", "alice@acme.com")
    }

    #[test]
    fn test_register_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        assert!(store.register(&alice()).unwrap());

        let loaded = store.get("alice@acme.com").unwrap().unwrap();
        assert_eq!(loaded.security_token, "TOKEN123");
        assert_eq!(loaded.client_secret, "client-secret");
        assert_eq!(loaded.client_id, "3MVG9abc");
        assert_eq!(loaded.name, "Alice");
        assert!(loaded.password.is_empty());
        assert!(loaded.pin.is_empty());
    }

    #[test]
    fn test_secrets_not_stored_in_plaintext() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.register(&alice()).unwrap();

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(!raw.contains("Passw0rd!"));
        assert!(!raw.contains("TOKEN123"));
        assert!(!raw.contains("client-secret"));
        assert!(!raw.contains("\"123456\""));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o600);
        }
    }

    #[test]
    fn test_register_twice_fails() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        assert!(store.register(&alice()).unwrap());
        assert!(!store.register(&alice()).unwrap());
    }

    #[test]
    fn test_invalid_pin_not_persisted() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);

        let mut creds = alice();
        creds.pin = "12345".to_string();
        let err = store.register(&creds).unwrap_err();
        assert!(err.is_validation());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_verify() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.register(&alice()).unwrap();

        assert!(store.verify("alice@acme.com", "Passw0rd!", "123456").unwrap());
        assert!(!store.verify("alice@acme.com", "wrong", "123456").unwrap());
        assert!(!store.verify("alice@acme.com", "Passw0rd!", "654321").unwrap());
        assert!(!store.verify("nobody@acme.com", "Passw0rd!", "123456").unwrap());
    }

    #[test]
    fn test_username_whitespace_names_same_user() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        let mut creds = alice();
        creds.username = "  alice@acme.com ".to_string();
        assert!(store.register(&creds).unwrap());
        assert!(!store.register(&alice()).unwrap());

        assert!(store.verify(" alice@acme.com ", "Passw0rd!", "123456").unwrap());
        assert!(store.verify("alice@acme.com", "Passw0rd!", "123456").unwrap());
        let loaded = store.get("alice@acme.com\t").unwrap().unwrap();
        assert_eq!(loaded.username, "alice@acme.com");

        let update = ProfileUpdate {
            name: Some("Alice Admin".to_string()),
            ..Default::default()
        };
        assert!(store.update_profile(" alice@acme.com", &update).unwrap());
        assert!(store.delete("alice@acme.com ").unwrap());
        assert!(store.get("alice@acme.com").unwrap().is_none());
    }

    #[test]
    fn test_get_unknown_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        assert!(store.get("ghost@acme.com").unwrap().is_none());
    }

    #[test]
    fn test_list_by_email() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.register(&alice()).unwrap();

        let sandbox = UserCredentials::new("alice@acme.com.dev", "pw", "111111")
            .with_domain(LoginDomain::Sandbox)
            .with_profile("Alice (dev)", "Alice@Acme.com");
        store.register(&sandbox).unwrap();

        let other = UserCredentials::new("bob@acme.com", "pw", "222222")
            .with_profile("Bob", "bob@acme.com");
        store.register(&other).unwrap();

        let orgs = store.list_by_email("alice@acme.com").unwrap();
        assert_eq!(orgs.len(), 2);
        assert!(orgs.iter().any(|o| o.domain == LoginDomain::Sandbox));
    }

    #[test]
    fn test_update_profile() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.register(&alice()).unwrap();

        let update = ProfileUpdate {
            name: Some("Alice Admin".to_string()),
            security_token: Some("NEWTOKEN".to_string()),
            pin: Some("999999".to_string()),
            ..Default::default()
        };
        assert!(store.update_profile("alice@acme.com", &update).unwrap());

        let loaded = store.get("alice@acme.com").unwrap().unwrap();
        assert_eq!(loaded.name, "Alice Admin");
        assert_eq!(loaded.security_token, "NEWTOKEN");
        assert!(store.verify("alice@acme.com", "Passw0rd!", "999999").unwrap());
        assert!(!store.verify("alice@acme.com", "Passw0rd!", "123456").unwrap());

        assert!(!store.update_profile("ghost@acme.com", &update).unwrap());

        let bad = ProfileUpdate {
            pin: Some("abc".to_string()),
            ..Default::default()
        };
        assert!(store.update_profile("alice@acme.com", &bad).unwrap_err().is_validation());
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir);
        store.register(&alice()).unwrap();

        assert!(store.delete("alice@acme.com").unwrap());
        assert!(!store.delete("alice@acme.com").unwrap());
        assert!(store.get("alice@acme.com").unwrap().is_none());
    }
}
