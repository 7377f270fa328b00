//! The locally registered user and the Salesforce credentials behind it.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};

/// Which Salesforce login host an org authenticates against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoginDomain {
    /// `login.salesforce.com`
    #[default]
    #[serde(rename = "login")]
    Production,
    /// `test.salesforce.com`
    #[serde(rename = "test")]
    Sandbox,
}

impl LoginDomain {
    /// The subdomain as stored and shown: `login` or `test`.
    pub fn as_str(&self) -> &'static str {
        match self {
            LoginDomain::Production => "login",
            LoginDomain::Sandbox => "test",
        }
    }

    /// Base login URL for this domain.
    pub fn login_url(&self) -> &'static str {
        match self {
            LoginDomain::Production => crate::PRODUCTION_LOGIN_URL,
            LoginDomain::Sandbox => crate::SANDBOX_LOGIN_URL,
        }
    }
}

impl std::fmt::Display for LoginDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoginDomain {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "login" | "production" => Ok(LoginDomain::Production),
            "test" | "sandbox" => Ok(LoginDomain::Sandbox),
            "" => Err(Error::new(ErrorKind::Validation(
                "domain is required".to_string(),
            ))),
            other => Err(Error::new(ErrorKind::Validation(format!(
                "unknown domain '{other}', expected 'login' or 'test'"
            )))),
        }
    }
}

/// A local user and the Salesforce credentials used to open a session.
///
/// `password`, `security_token`, `client_secret` and `pin` are redacted in
/// Debug output.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct UserCredentials {
    pub username: String,
    pub password: String,
    pub security_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub domain: LoginDomain,
    pub pin: String,
    pub name: String,
    pub email: String,
}

impl std::fmt::Debug for UserCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("security_token", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("pin", &"[REDACTED]")
            .field("name", &self.name)
            .field("email", &self.email)
            .finish()
    }
}

impl UserCredentials {
    /// Create credentials with the fields needed to register.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        pin: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            pin: pin.into(),
            ..Default::default()
        }
    }

    /// Set the security token appended to the password at login.
    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = token.into();
        self
    }

    /// Set the connected app client id and secret used by the OAuth fallback.
    pub fn with_connected_app(
        mut self,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        self.client_id = client_id.into();
        self.client_secret = client_secret.into();
        self
    }

    /// Set the login domain.
    pub fn with_domain(mut self, domain: LoginDomain) -> Self {
        self.domain = domain;
        self
    }

    /// Set the display name and email.
    pub fn with_profile(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.name = name.into();
        self.email = email.into();
        self
    }

    /// Check the fields required for registration.
    pub fn validate(&self) -> Result<()> {
        if self.username.trim().is_empty() {
            return Err(Error::new(ErrorKind::Validation(
                "username is required".to_string(),
            )));
        }
        if self.password.is_empty() {
            return Err(Error::new(ErrorKind::Validation(
                "password is required".to_string(),
            )));
        }
        validate_pin(&self.pin)
    }
}

/// A PIN is exactly six ASCII digits.
pub fn validate_pin(pin: &str) -> Result<()> {
    if pin.len() == 6 && pin.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(Error::new(ErrorKind::Validation(
            "PIN must be exactly 6 digits".to_string(),
        )))
    }
}

/// Fields a user may change after registration. `None` leaves a field as is.
#[derive(Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub security_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub domain: Option<LoginDomain>,
    pub pin: Option<String>,
}

impl std::fmt::Debug for ProfileUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("ProfileUpdate")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("security_token", &redact(&self.security_token))
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("domain", &self.domain)
            .field("pin", &redact(&self.pin))
            .finish()
    }
}

impl ProfileUpdate {
    /// Validate the fields that carry format rules.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref pin) = self.pin {
            validate_pin(pin)?;
        }
        Ok(())
    }

    /// Returns true if nothing would change.
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.security_token.is_none()
            && self.client_id.is_none()
            && self.client_secret.is_none()
            && self.domain.is_none()
            && self.pin.is_none()
    }
}

/// One registered org as shown in the "my orgs" listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredOrg {
    pub username: String,
    pub name: String,
    pub email: String,
    pub domain: LoginDomain,
}
