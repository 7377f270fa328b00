//! Opening an authenticated Salesforce session from stored credentials.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use sfdesk_client::{ClientConfig, SalesforceClient, SfHttpClient, DEFAULT_API_VERSION};

use crate::credentials::UserCredentials;
use crate::error::{Error, ErrorKind, Result};
use crate::oauth::password_grant;
use crate::soap::soap_login;

/// How a session was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoginMethod {
    /// Partner SOAP `login`.
    Soap,
    /// OAuth 2.0 username-password grant.
    OAuthPassword,
}

impl std::fmt::Display for LoginMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoginMethod::Soap => f.write_str("SOAP login"),
            LoginMethod::OAuthPassword => f.write_str("OAuth password grant"),
        }
    }
}

/// An authenticated handle to one org.
///
/// The access token is redacted in Debug output.
#[derive(Clone, Serialize, Deserialize)]
pub struct SalesforceSession {
    pub instance_url: String,
    access_token: String,
    pub username: String,
    pub login_method: LoginMethod,
    pub api_version: String,
    pub established_at: chrono::DateTime<chrono::Utc>,
}

impl std::fmt::Debug for SalesforceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceSession")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("username", &self.username)
            .field("login_method", &self.login_method)
            .field("api_version", &self.api_version)
            .field("established_at", &self.established_at)
            .finish()
    }
}

impl SalesforceSession {
    /// Create a session handle from an instance URL and access token.
    pub fn new(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        username: impl Into<String>,
        login_method: LoginMethod,
    ) -> Self {
        Self {
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            username: username.into(),
            login_method,
            api_version: DEFAULT_API_VERSION.to_string(),
            established_at: chrono::Utc::now(),
        }
    }

    /// Set the API version used by clients built from this session.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// The access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Build a REST client bound to this session.
    pub fn client(&self, config: ClientConfig) -> Result<SalesforceClient> {
        let client =
            SalesforceClient::with_config(&self.instance_url, &self.access_token, config)?;
        Ok(client.with_api_version(&self.api_version))
    }
}

/// Logs users in against Salesforce.
///
/// The SOAP login runs first. If it fails for any reason the OAuth password
/// grant is tried. Nothing is retried beyond that single fallback.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    http: SfHttpClient,
    api_version: String,
    login_url: Option<String>,
}

impl SessionFactory {
    /// Create a factory with the given HTTP configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            http: SfHttpClient::new(config)?,
            api_version: DEFAULT_API_VERSION.to_string(),
            login_url: None,
        })
    }

    /// Set the API version for the SOAP endpoint and the resulting session.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Log in against this URL instead of the one implied by the user's domain
    /// (My Domain hosts, tests).
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// The login URL used for these credentials.
    pub fn login_url_for(&self, creds: &UserCredentials) -> String {
        self.login_url
            .clone()
            .unwrap_or_else(|| creds.domain.login_url().to_string())
    }

    /// Open a session for `creds`.
    #[instrument(skip(self, creds), fields(username = %creds.username, domain = %creds.domain))]
    pub async fn authenticate(&self, creds: &UserCredentials) -> Result<SalesforceSession> {
        let login_url = self.login_url_for(creds);

        let soap_err = match soap_login(&self.http, &login_url, &self.api_version, creds).await {
            Ok(result) => {
                let instance_url = result.instance_url()?;
                info!(%instance_url, "Logged in with SOAP");
                return Ok(SalesforceSession::new(
                    instance_url,
                    result.session_id,
                    &creds.username,
                    LoginMethod::Soap,
                )
                .with_api_version(&self.api_version));
            }
            Err(e) => e,
        };

        warn!(error = %soap_err, "SOAP login failed, trying OAuth password grant");

        match password_grant(&self.http, &login_url, creds).await {
            Ok(token) => {
                info!(instance_url = %token.instance_url, "Logged in with OAuth password grant");
                Ok(SalesforceSession::new(
                    token.instance_url,
                    token.access_token,
                    &creds.username,
                    LoginMethod::OAuthPassword,
                )
                .with_api_version(&self.api_version))
            }
            Err(oauth_err) => {
                let reason = match &oauth_err.kind {
                    ErrorKind::OAuth { description, .. } if !description.is_empty() => {
                        description.clone()
                    }
                    other => other.to_string(),
                };
                Err(Error::with_source(ErrorKind::AuthFailed(reason), oauth_err))
            }
        }
    }
}
