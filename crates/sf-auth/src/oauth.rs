//! OAuth 2.0 username-password grant.
//!
//! Used as the fallback when the SOAP login is rejected. It needs a connected
//! app client id and secret in addition to the user's password and token.

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use sfdesk_client::SfHttpClient;

use crate::credentials::UserCredentials;
use crate::error::{Error, ErrorKind, Result};

/// Token response from the OAuth token endpoint.
///
/// `access_token` and `signature` are redacted in Debug output.
#[derive(Clone, Deserialize, Serialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Instance URL.
    pub instance_url: String,
    /// User identity URL.
    #[serde(default)]
    pub id: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Signature for verification.
    #[serde(default)]
    pub signature: Option<String>,
    /// Issued at timestamp, milliseconds since the epoch as a string.
    #[serde(default)]
    pub issued_at: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("signature", &self.signature.as_ref().map(|_| "[REDACTED]"))
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// OAuth error response.
#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Request an access token with `grant_type=password`.
///
/// The password sent is the user's password followed by the security token.
#[instrument(skip(http, creds), fields(username = %creds.username, login_url = %login_url))]
pub async fn password_grant(
    http: &SfHttpClient,
    login_url: &str,
    creds: &UserCredentials,
) -> Result<TokenResponse> {
    if creds.client_id.is_empty() || creds.client_secret.is_empty() {
        return Err(Error::new(ErrorKind::Config(
            "client id and client secret are required for the OAuth login".to_string(),
        )));
    }

    let password = format!("{}{}", creds.password, creds.security_token);
    let params = [
        ("grant_type", "password"),
        ("client_id", creds.client_id.as_str()),
        ("client_secret", creds.client_secret.as_str()),
        ("username", creds.username.as_str()),
        ("password", password.as_str()),
    ];
    let body = serde_urlencoded::to_string(params)?;

    let url = format!("{}/services/oauth2/token", login_url.trim_end_matches('/'));
    let response = http.execute_raw(http.post(url).form(body)).await?;

    if !response.is_success() {
        let status = response.status();
        let text = response.text().await?;
        return Err(match serde_json::from_str::<OAuthErrorResponse>(&text) {
            Ok(error) => Error::new(ErrorKind::OAuth {
                error: error.error,
                description: sfdesk_client::sanitize_error_message(&error.error_description),
            }),
            Err(_) => Error::new(ErrorKind::Http(format!(
                "token endpoint returned {status}: {}",
                sfdesk_client::sanitize_error_message(&text)
            ))),
        });
    }

    let token: TokenResponse = response.json().await?;
    debug!(instance_url = %token.instance_url, "OAuth password grant succeeded");
    Ok(token)
}
