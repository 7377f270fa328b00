//! Partner SOAP `login` call.
//!
//! Takes only a username, a password and a security token, so it works for
//! users without a connected app.

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::{debug, instrument};

use sfdesk_client::security::xml;
use sfdesk_client::SfHttpClient;

use crate::credentials::UserCredentials;
use crate::error::{Error, ErrorKind, Result};

/// Parsed `loginResponse`.
#[derive(Clone, Default)]
pub struct SoapLoginResult {
    pub session_id: String,
    pub server_url: String,
    pub user_id: Option<String>,
    pub organization_id: Option<String>,
    pub user_full_name: Option<String>,
}

impl std::fmt::Debug for SoapLoginResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SoapLoginResult")
            .field("session_id", &"[REDACTED]")
            .field("server_url", &self.server_url)
            .field("user_id", &self.user_id)
            .field("organization_id", &self.organization_id)
            .field("user_full_name", &self.user_full_name)
            .finish()
    }
}

impl SoapLoginResult {
    /// Scheme, host and port of the server URL: the REST instance URL.
    pub fn instance_url(&self) -> Result<String> {
        let parsed = url::Url::parse(&self.server_url).map_err(|e| {
            Error::with_source(
                ErrorKind::Other(format!("invalid serverUrl in login response: {e}")),
                e,
            )
        })?;
        Ok(parsed.origin().ascii_serialization())
    }
}

/// Log in through the partner SOAP endpoint at `{login_url}/services/Soap/u/{api_version}`.
#[instrument(skip(http, creds), fields(username = %creds.username, login_url = %login_url))]
pub async fn soap_login(
    http: &SfHttpClient,
    login_url: &str,
    api_version: &str,
    creds: &UserCredentials,
) -> Result<SoapLoginResult> {
    let url = format!(
        "{}/services/Soap/u/{}",
        login_url.trim_end_matches('/'),
        api_version
    );
    let envelope = login_envelope(creds);

    let request = http
        .post(url)
        .xml(envelope)
        .header("SOAPAction", "login");
    let response = http.execute_raw(request).await?;
    let status = response.status();
    let body = response.text().await?;

    let parsed = parse_login_response(&body)?;
    if parsed.session_id.is_empty() || parsed.server_url.is_empty() {
        return Err(Error::new(ErrorKind::Http(format!(
            "login returned {status} without a session"
        ))));
    }

    debug!(server_url = %parsed.server_url, "SOAP login succeeded");
    Ok(parsed)
}

fn login_envelope(creds: &UserCredentials) -> String {
    let password = format!("{}{}", creds.password, creds.security_token);
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:env="http://schemas.xmlsoap.org/soap/envelope/" xmlns:urn="urn:partner.soap.sforce.com">
  <env:Header>
    <urn:CallOptions>
      <urn:client>sfdesk</urn:client>
    </urn:CallOptions>
  </env:Header>
  <env:Body>
    <n1:login xmlns:n1="urn:partner.soap.sforce.com">
      <n1:username>{username}</n1:username>
      <n1:password>{password}</n1:password>
    </n1:login>
  </env:Body>
</env:Envelope>"#,
        username = xml::escape(&creds.username),
        password = xml::escape(&password),
    )
}

/// Pull the login result or the fault out of a SOAP response body.
pub(crate) fn parse_login_response(body: &str) -> Result<SoapLoginResult> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut result = SoapLoginResult::default();
    let mut fault_code: Option<String> = None;
    let mut fault_string: Option<String> = None;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                current = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Event::Text(t) => {
                let Some(ref tag) = current else { continue };
                let text = t.unescape()?.into_owned();
                match tag.as_str() {
                    "sessionId" => result.session_id = text,
                    "serverUrl" => result.server_url = text,
                    "userId" => result.user_id = Some(text),
                    "organizationId" => result.organization_id = Some(text),
                    "userFullName" => result.user_full_name = Some(text),
                    "faultcode" => fault_code = Some(text),
                    "faultstring" => fault_string = Some(text),
                    _ => {}
                }
            }
            Event::End(_) => current = None,
            Event::Eof => break,
            _ => {}
        }
    }

    if fault_code.is_some() || fault_string.is_some() {
        return Err(Error::new(ErrorKind::SoapFault {
            code: fault_code.unwrap_or_else(|| "UNKNOWN".to_string()),
            message: sfdesk_client::sanitize_error_message(
                &fault_string.unwrap_or_else(|| "Unknown error".to_string()),
            ),
        }));
    }

    Ok(result)
}
