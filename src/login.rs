//! Local account checks in front of the Salesforce login.

use sfdesk_auth::{
    CredentialStore, ErrorKind as AuthErrorKind, SalesforceSession, SessionContext,
    SessionFactory,
};
use sfdesk_client::ClientConfig;
use sfdesk_rest::SalesforceRestClient;
use tracing::{info, instrument, warn};

use crate::error::{Error, ErrorKind, Result};

/// Message for any mismatch; it never says which part was wrong.
pub const INVALID_LOGIN: &str = "invalid username, password or PIN";

/// Verify the local account, open a Salesforce session and make it current.
#[instrument(skip(store, factory, context, password, pin))]
pub async fn login(
    store: &dyn CredentialStore,
    factory: &SessionFactory,
    context: &mut SessionContext,
    username: &str,
    password: &str,
    pin: &str,
) -> Result<SalesforceSession> {
    let creds = if store.verify(username, password, pin)? {
        store.get(username)?
    } else {
        None
    };
    let Some(mut creds) = creds else {
        warn!("Local credential check failed");
        return Err(Error::new(ErrorKind::Auth(AuthErrorKind::AuthFailed(
            INVALID_LOGIN.to_string(),
        ))));
    };
    creds.password = password.to_string();

    let session = factory.authenticate(&creds).await?;
    context.create(session.clone())?;
    info!(method = %session.login_method, "Logged in");
    Ok(session)
}

/// REST client for the current session. Counts as activity.
pub fn connect(
    context: &mut SessionContext,
    config: &ClientConfig,
) -> Result<SalesforceRestClient> {
    let client = context.current()?.client(config.clone())?;
    context.touch()?;
    Ok(SalesforceRestClient::from_client(client))
}
