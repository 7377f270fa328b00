//! Local accounts and the login flow against a mock login host.

use serde_json::json;
use sfdesk::auth::{
    CredentialStore, ErrorKind as AuthErrorKind, LoginMethod, SessionContext, SessionFactory,
    UserCredentials,
};
use sfdesk::client::ClientConfig;
use sfdesk::{login, AppConfig, ErrorKind, StoreBackend, HOME_VAR};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SOAP_FAULT: &str = "<soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\
     <soapenv:Body><soapenv:Fault><faultcode>sf:INVALID_LOGIN</faultcode>\
     <faultstring>INVALID_LOGIN: Invalid username, password, security token; or user locked out.</faultstring>\
     </soapenv:Fault></soapenv:Body></soapenv:Envelope>";

fn config(dir: &TempDir, store: StoreBackend) -> AppConfig {
    let home = dir.path().join("home").to_string_lossy().to_string();
    AppConfig::from_lookup(|name| (name == HOME_VAR).then(|| home.clone()))
        .unwrap()
        .with_store(store)
}

fn ada() -> UserCredentials {
    UserCredentials::new("ada@acme.com", "s3cret", "123456")
        .with_security_token("TOKEN")
        .with_connected_app("3MVG9client", "shh")
        .with_profile("Ada Lovelace", "ada@acme.com")
}

#[tokio::test]
async fn test_register_then_login_falls_back_to_oauth() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, StoreBackend::Sqlite);
    config.init().unwrap();

    let store = config.open_store().unwrap();
    assert!(store.register(&ada()).unwrap());
    assert!(!store.register(&ada()).unwrap());

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/Soap/u/62.0"))
        .respond_with(ResponseTemplate::new(500).set_body_string(SOAP_FAULT))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "00Dxx!OAUTH",
            "instance_url": server.uri()
        })))
        .expect(1)
        .mount(&server)
        .await;

    let factory = config
        .clone()
        .with_login_url(server.uri())
        .session_factory()
        .unwrap();
    let mut context = config.session_context().unwrap();
    let session = login::login(&*store, &factory, &mut context, "ada@acme.com", "s3cret", "123456")
        .await
        .unwrap();

    assert_eq!(session.login_method, LoginMethod::OAuthPassword);
    assert_eq!(session.instance_url, server.uri());
    assert_eq!(session.access_token(), "00Dxx!OAUTH");

    // the session survives into the next process
    let mut reloaded = config.session_context().unwrap();
    assert_eq!(reloaded.username(), Some("ada@acme.com"));
    assert!(login::connect(&mut reloaded, &ClientConfig::default()).is_ok());

    reloaded.clear().unwrap();
    let err = config.session_context().unwrap().current().err().unwrap();
    assert!(matches!(err.kind, AuthErrorKind::SessionExpired(_)));
}

#[tokio::test]
async fn test_wrong_pin_never_reaches_salesforce() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, StoreBackend::File);
    config.init().unwrap();
    let store = config.open_store().unwrap();
    store.register(&ada()).unwrap();

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let factory = SessionFactory::new(ClientConfig::default())
        .unwrap()
        .with_login_url(server.uri());
    let mut context = SessionContext::in_memory();

    for (user, password, pin) in [
        ("ada@acme.com", "s3cret", "654321"),
        ("ada@acme.com", "wrong", "123456"),
        ("nobody@acme.com", "s3cret", "123456"),
    ] {
        let err = login::login(&*store, &factory, &mut context, user, password, pin)
            .await
            .unwrap_err();
        match &err.kind {
            ErrorKind::Auth(AuthErrorKind::AuthFailed(reason)) => {
                assert_eq!(reason, login::INVALID_LOGIN)
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }
    assert!(context.username().is_none());
}

#[test]
fn test_accounts_by_email_and_unregister() {
    let dir = TempDir::new().unwrap();
    let config = config(&dir, StoreBackend::Sqlite);
    config.init().unwrap();
    let store = config.open_store().unwrap();

    store.register(&ada()).unwrap();
    store
        .register(
            &UserCredentials::new("ada@acme.com.sandbox", "s3cret", "123456")
                .with_profile("Ada Lovelace", "ada@acme.com"),
        )
        .unwrap();

    let orgs = store.list_by_email("ada@acme.com").unwrap();
    assert_eq!(orgs.len(), 2);

    assert!(store.delete("ada@acme.com.sandbox").unwrap());
    assert!(!store.delete("ada@acme.com.sandbox").unwrap());
    assert_eq!(store.list_by_email("ada@acme.com").unwrap().len(), 1);

    // secrets come back decrypted
    let creds = store.get("ada@acme.com").unwrap().unwrap();
    assert_eq!(creds.security_token, "TOKEN");
    assert_eq!(creds.client_secret, "shh");
}
