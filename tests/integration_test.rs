// Integration tests for the storefront client
//
// These tests drive the public API end to end against a mock HTTP server:
// authentication, transparent refresh, forced logout and persistence.

use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use std::sync::Arc;
use tokio_test::{assert_err, assert_ok};

use storefront_client::{
    api::{AddressApi, CatalogApi, UserApi},
    auth::{
        CredentialStore, MemoryCredentialStore, SessionManager, SqliteCredentialStore, TokenKind,
        TokenPair,
    },
    config::Config,
    error::ClientError,
    http_client::StorefrontHttpClient,
};

// ==================================================================================================
// Test Helpers
// ==================================================================================================

fn client_with_store(server: &ServerGuard, store: Arc<dyn CredentialStore>) -> Arc<StorefrontHttpClient> {
    let config = Config::for_base_url(&server.url());
    Arc::new(StorefrontHttpClient::new(&config, store).expect("Failed to create HTTP client"))
}

fn logged_in_store(access: &str, refresh: &str) -> Arc<MemoryCredentialStore> {
    let store = Arc::new(MemoryCredentialStore::new());
    store
        .save_tokens(&TokenPair::new(access, refresh))
        .expect("Failed to seed store");
    store
}

const PROFILE: &str = r#"{"id":"7","name":"Ada","email":"ada@example.com","role":"USER"}"#;

// ==================================================================================================
// Refresh Scenarios
// ==================================================================================================

#[tokio::test]
async fn test_expired_token_is_refreshed_and_request_retried() {
    let mut server = Server::new_async().await;
    let expired = server
        .mock("GET", "/user/me")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .match_body(Matcher::Json(json!({"refreshToken": "R1"})))
        .with_status(200)
        .with_body(r#"{"accessToken":"A2","refreshToken":"R2"}"#)
        .expect(1)
        .create_async()
        .await;
    let retried = server
        .mock("GET", "/user/me")
        .match_header("authorization", "Bearer A2")
        .with_status(200)
        .with_body(PROFILE)
        .expect(1)
        .create_async()
        .await;

    let store = logged_in_store("A1", "R1");
    let http = client_with_store(&server, store.clone());

    let user = assert_ok!(UserApi::new(http).me().await);

    assert_eq!(user.name, "Ada");
    expired.assert_async().await;
    refresh.assert_async().await;
    retried.assert_async().await;
    assert_eq!(store.token(TokenKind::Access).unwrap().as_deref(), Some("A2"));
    assert_eq!(store.token(TokenKind::Refresh).unwrap().as_deref(), Some("R2"));
}

#[tokio::test]
async fn test_refresh_failure_forces_logout() {
    let mut server = Server::new_async().await;
    let _expired = server
        .mock("GET", "/address")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(403)
        .with_body(r#"{"message":"Refresh token revoked"}"#)
        .expect(1)
        .create_async()
        .await;

    let store = logged_in_store("A1", "R1");
    store.save_user_profile(PROFILE).unwrap();
    let http = client_with_store(&server, store.clone());

    let err = assert_err!(AddressApi::new(http).list().await);

    assert!(matches!(err, ClientError::SessionExpired(_)));
    assert!(err.requires_login());
    refresh.assert_async().await;
    assert!(store.token(TokenKind::Access).unwrap().is_none());
    assert!(store.token(TokenKind::Refresh).unwrap().is_none());
    assert!(store.user_profile().unwrap().is_none());
}

#[tokio::test]
async fn test_refresh_response_with_numeric_ids_keeps_session() {
    let mut server = Server::new_async().await;
    let _expired = server
        .mock("GET", "/category")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(200)
        .with_body(
            r#"{"accessToken":"A2","refreshToken":"R2",
                "user":{"id":7,"name":"Ada","email":"ada@example.com","role":"USER"}}"#,
        )
        .expect(1)
        .create_async()
        .await;
    let retried = server
        .mock("GET", "/category")
        .match_header("authorization", "Bearer A2")
        .with_status(200)
        .with_body(r#"[{"id":1,"name":"Kitchen"},{"id":2,"name":"Garden"}]"#)
        .expect(1)
        .create_async()
        .await;

    let store = logged_in_store("A1", "R1");
    let http = client_with_store(&server, store.clone());

    let categories = assert_ok!(CatalogApi::new(http).categories().await);

    assert_eq!(categories[0].id, "1");
    assert_eq!(categories[1].name, "Garden");
    refresh.assert_async().await;
    retried.assert_async().await;
    assert_eq!(store.token(TokenKind::Access).unwrap().as_deref(), Some("A2"));
    assert_eq!(store.token(TokenKind::Refresh).unwrap().as_deref(), Some("R2"));
    assert_eq!(store.profile().unwrap().unwrap().id, "7");
}

#[tokio::test]
async fn test_missing_refresh_token_makes_no_refresh_call() {
    let mut server = Server::new_async().await;
    let _expired = server
        .mock("GET", "/category")
        .with_status(401)
        .expect(1)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .expect(0)
        .create_async()
        .await;

    let store = Arc::new(MemoryCredentialStore::new());
    store.save_token("A1", TokenKind::Access).unwrap();
    let http = client_with_store(&server, store);

    let err = assert_err!(CatalogApi::new(http).categories().await);

    assert!(matches!(err, ClientError::SessionExpired(_)));
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_persistent_rejection_does_not_loop() {
    let mut server = Server::new_async().await;
    let always_401 = server
        .mock("GET", "/product/p1")
        .with_status(401)
        .with_body(r#"{"message":"Unauthorized"}"#)
        .expect(2)
        .create_async()
        .await;
    let refresh = server
        .mock("POST", "/auth/refresh")
        .with_status(200)
        .with_body(r#"{"accessToken":"A2","refreshToken":"R2"}"#)
        .expect(1)
        .create_async()
        .await;

    let store = logged_in_store("A1", "R1");
    let http = client_with_store(&server, store);

    let err = assert_err!(CatalogApi::new(http).product("p1").await);

    assert_eq!(err.status(), Some(401));
    assert!(err.requires_login());
    always_401.assert_async().await;
    refresh.assert_async().await;
}

#[tokio::test]
async fn test_each_failing_request_refreshes_once() {
    let mut server = Server::new_async().await;
    let _a1 = server
        .mock("GET", "/category")
        .match_header("authorization", "Bearer A1")
        .with_status(401)
        .create_async()
        .await;
    let _a2_expired = server
        .mock("GET", "/category")
        .match_header("authorization", "Bearer A2")
        .with_status(401)
        .create_async()
        .await;
    let _a3 = server
        .mock("GET", "/category")
        .match_header("authorization", "Bearer A3")
        .with_status(200)
        .with_body("[]")
        .create_async()
        .await;
    let first_refresh = server
        .mock("POST", "/auth/refresh")
        .match_body(Matcher::Json(json!({"refreshToken": "R1"})))
        .with_status(200)
        .with_body(r#"{"accessToken":"A2","refreshToken":"R2"}"#)
        .expect(1)
        .create_async()
        .await;

    let store = logged_in_store("A1", "R1");
    let http = client_with_store(&server, store.clone());
    let catalog = CatalogApi::new(http);

    // A1 -> 401 -> refresh -> A2 -> 401: surfaced without a second refresh
    let err = assert_err!(catalog.categories().await);
    assert_eq!(err.status(), Some(401));
    first_refresh.assert_async().await;

    // A fresh request starts a new chain and may refresh again
    let second_refresh = server
        .mock("POST", "/auth/refresh")
        .match_body(Matcher::Json(json!({"refreshToken": "R2"})))
        .with_status(200)
        .with_body(r#"{"accessToken":"A3","refreshToken":"R3"}"#)
        .expect(1)
        .create_async()
        .await;

    assert_ok!(catalog.categories().await);
    second_refresh.assert_async().await;
    assert_eq!(store.token(TokenKind::Refresh).unwrap().as_deref(), Some("R3"));
}

// ==================================================================================================
// Session Lifecycle
// ==================================================================================================

#[tokio::test]
async fn test_login_then_browse_then_logout_with_sqlite_store() {
    let mut server = Server::new_async().await;
    let _login = server
        .mock("POST", "/auth/login")
        .with_status(200)
        .with_body(format!(
            r#"{{"accessToken":"A1","refreshToken":"R1","user":{}}}"#,
            PROFILE
        ))
        .create_async()
        .await;
    let products = server
        .mock("GET", "/product")
        .match_header("authorization", "Bearer A1")
        .with_status(200)
        .with_body(r#"[{"id":"p1","name":"Mug","price":5.0,"stock":2}]"#)
        .expect(1)
        .create_async()
        .await;
    let logout = server
        .mock("POST", "/auth/logout")
        .match_body(Matcher::Json(json!({"refreshToken": "R1"})))
        .with_status(200)
        .expect(1)
        .create_async()
        .await;

    let store = Arc::new(SqliteCredentialStore::open_in_memory().unwrap());
    let http = client_with_store(&server, store.clone());
    let session = SessionManager::new(http.clone());

    let user = assert_ok!(session.login("ada@example.com", "pw").await);
    assert_eq!(user.unwrap().id, "7");

    let page = assert_ok!(CatalogApi::new(http).products(&Default::default()).await);
    assert_eq!(page.items[0].name, "Mug");

    assert_ok!(session.logout().await);
    assert!(!session.is_logged_in().unwrap());
    assert!(session.current_user().unwrap().is_none());

    products.assert_async().await;
    logout.assert_async().await;
}

#[tokio::test]
async fn test_unauthenticated_browse_sends_no_header() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/category")
        .match_header("authorization", Matcher::Missing)
        .with_status(200)
        .with_body(r#"[{"id":"c1","name":"Kitchen"}]"#)
        .expect(1)
        .create_async()
        .await;

    let http = client_with_store(&server, Arc::new(MemoryCredentialStore::new()));
    let categories = assert_ok!(CatalogApi::new(http).categories().await);

    assert_eq!(categories.len(), 1);
    mock.assert_async().await;
}
