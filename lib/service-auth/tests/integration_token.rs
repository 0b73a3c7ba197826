use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{Duration, Utc};
use service_auth::{
    AuthError, BearerTokenOptions, CredentialResolver, Credentials, HttpTokenExchange,
    ResolvedCredential, generate_bearer_token, is_expired,
};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RSA_PKCS8: &str = include_str!("fixtures/rsa_pkcs8.pem");

fn credentials_json(token_uri: &str) -> String {
    serde_json::json!({
        "clientID": "client-1",
        "clientName": "integration",
        "keyID": "key-1",
        "tokenURI": token_uri,
        "privateKey": RSA_PKCS8,
    })
    .to_string()
}

fn credentials_file(token_uri: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", credentials_json(token_uri)).unwrap();
    file
}

/// Unsigned JWT with the given lifetime; enough for expiry checks.
fn access_token(ttl_secs: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(r#"{"alg":"RS256","typ":"JWT"}"#);
    let exp = (Utc::now() + Duration::seconds(ttl_secs)).timestamp();
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{}}}"#, exp));
    format!("{}.{}.sig", header, payload)
}

async fn mount_token_endpoint(server: &MockServer, token: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/auth/sa/oauth/token"))
        .and(body_partial_json(serde_json::json!({
            "grant_type": "urn:ietf:params:oauth:grant-type:jwt-bearer"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": token,
            "tokenType": "Bearer"
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_generate_bearer_token_from_file() {
    let server = MockServer::start().await;
    let token = access_token(3600);
    mount_token_endpoint(&server, &token, 1).await;

    let file = credentials_file(&format!("{}/v1/auth/sa/oauth/token", server.uri()));
    let response = generate_bearer_token(
        file.path(),
        &BearerTokenOptions::default(),
        &HttpTokenExchange::new(),
    )
    .await
    .unwrap();

    assert_eq!(response.access_token, token);
    assert_eq!(response.token_type, "Bearer");
    assert!(!is_expired(&response.access_token));
}

#[tokio::test]
async fn test_resolver_reuses_cached_token() {
    let server = MockServer::start().await;
    let token = access_token(3600);
    // Only the first resolve may reach the token endpoint.
    mount_token_endpoint(&server, &token, 1).await;

    let file = credentials_file(&format!("{}/v1/auth/sa/oauth/token", server.uri()));
    let resolver = CredentialResolver::new(Arc::new(HttpTokenExchange::new()));
    let creds = Credentials::path(file.path());

    let first = resolver.resolve(&creds).await.unwrap();
    let second = resolver.resolve(&creds).await.unwrap();

    assert_eq!(first, ResolvedCredential::BearerToken(token.clone()));
    assert_eq!(second, ResolvedCredential::BearerToken(token));
}

#[tokio::test]
async fn test_resolver_sends_role_scope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({ "scope": " role:r1 role:r2" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": access_token(3600),
            "tokenType": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = CredentialResolver::default();
    let creds = Credentials::credentials_string(credentials_json(&server.uri()))
        .with_roles(["r1", "r2"]);

    assert!(resolver.resolve(&creds).await.is_ok());
}

#[tokio::test]
async fn test_api_key_never_calls_token_endpoint() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server, &access_token(3600), 0).await;

    let resolver = CredentialResolver::default();
    let resolved = resolver.resolve(&Credentials::api_key("sky-x")).await.unwrap();

    assert_eq!(resolved, ResolvedCredential::ApiKey("sky-x".to_string()));
}

#[tokio::test]
async fn test_token_endpoint_failure_is_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid assertion"))
        .mount(&server)
        .await;

    let resolver = CredentialResolver::default();
    let creds = Credentials::credentials_string(credentials_json(&server.uri()));
    let err = resolver.resolve(&creds).await.unwrap_err();

    assert!(matches!(err, AuthError::Server { status: 401, .. }));
    assert!(resolver.cache().get().await.is_none());
}
