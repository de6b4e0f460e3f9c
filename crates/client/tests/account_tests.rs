//! Integration tests for account operations

use foodsched_client::types::{OAuthRegisterRequest, RegisterRequest};
use foodsched_client::{AccountService, ApiClient, TokenStore};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn service_for(server: &MockServer, tokens: &TokenStore) -> AccountService {
    let client = ApiClient::builder()
        .base_url(server.uri())
        .tokens(tokens.clone())
        .build()
        .unwrap();
    AccountService::new(client)
}

fn token_body(access: &str, refresh: &str) -> serde_json::Value {
    json!({
        "access_token": access,
        "refresh_token": refresh,
        "token_type": "bearer",
        "expires_in": 1800
    })
}

#[tokio::test]
async fn test_login_then_me_without_refresh() {
    let mock_server = MockServer::start().await;
    let tokens = TokenStore::in_memory();

    Mock::given(method("POST"))
        .and(path("/user/login"))
        .and(body_json(json!({"email": "cook@example.com", "password": "Strong@Pwd123"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a1", "r1")))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/me"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": "u-1",
            "email": "cook@example.com",
            "nickname": "cook",
            "phone": null
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/refresh"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let accounts = service_for(&mock_server, &tokens);
    let response = accounts
        .login("cook@example.com", "Strong@Pwd123")
        .await
        .unwrap();
    assert_eq!(response, token_body("a1", "r1"));
    assert_eq!(tokens.get_access_token().as_deref(), Some("a1"));
    assert_eq!(tokens.get_refresh_token().as_deref(), Some("r1"));

    let me = accounts.me().await.unwrap();
    assert_eq!(me["uuid"], "u-1");
    assert_eq!(me["nickname"], "cook");
    assert!(me["phone"].is_null());
}

#[tokio::test]
async fn test_me_recovers_from_expired_access_token() {
    let mock_server = MockServer::start().await;
    let tokens = TokenStore::in_memory();
    tokens.set_tokens("expired", Some("r1"));

    Mock::given(method("GET"))
        .and(path("/user/me"))
        .and(header("authorization", "Bearer expired"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a2", "r2")))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/me"))
        .and(header("authorization", "Bearer a2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"uuid": "u-1", "email": "cook@example.com"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let accounts = service_for(&mock_server, &tokens);
    let me = accounts.me().await.unwrap();
    assert_eq!(me["email"], "cook@example.com");
    assert_eq!(tokens.get_refresh_token().as_deref(), Some("r2"));
}

#[tokio::test]
async fn test_failed_login_keeps_backend_message() {
    let mock_server = MockServer::start().await;
    let tokens = TokenStore::in_memory();

    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "invalid credentials"})),
        )
        .mount(&mock_server)
        .await;

    let accounts = service_for(&mock_server, &tokens);
    let error = accounts.login("cook@example.com", "nope").await.unwrap_err();
    assert_eq!(error.to_string(), "invalid credentials");
    assert_eq!(tokens.get_access_token(), None);
}

#[tokio::test]
async fn test_rejected_login_with_stored_session_keeps_backend_message() {
    let mock_server = MockServer::start().await;
    let tokens = TokenStore::in_memory();
    tokens.set_tokens("a0", Some("r0"));

    Mock::given(method("POST"))
        .and(path("/user/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "invalid credentials"})),
        )
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a1", "r1")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let accounts = service_for(&mock_server, &tokens);
    let error = accounts.login("cook@example.com", "nope").await.unwrap_err();

    assert_eq!(error.to_string(), "invalid credentials");
    assert_eq!(error.status(), Some(401));
    assert!(!error.is_auth_expired());
}

#[tokio::test]
async fn test_non_json_success_bodies_resolve_to_empty_object() {
    let mock_server = MockServer::start().await;
    let tokens = TokenStore::in_memory();
    tokens.set_tokens("a1", None);

    for endpoint in ["/user/register", "/user/verify/email", "/user/login"] {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_string("created"))
            .mount(&mock_server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/user/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"email": "partial"})))
        .mount(&mock_server)
        .await;

    let accounts = service_for(&mock_server, &tokens);
    let registered = accounts
        .register(&RegisterRequest {
            email: "new@example.com".to_string(),
            password: "Strong@Pwd123".to_string(),
            nickname: None,
            phone: None,
        })
        .await
        .unwrap();
    assert_eq!(registered, json!({}));

    let sent = accounts
        .request_verification("new@example.com")
        .await
        .unwrap();
    assert_eq!(sent, json!({}));

    let me = accounts.me().await.unwrap();
    assert_eq!(me, json!({"email": "partial"}));

    let login = accounts.login("new@example.com", "Strong@Pwd123").await.unwrap();
    assert_eq!(login, json!({}));
    assert_eq!(tokens.get_access_token().as_deref(), Some("a1"));
}

#[tokio::test]
async fn test_register_and_verification_are_public() {
    let mock_server = MockServer::start().await;
    let tokens = TokenStore::in_memory();
    tokens.set_tokens("a1", None);

    Mock::given(method("POST"))
        .and(path("/user/register"))
        .and(body_json(json!({
            "email": "new@example.com",
            "password": "Strong@Pwd123",
            "nickname": "newbie"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": "u-2",
            "email": "new@example.com",
            "message": "registered",
            "status": "success"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/verify/email"))
        .and(body_json(json!({"email": "new@example.com"})))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"message": "sent"})))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/verify/confirm"))
        .and(body_json(json!({"email": "new@example.com", "code": "123456"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "verified"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let accounts = service_for(&mock_server, &tokens);
    let registered = accounts
        .register(&RegisterRequest {
            email: "new@example.com".to_string(),
            password: "Strong@Pwd123".to_string(),
            nickname: Some("newbie".to_string()),
            phone: None,
        })
        .await
        .unwrap();
    assert_eq!(registered["uuid"], "u-2");

    let sent = accounts
        .request_verification("new@example.com")
        .await
        .unwrap();
    assert_eq!(sent, json!({"message": "sent"}));

    let confirmed = accounts
        .confirm_verification("new@example.com", "123456")
        .await
        .unwrap();
    assert_eq!(confirmed["message"], "verified");

    let requests = mock_server.received_requests().await.unwrap();
    assert!(
        requests
            .iter()
            .all(|r| r.headers.get("authorization").is_none())
    );
}

#[tokio::test]
async fn test_oauth_register_and_login() {
    let mock_server = MockServer::start().await;
    let tokens = TokenStore::in_memory();
    let request = OAuthRegisterRequest {
        email: "social@example.com".to_string(),
        social_code: "google".to_string(),
        access_token: "provider-token".to_string(),
        nickname: None,
    };

    Mock::given(method("POST"))
        .and(path("/user/oauth/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uuid": "u-3",
            "email": "social@example.com",
            "message": "registered",
            "status": "success"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/user/oauth/login"))
        .and(body_json(json!({
            "email": "social@example.com",
            "social_code": "google",
            "access_token": "provider-token"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_body("a3", "r3")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let accounts = service_for(&mock_server, &tokens);
    accounts.oauth_register(&request).await.unwrap();
    assert_eq!(tokens.get_access_token(), None);

    accounts.oauth_login(&request).await.unwrap();
    assert_eq!(tokens.get_access_token().as_deref(), Some("a3"));
    assert_eq!(tokens.get_refresh_token().as_deref(), Some("r3"));
}

#[tokio::test]
async fn test_logout_clears_tokens() {
    let mock_server = MockServer::start().await;
    let tokens = TokenStore::in_memory();
    tokens.set_tokens("a1", Some("r1"));

    Mock::given(method("POST"))
        .and(path("/user/logout"))
        .and(header("authorization", "Bearer a1"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "bye"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let accounts = service_for(&mock_server, &tokens);
    accounts.logout().await.unwrap();

    assert_eq!(tokens.get_access_token(), None);
    assert_eq!(tokens.get_refresh_token(), None);
}

#[tokio::test]
async fn test_logout_clears_tokens_when_backend_fails() {
    let mock_server = MockServer::start().await;
    let tokens = TokenStore::in_memory();
    tokens.set_tokens("a1", Some("r1"));

    Mock::given(method("POST"))
        .and(path("/user/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let accounts = service_for(&mock_server, &tokens);
    let error = accounts.logout().await.unwrap_err();

    assert_eq!(error.status(), Some(500));
    assert_eq!(tokens.get_access_token(), None);
    assert_eq!(tokens.get_refresh_token(), None);
}
