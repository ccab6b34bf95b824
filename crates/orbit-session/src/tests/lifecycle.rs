//! Login, logout, and startup restoration.

use super::*;
use crate::{SessionError, SessionStatus};
use orbit_client::testing::StubResponse;
use orbit_client::RegisterRequest;

#[tokio::test]
async fn test_login_authenticates_and_stores_pair() {
    let (stub, vault, manager) = setup().await;
    stub.enqueue("POST", "/auth/login", StubResponse::json(200, auth_body("1", "T1", "R1")));

    let session = manager.login("a@b.com", "secret1").await.unwrap();
    assert_eq!(session.status, SessionStatus::Authenticated);
    assert_eq!(session.user.unwrap().id, "1");
    assert!(session.last_error.is_none());

    let stored = vault.load().await.unwrap();
    assert_eq!(stored.pair, Some(pair("T1", "R1")));
    assert_eq!(stored.user.unwrap().id, "1");
}

#[tokio::test]
async fn test_login_failure_records_error_and_reraises() {
    let (stub, vault, manager) = setup().await;
    stub.enqueue(
        "POST",
        "/auth/login",
        StubResponse::json(401, error_body("Invalid credentials")),
    );

    let err = manager.login("a@b.com", "wrong").await.unwrap_err();
    assert!(err.to_string().contains("Invalid credentials"));

    let session = manager.session().await;
    assert_eq!(session.status, SessionStatus::Failed);
    assert!(session.user.is_none());
    assert!(session.last_error.unwrap().contains("Invalid credentials"));
    assert!(vault.load().await.unwrap().pair.is_none());

    // With no cached user, acknowledging the failure lands logged out.
    let session = manager.clear_error().await.unwrap();
    assert_eq!(session.status, SessionStatus::Unauthenticated);
    assert!(session.last_error.is_none());
}

#[tokio::test]
async fn test_register_authenticates() {
    let (stub, vault, manager) = setup().await;
    stub.enqueue("POST", "/auth/register", StubResponse::json(201, auth_body("9", "T1", "R1")));

    let request = RegisterRequest {
        email: "new@b.com".to_string(),
        password: "secret1".to_string(),
        first_name: "Jo".to_string(),
        last_name: "Doe".to_string(),
        ..Default::default()
    };
    let session = manager.register(&request).await.unwrap();
    assert_eq!(session.status, SessionStatus::Authenticated);
    assert_eq!(vault.load().await.unwrap().pair, Some(pair("T1", "R1")));
}

#[tokio::test]
async fn test_login_then_logout_leaves_vault_empty() {
    let (stub, vault, manager) = setup().await;
    stub.enqueue("POST", "/auth/login", StubResponse::json(200, auth_body("1", "T1", "R1")));
    stub.enqueue(
        "POST",
        "/auth/logout",
        StubResponse::json(200, r#"{"success":true,"message":"ok","data":null}"#),
    );

    manager.login("a@b.com", "secret1").await.unwrap();
    let session = manager.logout().await.unwrap();
    assert_eq!(session.status, SessionStatus::Unauthenticated);
    assert!(session.user.is_none());

    let stored = vault.load().await.unwrap();
    assert!(stored.pair.is_none());
    assert!(stored.user.is_none());

    // The server call carried the stored refresh token.
    let logout_requests: Vec<_> = stub
        .requests()
        .into_iter()
        .filter(|r| r.path == "/auth/logout")
        .collect();
    assert!(logout_requests[0].body.contains(r#""refreshToken":"R1""#));
}

#[tokio::test]
async fn test_logout_ignores_server_failure() {
    let (stub, vault, manager) = setup().await;
    stub.enqueue("POST", "/auth/login", StubResponse::json(200, auth_body("1", "T1", "R1")));
    stub.enqueue(
        "POST",
        "/auth/logout",
        StubResponse::json(500, error_body("Server exploded")),
    );

    manager.login("a@b.com", "secret1").await.unwrap();
    let session = manager.logout().await.unwrap();
    assert_eq!(session.status, SessionStatus::Unauthenticated);
    assert!(vault.load().await.unwrap().pair.is_none());
    assert_eq!(stub.hits("POST", "/auth/logout"), 1);
}

#[tokio::test]
async fn test_logout_requires_authenticated() {
    let (_stub, _vault, manager) = setup().await;
    let err = manager.logout().await.unwrap_err();
    assert!(matches!(err, SessionError::Transition(_)));
}

#[tokio::test]
async fn test_restore_without_stored_pair_stays_logged_out() {
    let (stub, _vault, manager) = setup().await;

    let session = manager.restore().await.unwrap();
    assert_eq!(session.status, SessionStatus::Unauthenticated);
    assert!(session.last_error.is_none());
    assert_eq!(stub.hits("GET", "/auth/me"), 0);
}

#[tokio::test]
async fn test_restore_with_valid_pair_authenticates() {
    let (stub, vault, manager) = setup().await;
    vault.save(&pair("T1", "R1"), &test_user("1")).await.unwrap();
    stub.enqueue("GET", "/auth/me", StubResponse::json(200, profile_body("1")));

    let session = manager.restore().await.unwrap();
    assert_eq!(session.status, SessionStatus::Authenticated);
    assert_eq!(session.user.unwrap().id, "1");
    assert_eq!(stub.requests()[0].authorization.as_deref(), Some("Bearer T1"));
}

#[tokio::test]
async fn test_restore_refreshes_expired_token_transparently() {
    let (stub, vault, manager) = setup().await;
    vault.save(&pair("T1", "R1"), &test_user("1")).await.unwrap();
    stub.enqueue("GET", "/auth/me", StubResponse::json(401, error_body("Token expired")));
    stub.enqueue("POST", "/auth/refresh-token", StubResponse::json(200, refresh_body("T2")));
    stub.enqueue("GET", "/auth/me", StubResponse::json(200, profile_body("1")));

    let session = manager.restore().await.unwrap();
    assert_eq!(session.status, SessionStatus::Authenticated);

    let stored = vault.load().await.unwrap();
    assert_eq!(stored.pair, Some(pair("T2", "R1")));
}

#[tokio::test]
async fn test_restore_with_rejected_pair_clears_store() {
    let (stub, vault, manager) = setup().await;
    vault.save(&pair("T1", "R1"), &test_user("1")).await.unwrap();
    // The profile fetch 401s and the refresh attempt is rejected too.
    stub.enqueue("GET", "/auth/me", StubResponse::json(401, error_body("Token expired")));
    stub.enqueue(
        "POST",
        "/auth/refresh-token",
        StubResponse::json(401, error_body("Invalid refresh token")),
    );

    let session = manager.restore().await.unwrap();
    assert_eq!(session.status, SessionStatus::Unauthenticated);
    assert!(session.user.is_none());
    // Startup failure is silent.
    assert!(session.last_error.is_none());

    let stored = vault.load().await.unwrap();
    assert!(stored.pair.is_none());
    assert!(stored.user.is_none());
}

#[tokio::test]
async fn test_watch_channel_sees_state_changes() {
    let (stub, _vault, manager) = setup().await;
    let rx = manager.subscribe();
    assert_eq!(rx.borrow().status, SessionStatus::Unauthenticated);

    stub.enqueue("POST", "/auth/login", StubResponse::json(200, auth_body("1", "T1", "R1")));
    manager.login("a@b.com", "secret1").await.unwrap();
    assert_eq!(rx.borrow().status, SessionStatus::Authenticated);
}
