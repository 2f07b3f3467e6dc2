//! The HTTP client against the stub service: endpoints, cookies, error taxonomy.

use api::{ApiClient, ApiError, Config, StatusCode};
use integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, RESIDENT_EMAIL, RESIDENT_PASSWORD, StubService, admin, complaint,
    resident,
};
use serde_json::json;
use types::{Credentials, Role, Status};

fn credentials(email: &str, password: &str) -> Credentials {
    Credentials::new(email, password.to_string().into())
}

#[tokio::test]
async fn session_cookie_carries_over_to_later_requests() {
    let stub = StubService::spawn().await;
    let client = stub.client();

    let user = client
        .login(Role::Admin, &credentials(ADMIN_EMAIL, ADMIN_PASSWORD))
        .await
        .unwrap();
    assert_eq!(user, Some(admin()));

    let me = client.current_user().await.unwrap();
    assert_eq!(me, Some(admin()));

    // A clone shares the cookie jar, a new client does not.
    assert_eq!(client.clone().current_user().await.unwrap(), Some(admin()));
    assert!(stub.client().current_user().await.is_err());
}

#[tokio::test]
async fn role_selects_login_endpoint() {
    let stub = StubService::spawn().await;
    let client = stub.client();

    let user = client
        .login(Role::User, &credentials(RESIDENT_EMAIL, RESIDENT_PASSWORD))
        .await
        .unwrap();

    assert_eq!(user, Some(resident()));
    assert_eq!(stub.state().hits("/api/auth/login"), 1);
    assert_eq!(stub.state().hits("/api/auth/admin-login"), 0);
}

#[tokio::test]
async fn rejected_login_carries_service_message() {
    let stub = StubService::spawn().await;

    let error = stub
        .client()
        .login(Role::Admin, &credentials(ADMIN_EMAIL, "wrong"))
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(StatusCode::UNAUTHORIZED));
    assert_eq!(error.server_message(), Some("Invalid email or password"));
}

#[tokio::test]
async fn logout_ends_remote_session() {
    let stub = StubService::spawn().await;
    let client = stub.client();

    client
        .login(Role::Admin, &credentials(ADMIN_EMAIL, ADMIN_PASSWORD))
        .await
        .unwrap();
    assert_eq!(stub.state().active_sessions(), 1);

    client.logout(Role::Admin).await.unwrap();

    assert_eq!(stub.state().hits("/api/auth/admin-logout"), 1);
    assert_eq!(stub.state().active_sessions(), 0);
    assert!(client.current_user().await.is_err());
}

#[tokio::test]
async fn lists_complaints_and_counts_users() {
    let stub = StubService::spawn().await;
    stub.state().set_complaints(vec![
        complaint("c1", "Pothole", "Roads", "Pending", "2024-01-01T09:00:00.000Z"),
        complaint("c2", "Broken lamp", "Lighting", "In Progress", "2024-01-02T09:00:00.000Z"),
    ]);
    stub.state().set_user_count(json!({ "count": 42 }));

    let client = stub.client();
    client
        .login(Role::Admin, &credentials(ADMIN_EMAIL, ADMIN_PASSWORD))
        .await
        .unwrap();

    let complaints = client.list_complaints().await.unwrap();
    assert_eq!(complaints.len(), 2);
    assert_eq!(complaints[0].id, "c1");
    assert_eq!(complaints[1].status, Status::InProgress);

    assert_eq!(client.user_count().await.unwrap(), 42);

    stub.state().set_user_count(json!({}));
    assert_eq!(client.user_count().await.unwrap(), 0);
}

#[tokio::test]
async fn undecodable_body_is_malformed() {
    let stub = StubService::spawn().await;
    stub.state().set_complaints(vec![json!({ "title": 7 })]);

    let client = stub.client();
    client
        .login(Role::Admin, &credentials(ADMIN_EMAIL, ADMIN_PASSWORD))
        .await
        .unwrap();

    let error = client.list_complaints().await.unwrap_err();
    assert!(matches!(error, ApiError::Malformed(_)), "{error:?}");
}

#[tokio::test]
async fn unreachable_service_is_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = Config::new(format!("http://{addr}").parse().unwrap());
    let client = ApiClient::new(&config).unwrap();

    let error = client.current_user().await.unwrap_err();
    assert!(matches!(error, ApiError::Transport(_)), "{error:?}");
    assert_eq!(error.server_message(), None);
}
