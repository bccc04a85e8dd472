//! Token refresh behaviour of the tracker client against a mock API

use serde_json::json;
use std::time::Duration;
use tokio::sync::broadcast::Receiver;
use tokio::time::{sleep, timeout};
use tracker_http::{ClientError, SessionEvent, TrackerClient};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CONCURRENT_REQUESTS: usize = 8;

fn client_with_token(server: &MockServer, token: &str) -> TrackerClient {
    TrackerClient::builder()
        .base_url(server.uri())
        .access_token(token)
        .build()
        .unwrap()
}

fn drain(events: &mut Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

async fn mount_accounts(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/accounts/"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/accounts/"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": 1, "balance": 250.0}
        ])))
        .mount(server)
        .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_unauthorized_requests_share_one_refresh() {
    let server = MockServer::start().await;
    mount_accounts(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "fresh", "token_type": "bearer"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "stale");
    let mut events = client.subscribe();

    let calls = (0..CONCURRENT_REQUESTS).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.list_accounts().await })
    });
    let results = futures::future::join_all(calls).await;

    for result in results {
        let accounts = result.unwrap().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, 250.0);
    }
    assert_eq!(client.access_token().unwrap().as_deref(), Some("fresh"));
    assert!(!client.is_refreshing());
    assert_eq!(drain(&mut events), vec![SessionEvent::Refreshed]);

    // Every replay went out with the renewed token
    let requests = server.received_requests().await.unwrap();
    let replays = requests
        .iter()
        .filter(|r| r.url.path() == "/accounts/")
        .filter(|r| {
            r.headers
                .get("authorization")
                .is_some_and(|v| v.as_bytes() == b"Bearer fresh")
        })
        .count();
    assert_eq!(replays, CONCURRENT_REQUESTS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_refresh_rejects_all_and_expires_once() {
    let server = MockServer::start().await;
    mount_accounts(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Invalid refresh token"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "stale");
    let mut events = client.subscribe();

    let calls = (0..CONCURRENT_REQUESTS).map(|_| {
        let client = client.clone();
        tokio::spawn(async move { client.list_accounts().await })
    });
    let results = futures::future::join_all(calls).await;

    for result in results {
        let err = result.unwrap().unwrap_err();
        assert!(err.is_session_expired(), "unexpected error: {err}");
    }
    assert_eq!(client.access_token().unwrap(), None);
    assert!(!client.is_refreshing());
    assert_eq!(drain(&mut events), vec![SessionEvent::Expired]);
}

#[tokio::test]
async fn test_unauthorized_retry_is_not_refreshed_again() {
    let server = MockServer::start().await;

    // Rejects both the stale and the refreshed token
    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "stale");
    let mut events = client.subscribe();

    let err = client.me().await.unwrap_err();
    assert!(matches!(err, ClientError::SessionExpired));
    assert_eq!(client.access_token().unwrap(), None);
    assert_eq!(
        drain(&mut events),
        vec![SessionEvent::Refreshed, SessionEvent::Expired]
    );
}

#[tokio::test]
async fn test_request_after_refresh_uses_new_token_directly() {
    let server = MockServer::start().await;
    mount_accounts(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "stale");
    client.list_accounts().await.unwrap();
    client.list_accounts().await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let account_calls = requests
        .iter()
        .filter(|r| r.url.path() == "/accounts/")
        .count();
    // 401, replay, then one direct call
    assert_eq!(account_calls, 3);
}

#[tokio::test]
async fn test_explicit_refresh_failure_reports_expiry() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "stale");
    let mut events = client.subscribe();

    let err = client.refresh_session().await.unwrap_err();
    assert!(err.is_session_expired());
    assert!(!client.is_authenticated().unwrap());
    assert_eq!(drain(&mut events), vec![SessionEvent::Expired]);
}

#[tokio::test]
async fn test_login_and_logout_publish_events() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "issued",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .and(header("authorization", "Bearer issued"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Logged out"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = TrackerClient::new(server.uri()).unwrap();
    let mut events = client.subscribe();

    let credentials = tracker_http::types::LoginRequest {
        username: "ada@example.com".to_string(),
        password: "correct horse".to_string(),
    };
    let token = client.login(&credentials).await.unwrap();
    assert_eq!(token.access_token, "issued");
    assert_eq!(client.access_token().unwrap().as_deref(), Some("issued"));

    client.logout().await.unwrap();
    assert_eq!(client.access_token().unwrap(), None);
    assert_eq!(
        drain(&mut events),
        vec![SessionEvent::LoggedIn, SessionEvent::LoggedOut]
    );
}

#[tokio::test]
async fn test_logout_clears_token_when_server_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "stale");
    let err = client.logout().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert_eq!(client.access_token().unwrap(), None);
}

#[tokio::test]
async fn test_logout_does_not_refresh_expired_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "stale");
    assert!(client.logout().await.is_err());
    assert!(!client.is_authenticated().unwrap());
}

#[tokio::test]
async fn test_bad_credentials_do_not_start_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Incorrect email or password"})),
        )
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
        .expect(0)
        .mount(&server)
        .await;

    let client = TrackerClient::new(server.uri()).unwrap();
    let credentials = tracker_http::types::LoginRequest {
        username: "ada@example.com".to_string(),
        password: "wrong".to_string(),
    };
    let err = client.login(&credentials).await.unwrap_err();
    match err {
        ClientError::AuthenticationFailed(message) => {
            assert_eq!(message, "Incorrect email or password");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cancelled_refresh_leader_hands_over_to_waiter() {
    let server = MockServer::start().await;
    mount_accounts(&server).await;

    // The cancelled leader's call still reaches the server; the waiter that
    // takes over issues the second one
    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access_token": "fresh"}))
                .set_delay(Duration::from_millis(400)),
        )
        .expect(2)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "stale");
    let mut events = client.subscribe();

    let leader = {
        let client = client.clone();
        tokio::spawn(async move {
            timeout(Duration::from_millis(150), client.list_accounts()).await
        })
    };
    let waiter = {
        let client = client.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(60)).await;
            client.list_accounts().await
        })
    };

    assert!(leader.await.unwrap().is_err(), "leader should time out");
    let accounts = waiter.await.unwrap().unwrap();
    assert_eq!(accounts.len(), 1);
    assert_eq!(client.access_token().unwrap().as_deref(), Some("fresh"));
    assert!(!client.is_refreshing());
    assert_eq!(drain(&mut events), vec![SessionEvent::Refreshed]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_late_unauthorized_response_reuses_settled_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "email": "ada@example.com"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "stale");
    let in_flight = {
        let client = client.clone();
        tokio::spawn(async move { client.me().await })
    };

    // Refresh completes while the stale request is still waiting on its 401
    sleep(Duration::from_millis(50)).await;
    client.refresh_session().await.unwrap();
    assert!(!client.is_refreshing());

    let user = in_flight.await.unwrap().unwrap();
    assert_eq!(user.email, "ada@example.com");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_late_unauthorized_response_after_logout_fails_without_refresh() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Logged out"})))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "fresh"})))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_with_token(&server, "stale");
    let mut events = client.subscribe();
    let in_flight = {
        let client = client.clone();
        tokio::spawn(async move { client.me().await })
    };

    sleep(Duration::from_millis(50)).await;
    client.logout().await.unwrap();

    let err = in_flight.await.unwrap().unwrap_err();
    assert!(err.is_session_expired());
    assert_eq!(client.access_token().unwrap(), None);
    assert_eq!(drain(&mut events), vec![SessionEvent::LoggedOut]);
}

#[tokio::test]
async fn test_logout_clears_token_when_server_unreachable() {
    // Nothing listens on the discard port
    let client = TrackerClient::builder()
        .base_url("http://127.0.0.1:9")
        .access_token("stale")
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let mut events = client.subscribe();

    let err = client.logout().await.unwrap_err();
    assert!(matches!(err, ClientError::Request(_)), "unexpected error: {err}");
    assert_eq!(client.access_token().unwrap(), None);
    assert_eq!(drain(&mut events), vec![SessionEvent::LoggedOut]);
}
