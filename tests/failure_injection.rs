//! Failure injection: transient statuses, timeouts, dead backends, denials.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::json;
use teamanalyzer_client::{ApiClient, ClientError, RequestOptions};

mod common;
use common::{RecordingNavigator, Reply};

#[tokio::test]
async fn test_retry_on_transient_failure() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let backend = common::start_programmable_backend(move |_| {
        let cc = cc.clone();
        async move {
            let count = cc.fetch_add(1, Ordering::SeqCst);
            if count < 3 {
                Reply::text(503, "Service Unavailable")
            } else {
                Reply::json(200, json!({ "ok": true }))
            }
        }
    })
    .await;
    let client = common::client_for(&backend);

    let response = client
        .get("/surveys/s1/results", RequestOptions::new().skip_auth_header().retry(3))
        .await
        .expect("should eventually succeed after retries");

    assert_eq!(response.status, 200);
    assert_eq!(call_count.load(Ordering::SeqCst), 4);

    // Every attempt of one logical request carries the same request ID.
    let ids: Vec<_> = backend.requests().into_iter().map(|r| r.request_id).collect();
    assert!(ids[0].is_some());
    assert!(ids.iter().all(|id| id == &ids[0]));
}

#[tokio::test]
async fn test_retry_budget_exhausted() {
    let backend = common::start_programmable_backend(|_| async { Reply::empty(502) }).await;
    let client = common::client_for(&backend);

    let err = client
        .get("/my/tokens", RequestOptions::new().skip_auth_header().retry(2))
        .await
        .unwrap_err();

    assert_eq!(err.status(), 502);
    assert!(err.is_transient());
    assert_eq!(backend.hits("GET", "/my/tokens"), 3);
}

#[tokio::test]
async fn test_mutations_are_never_retried() {
    let backend = common::start_programmable_backend(|_| async { Reply::empty(503) }).await;
    let client = common::client_for(&backend);
    client.tokens().set("t1".to_string());

    let err = client.my_token_for_survey("s1").await.unwrap_err();
    assert_eq!(err.status(), 503);
    assert_eq!(backend.hits("PUT", "/surveys/s1/my-token"), 1);

    let err = client.get_results_download_link("s1").await.unwrap_err();
    assert_eq!(err.status(), 503);
    assert_eq!(backend.hits("POST", "/surveys/s1/download-tokens"), 1);
}

#[tokio::test]
async fn test_non_transient_status_is_not_retried() {
    let backend = common::start_programmable_backend(|_| async {
        Reply::json(500, json!({ "message": "boom" }))
    })
    .await;
    let client = common::client_for(&backend);

    let err = client
        .get("/me/surveys", RequestOptions::new().skip_auth_header().retry(3))
        .await
        .unwrap_err();

    assert_eq!(err.status(), 500);
    assert!(!err.is_transient());
    assert_eq!(backend.hits("GET", "/me/surveys"), 1);
}

#[tokio::test]
async fn test_timeout_aborts_request() {
    let backend = common::start_programmable_backend(|_| async {
        Reply::json(200, json!({})).after(Duration::from_millis(500))
    })
    .await;
    let client = common::client_for(&backend);

    let started = Instant::now();
    let err = client
        .get("/surveys/s1", RequestOptions::new().skip_auth_header().timeout_ms(100))
        .await
        .unwrap_err();

    assert_eq!(err, ClientError::Timeout { after_ms: 100 });
    assert!(err.is_transient());
    assert!(started.elapsed() < Duration::from_millis(400));
}

#[tokio::test]
async fn test_timed_out_get_is_retried() {
    let call_count = Arc::new(AtomicU32::new(0));
    let cc = call_count.clone();
    let backend = common::start_programmable_backend(move |_| {
        let cc = cc.clone();
        async move {
            if cc.fetch_add(1, Ordering::SeqCst) == 0 {
                Reply::json(200, json!({ "late": true })).after(Duration::from_millis(400))
            } else {
                Reply::json(200, json!({ "late": false }))
            }
        }
    })
    .await;
    let client = common::client_for(&backend);

    let response = client
        .get(
            "/surveys/s1",
            RequestOptions::new().skip_auth_header().timeout_ms(100).retry(1),
        )
        .await
        .unwrap();

    assert_eq!(response.text(), r#"{"late":false}"#);
    assert_eq!(backend.hits("GET", "/surveys/s1"), 2);
}

#[tokio::test]
async fn test_dead_backend_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut config = teamanalyzer_client::ClientConfig::default();
    config.api.base_url = format!("http://{addr}/api");
    config.backoff.base_delay_ms = 10;
    config.backoff.max_delay_ms = 20;
    config.backoff.jitter_ms = 1;
    let client = ApiClient::builder(config).build().unwrap();

    let err = client
        .get("/surveys/s1", RequestOptions::new().skip_auth_header().retry(2))
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Network(_)));
    assert_eq!(err.status(), 0);
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_admin_forbidden_redirects() {
    let backend = common::start_programmable_backend(|_| async { Reply::empty(403) }).await;
    let navigator = Arc::new(RecordingNavigator::default());
    let client = ApiClient::builder(common::test_config(&backend))
        .navigator(navigator.clone())
        .build()
        .unwrap();
    client.tokens().set("t1".to_string());

    let err = client.list_teams_admin().await.unwrap_err();
    assert!(err.is_forbidden());
    assert_eq!(*navigator.locations.lock().unwrap(), vec!["/forbidden".to_string()]);
    assert_eq!(backend.hits("GET", "/admin/teams"), 1);

    // Outside the admin namespace a 403 is just an error.
    let err = client.my_teams(true).await.unwrap_err();
    assert!(err.is_forbidden());
    assert_eq!(navigator.locations.lock().unwrap().len(), 1);
}
