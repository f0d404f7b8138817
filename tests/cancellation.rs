//! Cancel groups, caller scopes, and latest-wins under concurrency.

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use teamanalyzer_client::{AbortReason, ClientError, RequestOptions, RunTracker};

mod common;
use common::Reply;

fn survey(id: &str) -> serde_json::Value {
    json!({ "id": id, "title": format!("Survey {id}"), "createdBy": null, "questions": [] })
}

#[tokio::test]
async fn test_newer_survey_load_supersedes_older() {
    let backend = common::start_programmable_backend(|req| async move {
        match req.path.as_str() {
            "/surveys/A" => Reply::json(200, survey("A")).after(Duration::from_millis(300)),
            "/surveys/B" => Reply::json(200, survey("B")).after(Duration::from_millis(50)),
            _ => Reply::empty(404),
        }
    })
    .await;
    let client = common::client_for(&backend);
    let runs = RunTracker::new();

    let run_a = runs.begin("survey");
    let load_a = {
        let client = client.clone();
        tokio::spawn(async move { client.get_survey("A").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let run_b = runs.begin("survey");
    let b = client.get_survey("B").await.unwrap();
    let a = load_a.await.unwrap();

    assert_eq!(b.unwrap().id, "B");
    assert!(runs.is_latest("survey", run_b));
    assert!(runs.is_stale("survey", run_a));
    assert_eq!(
        a.unwrap_err(),
        ClientError::Cancelled {
            reason: AbortReason::Superseded
        }
    );
    assert!(client.groups().is_empty());
}

#[tokio::test]
async fn test_burst_in_one_group_leaves_one_survivor() {
    let backend = common::start_programmable_backend(|_| async {
        Reply::json(200, json!([])).after(Duration::from_millis(200))
    })
    .await;
    let client = common::client_for(&backend);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            client
                .get("/my/tokens", RequestOptions::new().skip_auth_header().cancel_group("my/tokens"))
                .await
        }));
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let mut survivors = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => survivors += 1,
            Err(e) => assert_eq!(
                e,
                ClientError::Cancelled {
                    reason: AbortReason::Superseded
                }
            ),
        }
    }
    assert_eq!(survivors, 1);
    assert!(client.groups().is_empty());
}

#[tokio::test]
async fn test_abort_group_cancels_in_flight_request() {
    let backend = common::start_programmable_backend(|_| async {
        Reply::json(200, json!([])).after(Duration::from_millis(500))
    })
    .await;
    let client = common::client_for(&backend);
    client.tokens().set("t1".to_string());

    let pending = {
        let client = client.clone();
        tokio::spawn(async move { client.my_teams(true).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert!(client.abort_group("me/teams"));
    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(
        err,
        ClientError::Cancelled {
            reason: AbortReason::GroupAborted
        }
    );
    assert!(err.is_cancellation());
    assert!(!err.is_transient());
    assert!(!client.abort_group("me/teams"));
}

#[tokio::test]
async fn test_caller_scope_cancels_request() {
    let backend = common::start_programmable_backend(|_| async {
        Reply::json(200, json!({})).after(Duration::from_millis(500))
    })
    .await;
    let client = common::client_for(&backend);

    let scope = CancellationToken::new();
    let pending = {
        let client = client.clone();
        let scope = scope.clone();
        tokio::spawn(async move {
            client
                .get("/surveys/s1", RequestOptions::new().skip_auth_header().retry(3).signal(scope))
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    scope.cancel();

    let err = pending.await.unwrap().unwrap_err();
    assert_eq!(
        err,
        ClientError::Cancelled {
            reason: AbortReason::Caller
        }
    );
    assert_eq!(backend.hits("GET", "/surveys/s1"), 1);
}

#[tokio::test]
async fn test_different_groups_do_not_interfere() {
    let backend = common::start_programmable_backend(|req| async move {
        match req.path.as_str() {
            "/surveys/s1" => Reply::json(200, survey("s1")).after(Duration::from_millis(100)),
            "/my/tokens" => Reply::json(200, json!([])).after(Duration::from_millis(100)),
            _ => Reply::empty(404),
        }
    })
    .await;
    let client = common::client_for(&backend);
    client.tokens().set("t1".to_string());

    let (survey, tokens) = tokio::join!(client.get_survey("s1"), client.list_my_open_tokens());
    assert_eq!(survey.unwrap().unwrap().id, "s1");
    assert!(tokens.unwrap().is_empty());
}
