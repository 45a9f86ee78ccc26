//! Search-indexing lifecycle.

mod common;

use common::{Harness, TEST_ACCESS_KEY};
use educloud::cloud::CallbackSigner;
use educloud::error::CloudError;
use educloud::reconcile::{ConnectionStatus, SubmitOutcome};
use educloud::settings::IndexingState;
use serde_json::{json, Value};

const SUBMIT: &str = "/search/accounts";
const CALLBACK: &str = "http://school.test/edu_cloud/search/callback";

fn with_site() -> Harness {
    let h = Harness::with_credential();
    h.store.seed("site", json!({"name": "School", "url": "http://school.test/"}));
    h
}

#[tokio::test]
async fn test_status_initialises_closed() {
    let h = Harness::with_credential();
    let setting = h.ctx.indexing().await.unwrap().status().await.unwrap();
    assert_eq!(setting.status, IndexingState::Closed);
    assert_eq!(h.raw("cloud_search"), json!({"search_enabled": 0, "status": "closed"}));

    h.ctx.indexing().await.unwrap().status().await.unwrap();
    assert_eq!(h.store.write_count("cloud_search"), 1);
}

#[tokio::test]
async fn test_accepted_submit_moves_to_waiting() {
    let h = with_site();
    h.http.on_json("POST", SUBMIT, json!({"success": true}));

    let outcome = h.ctx.indexing().await.unwrap().submit(None).await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Accepted);

    let raw = h.raw("cloud_search");
    assert_eq!(raw["status"], "waiting");
    assert_eq!(raw["search_enabled"], 1);

    let body = h.http.requests_to("POST", SUBMIT)[0].json_body().unwrap();
    let urls = urlencoding::decode(body["urls"].as_str().unwrap()).unwrap().replace('+', " ");
    let feeds: Vec<Value> = serde_json::from_str(&urls).unwrap();
    assert_eq!(feeds.len(), 5);
    assert_eq!(feeds[0]["category"], "course");
    assert_eq!(
        feeds[0]["url"],
        "http://school.test/api/courses?cursor=0&start=0&limit=100"
    );

    let callback = body["callback"].as_str().unwrap();
    assert!(callback.starts_with(CALLBACK));
    assert!(CallbackSigner::default().verify_callback_url(callback, TEST_ACCESS_KEY));
}

#[tokio::test]
async fn test_failed_submit_stays_closed() {
    let h = with_site();
    h.http.on_json("POST", SUBMIT, json!({"success": false, "error": "site unreachable"}));

    let outcome = h.ctx.indexing().await.unwrap().submit(None).await.unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Rejected {
            message: "site unreachable".to_string()
        }
    );
    assert_eq!(h.raw("cloud_search")["status"], "closed");
    assert_eq!(h.raw("cloud_search")["search_enabled"], 0);
}

#[tokio::test]
async fn test_unreachable_submit_stays_closed() {
    let h = with_site();
    h.http.fail_all();

    let err = h.ctx.indexing().await.unwrap().submit(None).await.unwrap_err();
    assert!(err.is_unreachable());
    assert_eq!(h.raw("cloud_search")["status"], "closed");
}

#[tokio::test]
async fn test_submit_while_waiting_is_noop() {
    let h = with_site();
    h.store.seed("cloud_search", json!({"search_enabled": 1, "status": "waiting"}));

    let outcome = h.ctx.indexing().await.unwrap().submit(None).await.unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::AlreadyActive {
            state: IndexingState::Waiting
        }
    );
    assert_eq!(h.http.count("POST", SUBMIT), 0);
}

#[tokio::test]
async fn test_submit_without_site_url_is_invalid_input() {
    let h = Harness::with_credential();
    let err = h.ctx.indexing().await.unwrap().submit(None).await.unwrap_err();
    assert!(matches!(err, CloudError::InvalidInput { .. }));
    assert_eq!(h.http.count("POST", SUBMIT), 0);
}

#[tokio::test]
async fn test_explicit_site_url_overrides_setting() {
    let h = with_site();
    h.http.on_json("POST", SUBMIT, json!({"success": "1"}));

    h.ctx
        .indexing()
        .await
        .unwrap()
        .submit(Some(" http://other.test// "))
        .await
        .unwrap();
    let body = h.http.requests_to("POST", SUBMIT)[0].json_body().unwrap();
    assert!(body["callback"]
        .as_str()
        .unwrap()
        .starts_with("http://other.test/edu_cloud/search/callback?sign="));
}

#[tokio::test]
async fn test_callback_while_closed_is_noop() {
    let h = Harness::with_credential();
    h.store.seed("cloud_search", json!({"search_enabled": 0, "status": "closed"}));

    let state = h.ctx.indexing().await.unwrap().on_callback_confirmed().await.unwrap();
    assert_eq!(state, IndexingState::Closed);
    assert_eq!(h.store.write_count("cloud_search"), 0);
}

#[tokio::test]
async fn test_signed_callback_completes_job() {
    let h = with_site();
    h.http.on_json("POST", SUBMIT, json!({"success": true}));
    let search = h.ctx.indexing().await.unwrap();
    search.submit(None).await.unwrap();

    let signed = CallbackSigner::default().signed_callback_url(CALLBACK, TEST_ACCESS_KEY);
    let state = search.accept_callback(&signed).await.unwrap();
    assert_eq!(state, IndexingState::Ok);
    assert_eq!(h.raw("cloud_search")["status"], "ok");

    // Terminal: a replay changes nothing
    let writes = h.store.write_count("cloud_search");
    assert_eq!(search.accept_callback(&signed).await.unwrap(), IndexingState::Ok);
    assert_eq!(h.store.write_count("cloud_search"), writes);
}

#[tokio::test]
async fn test_forged_callback_is_rejected() {
    let h = Harness::with_credential();
    h.store.seed("cloud_search", json!({"search_enabled": 1, "status": "waiting"}));
    let search = h.ctx.indexing().await.unwrap();

    let forged = CallbackSigner::default().signed_callback_url(CALLBACK, "someone-else");
    let err = search.accept_callback(&forged).await.unwrap_err();
    assert!(matches!(err, CloudError::InvalidInput { .. }));

    let unsigned = search.accept_callback(CALLBACK).await.unwrap_err();
    assert!(matches!(unsigned, CloudError::InvalidInput { .. }));
    assert_eq!(h.raw("cloud_search")["status"], "waiting");
}

#[tokio::test]
async fn test_close_resets_and_keeps_foreign_keys() {
    let h = Harness::with_credential();
    h.store.seed(
        "cloud_search",
        json!({"search_enabled": 1, "status": "ok", "indexed_at": 1700000000}),
    );

    let setting = h.ctx.indexing().await.unwrap().close().await.unwrap();
    assert_eq!(setting.status, IndexingState::Closed);

    let raw = h.raw("cloud_search");
    assert_eq!(raw["status"], "closed");
    assert_eq!(raw["search_enabled"], 0);
    assert_eq!(raw["indexed_at"], 1700000000);
}

#[tokio::test]
async fn test_connection_status() {
    let overview = "/users/test-access-key/overview";

    let h = Harness::with_credential();
    h.http.fail_all();
    let search = h.ctx.indexing().await.unwrap();
    assert_eq!(search.connection_status().await.unwrap(), ConnectionStatus::Unlink);

    let h = Harness::with_credential();
    h.http.on_json("GET", overview, json!({"service": {"email": {"status": "used"}}}));
    h.http.on_json("GET", "/me", json!({"level": "license"}));
    let search = h.ctx.indexing().await.unwrap();
    assert_eq!(search.connection_status().await.unwrap(), ConnectionStatus::Unconnect);

    let h = Harness::with_credential();
    h.http.on_json("GET", overview, json!({"service": {"storage": {"status": "used"}}}));
    h.http.on_json("GET", "/me", json!({"level": "none"}));
    let search = h.ctx.indexing().await.unwrap();
    assert_eq!(search.connection_status().await.unwrap(), ConnectionStatus::Unconnect);

    let h = Harness::with_credential();
    h.http.on_json("GET", overview, json!({"service": {"sms": {"status": "used"}}}));
    h.http.on_json("GET", "/me", json!({"level": "license"}));
    let search = h.ctx.indexing().await.unwrap();
    assert_eq!(search.connection_status().await.unwrap(), ConnectionStatus::Ready);
}
