//! Messaging reconciliation against a scripted platform.

mod common;

use common::{object, Harness};
use educloud::error::CloudError;
use educloud::reconcile::{MessagingIntent, SignatureUpdate};
use educloud::settings::{ServiceState, ServiceStatus, SmsNotification};
use serde_json::json;

const ACCOUNT: &str = "/me/sms_account";
const CREATE: &str = "/sms_accounts";

#[tokio::test]
async fn test_open_creates_account_and_persists_enabled() {
    let h = Harness::with_credential();
    h.http.on_json("POST", CREATE, json!({"status": "ok"}));
    h.http.on_json("GET", ACCOUNT, json!({"status": "enable", "name": "MySchool"}));

    let sms = h.ctx.messaging().await.unwrap();
    let status = sms.open(Some("MySchool")).await.unwrap();

    assert_eq!(status, ServiceStatus::new(true, ServiceState::Enable, "MySchool"));
    let raw = h.raw("cloud_sms");
    assert_eq!(raw["sms_enabled"], 1);
    assert_eq!(raw["status"], "enable");
    assert_eq!(raw["sms_school_name"], "MySchool");

    let create = &h.http.requests_to("POST", CREATE)[0];
    assert_eq!(create.json_body().unwrap(), json!({"name": "MySchool"}));
}

#[tokio::test]
async fn test_second_open_only_refreshes() {
    let h = Harness::with_credential();
    h.http.on_json("POST", CREATE, json!({"status": "ok"}));
    h.http.on_json("GET", ACCOUNT, json!({"status": "enable", "name": "MySchool"}));

    let sms = h.ctx.messaging().await.unwrap();
    sms.open(Some("MySchool")).await.unwrap();
    let second = sms.open(Some("MySchool")).await.unwrap();
    assert_eq!(h.http.count("POST", CREATE), 1);

    let refreshed = sms.refresh().await.unwrap();
    assert_eq!(second, refreshed);
    assert_eq!(h.http.count("POST", CREATE), 1);
}

#[tokio::test]
async fn test_open_without_any_name_is_invalid_input() {
    let h = Harness::with_credential();
    let sms = h.ctx.messaging().await.unwrap();

    let err = sms.open(Some("  ")).await.unwrap_err();
    assert!(matches!(err, CloudError::InvalidInput { .. }));
    assert!(h.http.get_requests().is_empty());
    assert!(h.store.raw("cloud_sms").is_none());
}

#[tokio::test]
async fn test_failed_creation_is_error_status_not_enabled() {
    let h = Harness::with_credential();
    h.http.on_json("POST", CREATE, json!({"error": "quota exceeded"}));

    let status = h.ctx.messaging().await.unwrap().open(Some("MySchool")).await.unwrap();
    assert!(!status.enabled);
    assert!(status.is_error());
    assert_eq!(status.last_error.as_deref(), Some("quota exceeded"));
    assert_eq!(h.http.count("GET", ACCOUNT), 0);
    assert_eq!(h.raw("cloud_sms")["sms_enabled"], 0);
}

#[tokio::test]
async fn test_refresh_self_heals_missing_account() {
    let h = Harness::with_credential();
    h.store.seed(
        "cloud_sms",
        json!({"sms_enabled": 1, "status": "enable", "sms_school_name": "MySchool"}),
    );
    h.http.on_json("GET", ACCOUNT, json!({"error": "account not found"}));
    h.http.on_json("GET", ACCOUNT, json!({"status": "enable", "name": "MySchool"}));
    h.http.on_json("POST", CREATE, json!({"status": "ok"}));

    let status = h.ctx.messaging().await.unwrap().refresh().await.unwrap();

    assert!(status.enabled);
    assert_eq!(status.status, ServiceState::Enable);
    let create = &h.http.requests_to("POST", CREATE)[0];
    assert_eq!(create.json_body().unwrap()["name"], "MySchool");
    assert_eq!(h.http.count("GET", ACCOUNT), 2);
}

#[tokio::test]
async fn test_refresh_disabled_missing_account_does_not_create() {
    let h = Harness::with_credential();
    h.store.seed("cloud_sms", json!({"sms_enabled": 0, "sms_school_name": "MySchool"}));
    h.http.on_json("GET", ACCOUNT, json!({"error": "不存在短信账号"}));

    let status = h.ctx.messaging().await.unwrap().refresh().await.unwrap();
    assert_eq!(status, ServiceStatus::new(false, ServiceState::Disable, "MySchool"));
    assert_eq!(h.http.count("POST", CREATE), 0);
}

#[tokio::test]
async fn test_refresh_maps_remote_status_words() {
    let h = Harness::with_credential();
    h.store.seed("cloud_sms", json!({"sms_enabled": 1, "sms_school_name": "A"}));
    h.http.on_json("GET", ACCOUNT, json!({"status": "checking", "name": "A"}));

    let status = h.ctx.messaging().await.unwrap().refresh().await.unwrap();
    assert_eq!(status.status, ServiceState::Waiting);
    assert_eq!(h.raw("cloud_sms")["status"], "waiting");
}

#[tokio::test]
async fn test_business_rejection_keeps_messaging_enabled() {
    let h = Harness::with_credential();
    h.store.seed(
        "cloud_sms",
        json!({"sms_enabled": 1, "status": "enable", "sms_school_name": "MySchool"}),
    );
    h.http.on_json("GET", ACCOUNT, json!({"error": "service busy"}));
    h.http.on_json("GET", ACCOUNT, json!({"status": "enable", "name": "MySchool"}));

    let sms = h.ctx.messaging().await.unwrap();
    let status = sms.refresh().await.unwrap();
    assert!(status.enabled);
    assert!(status.is_error());
    assert_eq!(status.last_error.as_deref(), Some("service busy"));

    let raw = h.raw("cloud_sms");
    assert_eq!(raw["sms_enabled"], 1);
    assert_eq!(raw["status"], "error");
    assert_eq!(raw["sms_school_name"], "MySchool");

    // Platform recovered
    let status = sms.refresh().await.unwrap();
    assert_eq!(status, ServiceStatus::new(true, ServiceState::Enable, "MySchool"));
}

#[tokio::test]
async fn test_failed_self_heal_keeps_messaging_enabled() {
    let h = Harness::with_credential();
    h.store.seed(
        "cloud_sms",
        json!({"sms_enabled": 1, "status": "enable", "sms_school_name": "MySchool"}),
    );
    h.http.on_json("GET", ACCOUNT, json!({"error": "account not found"}));
    h.http.on_json("POST", CREATE, json!({"error": "quota exceeded"}));

    let status = h.ctx.messaging().await.unwrap().open(None).await.unwrap();
    assert!(status.enabled);
    assert_eq!(status.last_error.as_deref(), Some("quota exceeded"));
    assert_eq!(h.raw("cloud_sms")["sms_enabled"], 1);
}

#[tokio::test]
async fn test_close_while_unreachable_still_disables() {
    let h = Harness::with_credential();
    h.store.seed(
        "cloud_sms",
        json!({"sms_enabled": 1, "status": "enable", "sms_school_name": "MySchool"}),
    );
    h.http.fail_all();

    let status = h.ctx.messaging().await.unwrap().close().await.unwrap();
    assert!(!status.enabled);
    assert_eq!(status.status, ServiceState::Enable);
    assert_eq!(status.signature_name, "MySchool");
    assert!(status.last_error.is_some());

    let raw = h.raw("cloud_sms");
    assert_eq!(raw["sms_enabled"], 0);
    assert_eq!(raw["sms_school_name"], "MySchool");
}

#[tokio::test]
async fn test_unreachable_refresh_keeps_stored_state() {
    let h = Harness::with_credential();
    h.store.seed(
        "cloud_sms",
        json!({"sms_enabled": 1, "status": "enable", "sms_school_name": "MySchool"}),
    );
    h.http.fail_all();

    let err = h.ctx.messaging().await.unwrap().refresh().await.unwrap_err();
    assert!(err.is_unreachable());
    assert_eq!(h.store.write_count("cloud_sms"), 0);
}

#[tokio::test]
async fn test_rejected_rename_leaves_state_untouched() {
    let h = Harness::with_credential();
    h.store.seed(
        "cloud_sms",
        json!({"sms_enabled": 1, "status": "enable", "sms_school_name": "Old"}),
    );
    h.http.on_json("POST", ACCOUNT, json!({"error": "name contains forbidden words"}));

    let sms = h.ctx.messaging().await.unwrap();
    let update = sms.set_signature("New").await.unwrap();

    match update {
        SignatureUpdate::Rejected { current, message } => {
            assert_eq!(current.signature_name, "Old");
            assert_eq!(message, "name contains forbidden words");
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert_eq!(h.store.write_count("cloud_sms"), 0);
    assert_eq!(h.raw("cloud_sms")["sms_school_name"], "Old");
}

#[tokio::test]
async fn test_accepted_rename_is_persisted() {
    let h = Harness::with_credential();
    h.store.seed(
        "cloud_sms",
        json!({"sms_enabled": 1, "status": "enable", "sms_school_name": "Old"}),
    );
    h.http.on_json("POST", ACCOUNT, json!({"status": "ok"}));
    h.http.on_json("GET", ACCOUNT, json!({"status": "used", "name": "New"}));

    let update = h.ctx.messaging().await.unwrap().set_signature("New").await.unwrap();
    assert_eq!(
        update,
        SignatureUpdate::Applied(ServiceStatus::new(true, ServiceState::Enable, "New"))
    );
    assert_eq!(h.raw("cloud_sms")["sms_school_name"], "New");
}

#[tokio::test]
async fn test_configure_cascades_buy_notify() {
    let h = Harness::with_credential();
    h.store.seed("cloud_sms", json!({"sms_enabled": 1, "sms_school_name": "A"}));
    h.http.on_json("GET", ACCOUNT, json!({"status": "enable", "name": "A"}));

    let sms = h.ctx.messaging().await.unwrap();
    sms.configure(&[
        (SmsNotification::Registration, true),
        (SmsNotification::OrderPaySuccess, true),
        (SmsNotification::CourseBuyNotify, false),
    ])
    .await
    .unwrap();

    let raw = h.raw("cloud_sms");
    assert_eq!(raw["sms_registration"], "on");
    assert_eq!(raw["sms_order_pay_success"], "on");
    for notification in SmsNotification::BUY_NOTIFY {
        assert_eq!(raw[notification.key().as_str()], "on");
    }
    assert_eq!(raw["status"], "enable");
}

#[tokio::test]
async fn test_reconcile_dispatches_form_intent() {
    let h = Harness::with_credential();
    h.store.seed("cloud_sms", json!({"sms_enabled": 1, "sms_school_name": "A"}));
    h.http.on_json("GET", ACCOUNT, json!({"status": "enable", "name": "A"}));

    let intent = MessagingIntent::from_form(&object(json!({"sms-close": "1"})));
    let status = h.ctx.messaging().await.unwrap().reconcile(intent).await.unwrap();
    assert!(!status.enabled);
    assert_eq!(h.raw("cloud_sms")["sms_enabled"], 0);
}

#[tokio::test]
async fn test_apply_validates_width_before_io() {
    let h = Harness::with_credential();
    let sms = h.ctx.messaging().await.unwrap();

    assert!(matches!(
        sms.apply("a").await.unwrap_err(),
        CloudError::InvalidInput { .. }
    ));
    assert!(matches!(
        sms.apply("一二三四五六七八九").await.unwrap_err(),
        CloudError::InvalidInput { .. }
    ));
    assert!(h.http.get_requests().is_empty());
}

#[tokio::test]
async fn test_apply_stores_candidate_and_shows_notice() {
    let h = Harness::with_credential();
    h.http.on_json("POST", "/apply", json!({"status": "ok"}));

    let sms = h.ctx.messaging().await.unwrap();
    sms.apply("新学校").await.unwrap();

    let raw = h.raw("cloud_sms");
    assert_eq!(raw["sms_school_candidate_name"], "新学校");
    assert_eq!(raw["show_message"], "on");
    let request = &h.http.requests_to("POST", "/apply")[0];
    assert!(request.path.ends_with("/sms/test-access-key/apply"));

    sms.dismiss_notice().await.unwrap();
    assert_eq!(h.raw("cloud_sms")["show_message"], "off");
}

#[tokio::test]
async fn test_apply_rejection_is_remote_rejected() {
    let h = Harness::with_credential();
    h.http.on_json("POST", "/apply", json!({"error": "pending review"}));

    let err = h.ctx.messaging().await.unwrap().apply("新学校").await.unwrap_err();
    assert!(matches!(err, CloudError::RemoteRejected { .. }));
    assert!(h.store.raw("cloud_sms").is_none());
}

#[tokio::test]
async fn test_application_status() {
    let h = Harness::with_credential();
    h.http.on_json(
        "POST",
        "/applyResult",
        json!({"apply": {"status": "failed", "message": "name in use"}}),
    );

    let result = h
        .ctx
        .messaging()
        .await
        .unwrap()
        .application_status()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(result.status, "failed");
    assert_eq!(result.message.as_deref(), Some("name in use"));
}
