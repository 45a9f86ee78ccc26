//! Common test utilities for integration tests.
//!
//! # Example
//!
//! ```ignore
//! let h = Harness::with_credential();
//! h.http.on_json("GET", "/me/sms_account", json!({"status": "used", "name": "A"}));
//! let status = h.ctx.messaging().await.unwrap().refresh().await.unwrap();
//! ```

#![allow(dead_code)]

use std::sync::Arc;

use educloud::adapters::mock::{InMemorySettings, MockHttpClient, RecordingAuditLog};
use educloud::config::CloudConfig;
use educloud::reconcile::CloudContext;
use serde_json::{json, Map, Value};

pub const TEST_API_URL: &str = "http://api.test/v1";
pub const TEST_ACCESS_KEY: &str = "test-access-key";
pub const TEST_SECRET_KEY: &str = "test-secret-key";

/// Mocks wired into a [`CloudContext`].
pub struct Harness {
    pub http: MockHttpClient,
    pub store: Arc<InMemorySettings>,
    pub audit: RecordingAuditLog,
    pub ctx: CloudContext,
}

impl Harness {
    /// Harness with an empty settings store.
    pub fn new() -> Self {
        let http = MockHttpClient::new();
        let store = Arc::new(InMemorySettings::new());
        let audit = RecordingAuditLog::new();
        let ctx = CloudContext::new(
            Arc::new(http.clone()),
            store.clone(),
            Arc::new(audit.clone()),
            test_config(),
        );
        Self {
            http,
            store,
            audit,
            ctx,
        }
    }

    /// Harness with a stored credential.
    pub fn with_credential() -> Self {
        let harness = Self::new();
        harness.store.seed(
            "storage",
            json!({
                "cloud_access_key": TEST_ACCESS_KEY,
                "cloud_secret_key": TEST_SECRET_KEY,
                "cloud_key_applied": 1
            }),
        );
        harness
    }

    /// Raw category as a JSON value, `Null` when absent.
    pub fn raw(&self, category: &str) -> Value {
        self.store
            .raw(category)
            .map(Value::Object)
            .unwrap_or(Value::Null)
    }
}

pub fn test_config() -> CloudConfig {
    CloudConfig::default()
        .with_api_url(TEST_API_URL)
        .with_callback_path("/edu_cloud/search/callback")
        .with_default_sender("Default School")
}

/// Unwrap a JSON object literal.
pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {}", other),
    }
}
