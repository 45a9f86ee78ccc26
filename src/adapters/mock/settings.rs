//! In-memory settings store for testing.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{SettingsError, SettingsStore};

/// In-memory settings store for testing.
///
/// Keeps every write in order so tests can assert that a failed
/// reconciliation wrote nothing.
///
/// # Example
///
/// ```ignore
/// use educloud::adapters::mock::InMemorySettings;
/// use serde_json::json;
///
/// let store = InMemorySettings::new();
/// store.seed("cloud_sms", json!({"sms_enabled": 1, "sms_school_name": "A"}));
///
/// // ...drive a reconciler...
///
/// assert_eq!(store.write_count("cloud_sms"), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemorySettings {
    categories: Arc<Mutex<HashMap<String, Map<String, Value>>>>,
    writes: Arc<Mutex<Vec<(String, Map<String, Value>)>>>,
    load_should_fail: Arc<Mutex<bool>>,
    save_should_fail: Arc<Mutex<bool>>,
}

impl InMemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a category without recording it as a write.
    ///
    /// Non-object values are ignored.
    pub fn seed(&self, category: &str, value: Value) {
        if let Value::Object(map) = value {
            self.categories
                .lock()
                .unwrap()
                .insert(category.to_string(), map);
        }
    }

    /// Current raw map of a category.
    pub fn raw(&self, category: &str) -> Option<Map<String, Value>> {
        self.categories.lock().unwrap().get(category).cloned()
    }

    /// Number of `set` calls for a category.
    pub fn write_count(&self, category: &str) -> usize {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(c, _)| c == category)
            .count()
    }

    /// Every `set` call in order.
    pub fn writes(&self) -> Vec<(String, Map<String, Value>)> {
        self.writes.lock().unwrap().clone()
    }

    /// Configure whether reads should fail.
    pub fn fail_reads(&self, should_fail: bool) {
        *self.load_should_fail.lock().unwrap() = should_fail;
    }

    /// Configure whether writes should fail.
    pub fn fail_writes(&self, should_fail: bool) {
        *self.save_should_fail.lock().unwrap() = should_fail;
    }
}

#[async_trait]
impl SettingsStore for InMemorySettings {
    async fn get(&self, category: &str) -> Result<Option<Map<String, Value>>, SettingsError> {
        if *self.load_should_fail.lock().unwrap() {
            return Err(SettingsError::LoadFailed("Mock load failure".to_string()));
        }
        Ok(self.raw(category))
    }

    async fn set(&self, category: &str, value: Map<String, Value>) -> Result<(), SettingsError> {
        if *self.save_should_fail.lock().unwrap() {
            return Err(SettingsError::SaveFailed("Mock save failure".to_string()));
        }
        self.writes
            .lock()
            .unwrap()
            .push((category.to_string(), value.clone()));
        self.categories
            .lock()
            .unwrap()
            .insert(category.to_string(), value);
        Ok(())
    }
}
