//! Settings store trait abstraction.
//!
//! The host application owns a key-value settings store where each
//! category (`storage`, `cloud_sms`, `cloud_email`, ...) maps to a flat JSON
//! object. This trait is the narrow contract the reconcilers consume; it is
//! last-write-wins with no transactions.

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Settings operation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    /// Failed to read a category
    LoadFailed(String),
    /// Failed to write a category
    SaveFailed(String),
    /// IO error
    Io(String),
    /// Serialization/deserialization error
    Serialization(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::LoadFailed(msg) => write!(f, "Failed to load settings: {}", msg),
            SettingsError::SaveFailed(msg) => write!(f, "Failed to save settings: {}", msg),
            SettingsError::Io(msg) => write!(f, "IO error: {}", msg),
            SettingsError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            SettingsError::Other(msg) => write!(f, "Settings error: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

/// Trait for category-keyed settings storage.
///
/// # Returns
/// `get` yields `Ok(None)` when the category has never been written.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Read the whole map stored under `category`.
    async fn get(&self, category: &str) -> Result<Option<Map<String, Value>>, SettingsError>;

    /// Replace the whole map stored under `category`.
    async fn set(&self, category: &str, value: Map<String, Value>) -> Result<(), SettingsError>;
}
