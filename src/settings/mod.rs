//! Typed access to the host's settings store.
//!
//! The store is injected; there is no process-wide settings singleton.
//! Every read and write moves a whole category. Concurrent writers to the
//! same category race and the last one wins.

mod categories;
pub mod serde_ext;
mod status;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::CloudResult;
use crate::traits::{SettingsError, SettingsStore};

pub use categories::{
    EmailSetting, MailerSetting, SearchSetting, SiteSetting, SmsNotification, SmsSetting,
    StorageSetting,
};
pub use status::{IndexingState, ServiceState, ServiceStatus};

/// A settings category with a fixed store key.
pub trait SettingCategory: Serialize + DeserializeOwned + Default {
    const KEY: &'static str;
}

/// Typed facade over a [`SettingsStore`].
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn SettingsStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    /// Load a category, or `None` if it was never written.
    pub async fn load_existing<T: SettingCategory>(&self) -> CloudResult<Option<T>> {
        let Some(map) = self.store.get(T::KEY).await? else {
            return Ok(None);
        };
        let value = serde_json::from_value(Value::Object(map)).map_err(|e| {
            SettingsError::Serialization(format!("category '{}': {}", T::KEY, e))
        })?;
        Ok(Some(value))
    }

    /// Load a category, falling back to its default.
    pub async fn load<T: SettingCategory>(&self) -> CloudResult<T> {
        Ok(self.load_existing().await?.unwrap_or_default())
    }

    /// Replace a category.
    pub async fn save<T: SettingCategory>(&self, value: &T) -> CloudResult<()> {
        let map = match serde_json::to_value(value) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                return Err(SettingsError::Serialization(format!(
                    "category '{}' is not a map",
                    T::KEY
                ))
                .into())
            }
            Err(e) => {
                return Err(SettingsError::Serialization(format!("category '{}': {}", T::KEY, e)).into())
            }
        };
        debug!(category = T::KEY, "saving settings");
        self.store.set(T::KEY, map).await?;
        Ok(())
    }
}
