//! Reconcilers that keep local settings in step with the cloud platform.
//!
//! Each reconciler borrows nothing global: the HTTP transport, the
//! settings store and the audit sink are handed in through
//! [`CloudContext`].

mod email;
mod indexing;
mod license;
mod messaging;

use std::sync::Arc;

use tracing::debug;

use crate::cloud::{CallbackSigner, SignedClient};
use crate::config::CloudConfig;
use crate::error::{CloudError, CloudResult};
use crate::settings::{Settings, StorageSetting};
use crate::traits::{AuditLog, HttpClient, SettingsStore};

pub use email::{EmailIntent, EmailReconciler};
pub use indexing::{ConnectionStatus, IndexingStateMachine, SubmitOutcome};
pub use license::{is_local_address, CredentialManager, DomainBinding};
pub use messaging::{MessagingIntent, MessagingReconciler, SignatureUpdate};

/// Collaborators shared by every reconciler.
#[derive(Clone)]
pub struct CloudContext {
    http: Arc<dyn HttpClient>,
    settings: Settings,
    audit: Arc<dyn AuditLog>,
    config: CloudConfig,
}

impl CloudContext {
    pub fn new(
        http: Arc<dyn HttpClient>,
        store: Arc<dyn SettingsStore>,
        audit: Arc<dyn AuditLog>,
        config: CloudConfig,
    ) -> Self {
        Self {
            http,
            settings: Settings::new(store),
            audit,
            config,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    /// A client without a credential, for verifying candidate keys.
    pub fn unbound_client(&self) -> SignedClient {
        SignedClient::from_config(self.http.clone(), &self.config)
    }

    /// A client bound to the stored credential.
    ///
    /// Fails with `MissingCredential` when no key pair is stored.
    pub async fn signed_client(&self) -> CloudResult<SignedClient> {
        let storage: StorageSetting = self.settings.load().await?;
        let credential = storage.credential().ok_or(CloudError::MissingCredential)?;
        debug!(access_key = credential.access_key(), "using stored credential");
        Ok(self.unbound_client().with_credential(credential))
    }

    pub fn credentials(&self) -> CredentialManager {
        CredentialManager::new(
            self.unbound_client(),
            self.settings.clone(),
            self.config.required_edition.clone(),
        )
    }

    /// Credential manager bound to the stored key, for key info and binding.
    pub async fn bound_credentials(&self) -> CloudResult<CredentialManager> {
        Ok(CredentialManager::new(
            self.signed_client().await?,
            self.settings.clone(),
            self.config.required_edition.clone(),
        ))
    }

    pub async fn messaging(&self) -> CloudResult<MessagingReconciler> {
        Ok(MessagingReconciler::new(
            self.signed_client().await?,
            self.settings.clone(),
        ))
    }

    pub async fn email(&self) -> CloudResult<EmailReconciler> {
        Ok(EmailReconciler::new(
            self.signed_client().await?,
            self.settings.clone(),
            self.audit.clone(),
            self.config.default_sender.clone(),
        ))
    }

    pub async fn indexing(&self) -> CloudResult<IndexingStateMachine> {
        Ok(IndexingStateMachine::new(
            self.signed_client().await?,
            self.settings.clone(),
            CallbackSigner::default(),
            self.config.callback_path.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{InMemorySettings, MockHttpClient, RecordingAuditLog};
    use serde_json::json;

    fn context(store: Arc<InMemorySettings>) -> CloudContext {
        CloudContext::new(
            Arc::new(MockHttpClient::new()),
            store,
            Arc::new(RecordingAuditLog::new()),
            CloudConfig::default().with_api_url("http://api.test/v1"),
        )
    }

    #[tokio::test]
    async fn test_reconcilers_require_stored_credential() {
        let ctx = context(Arc::new(InMemorySettings::new()));
        assert_eq!(ctx.messaging().await.err(), Some(CloudError::MissingCredential));
        assert_eq!(ctx.indexing().await.err(), Some(CloudError::MissingCredential));
        assert!(ctx.unbound_client().credential().is_none());
    }

    #[tokio::test]
    async fn test_signed_client_uses_stored_credential() {
        let store = Arc::new(InMemorySettings::new());
        store.seed(
            "storage",
            json!({"cloud_access_key": "ak", "cloud_secret_key": "sk"}),
        );
        let ctx = context(store);
        let client = ctx.signed_client().await.unwrap();
        assert_eq!(client.access_key().unwrap(), "ak");
        assert_eq!(client.base_url(), "http://api.test/v1");
    }
}
