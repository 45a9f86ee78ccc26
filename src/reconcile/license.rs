//! Access key installation and license-domain binding.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::cloud::{AccountProfile, KeyVerifier, SignedClient, VerifiedKey};
use crate::error::{CloudError, CloudResult};
use crate::settings::{Settings, StorageSetting};

const LICENSE_DOMAIN_PATH: &str = "/me/license-domain";

/// Result of a license-domain bind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainBinding {
    pub bound: bool,
    pub domain: String,
    pub license_domains: Vec<String>,
}

pub struct CredentialManager {
    client: SignedClient,
    settings: Settings,
    required_edition: String,
}

impl CredentialManager {
    /// `client` may be unbound; `install` supplies its own credential.
    pub fn new(client: SignedClient, settings: Settings, required_edition: impl Into<String>) -> Self {
        Self {
            client,
            settings,
            required_edition: required_edition.into(),
        }
    }

    /// Verify a key pair without storing it.
    pub async fn verify(&self, access_key: &str, secret_key: &str) -> CloudResult<VerifiedKey> {
        KeyVerifier::new(self.client.clone(), self.required_edition.clone())
            .verify(access_key, secret_key)
            .await
    }

    /// Verify a key pair and, only if accepted, store it.
    ///
    /// Both halves and the applied flag land in one `storage` write.
    pub async fn install(&self, access_key: &str, secret_key: &str) -> CloudResult<VerifiedKey> {
        let verified = self.verify(access_key, secret_key).await?;

        let mut storage: StorageSetting = self.settings.load().await?;
        storage.install(&verified.credential);
        self.settings.save(&storage).await?;

        info!(access_key = verified.credential.access_key(), "access key installed");
        Ok(verified)
    }

    /// Fetch the bound account and sync the key-applied flag with it.
    pub async fn refresh_key_info(&self) -> CloudResult<AccountProfile> {
        let profile = AccountProfile::from_payload(&self.client.get("/me", None).await?);

        let mut storage: StorageSetting = self.settings.load().await?;
        let applied = profile.has_access_key();
        if storage.cloud_key_applied != applied {
            storage.cloud_key_applied = applied;
            self.settings.save(&storage).await?;
            info!(applied, "key-applied flag updated");
        }
        Ok(profile)
    }

    /// Register `host` as a licensed domain of the bound account.
    pub async fn bind_license_domain(&self, host: &str) -> CloudResult<DomainBinding> {
        let host = host.trim();
        if host.is_empty() {
            return Err(CloudError::invalid_input("domain", "A host name is required"));
        }

        let mut params = Map::new();
        params.insert("domain".to_string(), Value::String(host.to_string()));
        let payload = self.client.post(LICENSE_DOMAIN_PATH, Some(&params)).await?;
        let license_domains = AccountProfile::from_payload(&payload).license_domains;

        let bound = !license_domains.is_empty();
        if bound {
            info!(domain = host, "license domain bound");
        } else {
            warn!(
                domain = host,
                error = payload.error_message().as_deref().unwrap_or(""),
                "license domain bind failed"
            );
        }
        Ok(DomainBinding {
            bound,
            domain: host.to_string(),
            license_domains,
        })
    }
}

/// Whether `host` names this machine or a private network.
///
/// Local addresses cannot be bound as license domains. A trailing `:port`
/// is ignored.
pub fn is_local_address(host: &str) -> bool {
    let host = host.trim();
    let host = match host.rsplit_once(':') {
        Some((name, port)) if !name.contains(':') && port.chars().all(|c| c.is_ascii_digit()) => {
            name
        }
        _ => host,
    };
    host == "localhost"
        || host == "127.0.0.1"
        || host.starts_with("192.168.")
        || host.starts_with("10.")
}
