//! Gatekeeper for installing a credential.
//!
//! A key pair is accepted only when the platform verifies it and the account
//! behind it belongs to the required edition. The verifier never persists
//! anything.

use tracing::{info, warn};

use super::client::SignedClient;
use super::credential::Credential;
use super::views::{AccountProfile, RemotePayload};
use crate::error::{CloudError, CloudResult};

/// A credential that passed verification, with the profile it was checked against.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedKey {
    pub credential: Credential,
    pub profile: AccountProfile,
}

pub struct KeyVerifier {
    client: SignedClient,
    required_edition: String,
}

impl KeyVerifier {
    /// `client` supplies transport and base URL; any credential it holds is
    /// replaced by the candidate pair.
    pub fn new(client: SignedClient, required_edition: impl Into<String>) -> Self {
        Self {
            client,
            required_edition: required_edition.into(),
        }
    }

    pub fn required_edition(&self) -> &str {
        &self.required_edition
    }

    /// Verify a candidate key pair.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a blank key
    /// - `RemoteRejected` when the platform refuses the pair
    /// - `PolicyRejected` when the pair is valid but the edition is wrong
    /// - `Unreachable` / `InvalidResponse` on transport trouble
    pub async fn verify(&self, access_key: &str, secret_key: &str) -> CloudResult<VerifiedKey> {
        let credential = Credential::new(access_key, secret_key)?;
        let client = self.client.clone().with_credential(credential.clone());

        let endpoint = format!(
            "/keys/{}/verification",
            urlencoding::encode(credential.access_key())
        );
        let verification = client.post(&endpoint, None).await?;
        reject_on_error(&endpoint, &verification, "credential rejected by remote")?;

        let me = client.get("/me", None).await?;
        reject_on_error("/me", &me, "account profile unavailable")?;
        let profile = AccountProfile::from_payload(&me);

        if profile.edition.as_deref() != Some(self.required_edition.as_str()) {
            warn!(
                access_key = credential.access_key(),
                edition = profile.edition.as_deref().unwrap_or("unknown"),
                required = %self.required_edition,
                "access key has wrong edition"
            );
            return Err(CloudError::PolicyRejected {
                edition: profile.edition.clone(),
                required: self.required_edition.clone(),
            });
        }

        info!(access_key = credential.access_key(), "access key verified");
        Ok(VerifiedKey {
            credential,
            profile,
        })
    }
}

fn reject_on_error(endpoint: &str, payload: &RemotePayload, reason: &str) -> CloudResult<()> {
    match payload.error_message() {
        Some(message) => {
            warn!(endpoint, %message, "{}", reason);
            Err(CloudError::RemoteRejected {
                endpoint: endpoint.to_string(),
                message: format!("{}: {}", reason, message),
            })
        }
        None => Ok(()),
    }
}
