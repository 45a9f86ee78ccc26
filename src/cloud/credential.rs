//! Access key / secret key pair for the cloud platform.
//!
//! A credential is replaced wholesale, never edited field by field. It is
//! persisted in the `storage` settings category; see
//! [`crate::settings::StorageSetting`].

use std::fmt;

use crate::error::{CloudError, CloudResult};

/// An immutable access key / secret key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    access_key: String,
    secret_key: String,
}

impl Credential {
    /// Build a credential, rejecting blank halves.
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> CloudResult<Self> {
        let access_key = access_key.into().trim().to_string();
        let secret_key = secret_key.into().trim().to_string();

        if access_key.is_empty() {
            return Err(CloudError::invalid_input("accessKey", "Access key must not be empty"));
        }
        if secret_key.is_empty() {
            return Err(CloudError::invalid_input("secretKey", "Secret key must not be empty"));
        }

        Ok(Self {
            access_key,
            secret_key,
        })
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key", &self.access_key)
            .field("secret_key", &"******")
            .finish()
    }
}
