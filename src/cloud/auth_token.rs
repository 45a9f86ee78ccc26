//! Per-request authentication token.
//!
//! Every call to the platform carries an `Auth` header of the form
//! `{accessKey}:{deadline}:{nonce}:{signature}`. The signature is an
//! HMAC-SHA256 keyed with the secret key over the canonical request, so a
//! captured header cannot be replayed against another endpoint, another
//! body, or after its deadline.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::credential::Credential;
use crate::error::{CloudError, CloudResult};

type HmacSha256 = Hmac<Sha256>;

/// Name of the header carrying the token.
pub const AUTH_HEADER: &str = "Auth";

/// A signed request token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub access_key: String,
    /// Unix timestamp after which the platform rejects the request
    pub deadline: i64,
    pub nonce: String,
    /// Lowercase hex HMAC-SHA256
    pub signature: String,
}

impl AuthToken {
    /// Sign a request.
    ///
    /// `uri` is the path plus query string as sent on the wire, `body` the
    /// exact request body (empty for GET).
    pub fn issue(
        credential: &Credential,
        method: &str,
        uri: &str,
        body: &str,
        deadline: i64,
        nonce: &str,
    ) -> CloudResult<Self> {
        let signature = compute_signature(credential.secret_key(), method, uri, body, deadline, nonce)?;
        Ok(Self {
            access_key: credential.access_key().to_string(),
            deadline,
            nonce: nonce.to_string(),
            signature,
        })
    }

    /// Header value.
    pub fn header_value(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.access_key, self.deadline, self.nonce, self.signature
        )
    }

    /// Check this token against a request, as the platform does.
    pub fn verify(&self, secret_key: &str, method: &str, uri: &str, body: &str, now: i64) -> bool {
        if now > self.deadline {
            return false;
        }
        let Ok(expected) = hex::decode(&self.signature) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret_key.as_bytes()) else {
            return false;
        };
        mac.update(canonical_request(method, uri, body, self.deadline, &self.nonce).as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

fn canonical_request(method: &str, uri: &str, body: &str, deadline: i64, nonce: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}\n{}",
        nonce,
        deadline,
        method.to_ascii_uppercase(),
        uri,
        body
    )
}

fn compute_signature(
    secret_key: &str,
    method: &str,
    uri: &str,
    body: &str,
    deadline: i64,
    nonce: &str,
) -> CloudResult<String> {
    let mut mac = HmacSha256::new_from_slice(secret_key.as_bytes())
        .map_err(|err| CloudError::invalid_input("secret_key", format!("Unusable secret key: {}", err)))?;
    mac.update(canonical_request(method, uri, body, deadline, nonce).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
