//! Cloud platform protocol: credential, signed requests, response views,
//! key verification and callback signatures.

mod auth_token;
mod callback_sign;
mod client;
mod credential;
mod key_verifier;
pub mod views;

pub use auth_token::{AuthToken, AUTH_HEADER};
pub use callback_sign::{CallbackSigner, SignatureScheme};
pub use client::{Method, SignedClient};
pub use credential::Credential;
pub use key_verifier::{KeyVerifier, VerifiedKey};
pub use views::{
    AccountProfile, ApplicationStatus, EmailAccountView, Mutation, RemotePayload,
    SearchSubmission, ServiceOverview, SmsAccountView,
};
