//! Trait abstractions for dependency injection and testability.
//!
//! These are the seams between the reconciliation core and its external
//! collaborators.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (GET, POST)
//! - [`SettingsStore`] - Category-keyed settings persistence
//! - [`AuditLog`] - Business audit records

pub mod audit;
pub mod http;
pub mod settings;

pub use audit::{AuditEntry, AuditLevel, AuditLog};
pub use http::{Headers, HttpClient, Response};
pub use settings::{SettingsError, SettingsStore};
