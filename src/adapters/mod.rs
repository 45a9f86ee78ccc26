//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`FileSettingsStore`] - One JSON file per settings category
//! - [`TracingAuditLog`] - Audit entries as `tracing` events
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles for all adapters:
//! - [`mock::MockHttpClient`] - Scripted HTTP responses
//! - [`mock::InMemorySettings`] - In-memory settings with failure switches
//! - [`mock::RecordingAuditLog`] - In-memory audit entries

pub mod file_settings;
pub mod mock;
pub mod reqwest_http;
pub mod tracing_audit;

pub use file_settings::FileSettingsStore;
pub use mock::{InMemorySettings, MockHttpClient, RecordingAuditLog};
pub use reqwest_http::ReqwestHttpClient;
pub use tracing_audit::TracingAuditLog;
