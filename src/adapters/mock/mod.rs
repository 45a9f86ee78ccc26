//! Mock implementations for testing.
//!
//! Test doubles for every trait seam, usable without network or disk.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with scripted per-route responses
//! - [`InMemorySettings`] - Settings store with failure switches
//! - [`RecordingAuditLog`] - Audit log that keeps entries in memory

pub mod audit;
pub mod http;
pub mod settings;

pub use audit::RecordingAuditLog;
pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use settings::InMemorySettings;
