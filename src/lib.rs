//! educloud - signed client and settings reconciliation for the EduCloud
//! add-on platform
//!
//! This library exposes modules for use by the CLI and integration tests.

pub mod adapters;
pub mod cli;
pub mod cloud;
pub mod config;
pub mod error;
pub mod reconcile;
pub mod settings;
pub mod traits;
