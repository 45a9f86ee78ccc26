//! Error handling for the cloud integration.
//!
//! - **Error Categories**: what the admin layer should show
//! - **Network Errors**: transport-level failures
//! - **Unified Error Type**: `CloudError` and the `CloudResult<T>` alias
//!
//! # Error Categories
//!
//! | Category | Description | Remediation |
//! |----------|-------------|-------------|
//! | Unreachable | No usable response | Try again later |
//! | RemoteRejected | Platform refused | Re-issue credential |
//! | PolicyRejected | Wrong edition | Contact support |
//! | User | Bad input / no key | Fix input |
//! | Storage | Settings store failed | Check disk |

mod category;
mod cloud_error;
mod network;

pub use category::ErrorCategory;
pub use cloud_error::{CloudError, CloudResult};
pub use network::{classify_reqwest_error, NetworkError};
