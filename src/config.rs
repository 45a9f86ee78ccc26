//! Client configuration.
//!
//! Defaults target the public cloud platform; every value can be overridden
//! from the environment or through the builder methods.

use std::path::PathBuf;
use std::time::Duration;

/// Default URL for the cloud platform API
pub const CLOUD_API_URL: &str = "http://api.edusoho.net/v1";

/// Edition an access key must belong to for self-hosted installs.
pub const REQUIRED_EDITION: &str = "opensource";

/// Configuration for the cloud client and reconcilers.
///
/// # Example
///
/// ```ignore
/// use educloud::config::CloudConfig;
///
/// let config = CloudConfig::default()
///     .with_api_url("http://localhost:9000")
///     .with_timeout_secs(5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CloudConfig {
    /// Base URL of the platform API, without trailing slash
    pub api_url: String,
    /// Per-request timeout enforced by the transport
    pub timeout_secs: u64,
    /// Directory holding one JSON file per settings category
    pub settings_dir: PathBuf,
    /// Edition required by `KeyVerifier`
    pub required_edition: String,
    /// How long a signed request stays valid on the platform side
    pub auth_ttl_secs: i64,
    /// Route of the search-indexing callback on this site
    pub callback_path: String,
    /// Sender used for a new email account when the site has no name
    pub default_sender: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            api_url: CLOUD_API_URL.to_string(),
            timeout_secs: 30,
            settings_dir: default_settings_dir(),
            required_edition: REQUIRED_EDITION.to_string(),
            auth_ttl_secs: 600,
            callback_path: "/edu_cloud/search/callback".to_string(),
            default_sender: "My School".to_string(),
        }
    }
}

impl CloudConfig {
    /// Create a new CloudConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the platform API URL.
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the transport timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the settings directory.
    pub fn with_settings_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings_dir = dir.into();
        self
    }

    /// Set the edition required for key installation.
    pub fn with_required_edition(mut self, edition: impl Into<String>) -> Self {
        self.required_edition = edition.into();
        self
    }

    /// Set the validity window of signed requests.
    pub fn with_auth_ttl_secs(mut self, secs: i64) -> Self {
        self.auth_ttl_secs = secs;
        self
    }

    /// Set the callback route.
    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = path.into();
        self
    }

    /// Set the fallback email sender.
    pub fn with_default_sender(mut self, sender: impl Into<String>) -> Self {
        self.default_sender = sender.into();
        self
    }

    /// Transport timeout as a `Duration`.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Create config from `EDUCLOUD_*` environment variables.
    ///
    /// Unparseable numeric values fall back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("EDUCLOUD_API_URL") {
            config = config.with_api_url(url);
        }
        if let Some(secs) = env_parse::<u64>("EDUCLOUD_TIMEOUT_SECS") {
            config.timeout_secs = secs;
        }
        if let Ok(dir) = std::env::var("EDUCLOUD_SETTINGS_DIR") {
            config.settings_dir = PathBuf::from(dir);
        }
        if let Ok(edition) = std::env::var("EDUCLOUD_REQUIRED_EDITION") {
            config.required_edition = edition;
        }
        if let Some(secs) = env_parse::<i64>("EDUCLOUD_AUTH_TTL_SECS") {
            config.auth_ttl_secs = secs;
        }
        if let Ok(path) = std::env::var("EDUCLOUD_CALLBACK_PATH") {
            config.callback_path = path;
        }
        if let Ok(sender) = std::env::var("EDUCLOUD_DEFAULT_SENDER") {
            config.default_sender = sender;
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn default_settings_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".educloud").join("settings"))
        .unwrap_or_else(|| PathBuf::from("settings"))
}
