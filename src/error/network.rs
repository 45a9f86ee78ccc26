//! Network-related error types.
//!
//! This module defines errors that occur before a usable response is
//! obtained from the cloud platform: connection, DNS, TLS, timeouts and
//! server-side failures that carry no business payload.

use std::fmt;

/// Network-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// Connection to the server failed.
    ConnectionFailed { url: String, message: String },

    /// DNS resolution failed.
    DnsResolutionFailed { host: String },

    /// Request timed out.
    Timeout { operation: String, duration_secs: u64 },

    /// TLS/SSL error.
    TlsError { message: String },

    /// HTTP status error without a readable payload.
    HttpStatus { status: u16, message: String },

    /// Response body could not be read.
    InvalidResponse { message: String },

    /// Malformed request URL.
    InvalidUrl { url: String },

    /// Generic network error.
    Other { message: String },
}

impl NetworkError {
    /// Check if this error is likely transient.
    ///
    /// The core never retries on its own; this only informs the caller
    /// whether asking the user to try again later is sensible.
    pub fn is_transient(&self) -> bool {
        match self {
            NetworkError::ConnectionFailed { .. } => true,
            NetworkError::DnsResolutionFailed { .. } => true,
            NetworkError::Timeout { .. } => true,
            NetworkError::TlsError { .. } => false,
            NetworkError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            NetworkError::InvalidResponse { .. } => false,
            NetworkError::InvalidUrl { .. } => false,
            NetworkError::Other { .. } => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            NetworkError::ConnectionFailed { .. } => {
                "Unable to reach the cloud platform. Please check the server's network connection.".to_string()
            }
            NetworkError::DnsResolutionFailed { host } => {
                format!(
                    "Could not resolve the cloud platform address '{}'. Please check DNS settings.",
                    host
                )
            }
            NetworkError::Timeout {
                operation,
                duration_secs,
            } => {
                format!(
                    "The {} operation timed out after {} seconds. The cloud platform may be slow or unreachable.",
                    operation, duration_secs
                )
            }
            NetworkError::TlsError { .. } => {
                "A secure connection to the cloud platform could not be established.".to_string()
            }
            NetworkError::HttpStatus { status, .. } => match *status {
                500..=599 => {
                    "The cloud platform is experiencing issues. Please try again later.".to_string()
                }
                _ => format!(
                    "The cloud platform returned an error (HTTP {}). Please try again.",
                    status
                ),
            },
            NetworkError::InvalidResponse { .. } => {
                "Received an unreadable response from the cloud platform.".to_string()
            }
            NetworkError::InvalidUrl { url } => format!("Invalid cloud platform URL: {}", url),
            NetworkError::Other { message } => format!("Network error: {}", message),
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed { .. } => "E_NET_CONN",
            NetworkError::DnsResolutionFailed { .. } => "E_NET_DNS",
            NetworkError::Timeout { .. } => "E_NET_TIMEOUT",
            NetworkError::TlsError { .. } => "E_NET_TLS",
            NetworkError::HttpStatus { .. } => "E_NET_HTTP",
            NetworkError::InvalidResponse { .. } => "E_NET_INVALID",
            NetworkError::InvalidUrl { .. } => "E_NET_URL",
            NetworkError::Other { .. } => "E_NET_OTHER",
        }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::ConnectionFailed { url, message } => {
                write!(f, "Connection failed to '{}': {}", url, message)
            }
            NetworkError::DnsResolutionFailed { host } => {
                write!(f, "DNS resolution failed for '{}'", host)
            }
            NetworkError::Timeout {
                operation,
                duration_secs,
            } => {
                write!(f, "{} timed out after {} seconds", operation, duration_secs)
            }
            NetworkError::TlsError { message } => write!(f, "TLS error: {}", message),
            NetworkError::HttpStatus { status, message } => {
                write!(f, "HTTP {} error: {}", status, message)
            }
            NetworkError::InvalidResponse { message } => {
                write!(f, "Invalid response: {}", message)
            }
            NetworkError::InvalidUrl { url } => write!(f, "Invalid URL: {}", url),
            NetworkError::Other { message } => write!(f, "Network error: {}", message),
        }
    }
}

impl std::error::Error for NetworkError {}

/// Classify a reqwest error into a NetworkError.
pub fn classify_reqwest_error(err: &reqwest::Error, url: &str, timeout_secs: u64) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout {
            operation: "HTTP request".to_string(),
            duration_secs: timeout_secs,
        }
    } else if err.is_connect() {
        let err_str = err.to_string().to_lowercase();
        if err_str.contains("dns") || err_str.contains("resolve") {
            NetworkError::DnsResolutionFailed {
                host: extract_host_from_url(url),
            }
        } else {
            NetworkError::ConnectionFailed {
                url: url.to_string(),
                message: err.to_string(),
            }
        }
    } else if err.is_builder() {
        NetworkError::InvalidUrl {
            url: url.to_string(),
        }
    } else if err.is_status() {
        NetworkError::HttpStatus {
            status: err.status().map(|s| s.as_u16()).unwrap_or(0),
            message: err.to_string(),
        }
    } else if err.is_decode() || err.is_body() {
        NetworkError::InvalidResponse {
            message: format!("Failed to read response: {}", err),
        }
    } else {
        let err_str = err.to_string().to_lowercase();
        if err_str.contains("tls") || err_str.contains("ssl") || err_str.contains("certificate") {
            NetworkError::TlsError {
                message: err.to_string(),
            }
        } else {
            NetworkError::Other {
                message: err.to_string(),
            }
        }
    }
}

/// Extract the host portion from a URL string.
fn extract_host_from_url(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_string()))
        .unwrap_or_else(|| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failed_is_transient() {
        let err = NetworkError::ConnectionFailed {
            url: "http://api.example.com".to_string(),
            message: "Connection refused".to_string(),
        };
        assert!(err.is_transient());
        assert_eq!(err.error_code(), "E_NET_CONN");
    }

    #[test]
    fn test_timeout_is_transient() {
        let err = NetworkError::Timeout {
            operation: "connect".to_string(),
            duration_secs: 30,
        };
        assert!(err.is_transient());
        assert_eq!(err.error_code(), "E_NET_TIMEOUT");
    }

    #[test]
    fn test_tls_error_not_transient() {
        let err = NetworkError::TlsError {
            message: "certificate expired".to_string(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn test_http_status_transient_only_for_server_errors() {
        let err_502 = NetworkError::HttpStatus {
            status: 502,
            message: "Bad Gateway".to_string(),
        };
        assert!(err_502.is_transient());

        let err_404 = NetworkError::HttpStatus {
            status: 404,
            message: "Not Found".to_string(),
        };
        assert!(!err_404.is_transient());
    }

    #[test]
    fn test_user_message_mentions_cloud_platform() {
        let err = NetworkError::ConnectionFailed {
            url: "http://api.example.com".to_string(),
            message: "refused".to_string(),
        };
        assert!(err.user_message().contains("cloud platform"));

        let err = NetworkError::HttpStatus {
            status: 503,
            message: "down".to_string(),
        };
        assert!(err.user_message().contains("try again later"));
    }

    #[test]
    fn test_display_format() {
        let err = NetworkError::ConnectionFailed {
            url: "https://api.example.com".to_string(),
            message: "refused".to_string(),
        };
        let display = format!("{}", err);
        assert!(display.contains("api.example.com"));
        assert!(display.contains("refused"));
    }

    #[test]
    fn test_extract_host_from_url() {
        assert_eq!(extract_host_from_url("https://example.com/path"), "example.com");
        assert_eq!(
            extract_host_from_url("http://example.com:8080/path"),
            "example.com"
        );
        assert_eq!(extract_host_from_url("not a url"), "not a url");
    }
}
