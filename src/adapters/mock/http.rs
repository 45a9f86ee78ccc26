//! Mock HTTP client for testing.
//!
//! Responses are scripted per method and URL path. Each route holds a
//! queue: calls consume responses in order and the last one repeats, so a
//! test can script "missing, then present" for the same endpoint.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::error::NetworkError;
use crate::traits::{Headers, HttpClient, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (GET or POST)
    pub method: String,
    /// Full request URL
    pub url: String,
    /// URL path without query
    pub path: String,
    /// Request headers
    pub headers: Headers,
    /// Request body (for POST requests)
    pub body: Option<String>,
}

impl RecordedRequest {
    /// Parse the body as JSON, if any.
    pub fn json_body(&self) -> Option<Value> {
        self.body.as_deref().and_then(|b| serde_json::from_str(b).ok())
    }

    /// Decoded query parameter.
    pub fn query_param(&self, name: &str) -> Option<String> {
        url::Url::parse(&self.url)
            .ok()?
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a response
    Success(Response),
    /// Fail at the transport level
    Error(NetworkError),
}

type Route = (String, String);

/// Mock HTTP client for testing.
///
/// # Example
///
/// ```ignore
/// use educloud::adapters::mock::MockHttpClient;
/// use serde_json::json;
///
/// let http = MockHttpClient::new();
/// http.on_json("GET", "/me/sms_account", json!({"error": "不存在短信账号"}));
/// http.on_json("GET", "/me/sms_account", json!({"status": "used", "name": "A"}));
///
/// // ...drive a reconciler...
///
/// assert_eq!(http.count("GET", "/me/sms_account"), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    routes: Arc<Mutex<HashMap<Route, VecDeque<MockResponse>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `method` on any URL whose path ends with `path`.
    pub fn on(&self, method: &str, path: &str, response: MockResponse) {
        let mut routes = self.routes.lock().unwrap();
        routes
            .entry((method.to_ascii_uppercase(), path.to_string()))
            .or_default()
            .push_back(response);
    }

    /// Queue a 200 JSON response.
    pub fn on_json(&self, method: &str, path: &str, body: Value) {
        self.on(method, path, MockResponse::Success(Response::json_body(&body)));
    }

    /// Queue a raw response.
    pub fn on_status(&self, method: &str, path: &str, status: u16, body: &str) {
        self.on(
            method,
            path,
            MockResponse::Success(Response::new(status, Bytes::from(body.to_string()))),
        );
    }

    /// Queue a transport failure.
    pub fn on_error(&self, method: &str, path: &str, error: NetworkError) {
        self.on(method, path, MockResponse::Error(error));
    }

    /// Make every route fail with a connection error.
    pub fn fail_all(&self) {
        let mut routes = self.routes.lock().unwrap();
        routes.clear();
        routes
            .entry(("*".to_string(), String::new()))
            .or_default()
            .push_back(MockResponse::Error(NetworkError::ConnectionFailed {
                url: "mock".to_string(),
                message: "connection refused".to_string(),
            }));
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests for one route.
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.get_requests()
            .into_iter()
            .filter(|r| r.method.eq_ignore_ascii_case(method) && r.path.ends_with(path))
            .collect()
    }

    /// Number of calls made to one route.
    pub fn count(&self, method: &str, path: &str) -> usize {
        self.requests_to(method, path).len()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn record_request(&self, method: &str, url: &str, headers: &Headers, body: Option<String>) -> String {
        let path = url::Url::parse(url)
            .map(|u| u.path().to_string())
            .unwrap_or_else(|_| url.to_string());
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            path: path.clone(),
            headers: headers.clone(),
            body,
        });
        path
    }

    /// Pop the next response for a route; the last one repeats.
    fn next_response(&self, method: &str, path: &str) -> Option<MockResponse> {
        let mut routes = self.routes.lock().unwrap();

        let key = routes
            .keys()
            .filter(|(m, p)| m == method && !p.is_empty() && path.ends_with(p.as_str()))
            .max_by_key(|(_, p)| p.len())
            .cloned()
            .or_else(|| {
                let wildcard = ("*".to_string(), String::new());
                routes.contains_key(&wildcard).then_some(wildcard)
            })?;

        let queue = routes.get_mut(&key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }

    fn respond(&self, method: &str, url: &str, path: &str) -> Result<Response, NetworkError> {
        match self.next_response(method, path) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(NetworkError::Other {
                message: format!("No mock response for {} {}", method, url),
            }),
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, NetworkError> {
        let path = self.record_request("GET", url, headers, None);
        self.respond("GET", url, &path)
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, NetworkError> {
        let path = self.record_request("POST", url, headers, Some(body.to_string()));
        self.respond("POST", url, &path)
    }
}
