//! HTTP transport abstraction
//!
//! [`Transport`] is the seam between the request client and the network, so
//! tests can script responses. [`UreqTransport`] is the production
//! implementation: synchronous HTTP (ureq) run on tokio's blocking pool.

use anyhow::{Context, Result};
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// HTTP method used by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
        })
    }
}

/// A fully-built request, ready for the transport
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    /// JSON body (POST only)
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Value of a header, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Value of a query parameter or top-level body field
    pub fn param(&self, name: &str) -> Option<String> {
        if let Some((_, v)) = self.query.iter().find(|(k, _)| k == name) {
            return Some(v.clone());
        }
        self.body
            .as_ref()
            .and_then(|b| b.get(name))
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    }
}

// Header values, query values and body contents may hold credentials, so only
// their names are printed.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query: Vec<&str> = self.query.iter().map(|(k, _)| k.as_str()).collect();
        let headers: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        let body_keys: Option<Vec<&str>> = self
            .body
            .as_ref()
            .and_then(Value::as_object)
            .map(|o| o.keys().map(String::as_str).collect());

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("query", &query)
            .field("headers", &headers)
            .field("body_keys", &body_keys)
            .finish()
    }
}

/// Trait for asynchronous HTTP execution
///
/// Implementations return the decoded JSON body for any response that has
/// one, regardless of HTTP status; application-level failure detection is the
/// request client's job.
pub trait Transport: Send + Sync + 'static {
    fn send(&self, request: HttpRequest) -> impl Future<Output = Result<Value>> + Send;
}

/// Production transport backed by a `ureq` agent
#[derive(Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    /// Create a transport whose calls are bounded by `timeout`
    pub fn new(timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();

        Self {
            agent: config.into(),
        }
    }

    fn send_blocking(agent: &ureq::Agent, request: HttpRequest) -> Result<Value> {
        let response = match request.method {
            Method::Get => {
                let mut builder = agent.get(request.url.as_str());
                for (key, value) in &request.query {
                    builder = builder.query(key, value);
                }
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            Method::Post => {
                let mut builder = agent.post(request.url.as_str());
                for (key, value) in &request.query {
                    builder = builder.query(key, value);
                }
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                let body = request
                    .body
                    .unwrap_or_else(|| Value::Object(Default::default()));
                builder.send_json(&body)
            }
        };

        let mut response =
            response.with_context(|| format!("Failed to send {} request", request.method))?;

        let status = response.status();
        response
            .body_mut()
            .read_json::<Value>()
            .with_context(|| format!("Failed to parse response body (HTTP {})", status))
    }
}

impl Transport for UreqTransport {
    async fn send(&self, request: HttpRequest) -> Result<Value> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || Self::send_blocking(&agent, request))
            .await
            .context("HTTP worker task failed")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_debug_hides_credential_values() {
        let mut request = HttpRequest::new(Method::Post, "https://api.eu.navixy.com/v2/tracker/list");
        request.headers.push(("Authorization".to_string(), "NVX secret-key".to_string()));
        request.body = Some(json!({"hash": "secret-hash"}));

        let debug = format!("{:?}", request);
        assert!(debug.contains("Authorization"));
        assert!(debug.contains("hash"));
        assert!(!debug.contains("secret-key"));
        assert!(!debug.contains("secret-hash"));
    }

    #[test]
    fn test_param_reads_query_then_body() {
        let mut request = HttpRequest::new(Method::Get, "https://x");
        request.query.push(("hash".to_string(), "q".to_string()));
        assert_eq!(request.param("hash").as_deref(), Some("q"));

        let mut request = HttpRequest::new(Method::Post, "https://x");
        request.body = Some(json!({"session_key": "b", "limit": 5}));
        assert_eq!(request.param("session_key").as_deref(), Some("b"));
        assert_eq!(request.param("limit").as_deref(), Some("5"));
        assert!(request.param("hash").is_none());
        assert!(request.header("authorization").is_none());
    }
}
