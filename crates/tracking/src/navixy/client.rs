//! Authenticated Navixy API client
//!
//! Every call first tries the params strategy (credential in body/query).
//! If the backend answers with `success: false`, the call is retried exactly
//! once with the header strategy. A single timer bounds the whole call,
//! whichever strategy is in flight when it fires.

use log::{debug, warn};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use super::auth::{AuthStrategy, Credentials};
use super::transport::{Method, Transport};
use crate::diagnostics::{AttemptOutcome, DiagnosticsSink, LogDiagnostics, RequestEvent};
use crate::error::RequestError;

/// Result of one strategy attempt that reached the backend
enum Attempt {
    Accepted(Value),
    Rejected(Value),
}

/// Navixy API client with dual auth strategies
pub struct RequestClient<T: Transport> {
    transport: T,
    base_url: String,
    credentials: Credentials,
    fallback_key: String,
    timeout: Duration,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl<T: Transport> RequestClient<T> {
    /// Create a new client
    ///
    /// # Arguments
    /// * `transport` - HTTP transport
    /// * `base_url` - Cluster base URL, e.g. `https://api.eu.navixy.com/v2`
    /// * `credentials` - The resolved credential for the params strategy
    /// * `fallback_key` - Static key used by the header strategy
    pub fn new(
        transport: T,
        base_url: impl Into<String>,
        credentials: Credentials,
        fallback_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            fallback_key: fallback_key.into(),
            timeout: crate::config::EngineOptions::DEFAULT_REQUEST_TIMEOUT,
            diagnostics: Arc::new(LogDiagnostics),
        }
    }

    /// Set the per-call timeout budget
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Route attempt diagnostics to `sink` instead of the log
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Auth mode of the resolved credential
    pub fn auth_mode(&self) -> &'static str {
        self.credentials.mode()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// POST `payload` (merged with credentials) to `path`
    pub async fn post(&self, path: &str, payload: Map<String, Value>) -> Result<Value, RequestError> {
        self.request(Method::Post, path, payload).await
    }

    /// GET `path` with `query` (merged with credentials)
    pub async fn get(&self, path: &str, query: Map<String, Value>) -> Result<Value, RequestError> {
        self.request(Method::Get, path, query).await
    }

    /// Issue an authenticated request
    ///
    /// # Errors
    /// * `RequestError::Timeout` - the call's budget elapsed
    /// * `RequestError::Transport` - network failure or non-JSON response
    /// * `RequestError::Application` - both strategies returned `success: false`
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        payload: Map<String, Value>,
    ) -> Result<Value, RequestError> {
        let escalated = AtomicBool::new(false);

        let call = self.request_with_fallback(method, path, &payload, &escalated);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                let strategy = if escalated.load(Ordering::Acquire) {
                    AuthStrategy::Header
                } else {
                    AuthStrategy::Params
                };
                self.emit(method, path, strategy, AttemptOutcome::TimedOut);
                Err(RequestError::Timeout {
                    path: path.to_string(),
                    budget: self.timeout,
                })
            }
        }
    }

    async fn request_with_fallback(
        &self,
        method: Method,
        path: &str,
        payload: &Map<String, Value>,
        escalated: &AtomicBool,
    ) -> Result<Value, RequestError> {
        // 1. Params strategy with the resolved credential
        match self.attempt(AuthStrategy::Params, method, path, payload).await? {
            Attempt::Accepted(body) => return Ok(body),
            Attempt::Rejected(_) => {
                debug!("{} {} rejected with params auth, retrying with header auth", method, path);
            }
        }

        // 2. Header strategy with the fallback key, exactly once
        escalated.store(true, Ordering::Release);
        match self.attempt(AuthStrategy::Header, method, path, payload).await? {
            Attempt::Accepted(body) => Ok(body),
            Attempt::Rejected(last_body) => {
                warn!("{} {} rejected under both auth strategies", method, path);
                Err(RequestError::Application {
                    path: path.to_string(),
                    last_body,
                })
            }
        }
    }

    async fn attempt(
        &self,
        strategy: AuthStrategy,
        method: Method,
        path: &str,
        payload: &Map<String, Value>,
    ) -> Result<Attempt, RequestError> {
        let url = format!("{}{}", self.base_url, path);
        let request =
            strategy.build_request(method, url, payload, &self.credentials, &self.fallback_key);

        match self.transport.send(request).await {
            Ok(body) if is_failure(&body) => {
                self.emit(method, path, strategy, AttemptOutcome::Rejected);
                Ok(Attempt::Rejected(body))
            }
            Ok(body) => {
                self.emit(method, path, strategy, AttemptOutcome::Succeeded);
                Ok(Attempt::Accepted(body))
            }
            Err(e) => {
                let message = format!("{:#}", e);
                self.emit(method, path, strategy, AttemptOutcome::TransportFailed(message.clone()));
                Err(RequestError::Transport {
                    path: path.to_string(),
                    message,
                })
            }
        }
    }

    fn emit(&self, method: Method, path: &str, strategy: AuthStrategy, outcome: AttemptOutcome) {
        self.diagnostics
            .on_event(&RequestEvent::new(method, path, strategy, outcome));
    }
}

/// Whether a response carries the backend's failure marker
fn is_failure(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool) == Some(false)
}
