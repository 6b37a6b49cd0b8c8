//! Scripted transport for unit tests

use anyhow::Result;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::transport::{HttpRequest, Transport};

#[derive(Default)]
struct Script {
    responses: HashMap<String, VecDeque<Result<Value, String>>>,
    calls: Vec<HttpRequest>,
}

/// Transport that replays queued responses per API path
///
/// The last queued response for a path is repeated once the queue is down to
/// one entry. Unscripted paths fail as transport errors.
#[derive(Clone, Default)]
pub(crate) struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
    delay: Duration,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn respond(&self, path: &str, body: Value) {
        self.push(path, Ok(body));
    }

    pub(crate) fn fail(&self, path: &str, message: &str) {
        self.push(path, Err(message.to_string()));
    }

    pub(crate) fn calls(&self) -> Vec<HttpRequest> {
        self.script.lock().unwrap().calls.clone()
    }

    pub(crate) fn calls_to(&self, path: &str) -> usize {
        self.calls().iter().filter(|c| c.url.ends_with(path)).count()
    }

    fn push(&self, path: &str, response: Result<Value, String>) {
        self.script
            .lock()
            .unwrap()
            .responses
            .entry(path.to_string())
            .or_default()
            .push_back(response);
    }

    fn next_response(&self, request: &HttpRequest) -> Result<Value, String> {
        let mut script = self.script.lock().unwrap();
        let path = script
            .responses
            .keys()
            .find(|p| request.url.ends_with(p.as_str()))
            .cloned();

        let Some(path) = path else {
            return Err(format!("no scripted response for {}", request.url));
        };

        let queue = script.responses.get_mut(&path).unwrap();
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<Value> {
        self.script.lock().unwrap().calls.push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.next_response(&request).map_err(anyhow::Error::msg)
    }
}
