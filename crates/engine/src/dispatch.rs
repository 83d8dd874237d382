//! HTTP dispatch layer.
//!
//! Translates a resolved step into one outbound call and captures a
//! structured response. The [`StepDispatcher`] trait is the seam between the
//! orchestrator and the network: [`HttpStepDispatcher`] issues real requests
//! through the shared [`CasewireClient`] pool, while [`ScriptedDispatcher`]
//! replays canned responses for previews and tests.

use std::{
    collections::VecDeque,
    sync::Mutex,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::Method;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{debug, warn};

use casewire_api::CasewireClient;
use casewire_types::TestStep;
use casewire_util::{parse_lenient_body, query_pairs};

use crate::error::ExecutionError;

/// Per-step timeout applied when a step does not configure its own.
const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(30);

/// Structured capture of one HTTP exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers; repeated headers accumulate in order.
    pub headers: IndexMap<String, Vec<String>>,
    /// Leniently parsed body (`{"raw": text}` when not valid JSON).
    pub body: JsonValue,
    /// Time from sending the request to reading the full body, in ms.
    pub latency_ms: u64,
}

/// Executes one resolved step against some backend.
#[async_trait]
pub trait StepDispatcher: Send + Sync {
    /// Sends the step's request with the given resolved parameters.
    async fn dispatch(&self, step: &TestStep, params: &JsonMap<String, JsonValue>) -> Result<DispatchedResponse, ExecutionError>;
}

/// Real dispatcher issuing requests through a pooled HTTP client.
pub struct HttpStepDispatcher {
    client: CasewireClient,
    default_timeout: Duration,
}

impl HttpStepDispatcher {
    /// Wraps a configured client with the engine's default step timeout.
    pub fn new(client: CasewireClient) -> Self {
        Self {
            client,
            default_timeout: DEFAULT_STEP_TIMEOUT,
        }
    }

    /// Overrides the timeout used for steps without an explicit one.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }
}

#[async_trait]
impl StepDispatcher for HttpStepDispatcher {
    async fn dispatch(&self, step: &TestStep, params: &JsonMap<String, JsonValue>) -> Result<DispatchedResponse, ExecutionError> {
        let method = parse_method(&step.api_method)?;

        let mut builder = self.client.request(method.clone(), &step.api_path);

        // GET carries parameters as query pairs; POST/PUT/PATCH as a JSON
        // body; DELETE sends no payload at all.
        match method {
            Method::GET => {
                if !params.is_empty() {
                    builder = builder.query(&query_pairs(params));
                }
            }
            Method::POST | Method::PUT | Method::PATCH => {
                builder = builder.json(&JsonValue::Object(params.clone()));
            }
            _ => {}
        }

        for (name, value) in &step.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let timeout = step.timeout_ms.map(Duration::from_millis).unwrap_or(self.default_timeout);
        builder = builder.timeout(timeout);

        debug!(
            method = %method,
            path = %step.api_path,
            param_count = params.len(),
            timeout_ms = timeout.as_millis() as u64,
            "dispatching step request"
        );

        let started = Instant::now();
        let response = builder.send().await.map_err(|error| {
            warn!(method = %method, path = %step.api_path, error = %error, "step request failed");
            ExecutionError::Transport {
                message: error.to_string(),
            }
        })?;

        let status = response.status().as_u16();
        let mut headers: IndexMap<String, Vec<String>> = IndexMap::new();
        for (name, value) in response.headers() {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }

        let text = response.text().await.map_err(|error| ExecutionError::Transport {
            message: error.to_string(),
        })?;
        let latency_ms = started.elapsed().as_millis().try_into().unwrap_or(u64::MAX);

        debug!(
            method = %method,
            path = %step.api_path,
            status,
            latency_ms,
            body_len = text.len(),
            "step request completed"
        );

        Ok(DispatchedResponse {
            status,
            headers,
            body: parse_lenient_body(&text),
            latency_ms,
        })
    }
}

/// Maps a step's declared method onto the dispatch table.
fn parse_method(method: &str) -> Result<Method, ExecutionError> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        other => Err(ExecutionError::UnsupportedMethod { method: other.to_string() }),
    }
}

/// Dispatcher that replays queued outcomes without touching the network.
///
/// Each call pops the next queued outcome; an exhausted queue reports a
/// transport failure, which mirrors an unreachable backend.
#[derive(Default)]
pub struct ScriptedDispatcher {
    queue: Mutex<VecDeque<Result<DispatchedResponse, ExecutionError>>>,
}

impl ScriptedDispatcher {
    /// Creates a dispatcher with an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response with the given status and body.
    pub fn respond(self, status: u16, body: JsonValue) -> Self {
        self.push(Ok(DispatchedResponse {
            status,
            headers: IndexMap::new(),
            body,
            latency_ms: 1,
        }));
        self
    }

    /// Queues a failure for the next dispatch.
    pub fn fail(self, error: ExecutionError) -> Self {
        self.push(Err(error));
        self
    }

    fn push(&self, outcome: Result<DispatchedResponse, ExecutionError>) {
        self.queue.lock().expect("scripted dispatcher queue poisoned").push_back(outcome);
    }
}

#[async_trait]
impl StepDispatcher for ScriptedDispatcher {
    async fn dispatch(&self, step: &TestStep, _params: &JsonMap<String, JsonValue>) -> Result<DispatchedResponse, ExecutionError> {
        // The method gate applies before any scripted outcome, matching the
        // real dispatcher's before-network check.
        parse_method(&step.api_method)?;

        self.queue
            .lock()
            .expect("scripted dispatcher queue poisoned")
            .pop_front()
            .unwrap_or_else(|| {
                Err(ExecutionError::Transport {
                    message: format!("no scripted response for '{}'", step.api_path),
                })
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn step(method: &str) -> TestStep {
        TestStep {
            id: "s1".into(),
            step_order: 1,
            api_id: None,
            api_name: None,
            api_path: "/ping".into(),
            api_method: method.into(),
            description: None,
            params: JsonMap::new(),
            headers: Default::default(),
            param_mappings: Vec::new(),
            assertions: Vec::new(),
            expected_status: 200,
            timeout_ms: None,
        }
    }

    #[test]
    fn method_table_covers_the_five_verbs() {
        for verb in ["GET", "post", "Put", "PATCH", "delete"] {
            assert!(parse_method(verb).is_ok(), "verb {verb} should dispatch");
        }
        let error = parse_method("HEAD").expect_err("HEAD is not dispatchable");
        assert_eq!(error, ExecutionError::UnsupportedMethod { method: "HEAD".into() });
    }

    #[tokio::test]
    async fn scripted_dispatcher_replays_in_order_then_fails() {
        let dispatcher = ScriptedDispatcher::new()
            .respond(200, json!({"ok": true}))
            .respond(404, json!({"error": "missing"}));

        let first = dispatcher.dispatch(&step("GET"), &JsonMap::new()).await.expect("first");
        assert_eq!(first.status, 200);
        let second = dispatcher.dispatch(&step("GET"), &JsonMap::new()).await.expect("second");
        assert_eq!(second.status, 404);

        let exhausted = dispatcher.dispatch(&step("GET"), &JsonMap::new()).await;
        assert!(matches!(exhausted, Err(ExecutionError::Transport { .. })));
    }

    #[tokio::test]
    async fn scripted_dispatcher_rejects_unsupported_methods_before_replaying() {
        let dispatcher = ScriptedDispatcher::new().respond(200, json!({}));
        let error = dispatcher.dispatch(&step("TRACE"), &JsonMap::new()).await.expect_err("method gate");
        assert_eq!(error, ExecutionError::UnsupportedMethod { method: "TRACE".into() });
    }
}
