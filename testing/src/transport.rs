//! Scripted stand-in for the backend API

use async_trait::async_trait;
use serde_json::Value;
use shopdesk_api::{ApiError, ApiRequest, Method, Transport};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

type Key = (Method, String);

#[derive(Debug, Default)]
struct Script {
    responses: HashMap<Key, VecDeque<Result<Value, ApiError>>>,
    delays: HashMap<Key, Duration>,
    requests: Vec<ApiRequest>,
}

/// Transport that replays scripted responses per `(method, path)`
///
/// Responses queued for the same route are returned in order; the last one
/// keeps being returned once the queue is down to a single entry. Unscripted
/// routes fail with a 404. Clones share the same script and request log.
///
/// # Example
///
/// ```
/// use shopdesk_api::{ApiRequest, Method, Transport};
/// use shopdesk_testing::MockTransport;
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let transport = MockTransport::new();
/// transport.respond(Method::Get, "customers", json!({ "data": [] }));
///
/// let body = transport.execute(ApiRequest::get("customers")).await.unwrap();
/// assert_eq!(body, json!({ "data": [] }));
/// assert_eq!(transport.requests().len(), 1);
/// # });
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    script: Arc<Mutex<Script>>,
}

impl MockTransport {
    /// Create a transport with nothing scripted
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful JSON body for `method path`
    pub fn respond(&self, method: Method, path: &str, body: Value) {
        self.push(method, path, Ok(body));
    }

    /// Queue a failure for `method path`
    pub fn fail(&self, method: Method, path: &str, error: ApiError) {
        self.push(method, path, Err(error));
    }

    /// Hold every response for `method path` back by `delay`
    #[allow(clippy::expect_used)]
    pub fn delay(&self, method: Method, path: &str, delay: Duration) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .delays
            .insert((method, normalize(path)), delay);
    }

    /// Every request executed so far, in order
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.script
            .lock()
            .expect("script lock poisoned")
            .requests
            .clone()
    }

    /// Number of requests executed against `method path`
    #[must_use]
    pub fn calls(&self, method: Method, path: &str) -> usize {
        let path = normalize(path);
        self.requests()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    #[allow(clippy::expect_used)]
    fn push(&self, method: Method, path: &str, response: Result<Value, ApiError>) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .responses
            .entry((method, normalize(path)))
            .or_default()
            .push_back(response);
    }
}

#[async_trait]
impl Transport for MockTransport {
    #[allow(clippy::expect_used)]
    async fn execute(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let key = (request.method, request.path.clone());

        let (response, delay) = {
            let mut script = self.script.lock().expect("script lock poisoned");
            script.requests.push(request.clone());
            let delay = script.delays.get(&key).copied();
            let response = match script.responses.get_mut(&key) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            };
            (response, delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        response.unwrap_or_else(|| {
            Err(ApiError::Http {
                status: 404,
                message: Some(format!("no scripted response for {request}")),
            })
        })
    }
}

fn normalize(path: &str) -> String {
    path.trim_start_matches('/').to_string()
}
