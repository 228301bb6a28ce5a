//! Mock implementations for testing

use printquote_protocol::api::{LoginRequest, RegisterRequest};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::client::ApiClient;
use crate::error::{PqError, Result};

/// A request as seen by the mock
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub endpoint: String,
    pub payload: Option<serde_json::Value>,
}

type Canned = std::result::Result<serde_json::Value, PqError>;

/// Mock API client replaying canned responses per method and endpoint
///
/// Responses for one key are served in order; the last one keeps being
/// replayed.
#[derive(Debug, Clone)]
pub struct MockApiClient {
    pub authenticated: Arc<Mutex<bool>>,
    responses: Arc<Mutex<HashMap<(Method, String), VecDeque<Canned>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self {
            authenticated: Arc::new(Mutex::new(false)),
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_auth(self) -> Self {
        *self.authenticated.lock().unwrap() = true;
        self
    }

    pub fn add_response(&self, method: Method, endpoint: &str, response: serde_json::Value) {
        self.push(method, endpoint, Ok(response));
    }

    pub fn add_error(&self, method: Method, endpoint: &str, error: PqError) {
        self.push(method, endpoint, Err(error));
    }

    fn push(&self, method: Method, endpoint: &str, canned: Canned) {
        self.responses
            .lock()
            .unwrap()
            .entry((method, endpoint.to_string()))
            .or_default()
            .push_back(canned);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<RecordedRequest> {
        self.requests.lock().unwrap().last().cloned()
    }

    pub fn count(&self, method: Method, endpoint: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.endpoint == endpoint)
            .count()
    }

    fn next_response(&self, method: &Method, endpoint: &str) -> Canned {
        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(&(method.clone(), endpoint.to_string()))
            .ok_or_else(|| PqError::internal(format!("No mock response for {} {}", method, endpoint)))?;
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

impl ApiClient for MockApiClient {
    async fn is_authenticated(&self) -> bool {
        *self.authenticated.lock().unwrap()
    }

    async fn login(&self, _request: &LoginRequest) -> Result<()> {
        *self.authenticated.lock().unwrap() = true;
        Ok(())
    }

    async fn register(&self, _request: &RegisterRequest) -> Result<()> {
        *self.authenticated.lock().unwrap() = true;
        Ok(())
    }

    async fn logout(&self) -> Result<()> {
        *self.authenticated.lock().unwrap() = false;
        Ok(())
    }

    async fn authenticated_request<T, R>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&T>,
    ) -> Result<R>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        if !*self.authenticated.lock().unwrap() {
            return Err(PqError::not_logged_in());
        }

        let payload = payload.map(serde_json::to_value).transpose()?;
        self.requests.lock().unwrap().push(RecordedRequest {
            method: method.clone(),
            endpoint: endpoint.to_string(),
            payload,
        });

        let value = self.next_response(&method, endpoint)?;
        serde_json::from_value(value).map_err(PqError::from)
    }
}
