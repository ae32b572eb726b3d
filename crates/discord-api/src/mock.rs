//! # Mock Transport
//!
//! A scripted [`Transport`] for testing clients without a network. Expectations are
//! answered in the order they were registered; a request whose method or route does
//! not match the next expectation fails with [`TransportError::Unexpected`].
//!
//! ```rust
//! use discord_api::clients::MessageClient;
//! use discord_api::mock::MockTransport;
//! use discord_api::model::CreateMessageParams;
//! use discord_api::transport::Method;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let mock = MockTransport::new();
//! mock.expect(Method::Post, "/channels/42/messages")
//!     .return_ok(r#"{"id":"1","content":"hi"}"#);
//!
//! let client = MessageClient::new(mock.transport());
//! let message = client
//!     .create_message("42", &CreateMessageParams::new("hi"))
//!     .await
//!     .unwrap();
//! assert_eq!(message.id, "1");
//!
//! mock.verify(); // Ensures all expectations were met
//! # }
//! ```

use crate::transport::{ApiRequest, Method, Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug)]
struct Expectation {
    method: Method,
    route: String,
    response: Result<String, TransportError>,
}

/// Clones share the same expectations and request log.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
    received: Arc<Mutex<Vec<ApiRequest>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// The mock as a shareable transport handle for a client.
    pub fn transport(&self) -> Arc<dyn Transport> {
        Arc::new(self.clone())
    }

    /// Expects a request with this method and route.
    pub fn expect(&self, method: Method, route: impl Into<String>) -> ExpectationBuilder {
        ExpectationBuilder {
            method,
            route: route.into(),
            expectations: self.expectations.clone(),
        }
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ApiRequest> {
        lock(&self.received).clone()
    }

    /// Panics unless every expectation was consumed.
    pub fn verify(&self) {
        let remaining = lock(&self.expectations).len();
        if remaining != 0 {
            panic!("Not all expectations were met. {remaining} remaining");
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<String, TransportError> {
        debug!(method = %request.method, route = %request.route, "Mock received request");
        lock(&self.received).push(request.clone());

        let expectation = lock(&self.expectations).pop_front();
        match expectation {
            Some(expected) if expected.method == request.method && expected.route == request.route => {
                expected.response
            }
            Some(expected) => Err(TransportError::Unexpected(format!(
                "{} {}, expected {} {}",
                request.method, request.route, expected.method, expected.route
            ))),
            None => Err(TransportError::Unexpected(format!(
                "{} {}, no expectations left",
                request.method, request.route
            ))),
        }
    }
}

/// Completes an expectation started with [`MockTransport::expect`].
pub struct ExpectationBuilder {
    method: Method,
    route: String,
    expectations: Arc<Mutex<VecDeque<Expectation>>>,
}

impl ExpectationBuilder {
    /// Answers with this response body.
    pub fn return_ok(self, body: impl Into<String>) {
        self.push(Ok(body.into()));
    }

    pub fn return_err(self, error: TransportError) {
        self.push(Err(error));
    }

    fn push(self, response: Result<String, TransportError>) {
        lock(&self.expectations).push_back(Expectation {
            method: self.method,
            route: self.route,
            response,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn answers_in_registration_order() {
        let mock = MockTransport::new();
        mock.expect(Method::Get, "/a").return_ok("1");
        mock.expect(Method::Get, "/b").return_err(TransportError::Connection("down".into()));

        assert_eq!(mock.send(ApiRequest::get("/a")).await, Ok("1".to_string()));
        assert_eq!(
            mock.send(ApiRequest::get("/b")).await,
            Err(TransportError::Connection("down".into()))
        );
        mock.verify();
        assert_eq!(mock.requests().len(), 2);
    }

    #[tokio::test]
    async fn mismatched_route_is_unexpected() {
        let mock = MockTransport::new();
        mock.expect(Method::Post, "/a").return_ok("{}");

        let result = mock.send(ApiRequest::post("/b", "{}")).await;
        assert!(matches!(result, Err(TransportError::Unexpected(_))));
    }

    #[test]
    #[should_panic(expected = "Not all expectations were met")]
    fn verify_panics_on_leftovers() {
        let mock = MockTransport::new();
        mock.expect(Method::Get, "/never").return_ok("{}");
        mock.verify();
    }
}
