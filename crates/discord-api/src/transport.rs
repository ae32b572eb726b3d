//! # Transport Boundary
//!
//! The command layer never talks HTTP itself. It hands an [`ApiRequest`] to a
//! [`Transport`] and scans whatever body comes back. Connection handling, auth and
//! rate limits live behind this trait.
//!
//! Two implementations ship with the crate: [`MockTransport`](crate::mock::MockTransport)
//! for tests and [`DryRunTransport`] for the demo binary.

use crate::config::ClientConfig;
use async_trait::async_trait;
use std::fmt;
use thiserror::Error;
use tracing::info;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// One request handed to the transport. `route` is relative to the API base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub method: Method,
    pub route: String,
    pub body: Option<String>,
}

impl ApiRequest {
    pub fn get(route: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            route: route.into(),
            body: None,
        }
    }

    pub fn post(route: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            route: route.into(),
            body: Some(body.into()),
        }
    }

    pub fn patch(route: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            method: Method::Patch,
            route: route.into(),
            body: Some(body.into()),
        }
    }
}

/// Errors reported by a transport.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransportError {
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Connection failed: {0}")]
    Connection(String),

    /// A test transport received a request it was not told to expect.
    #[error("Unexpected request: {0}")]
    Unexpected(String),
}

/// Sends requests and returns the response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<String, TransportError>;
}

/// Logs each request instead of sending it and answers with the request body, or
/// `{}` for requests without one.
#[derive(Debug, Clone, Default)]
pub struct DryRunTransport {
    config: ClientConfig,
}

impl DryRunTransport {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transport for DryRunTransport {
    async fn send(&self, request: ApiRequest) -> Result<String, TransportError> {
        let url = format!("{}{}", self.config.api_base, request.route);
        info!(
            method = %request.method,
            %url,
            user_agent = %self.config.user_agent,
            body = request.body.as_deref().unwrap_or(""),
            "Dry run, request not sent"
        );
        Ok(request.body.unwrap_or_else(|| "{}".to_string()))
    }
}
