// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Request/reply transport.
//!
//! A trait-based HTTP layer so the client can run against:
//! - `reqwest` in production
//! - Recording mocks in unit tests

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Header carrying the session token on identity-bearing calls.
pub const SESSION_TOKEN_HEADER: &str = "X-Session-Token";

/// Error type for request/reply calls.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The call exceeded the transport timeout.
    #[error("request timed out")]
    Timeout,

    /// The backend could not be reached.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other transport failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The call was dropped before completing.
    #[error("request aborted")]
    Aborted,
}

/// Result type for request/reply calls.
pub type HttpResult<T> = Result<T, HttpError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

/// A request relative to the configured base url.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Path starting with `/`, already percent-encoded.
    pub path: String,
    /// Session token sent as [`SESSION_TOKEN_HEADER`].
    pub token: Option<String>,
    pub body: Option<Value>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        HttpRequest {
            method,
            path: path.into(),
            token: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Status and raw body of a completed call.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            body: body.into(),
        }
    }

    /// Only 200 counts as success.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Parses the body, falling back to `T::default()` when it is not
    /// valid JSON of the expected shape.
    pub fn json_or_default<T: DeserializeOwned + Default>(&self) -> T {
        serde_json::from_str(&self.body).unwrap_or_default()
    }

    /// Parses the body as an arbitrary JSON value.
    pub fn json_value(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

/// Request/reply transport.
pub trait HttpTransport: Send + Sync {
    /// Performs one call. Never retries.
    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = HttpResult<HttpResponse>> + Send + '_>>;
}

/// HTTP transport implementation using reqwest.
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
}

impl ReqwestTransport {
    /// Creates a transport for `base_url` with a fixed per-call timeout.
    pub fn new(base_url: &str, timeout: Duration) -> HttpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| HttpError::Request(e.to_string()))?;
        Ok(ReqwestTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl HttpTransport for ReqwestTransport {
    fn send(
        &self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = HttpResult<HttpResponse>> + Send + '_>> {
        Box::pin(async move {
            let url = self.url(&request.path);
            let mut builder = match request.method {
                Method::Get => self.client.get(&url),
                Method::Post => self.client.post(&url),
                Method::Put => self.client.put(&url),
                Method::Delete => self.client.delete(&url),
            };
            if let Some(ref token) = request.token {
                builder = builder.header(SESSION_TOKEN_HEADER, token);
            }
            if let Some(ref body) = request.body {
                builder = builder.json(body);
            }

            let resp = builder.send().await.map_err(classify)?;
            let status = resp.status().as_u16();
            // An unreadable body is treated like an empty one
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!("{} {} -> {}", request.method.as_str(), request.path, status);
            Ok(HttpResponse { status, body })
        })
    }
}

fn classify(e: reqwest::Error) -> HttpError {
    if e.is_timeout() {
        HttpError::Timeout
    } else if e.is_connect() {
        HttpError::Connect(e.to_string())
    } else {
        HttpError::Request(e.to_string())
    }
}

#[cfg(test)]
#[path = "http_tests.rs"]
mod tests;
