// IP Geolocation Client - HTTP transport
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Transport capability used by the client
//!
//! The client only needs one operation: send a prepared [`reqwest::Request`] and
//! hand back the status plus a readable body. Anything implementing
//! [`Transport`] can be injected, which is how tests run without a network.

use async_trait::async_trait;
use reqwest::header::{CONNECTION, HeaderMap, HeaderValue};
use reqwest::{Request, StatusCode};

use super::error::{BoxError, GeoResult, TransportError};
use crate::config::{TransportPolicy, USER_AGENT};
use crate::log_debug;

/// Streamed response body owned by a single call
#[async_trait]
pub trait ResponseBody: Send {
    /// Next chunk of the body, `None` once drained
    async fn chunk(&mut self) -> Result<Option<Vec<u8>>, BoxError>;

    /// Give the underlying connection back (or tear it down)
    fn release(&mut self);
}

pub struct TransportResponse {
    pub status: StatusCode,
    pub body: Box<dyn ResponseBody>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<TransportResponse, TransportError>;
}

/// Scoped owner of a response: the body is released exactly once, on drop
pub struct ResponseGuard {
    status: StatusCode,
    body: Option<Box<dyn ResponseBody>>,
}

impl ResponseGuard {
    pub fn new(response: TransportResponse) -> Self {
        Self {
            status: response.status,
            body: Some(response.body),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Drain the whole body, regardless of status code
    pub async fn read_to_end(&mut self) -> Result<Vec<u8>, BoxError> {
        let mut buf = Vec::new();
        let Some(body) = self.body.as_mut() else {
            return Ok(buf);
        };
        while let Some(chunk) = body.chunk().await? {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf)
    }
}

impl Drop for ResponseGuard {
    fn drop(&mut self) {
        if let Some(mut body) = self.body.take() {
            body.release();
        }
    }
}

/// Default transport backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Build a client honouring `policy`
    ///
    /// With keep-alive off no idle connection is pooled and every request carries
    /// `Connection: close`.
    pub fn with_policy(policy: &TransportPolicy) -> GeoResult<Self> {
        let mut headers = HeaderMap::new();
        let idle_per_host = if policy.keep_alive {
            policy.max_idle_per_host
        } else {
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
            0
        };

        let mut builder = reqwest::Client::builder();
        if !policy.use_env_proxy {
            builder = builder.no_proxy();
        }

        let client = builder
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .pool_max_idle_per_host(idle_per_host)
            .pool_idle_timeout(policy.idle_timeout)
            .connect_timeout(policy.connect_timeout)
            .timeout(policy.request_timeout)
            .tcp_keepalive(policy.tcp_keepalive)
            .build()
            .map_err(TransportError::from)?;

        Ok(Self::new(client))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: Request) -> Result<TransportResponse, TransportError> {
        let response = self.client.execute(request).await?;
        log_debug!("ipgeolocation responded with {}", response.status());
        Ok(TransportResponse {
            status: response.status(),
            body: Box::new(ReqwestBody(Some(response))),
        })
    }
}

struct ReqwestBody(Option<reqwest::Response>);

#[async_trait]
impl ResponseBody for ReqwestBody {
    async fn chunk(&mut self) -> Result<Option<Vec<u8>>, BoxError> {
        match self.0.as_mut() {
            Some(response) => Ok(response.chunk().await?.map(|bytes| bytes.to_vec())),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        // Dropping the response frees the connection
        self.0.take();
    }
}
