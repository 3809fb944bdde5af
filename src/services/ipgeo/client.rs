// IP Geolocation Client - API client
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Main geolocation API client

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::{Body, Method, Request};
use url::Url;

use super::error::{GeoError, GeoResult};
use super::models::{LookupRequest, LookupResult};
use super::params::{EncodedQuery, bulk_body, encode_params, validate_bulk, validate_single};
use super::transport::ResponseGuard;
use crate::config::{BULK_LOOKUP_PATH, ClientConfig, SINGLE_LOOKUP_PATH};
use crate::{log_debug, log_error, log_warn};

/// Geolocation API client
///
/// Stateless apart from its configuration; share it freely between tasks.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Look up a single IP address
    ///
    /// A non-success status is not an error: the body is decoded either way.
    pub async fn lookup<'a>(&self, request: impl Into<Option<&'a LookupRequest>>) -> GeoResult<LookupResult> {
        let request = validate_single(request.into())?;

        let query = encode_params(&self.config, request, Some(request.ip.as_str()));
        let url = self.url(SINGLE_LOOKUP_PATH, &query)?;
        log_debug!("GET {}?{}", url.path(), query.redacted());

        self.send(Request::new(Method::GET, url)).await
    }

    /// Look up several IP addresses in one POST
    pub async fn lookup_bulk<'a>(&self, request: impl Into<Option<&'a LookupRequest>>) -> GeoResult<LookupResult> {
        let request = validate_bulk(request.into())?;

        let query = encode_params(&self.config, request, None);
        let url = self.url(BULK_LOOKUP_PATH, &query)?;
        let body = bulk_body(&request.ips)?;
        log_debug!("POST {}?{} ({} ips)", url.path(), query.redacted(), request.ips.len());

        let mut http_request = Request::new(Method::POST, url);
        http_request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        *http_request.body_mut() = Some(Body::from(body));

        self.send(http_request).await
    }

    fn url(&self, path: &str, query: &EncodedQuery) -> GeoResult<Url> {
        let mut url = self.config.endpoint().join(path).map_err(GeoError::InvalidEndpoint)?;
        url.set_query(Some(&query.encode()));
        Ok(url)
    }

    async fn send(&self, request: Request) -> GeoResult<LookupResult> {
        let response = self.config.transport().execute(request).await.map_err(|e| {
            log_error!("error making request: {}", e);
            GeoError::Transport(e)
        })?;

        // Released on every return below
        let mut response = ResponseGuard::new(response);
        let status = response.status();
        if !status.is_success() {
            log_warn!("ipgeolocation returned non-success status: {}", status);
        }

        let body = response.read_to_end().await.map_err(|e| {
            log_error!("error reading response body: {}", e);
            GeoError::Read(e)
        })?;

        decode(&body)
    }
}

/// Decode a response body, salvaging a partial result on failure
pub fn decode(body: &[u8]) -> GeoResult<LookupResult> {
    serde_json::from_slice(body).map_err(|source| {
        log_error!("error decoding response body: {}", source);
        GeoError::Decode {
            source,
            partial: Box::new(LookupResult::salvage(body)),
        }
    })
}
