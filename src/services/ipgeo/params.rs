// IP Geolocation Client - Query parameter encoding
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Turns a [`LookupRequest`] into the query string and body the provider expects

use std::collections::HashMap;

use url::form_urlencoded;

use super::error::{GeoError, GeoResult};
use super::models::LookupRequest;
use crate::config::ClientConfig;

/// Optional response sections requested through repeated `include` parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncludeFlag {
    Security,
    Hostname,
    LiveHostname,
    HostnameFallbackLive,
    UserAgent,
}

impl IncludeFlag {
    /// Encoding order of the `include` entries
    pub const ORDER: [IncludeFlag; 5] = [
        IncludeFlag::Security,
        IncludeFlag::Hostname,
        IncludeFlag::LiveHostname,
        IncludeFlag::HostnameFallbackLive,
        IncludeFlag::UserAgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IncludeFlag::Security => "security",
            IncludeFlag::Hostname => "hostname",
            IncludeFlag::LiveHostname => "liveHostname",
            IncludeFlag::HostnameFallbackLive => "hostnameFallbackLive",
            IncludeFlag::UserAgent => "useragent",
        }
    }

    pub fn is_set(self, request: &LookupRequest) -> bool {
        match self {
            IncludeFlag::Security => request.include_security,
            IncludeFlag::Hostname => request.include_hostname,
            IncludeFlag::LiveHostname => request.include_live_hostname,
            IncludeFlag::HostnameFallbackLive => request.include_hostname_fallback_live,
            IncludeFlag::UserAgent => request.include_user_agent,
        }
    }
}

/// Ordered multimap of query parameters; repeated keys stay separate entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedQuery {
    pairs: Vec<(String, String)>,
}

impl EncodedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    /// All values recorded under `key`, in insertion order
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// `application/x-www-form-urlencoded` rendering
    pub fn encode(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    /// Same as [`encode`](Self::encode) with the API key masked, for logging
    pub fn redacted(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter().map(|(k, v)| {
                if k == "apiKey" { (k, "***") } else { (k, v) }
            }))
            .finish()
    }
}

/// Language actually sent: the request override, or the configured default
///
/// The override is passed through as-is; only the configured default is
/// validated against the supported set.
pub fn effective_language<'a>(config: &'a ClientConfig, request: &'a LookupRequest) -> &'a str {
    if request.language.is_empty() {
        config.default_language().as_str()
    } else {
        &request.language
    }
}

/// Build the query shared by single and bulk lookups
pub fn encode_params(config: &ClientConfig, request: &LookupRequest, ip: Option<&str>) -> EncodedQuery {
    let mut query = EncodedQuery::new();

    query.add("apiKey", config.api_key());
    if let Some(ip) = ip {
        query.add("ip", ip);
    }

    for field in &request.fields {
        query.add("fields", field.as_str());
    }

    query.add("lang", effective_language(config, request));

    for flag in IncludeFlag::ORDER {
        if flag.is_set(request) {
            query.add("include", flag.as_str());
        }
    }

    query
}

pub fn validate_single(request: Option<&LookupRequest>) -> GeoResult<&LookupRequest> {
    let request = request.ok_or(GeoError::MissingInput)?;
    if request.ip.is_empty() {
        return Err(GeoError::MissingIp);
    }
    Ok(request)
}

pub fn validate_bulk(request: Option<&LookupRequest>) -> GeoResult<&LookupRequest> {
    let request = request.ok_or(GeoError::MissingInput)?;
    if request.ips.is_empty() {
        return Err(GeoError::MissingIps);
    }
    Ok(request)
}

/// Bulk POST body: `{"ips": "<json array>"}`
///
/// The provider expects the address list serialized to a JSON string and then
/// embedded as a string value, not as a nested array.
pub fn bulk_body(ips: &[String]) -> GeoResult<Vec<u8>> {
    let list = serde_json::to_string(ips).map_err(GeoError::Encode)?;
    let body = HashMap::from([("ips", list)]);
    serde_json::to_vec(&body).map_err(GeoError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ipgeo::transport::testing::StubTransport;
    use std::sync::Arc;

    fn config(lang: Option<&str>) -> ClientConfig {
        ClientConfig::new("k", lang, Some(Arc::new(StubTransport::ok(200, "{}")))).unwrap()
    }

    #[test]
    fn test_fields_and_includes_keep_order() {
        let request = LookupRequest {
            fields: vec!["city".into(), "isp".into()],
            include_security: true,
            include_hostname: true,
            ..LookupRequest::default()
        };

        let query = encode_params(&config(None), &request, None);
        assert_eq!(query.get_all("fields"), vec!["city", "isp"]);
        assert_eq!(query.get_all("include"), vec!["security", "hostname"]);
        assert_eq!(query.get_all("lang"), vec!["en"]);
        assert_eq!(query.get_all("apiKey"), vec!["k"]);
        assert!(query.get_all("ip").is_empty());
        assert_eq!(query.len(), 6);
        assert!(!query.is_empty());
        assert!(EncodedQuery::new().is_empty());
    }

    #[test]
    fn test_all_includes_in_fixed_order() {
        let request = LookupRequest {
            include_security: true,
            include_hostname: true,
            include_live_hostname: true,
            include_hostname_fallback_live: true,
            include_user_agent: true,
            ..LookupRequest::default()
        };

        let query = encode_params(&config(None), &request, Some("1.1.1.1"));
        assert_eq!(
            query.get_all("include"),
            vec!["security", "hostname", "liveHostname", "hostnameFallbackLive", "useragent"]
        );
        assert_eq!(query.get_all("ip"), vec!["1.1.1.1"]);
    }

    #[test]
    fn test_duplicate_fields_preserved() {
        let request = LookupRequest::default().fields(["city", "city"]);
        let query = encode_params(&config(None), &request, None);
        assert_eq!(query.get_all("fields"), vec!["city", "city"]);
    }

    #[test]
    fn test_language_resolution_does_not_mutate() {
        let config = config(Some("ja"));
        let request = LookupRequest::single("1.1.1.1");
        assert_eq!(effective_language(&config, &request), "ja");
        assert!(request.language.is_empty());

        // Overrides are not re-validated
        let request = request.language("zz");
        let query = encode_params(&config, &request, None);
        assert_eq!(query.get_all("lang"), vec!["zz"]);
    }

    #[test]
    fn test_encode_string() {
        let request = LookupRequest::default().fields(["city"]);
        let query = encode_params(&config(None), &request, Some("1.1.1.1"));
        assert_eq!(query.encode(), "apiKey=k&ip=1.1.1.1&fields=city&lang=en");
        assert_eq!(query.redacted(), "apiKey=***&ip=1.1.1.1&fields=city&lang=en");
    }

    #[test]
    fn test_validation() {
        assert!(matches!(validate_single(None), Err(GeoError::MissingInput)));
        assert!(matches!(validate_bulk(None), Err(GeoError::MissingInput)));

        let empty = LookupRequest::default();
        assert!(matches!(validate_single(Some(&empty)), Err(GeoError::MissingIp)));
        assert!(matches!(validate_bulk(Some(&empty)), Err(GeoError::MissingIps)));

        let single = LookupRequest::single("1.1.1.1");
        assert!(validate_single(Some(&single)).is_ok());
        assert!(matches!(validate_bulk(Some(&single)), Err(GeoError::MissingIps)));
    }

    #[test]
    fn test_bulk_body_is_double_encoded() {
        let ips = vec!["1.1.1.1".to_string(), "8.8.8.8".to_string()];
        let body = bulk_body(&ips).unwrap();

        let outer: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let object = outer.as_object().unwrap();
        assert_eq!(object.len(), 1);

        let inner = object["ips"].as_str().unwrap();
        let parsed: Vec<String> = serde_json::from_str(inner).unwrap();
        assert_eq!(parsed, ips);
    }
}
