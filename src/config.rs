// IP Geolocation Client - Configuration
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::services::ipgeo::error::{GeoError, GeoResult};
use crate::services::ipgeo::transport::{ReqwestTransport, Transport};

// Provider endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.ipgeolocation.io/";
pub const SINGLE_LOOKUP_PATH: &str = "ipgeo";
pub const BULK_LOOKUP_PATH: &str = "ipgeo-bulk";

// Environment variable read by the binary only
pub const API_KEY_ENV: &str = "IPGEOLOCATION_API_KEY";

// Default transport policy
pub const MAX_IDLE_PER_HOST: usize = 2;
pub const MAX_IDLE_TOTAL: usize = 20;
pub const IDLE_TIMEOUT_SECONDS: u64 = 90;
pub const CONNECT_TIMEOUT_SECONDS: u64 = 50;
pub const TLS_HANDSHAKE_TIMEOUT_SECONDS: u64 = 10;
pub const EXPECT_CONTINUE_TIMEOUT_SECONDS: u64 = 1;
pub const REQUEST_TIMEOUT_SECONDS: u64 = 50;
pub const TCP_KEEPALIVE_SECONDS: u64 = 90;

pub const USER_AGENT: &str = concat!("ipgeolocation-rs/", env!("CARGO_PKG_VERSION"));

/// Response languages accepted by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    #[default]
    En,
    De,
    Ru,
    Ja,
    Fr,
    Cn,
    Es,
    Cs,
    It,
}

impl Language {
    pub const ALL: [Language; 9] = [
        Language::En,
        Language::De,
        Language::Ru,
        Language::Ja,
        Language::Fr,
        Language::Cn,
        Language::Es,
        Language::Cs,
        Language::It,
    ];

    /// Wire code sent as the `lang` query parameter
    pub fn as_str(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::De => "de",
            Language::Ru => "ru",
            Language::Ja => "ja",
            Language::Fr => "fr",
            Language::Cn => "cn",
            Language::Es => "es",
            Language::Cs => "cs",
            Language::It => "it",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .iter()
            .copied()
            .find(|lang| lang.as_str() == s)
            .ok_or_else(|| GeoError::UnsupportedLanguage(s.to_string()))
    }
}

/// Connection policy applied to the default transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportPolicy {
    pub max_idle_per_host: usize,
    /// Not exposed by reqwest; kept for parity with the provider's reference client
    pub max_idle_total: usize,
    pub idle_timeout: Duration,
    pub connect_timeout: Duration,
    /// Not exposed by reqwest
    pub tls_handshake_timeout: Duration,
    /// Not exposed by reqwest
    pub expect_continue_timeout: Duration,
    pub request_timeout: Duration,
    pub tcp_keepalive: Duration,
    /// Honour HTTP(S)_PROXY / NO_PROXY from the environment
    pub use_env_proxy: bool,
    /// When false every call tears down its connection instead of returning it to the pool
    pub keep_alive: bool,
}

impl Default for TransportPolicy {
    fn default() -> Self {
        Self {
            max_idle_per_host: MAX_IDLE_PER_HOST,
            max_idle_total: MAX_IDLE_TOTAL,
            idle_timeout: Duration::from_secs(IDLE_TIMEOUT_SECONDS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECONDS),
            tls_handshake_timeout: Duration::from_secs(TLS_HANDSHAKE_TIMEOUT_SECONDS),
            expect_continue_timeout: Duration::from_secs(EXPECT_CONTINUE_TIMEOUT_SECONDS),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECONDS),
            tcp_keepalive: Duration::from_secs(TCP_KEEPALIVE_SECONDS),
            use_env_proxy: true,
            keep_alive: false,
        }
    }
}

/// Immutable client configuration
///
/// Holds the API key, the base endpoint, the validated default language and the
/// transport every call goes through. Cloning shares the transport.
#[derive(Clone)]
pub struct ClientConfig {
    api_key: String,
    endpoint: Url,
    default_language: Language,
    transport: Arc<dyn Transport>,
}

impl ClientConfig {
    /// Build a configuration, validating the default language
    ///
    /// An empty or absent `language` falls back to `en`. Without a transport a
    /// [`ReqwestTransport`] with [`TransportPolicy::default`] is created.
    pub fn new(
        api_key: impl Into<String>,
        language: Option<&str>,
        transport: Option<Arc<dyn Transport>>,
    ) -> GeoResult<Self> {
        let default_language = match language {
            None | Some("") => Language::default(),
            Some(code) => code.parse()?,
        };

        let transport = match transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::with_policy(&TransportPolicy::default())?),
        };

        let endpoint = Url::parse(DEFAULT_ENDPOINT).map_err(GeoError::InvalidEndpoint)?;

        Ok(Self {
            api_key: api_key.into(),
            endpoint,
            default_language,
            transport,
        })
    }

    /// Replace the base endpoint, e.g. to point at a local test server
    pub fn with_endpoint(mut self, endpoint: &str) -> GeoResult<Self> {
        let mut endpoint = Url::parse(endpoint).map_err(GeoError::InvalidEndpoint)?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }
        self.endpoint = endpoint;
        Ok(self)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn default_language(&self) -> Language {
        self.default_language
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint.as_str())
            .field("default_language", &self.default_language)
            .finish_non_exhaustive()
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Look up IP addresses against the ipgeolocation.io API")]
pub struct Cli {
    /// IP addresses to look up (more than one implies a bulk lookup)
    #[arg(required = true, value_name = "IP")]
    pub ips: Vec<String>,

    /// API key (falls back to IPGEOLOCATION_API_KEY)
    #[arg(short = 'k', long)]
    pub api_key: Option<String>,

    /// Response language (en, de, ru, ja, fr, cn, es, cs, it)
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Restrict the response to these fields
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Override the API endpoint
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Force a bulk request even for a single IP
    #[arg(long)]
    pub bulk: bool,

    /// Include security details
    #[arg(long)]
    pub security: bool,

    /// Include the cached hostname
    #[arg(long)]
    pub hostname: bool,

    /// Include a live hostname lookup
    #[arg(long)]
    pub live_hostname: bool,

    /// Include the cached hostname, falling back to a live lookup
    #[arg(long)]
    pub hostname_fallback_live: bool,

    /// Include user agent details
    #[arg(long)]
    pub useragent: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ipgeo::transport::testing::StubTransport;

    fn stub() -> Option<Arc<dyn Transport>> {
        Some(Arc::new(StubTransport::ok(200, "{}")))
    }

    #[test]
    fn test_language_defaults_to_en() {
        let config = ClientConfig::new("k", None, stub()).unwrap();
        assert_eq!(config.default_language(), Language::En);

        let config = ClientConfig::new("k", Some(""), stub()).unwrap();
        assert_eq!(config.default_language(), Language::En);
    }

    #[test]
    fn test_supported_languages_accepted() {
        for code in ["en", "de", "ru", "ja", "fr", "cn", "es", "cs", "it"] {
            let config = ClientConfig::new("k", Some(code), stub()).unwrap();
            assert_eq!(config.default_language().as_str(), code);
        }
    }

    #[test]
    fn test_unsupported_language_rejected() {
        for code in ["xx", "EN", "zh", "en-US", " en"] {
            match ClientConfig::new("k", Some(code), stub()) {
                Err(GeoError::UnsupportedLanguage(lang)) => assert_eq!(lang, code),
                other => panic!("expected UnsupportedLanguage for {code}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_default_endpoint_and_override() {
        let config = ClientConfig::new("k", None, stub()).unwrap();
        assert_eq!(config.endpoint().as_str(), DEFAULT_ENDPOINT);

        let config = config.with_endpoint("http://127.0.0.1:8080/v2").unwrap();
        assert_eq!(config.endpoint().as_str(), "http://127.0.0.1:8080/v2/");

        let err = ClientConfig::new("k", None, stub())
            .unwrap()
            .with_endpoint("not a url")
            .unwrap_err();
        assert!(matches!(err, GeoError::InvalidEndpoint(_)));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig::new("secret-key", None, stub()).unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_default_policy_values() {
        let policy = TransportPolicy::default();
        assert_eq!(policy.max_idle_per_host, 2);
        assert_eq!(policy.max_idle_total, 20);
        assert_eq!(policy.idle_timeout, Duration::from_secs(90));
        assert_eq!(policy.connect_timeout, Duration::from_secs(50));
        assert_eq!(policy.tls_handshake_timeout, Duration::from_secs(10));
        assert_eq!(policy.expect_continue_timeout, Duration::from_secs(1));
        assert_eq!(policy.request_timeout, Duration::from_secs(50));
        assert!(policy.use_env_proxy);
        assert!(!policy.keep_alive);
    }

    #[tokio::test]
    async fn test_default_transport_is_built() {
        let config = ClientConfig::new("k", Some("de"), None).unwrap();
        assert_eq!(config.default_language(), Language::De);
    }
}
