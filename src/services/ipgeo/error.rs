// IP Geolocation Client - Errors
// Copyright (C) 2025 Akaere Networks
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Error types for the geolocation client

use thiserror::Error;

use super::models::LookupResult;

/// Boxed error raised by a transport or response body
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure to deliver a request or receive response headers
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("transport failure: {0}")]
    Other(BoxError),
}

impl TransportError {
    pub fn other(err: impl Into<BoxError>) -> Self {
        Self::Other(err.into())
    }

    /// Timeouts and connect failures; the caller decides whether to retry
    pub fn is_timeout_or_connect(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Other(_) => false,
        }
    }
}

/// Geolocation client error type
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("missing input")]
    MissingInput,

    #[error("missing ip")]
    MissingIp,

    #[error("missing ips")]
    MissingIps,

    #[error("language not supported: {0:?}")]
    UnsupportedLanguage(String),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[source] url::ParseError),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("request failed: {0}")]
    Transport(#[from] TransportError),

    #[error("failed to read response body: {0}")]
    Read(#[source] BoxError),

    #[error("failed to decode response body: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        /// Whatever could be recovered from the body
        partial: Box<LookupResult>,
    },
}

/// Result type for geolocation operations
pub type GeoResult<T> = Result<T, GeoError>;

impl GeoError {
    /// Local input problems, raised before any network call
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingInput | Self::MissingIp | Self::MissingIps | Self::UnsupportedLanguage(_)
        )
    }

    /// Check if error is recoverable (worth retrying by the caller)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_timeout_or_connect(),
            Self::Read(_) => true,
            _ => false,
        }
    }

    /// Partially decoded result carried by a decode failure
    pub fn partial_result(&self) -> Option<&LookupResult> {
        match self {
            Self::Decode { partial, .. } => Some(partial),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_classification() {
        assert!(GeoError::MissingInput.is_validation());
        assert!(GeoError::MissingIp.is_validation());
        assert!(GeoError::MissingIps.is_validation());
        assert!(GeoError::UnsupportedLanguage("xx".into()).is_validation());
        assert!(!GeoError::Read("boom".into()).is_validation());
    }

    #[test]
    fn test_messages() {
        assert_eq!(GeoError::MissingIp.to_string(), "missing ip");
        assert_eq!(GeoError::MissingIps.to_string(), "missing ips");
        assert_eq!(
            GeoError::UnsupportedLanguage("xx".into()).to_string(),
            "language not supported: \"xx\""
        );
    }

    #[test]
    fn test_partial_result_only_on_decode() {
        let source = serde_json::from_str::<LookupResult>("{").unwrap_err();
        let err = GeoError::Decode {
            source,
            partial: Box::new(LookupResult::default()),
        };
        assert!(err.partial_result().is_some());
        assert!(GeoError::MissingIp.partial_result().is_none());
        assert!(GeoError::Read("reset".into()).is_recoverable());
        assert!(!err.is_recoverable());
    }
}
