//! # IP Geolocation Client
//!
//! An async client for the [ipgeolocation.io](https://ipgeolocation.io) API:
//! - Single IP lookups (`GET ipgeo`)
//! - Bulk lookups (`POST ipgeo-bulk`)
//! - Field selection, language negotiation and optional `include` sections
//! - Pluggable transport for testing or custom HTTP stacks
//!
//! ## Quick Start
//!
//! ```no_run
//! use ipgeolocation::{Client, ClientConfig, LookupRequest};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = Client::new(ClientConfig::new("your-api-key", None, None)?);
//!
//!     let result = client.lookup(&LookupRequest::single("1.1.1.1")).await?;
//!     println!("{} is in {}", result.ip, result.city);
//!
//!     let request = LookupRequest::bulk(["1.1.1.1", "8.8.8.8"]).fields(["city", "isp"]);
//!     let result = client.lookup_bulk(&request).await?;
//!     println!("{:?}", result);
//!     Ok(())
//! }
//! ```
//!
//! A response with a non-success HTTP status is still decoded; only transport,
//! read and decode failures are reported as errors.

pub mod config;
pub mod core;
pub mod services;

// Re-export commonly used types for convenience
pub use config::{ClientConfig, DEFAULT_ENDPOINT, Language, TransportPolicy};
pub use services::ipgeo::{
    Client, Currency, GeoError, GeoResult, LookupRequest, LookupResult, ReqwestTransport, TimeZone,
    Transport, TransportError,
};
