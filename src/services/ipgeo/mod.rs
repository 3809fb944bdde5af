//! Client for the ipgeolocation.io lookup API

pub mod client;
pub mod error;
pub mod models;
pub mod params;
pub mod transport;

// Re-export main components
pub use client::{Client, decode};
pub use error::{BoxError, GeoError, GeoResult, TransportError};
pub use models::*;
pub use params::{EncodedQuery, IncludeFlag, effective_language, encode_params};
pub use transport::{ReqwestTransport, ResponseBody, ResponseGuard, Transport, TransportResponse};
